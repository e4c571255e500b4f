//! Rewrites a migration batch into operations SQLite can run.
//!
//! SQLite's `ALTER TABLE` can rename tables and columns and add columns.
//! Everything else (dropping columns, changing types, adding or removing
//! constraints) is expressed by rebuilding the table:
//!
//! ```text
//! PRAGMA foreign_keys = 0
//! CREATE TABLE "t_new" (...)           -- final shape, from the target model
//! INSERT INTO "t_new" (...) SELECT ... FROM "t"
//! DROP TABLE "t"
//! ALTER TABLE "t_new" RENAME TO "t"
//! CREATE INDEX "IX_t_..." ...
//! PRAGMA foreign_keys = 1
//! ```
//!
//! The rewrite runs in one pass. Each operation is classified: passed
//! through, folded into a `CreateTable` from the same batch, or queued for a
//! rebuild. Once the whole batch has been seen, one rebuild block per queued
//! table is appended.
//!
//! # Example
//!
//! ```rust
//! use oxide_rebuild::prelude::*;
//!
//! let target = DatabaseSchema::new().table(
//!     TableSchema::new("users")
//!         .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
//!         .column(ColumnSchema::new("name", SqlType::Text)),
//! );
//!
//! let ops = vec![MigrationOperation::drop_column("users", "email")];
//! let commands = OperationRewriter::new()
//!     .generate_commands(&SqliteDialect::new(), &ops, &target)
//!     .unwrap();
//!
//! assert_eq!(commands[0].sql, "PRAGMA foreign_keys = 0");
//! assert!(commands[0].suppress_transaction);
//! ```

mod classify;
mod ledger;
mod planner;

pub use ledger::{ColumnRename, IndexRename, RebuildLedger, TableRebuild};
pub(crate) use planner::{DISABLE_FOREIGN_KEYS, ENABLE_FOREIGN_KEYS};

use tracing::debug;

use crate::autodetector::{Autodetector, ModelDiffer};
use crate::command::MigrationCommand;
use crate::dialect::MigrationDialect;
use crate::error::Result;
use crate::operations::MigrationOperation;
use crate::schema::DatabaseSchema;

/// Rewrites operation batches for SQLite.
///
/// The rewriter holds no per-call state, so one instance can serve
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct OperationRewriter<D = Autodetector> {
    differ: D,
}

impl OperationRewriter {
    /// Creates a rewriter backed by the built-in [`Autodetector`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: ModelDiffer> OperationRewriter<D> {
    /// Creates a rewriter that synthesizes table shapes with `differ`.
    #[must_use]
    pub fn with_differ(differ: D) -> Self {
        Self { differ }
    }

    /// Rewrites `operations` so that every remaining operation has a native
    /// SQLite form, using `target` as the final shape of rebuilt tables.
    ///
    /// The input is left untouched.
    ///
    /// # Errors
    ///
    /// Fails if a rebuild cannot be planned; see
    /// [`crate::error::RebuildError::MissingSynthesizedTable`] and
    /// [`crate::error::RebuildError::AmbiguousRename`].
    pub fn rewrite(
        &self,
        operations: &[MigrationOperation],
        target: &DatabaseSchema,
    ) -> Result<Vec<MigrationOperation>> {
        let mut ledger = RebuildLedger::new();
        let mut rewritten = classify::classify(operations, &mut ledger);

        debug!(
            input = operations.len(),
            passed = rewritten.len(),
            rebuilds = ledger.len(),
            "Classified migration batch"
        );

        if !ledger.is_empty() {
            let synthesized = self.differ.diff(&DatabaseSchema::new(), target);
            rewritten.extend(planner::plan_rebuilds(ledger, &synthesized)?);
        }

        Ok(rewritten)
    }

    /// Rewrites `operations` and renders them with `dialect`.
    ///
    /// Either every command is returned or none is.
    ///
    /// # Errors
    ///
    /// Fails if the rewrite fails or if an operation is left that `dialect`
    /// cannot express.
    pub fn generate_commands(
        &self,
        dialect: &dyn MigrationDialect,
        operations: &[MigrationOperation],
        target: &DatabaseSchema,
    ) -> Result<Vec<MigrationCommand>> {
        let rewritten = self.rewrite(operations, target)?;
        let commands = dialect.generate_commands(&rewritten)?;
        for command in &commands {
            debug!(sql = %command.sql, suppress_transaction = command.suppress_transaction, "Emitting");
        }
        Ok(commands)
    }
}
