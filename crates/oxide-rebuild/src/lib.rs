//! SQLite migrations through table rebuilds.
//!
//! `oxide-rebuild` takes migration operations written for a full-featured
//! database and rewrites them into something SQLite can run. SQLite's
//! `ALTER TABLE` only renames tables, renames columns and adds columns; every
//! other change (dropping a column, altering its type, adding or dropping a
//! key or constraint) is turned into a table rebuild: create a shadow table
//! in the final shape, copy the rows across, drop the original and rename the
//! shadow into place.
//!
//! # Architecture
//!
//! - **Schema** - The target model a migration heads towards
//! - **Operations** - Schema changes like `CreateTable`, `DropColumn`, `RenameIndex`, etc.
//! - **Autodetector** - Diffs models; the rewriter uses it to synthesize final table shapes
//! - **Rewrite** - Classifies operations and plans table rebuilds
//! - **Dialect** - SQLite SQL generation
//! - **Executor** - Applies planned migrations to a database, tracking history
//!
//! # Example
//!
//! ```rust
//! use oxide_rebuild::prelude::*;
//!
//! let target = DatabaseSchema::new().table(
//!     TableSchema::new("users")
//!         .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
//!         .column(ColumnSchema::new("full_name", SqlType::Text).not_null()),
//! );
//!
//! let operations = vec![
//!     MigrationOperation::rename_column("users", "name", "full_name"),
//!     MigrationOperation::drop_column("users", "email"),
//! ];
//!
//! let commands = OperationRewriter::new()
//!     .generate_commands(&SqliteDialect::new(), &operations, &target)
//!     .unwrap();
//!
//! assert!(commands.iter().any(|c| c.sql.contains("SELECT \"id\", \"name\"")));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the SQL for a batch
//! oxide-rebuild plan --operations ops.json --model model.json
//!
//! # Apply it and record it in the history table
//! oxide-rebuild migrate --app users --name 0002_drop_email \
//!     --operations ops.json --model model.json
//!
//! # Show migration status
//! oxide-rebuild show-migrations
//! ```

pub mod autodetector;
pub mod command;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod history;
pub mod io;
pub mod operations;
pub mod rewrite;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::autodetector::{Autodetector, AutodetectorOptions, ModelDiffer};
    pub use crate::command::{CommandListBuilder, MigrationCommand};
    pub use crate::dialect::{MigrationDialect, SqliteDialect};
    pub use crate::error::{RebuildError, Result};
    pub use crate::executor::{ExecutableMigration, MigrationExecutor};
    pub use crate::history::MigrationHistory;
    pub use crate::operations::{
        foreign_key, ColumnChanges, ExtensionColumn, ForeignKeyBuilder, MigrationOperation,
    };
    pub use crate::rewrite::OperationRewriter;
    pub use crate::schema::{
        annotations, AnnotationValue, Annotations, ColumnSchema, DatabaseSchema, DefaultValue,
        ForeignKeyAction, ForeignKeySchema, IndexSchema, PrimaryKeySchema, SqlType, TableSchema,
        UniqueConstraint,
    };
}
