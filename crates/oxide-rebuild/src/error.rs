//! Error types for planning and applying migrations.

use std::path::PathBuf;

/// Errors that can occur while rewriting, emitting or applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    /// The operation has no SQLite form and no rebuild path.
    #[error("SQLite does not support the {kind} operation")]
    UnsupportedOperation {
        /// Operation kind, e.g. `CreateSequence`.
        kind: &'static str,
    },

    /// An index rename could not be resolved against the target model.
    #[error("Cannot rename index on table '{table}': index '{index}' is not in the target model")]
    AmbiguousRename {
        /// Table the index belongs to.
        table: String,
        /// The index name that could not be resolved.
        index: String,
    },

    /// The model differ produced no `CreateTable` for a table queued for rebuild.
    #[error("Table '{table}' is queued for rebuild but the target model does not define it")]
    MissingSynthesizedTable {
        /// The table that could not be synthesized.
        table: String,
    },

    /// A migration depends on another that hasn't been applied.
    #[error("Migration '{migration}' depends on '{dependency}' which has not been applied")]
    MissingDependency {
        /// The migration with the missing dependency.
        migration: String,
        /// The dependency that's missing.
        dependency: String,
    },

    /// Database error during migration execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading operation or model files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an operation or model file.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, RebuildError>;
