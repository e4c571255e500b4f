//! Loading operation batches and target models from JSON files.
//!
//! Operations use serde's externally tagged enum layout:
//!
//! ```json
//! [
//!   {"RenameColumn": {"table": "users", "old_name": "name", "new_name": "full_name"}},
//!   {"DropColumn": {"table": "users", "column_name": "email"}}
//! ]
//! ```
//!
//! A model is a serialized [`DatabaseSchema`].

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{RebuildError, Result};
use crate::operations::MigrationOperation;
use crate::schema::DatabaseSchema;

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| RebuildError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an operation batch from `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a JSON array of operations.
pub fn load_operations(path: &Path) -> Result<Vec<MigrationOperation>> {
    let operations: Vec<MigrationOperation> = load_json(path)?;
    debug!(path = %path.display(), count = operations.len(), "Loaded operations");
    Ok(operations)
}

/// Reads a target model from `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a JSON model.
pub fn load_model(path: &Path) -> Result<DatabaseSchema> {
    let model: DatabaseSchema = load_json(path)?;
    debug!(path = %path.display(), tables = model.tables.len(), "Loaded model");
    Ok(model)
}
