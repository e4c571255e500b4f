//! Database dialect implementations.
//!
//! A dialect turns a finalized operation list into executable commands. It
//! does not rewrite anything: operations without a native form are rejected
//! here, so callers are expected to run the batch through
//! [`crate::rewrite::OperationRewriter`] first.

mod sqlite;

pub use sqlite::SqliteDialect;

use crate::command::{CommandListBuilder, MigrationCommand};
use crate::error::Result;
use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, SqlType};

/// Trait for database-specific SQL generation.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Writes the SQL for one operation into `builder`, closing commands as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RebuildError::UnsupportedOperation`] when the
    /// operation has no native form in this dialect.
    fn generate(&self, operation: &MigrationOperation, builder: &mut CommandListBuilder)
        -> Result<()>;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String;

    /// Returns the auto-increment keyword for this dialect.
    fn auto_increment_keyword(&self) -> &'static str;

    /// Generates the commands for a whole batch.
    ///
    /// Nothing is returned unless every operation is supported.
    ///
    /// # Errors
    ///
    /// Fails on the first unsupported operation.
    fn generate_commands(&self, operations: &[MigrationOperation]) -> Result<Vec<MigrationCommand>> {
        let mut builder = CommandListBuilder::new();
        for operation in operations {
            self.generate(operation, &mut builder)?;
        }
        Ok(builder.finish())
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &ColumnSchema) -> String {
        let mut parts = vec![
            self.quote_identifier(&column.name),
            self.type_name(&column.sql_type),
        ];

        if column.primary_key {
            parts.push("PRIMARY KEY".to_string());
            if column.auto_increment {
                parts.push(self.auto_increment_keyword().to_string());
            }
        }

        if !column.nullable && !column.primary_key {
            parts.push("NOT NULL".to_string());
        }

        if column.unique && !column.primary_key {
            parts.push("UNIQUE".to_string());
        }

        if let Some(default_sql) = column.default.to_sql() {
            parts.push(format!("DEFAULT {default_sql}"));
        }

        if let Some(ref check) = column.check {
            parts.push(format!("CHECK ({check})"));
        }

        parts.join(" ")
    }

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        quote_identifier(name)
    }

    /// Quote a string literal.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Double-quotes an identifier, doubling any embedded quote.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
