//! SQLite dialect for migrations.
//!
//! SQLite's `ALTER TABLE` can rename a table, rename a column and add a
//! column. Everything else reaching this dialect is rejected; the rewriter
//! replaces those operations with table rebuilds before they get here.

use tracing::debug;

use crate::command::CommandListBuilder;
use crate::error::{RebuildError, Result};
use crate::operations::{ExtensionColumn, MigrationOperation};
use crate::schema::{
    annotations, Annotations, ColumnSchema, ForeignKeySchema, PrimaryKeySchema, SqlType,
    UniqueConstraint,
};

use super::MigrationDialect;

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates SQL for creating a table.
    fn create_table_sql(
        &self,
        name: &str,
        columns: &[ColumnSchema],
        primary_key: Option<&PrimaryKeySchema>,
        foreign_keys: &[ForeignKeySchema],
        unique_constraints: &[UniqueConstraint],
    ) -> String {
        let mut sql = String::from("CREATE TABLE ");
        sql.push_str(&self.quote_identifier(name));
        sql.push_str(" (\n");

        let mut definitions: Vec<String> =
            columns.iter().map(|c| self.column_definition(c)).collect();

        if let Some(pk) = primary_key {
            definitions.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&pk.name),
                self.column_list(&pk.columns)
            ));
        }

        for uc in unique_constraints {
            definitions.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&uc.name),
                self.column_list(&uc.columns)
            ));
        }

        for fk in foreign_keys {
            definitions.push(self.foreign_key_sql(fk));
        }

        sql.push_str("    ");
        sql.push_str(&definitions.join(",\n    "));
        sql.push_str("\n)");
        sql
    }

    fn foreign_key_sql(&self, fk: &ForeignKeySchema) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.quote_identifier(&fk.name),
            self.column_list(&fk.columns),
            self.quote_identifier(&fk.references_table),
            self.column_list(&fk.references_columns),
            fk.on_delete.to_sql(),
            fk.on_update.to_sql()
        )
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates SQL for renaming a table.
    fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(old_name),
            self.quote_identifier(new_name)
        )
    }

    /// Generates SQL for adding a column.
    fn add_column_sql(&self, table: &str, column: &ColumnSchema) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(column)
        )
    }

    /// Generates SQL for renaming a column (SQLite 3.25.0+).
    fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_identifier(table),
            self.quote_identifier(old_name),
            self.quote_identifier(new_name)
        )
    }

    /// Generates SQL for creating an index.
    fn create_index_sql(
        &self,
        name: &str,
        table: &str,
        columns: &[String],
        unique: bool,
        condition: Option<&str>,
    ) -> String {
        let mut sql = String::from("CREATE ");
        if unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        sql.push_str(&self.quote_identifier(name));
        sql.push_str(" ON ");
        sql.push_str(&self.quote_identifier(table));
        sql.push_str(" (");
        sql.push_str(&self.column_list(columns));
        sql.push(')');

        if let Some(cond) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(cond);
        }

        sql
    }

    /// Generates the SpatiaLite call that registers a geometry column.
    fn add_geometry_column_sql(&self, column: &ExtensionColumn) -> String {
        format!(
            "SELECT AddGeometryColumn({}, {}, {}, {}, {}, {})",
            self.string_literal(&column.table),
            self.string_literal(&column.column),
            column.srid,
            self.string_literal(&column.geometry_type),
            self.string_literal(column.dimension.as_deref().unwrap_or("XY")),
            if column.nullable { 0 } else { 1 }
        )
    }

    /// Spatial metadata is initialized once, when the target model first
    /// asks for it.
    fn needs_spatial_init(new: &Annotations, old: &Annotations) -> bool {
        new.is_set(annotations::INIT_SPATIAL_METADATA)
            && !old.is_set(annotations::INIT_SPATIAL_METADATA)
    }

    fn unsupported(operation: &MigrationOperation) -> RebuildError {
        RebuildError::UnsupportedOperation {
            kind: operation.kind(),
        }
    }
}

impl MigrationDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn generate(
        &self,
        operation: &MigrationOperation,
        builder: &mut CommandListBuilder,
    ) -> Result<()> {
        match operation {
            MigrationOperation::CreateTable {
                name,
                columns,
                primary_key,
                foreign_keys,
                unique_constraints,
            } => {
                builder.append(&self.create_table_sql(
                    name,
                    columns,
                    primary_key.as_ref(),
                    foreign_keys,
                    unique_constraints,
                ));
                builder.end_command(false);
            }

            MigrationOperation::DropTable { name } => {
                builder.append(&format!("DROP TABLE {}", self.quote_identifier(name)));
                builder.end_command(false);
            }

            MigrationOperation::RenameTable { old_name, new_name } => {
                builder.append(&self.rename_table_sql(old_name, new_name));
                builder.end_command(false);
            }

            MigrationOperation::AddColumn { table, column } => {
                if column.is_extension_type() {
                    let ext = ExtensionColumn::from_column(table.clone(), column);
                    builder.append(&self.add_geometry_column_sql(&ext));
                } else {
                    builder.append(&self.add_column_sql(table, column));
                }
                builder.end_command(false);
            }

            MigrationOperation::RenameColumn {
                table,
                old_name,
                new_name,
            } => {
                builder.append(&self.rename_column_sql(table, old_name, new_name));
                builder.end_command(false);
            }

            MigrationOperation::CreateIndex {
                name,
                table,
                columns,
                unique,
                condition,
            } => {
                builder.append(&self.create_index_sql(
                    name,
                    table,
                    columns,
                    *unique,
                    condition.as_deref(),
                ));
                builder.end_command(false);
            }

            // SQLite index names are global, not per-table
            MigrationOperation::DropIndex { name, .. } => {
                builder.append(&format!("DROP INDEX {}", self.quote_identifier(name)));
                builder.end_command(false);
            }

            MigrationOperation::RunSql {
                sql,
                suppress_transaction,
            } => {
                builder.append(sql);
                builder.end_command(*suppress_transaction);
            }

            MigrationOperation::AlterDatabase {
                annotations,
                old_annotations,
            } => {
                if Self::needs_spatial_init(annotations, old_annotations) {
                    builder.append("SELECT InitSpatialMetaData()");
                    builder.end_command(false);
                }
            }

            // Must be the last statement of its command.
            MigrationOperation::AddExtensionColumn(column) => {
                builder.append(&self.add_geometry_column_sql(column));
                builder.end_command(false);
            }

            MigrationOperation::EnsureSchema { name } | MigrationOperation::DropSchema { name } => {
                debug!(schema = %name, "Ignoring schema operation, SQLite has no schemas");
            }

            MigrationOperation::DropColumn { .. }
            | MigrationOperation::AlterColumn { .. }
            | MigrationOperation::AddPrimaryKey { .. }
            | MigrationOperation::DropPrimaryKey { .. }
            | MigrationOperation::AddForeignKey { .. }
            | MigrationOperation::DropForeignKey { .. }
            | MigrationOperation::AddUniqueConstraint { .. }
            | MigrationOperation::DropUniqueConstraint { .. }
            | MigrationOperation::RenameIndex { .. }
            | MigrationOperation::CreateSequence { .. }
            | MigrationOperation::AlterSequence { .. }
            | MigrationOperation::RenameSequence { .. }
            | MigrationOperation::DropSequence { .. }
            | MigrationOperation::RestartSequence { .. } => {
                return Err(Self::unsupported(operation));
            }
        }

        Ok(())
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        sql_type.sqlite_name()
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "AUTOINCREMENT"
    }
}
