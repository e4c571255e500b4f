//! Migration operations.
//!
//! This module defines every schema change a migration batch can express.
//! Operations are plain data: deciding which ones SQLite can run natively is
//! the job of [`crate::rewrite`], and turning them into SQL is the job of
//! [`crate::dialect`].

use serde::{Deserialize, Serialize};

use crate::schema::{
    annotations, split_dimension_suffix, Annotations, ColumnSchema, DefaultValue,
    ForeignKeyAction, ForeignKeySchema, PrimaryKeySchema, SqlType, UniqueConstraint,
};

/// Changes to apply to an existing column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnChanges {
    /// New data type (if changing).
    pub sql_type: Option<SqlType>,
    /// New nullability (if changing).
    pub nullable: Option<bool>,
    /// New default value (if changing).
    pub default: Option<DefaultValue>,
    /// New unique constraint (if changing).
    pub unique: Option<bool>,
}

impl ColumnChanges {
    /// Creates empty column changes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new type.
    #[must_use]
    pub fn set_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    /// Sets nullability.
    #[must_use]
    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Sets default value.
    #[must_use]
    pub fn set_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets unique constraint.
    #[must_use]
    pub fn set_unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Returns true if no changes are specified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql_type.is_none()
            && self.nullable.is_none()
            && self.default.is_none()
            && self.unique.is_none()
    }
}

/// A geometry column that must be registered through `AddGeometryColumn`
/// after its table exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionColumn {
    /// Owning table.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Spatial reference system identifier.
    pub srid: i64,
    /// Geometry type without dimension suffix, e.g. `POINT`.
    pub geometry_type: String,
    /// Coordinate dimension (`XYZ`, `XYM`, `XYZM`); `None` means `XY`.
    pub dimension: Option<String>,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ExtensionColumn {
    /// Derives the registration for `column` on `table`.
    ///
    /// The SRID defaults to 0. An explicit dimension annotation wins over a
    /// dimension suffix on the store type (`POINTZ`, `POLYGONZM`, ...).
    #[must_use]
    pub fn from_column(table: impl Into<String>, column: &ColumnSchema) -> Self {
        let store_type = column.sql_type.sqlite_name().trim().to_ascii_uppercase();
        let (geometry_type, implied_dimension) = split_dimension_suffix(&store_type);
        let dimension = column
            .annotations
            .get_str(annotations::DIMENSION)
            .map(str::to_string)
            .or_else(|| implied_dimension.map(str::to_string));

        Self {
            table: table.into(),
            column: column.name.clone(),
            srid: column.annotations.get_int(annotations::SRID).unwrap_or(0),
            geometry_type: geometry_type.to_string(),
            dimension,
            nullable: column.nullable,
        }
    }
}

/// A single migration operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationOperation {
    /// Create a new table.
    CreateTable {
        /// Table name.
        name: String,
        /// Column definitions.
        columns: Vec<ColumnSchema>,
        /// Table-level primary key.
        #[serde(default)]
        primary_key: Option<PrimaryKeySchema>,
        /// Foreign keys declared with the table.
        #[serde(default)]
        foreign_keys: Vec<ForeignKeySchema>,
        /// Unique constraints declared with the table.
        #[serde(default)]
        unique_constraints: Vec<UniqueConstraint>,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        name: String,
    },

    /// Rename a table.
    RenameTable {
        /// Old table name.
        old_name: String,
        /// New table name.
        new_name: String,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column definition.
        column: ColumnSchema,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column_name: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Old column name.
        old_name: String,
        /// New column name.
        new_name: String,
    },

    /// Alter a column's properties.
    AlterColumn {
        /// Table name.
        table: String,
        /// Column name.
        column_name: String,
        /// Changes to apply.
        changes: ColumnChanges,
    },

    /// Add a primary key constraint.
    AddPrimaryKey {
        /// Table name.
        table: String,
        /// Primary key definition.
        primary_key: PrimaryKeySchema,
    },

    /// Drop a primary key constraint.
    DropPrimaryKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// Add a foreign key constraint.
    AddForeignKey {
        /// Table name.
        table: String,
        /// Foreign key definition.
        foreign_key: ForeignKeySchema,
    },

    /// Drop a foreign key constraint.
    DropForeignKey {
        /// Table name.
        table: String,
        /// Constraint name.
        constraint_name: String,
    },

    /// Add a unique constraint.
    AddUniqueConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Columns that form the unique constraint.
        columns: Vec<String>,
    },

    /// Drop a unique constraint.
    DropUniqueConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// Create an index.
    CreateIndex {
        /// Index name.
        name: String,
        /// Table name.
        table: String,
        /// Columns to index.
        columns: Vec<String>,
        /// Whether this is a unique index.
        #[serde(default)]
        unique: bool,
        /// Partial index condition.
        #[serde(default)]
        condition: Option<String>,
    },

    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
        /// Table name, when known.
        #[serde(default)]
        table: Option<String>,
    },

    /// Rename an index.
    RenameIndex {
        /// Table the index belongs to.
        table: String,
        /// Current index name.
        old_name: String,
        /// New index name.
        new_name: String,
    },

    /// Run raw SQL.
    RunSql {
        /// SQL text.
        sql: String,
        /// Whether the statement must run outside any transaction.
        #[serde(default)]
        suppress_transaction: bool,
    },

    /// Create a sequence.
    CreateSequence {
        /// Sequence name.
        name: String,
        /// First value.
        start: i64,
        /// Step between values.
        increment: i64,
    },

    /// Alter a sequence.
    AlterSequence {
        /// Sequence name.
        name: String,
        /// New step between values.
        increment: i64,
    },

    /// Rename a sequence.
    RenameSequence {
        /// Sequence name.
        name: String,
        /// New sequence name.
        new_name: String,
    },

    /// Drop a sequence.
    DropSequence {
        /// Sequence name.
        name: String,
    },

    /// Restart a sequence.
    RestartSequence {
        /// Sequence name.
        name: String,
        /// Value to restart from.
        start: i64,
    },

    /// Ensure a schema namespace exists.
    EnsureSchema {
        /// Schema name.
        name: String,
    },

    /// Drop a schema namespace.
    DropSchema {
        /// Schema name.
        name: String,
    },

    /// Change database-wide settings.
    AlterDatabase {
        /// Annotations the database should have afterwards.
        annotations: Annotations,
        /// Annotations the database had before.
        #[serde(default)]
        old_annotations: Annotations,
    },

    /// Register a geometry column on an existing table.
    AddExtensionColumn(ExtensionColumn),
}

impl MigrationOperation {
    /// Creates a CreateTable operation with no constraints besides the
    /// primary key.
    #[must_use]
    pub fn create_table(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: Option<PrimaryKeySchema>,
    ) -> Self {
        Self::CreateTable {
            name: name.into(),
            columns,
            primary_key,
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Creates a DropTable operation.
    #[must_use]
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }

    /// Creates a RenameTable operation.
    #[must_use]
    pub fn rename_table(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::RenameTable {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates an AddColumn operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnSchema) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a DropColumn operation.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column_name: column_name.into(),
        }
    }

    /// Creates a RenameColumn operation.
    #[must_use]
    pub fn rename_column(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates an AlterColumn operation.
    #[must_use]
    pub fn alter_column(
        table: impl Into<String>,
        column_name: impl Into<String>,
        changes: ColumnChanges,
    ) -> Self {
        Self::AlterColumn {
            table: table.into(),
            column_name: column_name.into(),
            changes,
        }
    }

    /// Creates an AddPrimaryKey operation.
    #[must_use]
    pub fn add_primary_key(table: impl Into<String>, columns: Vec<String>) -> Self {
        let table = table.into();
        let primary_key = PrimaryKeySchema::for_table(&table, columns);
        Self::AddPrimaryKey { table, primary_key }
    }

    /// Creates a DropPrimaryKey operation.
    #[must_use]
    pub fn drop_primary_key(table: impl Into<String>) -> Self {
        let table = table.into();
        let name = format!("PK_{table}");
        Self::DropPrimaryKey { table, name }
    }

    /// Creates a CreateIndex operation.
    #[must_use]
    pub fn create_index(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
        unique: bool,
    ) -> Self {
        Self::CreateIndex {
            name: name.into(),
            table: table.into(),
            columns,
            unique,
            condition: None,
        }
    }

    /// Creates a DropIndex operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>) -> Self {
        Self::DropIndex {
            name: name.into(),
            table: None,
        }
    }

    /// Creates a RenameIndex operation.
    #[must_use]
    pub fn rename_index(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameIndex {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates an AddForeignKey operation.
    #[must_use]
    pub fn add_foreign_key(table: impl Into<String>, foreign_key: ForeignKeySchema) -> Self {
        Self::AddForeignKey {
            table: table.into(),
            foreign_key,
        }
    }

    /// Creates a DropForeignKey operation.
    #[must_use]
    pub fn drop_foreign_key(table: impl Into<String>, constraint_name: impl Into<String>) -> Self {
        Self::DropForeignKey {
            table: table.into(),
            constraint_name: constraint_name.into(),
        }
    }

    /// Creates an AddUniqueConstraint operation.
    #[must_use]
    pub fn add_unique_constraint(
        table: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self::AddUniqueConstraint {
            table: table.into(),
            name: name.into(),
            columns,
        }
    }

    /// Creates a DropUniqueConstraint operation.
    #[must_use]
    pub fn drop_unique_constraint(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DropUniqueConstraint {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Creates a RunSql operation that runs inside the migration transaction.
    #[must_use]
    pub fn run_sql(sql: impl Into<String>) -> Self {
        Self::RunSql {
            sql: sql.into(),
            suppress_transaction: false,
        }
    }

    /// Creates a RunSql operation that must run outside any transaction.
    #[must_use]
    pub fn run_sql_outside_transaction(sql: impl Into<String>) -> Self {
        Self::RunSql {
            sql: sql.into(),
            suppress_transaction: true,
        }
    }

    /// Returns the operation kind, as used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "CreateTable",
            Self::DropTable { .. } => "DropTable",
            Self::RenameTable { .. } => "RenameTable",
            Self::AddColumn { .. } => "AddColumn",
            Self::DropColumn { .. } => "DropColumn",
            Self::RenameColumn { .. } => "RenameColumn",
            Self::AlterColumn { .. } => "AlterColumn",
            Self::AddPrimaryKey { .. } => "AddPrimaryKey",
            Self::DropPrimaryKey { .. } => "DropPrimaryKey",
            Self::AddForeignKey { .. } => "AddForeignKey",
            Self::DropForeignKey { .. } => "DropForeignKey",
            Self::AddUniqueConstraint { .. } => "AddUniqueConstraint",
            Self::DropUniqueConstraint { .. } => "DropUniqueConstraint",
            Self::CreateIndex { .. } => "CreateIndex",
            Self::DropIndex { .. } => "DropIndex",
            Self::RenameIndex { .. } => "RenameIndex",
            Self::RunSql { .. } => "RunSql",
            Self::CreateSequence { .. } => "CreateSequence",
            Self::AlterSequence { .. } => "AlterSequence",
            Self::RenameSequence { .. } => "RenameSequence",
            Self::DropSequence { .. } => "DropSequence",
            Self::RestartSequence { .. } => "RestartSequence",
            Self::EnsureSchema { .. } => "EnsureSchema",
            Self::DropSchema { .. } => "DropSchema",
            Self::AlterDatabase { .. } => "AlterDatabase",
            Self::AddExtensionColumn(_) => "AddExtensionColumn",
        }
    }

    /// Returns the table this operation targets, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::CreateTable { name, .. } | Self::DropTable { name } => Some(name),
            Self::RenameTable { old_name, .. } => Some(old_name),
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::AddPrimaryKey { table, .. }
            | Self::DropPrimaryKey { table, .. }
            | Self::AddForeignKey { table, .. }
            | Self::DropForeignKey { table, .. }
            | Self::AddUniqueConstraint { table, .. }
            | Self::DropUniqueConstraint { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::RenameIndex { table, .. } => Some(table),
            Self::DropIndex { table, .. } => table.as_deref(),
            Self::AddExtensionColumn(column) => Some(&column.table),
            Self::RunSql { .. }
            | Self::CreateSequence { .. }
            | Self::AlterSequence { .. }
            | Self::RenameSequence { .. }
            | Self::DropSequence { .. }
            | Self::RestartSequence { .. }
            | Self::EnsureSchema { .. }
            | Self::DropSchema { .. }
            | Self::AlterDatabase { .. } => None,
        }
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { name, .. } => format!("Create table '{name}'"),
            Self::DropTable { name } => format!("Drop table '{name}'"),
            Self::RenameTable { old_name, new_name } => {
                format!("Rename table '{old_name}' to '{new_name}'")
            }
            Self::AddColumn { table, column } => {
                format!("Add column '{}' to table '{table}'", column.name)
            }
            Self::DropColumn { table, column_name } => {
                format!("Drop column '{column_name}' from table '{table}'")
            }
            Self::RenameColumn {
                table,
                old_name,
                new_name,
            } => format!("Rename column '{old_name}' to '{new_name}' in table '{table}'"),
            Self::AlterColumn {
                table, column_name, ..
            } => format!("Alter column '{column_name}' in table '{table}'"),
            Self::AddPrimaryKey { table, primary_key } => {
                format!("Add primary key '{}' to table '{table}'", primary_key.name)
            }
            Self::DropPrimaryKey { table, name } => {
                format!("Drop primary key '{name}' from table '{table}'")
            }
            Self::AddForeignKey { table, foreign_key } => {
                format!("Add foreign key '{}' to table '{table}'", foreign_key.name)
            }
            Self::DropForeignKey {
                table,
                constraint_name,
            } => format!("Drop foreign key '{constraint_name}' from table '{table}'"),
            Self::AddUniqueConstraint { table, name, .. } => {
                format!("Add unique constraint '{name}' to table '{table}'")
            }
            Self::DropUniqueConstraint { table, name } => {
                format!("Drop unique constraint '{name}' from table '{table}'")
            }
            Self::CreateIndex { name, table, .. } => {
                format!("Create index '{name}' on table '{table}'")
            }
            Self::DropIndex { name, .. } => format!("Drop index '{name}'"),
            Self::RenameIndex {
                table,
                old_name,
                new_name,
            } => format!("Rename index '{old_name}' to '{new_name}' on table '{table}'"),
            Self::RunSql { .. } => "Run custom SQL".to_string(),
            Self::CreateSequence { name, .. } => format!("Create sequence '{name}'"),
            Self::AlterSequence { name, .. } => format!("Alter sequence '{name}'"),
            Self::RenameSequence { name, new_name } => {
                format!("Rename sequence '{name}' to '{new_name}'")
            }
            Self::DropSequence { name } => format!("Drop sequence '{name}'"),
            Self::RestartSequence { name, .. } => format!("Restart sequence '{name}'"),
            Self::EnsureSchema { name } => format!("Ensure schema '{name}'"),
            Self::DropSchema { name } => format!("Drop schema '{name}'"),
            Self::AlterDatabase { .. } => "Alter database".to_string(),
            Self::AddExtensionColumn(column) => format!(
                "Register geometry column '{}' on table '{}'",
                column.column, column.table
            ),
        }
    }
}

/// Helper to create a foreign key schema.
#[must_use]
pub fn foreign_key(
    name: impl Into<String>,
    columns: Vec<String>,
    references_table: impl Into<String>,
    references_columns: Vec<String>,
) -> ForeignKeySchema {
    ForeignKeySchema {
        name: name.into(),
        columns,
        references_table: references_table.into(),
        references_columns,
        on_delete: ForeignKeyAction::NoAction,
        on_update: ForeignKeyAction::NoAction,
    }
}

/// Builder for foreign key schema.
pub struct ForeignKeyBuilder {
    schema: ForeignKeySchema,
}

impl ForeignKeyBuilder {
    /// Creates a new foreign key builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: foreign_key(name, Vec::new(), String::new(), Vec::new()),
        }
    }

    /// Sets the local columns.
    #[must_use]
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.schema.columns = columns;
        self
    }

    /// Sets the referenced table and columns.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, columns: Vec<String>) -> Self {
        self.schema.references_table = table.into();
        self.schema.references_columns = columns;
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.schema.on_delete = action;
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.schema.on_update = action;
        self
    }

    /// Builds the foreign key schema.
    #[must_use]
    pub fn build(self) -> ForeignKeySchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AnnotationValue;

    #[test]
    fn test_extension_column_from_suffixed_type() {
        let column = ColumnSchema::new("location", SqlType::Custom("pointz".to_string()))
            .not_null()
            .annotation(annotations::SRID, AnnotationValue::Integer(4326));

        let ext = ExtensionColumn::from_column("places", &column);
        assert_eq!(ext.table, "places");
        assert_eq!(ext.column, "location");
        assert_eq!(ext.srid, 4326);
        assert_eq!(ext.geometry_type, "POINT");
        assert_eq!(ext.dimension.as_deref(), Some("XYZ"));
        assert!(!ext.nullable);
    }

    #[test]
    fn test_extension_column_defaults() {
        let column = ColumnSchema::new("area", SqlType::Custom("POLYGON".to_string()))
            .annotation(annotations::DIMENSION, AnnotationValue::String("XYM".into()));

        let ext = ExtensionColumn::from_column("zones", &column);
        assert_eq!(ext.srid, 0);
        assert_eq!(ext.geometry_type, "POLYGON");
        assert_eq!(ext.dimension.as_deref(), Some("XYM"));
        assert!(ext.nullable);
    }

    #[test]
    fn test_kind_and_table() {
        let op = MigrationOperation::drop_column("users", "email");
        assert_eq!(op.kind(), "DropColumn");
        assert_eq!(op.table(), Some("users"));

        let op = MigrationOperation::EnsureSchema {
            name: "audit".to_string(),
        };
        assert_eq!(op.kind(), "EnsureSchema");
        assert_eq!(op.table(), None);

        assert_eq!(MigrationOperation::drop_index("IX_users_email").table(), None);
    }

    #[test]
    fn test_primary_key_helpers() {
        match MigrationOperation::add_primary_key("orders", vec!["id".to_string()]) {
            MigrationOperation::AddPrimaryKey { table, primary_key } => {
                assert_eq!(table, "orders");
                assert_eq!(primary_key.name, "PK_orders");
                assert_eq!(primary_key.columns, vec!["id"]);
            }
            other => panic!("Expected AddPrimaryKey, got {other:?}"),
        }

        match MigrationOperation::drop_primary_key("orders") {
            MigrationOperation::DropPrimaryKey { name, .. } => assert_eq!(name, "PK_orders"),
            other => panic!("Expected DropPrimaryKey, got {other:?}"),
        }
    }

    #[test]
    fn test_run_sql_transaction_flag() {
        let inside = MigrationOperation::run_sql("DELETE FROM sessions");
        let outside = MigrationOperation::run_sql_outside_transaction("VACUUM");

        assert!(matches!(
            inside,
            MigrationOperation::RunSql {
                suppress_transaction: false,
                ..
            }
        ));
        assert!(matches!(
            outside,
            MigrationOperation::RunSql {
                suppress_transaction: true,
                ..
            }
        ));
    }

    #[test]
    fn test_description() {
        let op = MigrationOperation::rename_column("users", "name", "full_name");
        assert_eq!(
            op.description(),
            "Rename column 'name' to 'full_name' in table 'users'"
        );
    }

    #[test]
    fn test_column_changes() {
        let changes = ColumnChanges::new()
            .set_type(SqlType::Text)
            .set_nullable(false);

        assert!(!changes.is_empty());
        assert_eq!(changes.sql_type, Some(SqlType::Text));
        assert_eq!(changes.nullable, Some(false));
        assert!(ColumnChanges::new().is_empty());
    }

    #[test]
    fn test_foreign_key_builder() {
        let fk = ForeignKeyBuilder::new("FK_users_organizations_organization_id")
            .columns(vec!["organization_id".to_string()])
            .references("organizations", vec!["id".to_string()])
            .on_delete(ForeignKeyAction::Cascade)
            .build();

        assert_eq!(fk.columns, vec!["organization_id"]);
        assert_eq!(fk.references_table, "organizations");
        assert_eq!(fk.on_delete, ForeignKeyAction::Cascade);
        assert_eq!(fk.on_update, ForeignKeyAction::NoAction);
    }

    #[test]
    fn test_operation_json_shape() {
        let json = r#"{"RenameColumn":{"table":"users","old_name":"a","new_name":"b"}}"#;
        let op: MigrationOperation = serde_json::from_str(json).unwrap();
        assert_eq!(op, MigrationOperation::rename_column("users", "a", "b"));
    }
}
