//! Schema representation types.
//!
//! These types describe the target model a migration is heading towards. The
//! rewriter never inspects the live database; every rebuilt table takes its
//! final shape from a [`DatabaseSchema`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known annotation keys read by the rewriter and the SQLite dialect.
pub mod annotations {
    /// Marks a single-column integer primary key as `AUTOINCREMENT`.
    pub const AUTOINCREMENT: &str = "Sqlite:Autoincrement";
    /// Forces a column to be (or not be) treated as an extension type.
    pub const EXTENSION_TYPE: &str = "Sqlite:ExtensionType";
    /// Spatial reference system identifier of a geometry column.
    pub const SRID: &str = "Sqlite:Srid";
    /// Dimension of a geometry column (`XY`, `XYZ`, `XYM`, `XYZM`).
    pub const DIMENSION: &str = "Sqlite:Dimension";
    /// Set on a database when spatial metadata tables must exist.
    pub const INIT_SPATIAL_METADATA: &str = "Sqlite:InitSpatialMetaData";
}

/// Store types that SQLite can only create through `AddGeometryColumn`.
const SPATIAL_TYPES: &[&str] = &[
    "GEOMETRY",
    "GEOMETRYCOLLECTION",
    "LINESTRING",
    "MULTILINESTRING",
    "MULTIPOINT",
    "MULTIPOLYGON",
    "POINT",
    "POLYGON",
];

/// SQL data types supported by the migration system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Small integer (16-bit).
    SmallInt,
    /// Unbounded text.
    Text,
    /// Variable-length character string.
    Varchar(usize),
    /// Fixed-length character string.
    Char(usize),
    /// Boolean.
    Boolean,
    /// Date and time.
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Timestamp (alias for DateTime in most databases).
    Timestamp,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Binary large object.
    Blob,
    /// JSON data.
    Json,
    /// UUID.
    Uuid,
    /// Store type passed through verbatim, e.g. `POINT` or `GEOMETRYZ`.
    Custom(String),
}

impl SqlType {
    /// Returns the SQL type name for SQLite.
    #[must_use]
    pub fn sqlite_name(&self) -> String {
        match self {
            Self::Integer | Self::SmallInt | Self::BigInt | Self::Boolean => "INTEGER".to_string(),
            Self::Text
            | Self::Varchar(_)
            | Self::Char(_)
            | Self::Json
            | Self::Uuid
            | Self::DateTime
            | Self::Date
            | Self::Time
            | Self::Timestamp => "TEXT".to_string(),
            Self::Real | Self::Double => "REAL".to_string(),
            Self::Decimal(_, _) => "NUMERIC".to_string(),
            Self::Blob => "BLOB".to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Returns true for SpatiaLite geometry store types, with or without a
    /// `Z`, `M` or `ZM` dimension suffix.
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        let Self::Custom(name) = self else {
            return false;
        };
        let upper = name.trim().to_ascii_uppercase();
        let (base, _) = split_dimension_suffix(&upper);
        SPATIAL_TYPES.contains(&base)
    }
}

/// Splits a geometry store type into its base type and the dimension implied
/// by its suffix.
///
/// `POINTZM` yields `("POINT", Some("XYZM"))`, `POLYGON` yields
/// `("POLYGON", None)`.
#[must_use]
pub fn split_dimension_suffix(store_type: &str) -> (&str, Option<&'static str>) {
    for (suffix, dimension) in [("ZM", "XYZM"), ("Z", "XYZ"), ("M", "XYM")] {
        if let Some(base) = store_type.strip_suffix(suffix) {
            if SPATIAL_TYPES.contains(&base) {
                return (base, Some(dimension));
            }
        }
    }
    (store_type, None)
}

/// A single annotation value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// String value.
    String(String),
}

/// Opaque engine-specific key/value metadata attached to model elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, AnnotationValue>);

impl Annotations {
    /// Creates an empty annotation set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an annotation, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.0.get(key)
    }

    /// Returns the value for `key` if it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(AnnotationValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value for `key` if it is an integer.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(AnnotationValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value for `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AnnotationValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns true when `key` is set to boolean `true`.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get_bool(key) == Some(true)
    }

    /// Returns true if no annotations are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(format!("({expr})")),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// SQL data type.
    pub sql_type: SqlType,
    /// Whether the column allows NULL values.
    #[serde(default = "nullable_by_default")]
    pub nullable: bool,
    /// Default value.
    #[serde(default)]
    pub default: DefaultValue,
    /// Whether the column carries an inline `PRIMARY KEY` clause.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column auto-increments.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether this column has a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Check constraint expression (if any).
    #[serde(default)]
    pub check: Option<String>,
    /// Engine-specific metadata.
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

const fn nullable_by_default() -> bool {
    true
}

impl ColumnSchema {
    /// Creates a new column schema.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            default: DefaultValue::None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            check: None,
            annotations: Annotations::new(),
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets a check constraint.
    #[must_use]
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    /// Attaches an annotation.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.annotations = self.annotations.with(key, value);
        self
    }

    /// Returns true if the column needs extension registration instead of a
    /// plain column definition.
    ///
    /// An explicit [`annotations::EXTENSION_TYPE`] flag wins over the
    /// store type.
    #[must_use]
    pub fn is_extension_type(&self) -> bool {
        self.annotations
            .get_bool(annotations::EXTENSION_TYPE)
            .unwrap_or_else(|| self.sql_type.is_spatial())
    }
}

/// Schema definition for a primary key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKeySchema {
    /// Constraint name.
    pub name: String,
    /// Key columns, in order.
    pub columns: Vec<String>,
}

impl PrimaryKeySchema {
    /// Creates a primary key named `PK_<table>`.
    #[must_use]
    pub fn for_table(table: &str, columns: Vec<String>) -> Self {
        Self {
            name: format!("PK_{table}"),
            columns,
        }
    }
}

/// Schema definition for a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeySchema {
    /// Constraint name.
    pub name: String,
    /// Column(s) in the referencing table.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub references_table: String,
    /// Referenced column(s).
    pub references_columns: Vec<String>,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
    /// Action on update.
    #[serde(default)]
    pub on_update: ForeignKeyAction,
}

/// Schema definition for an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name.
    pub name: String,
    /// Columns included in the index.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    #[serde(default)]
    pub unique: bool,
    /// Partial index condition (WHERE clause).
    #[serde(default)]
    pub condition: Option<String>,
}

/// Schema definition for a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    /// Constraint name.
    pub name: String,
    /// Columns that form the unique constraint.
    pub columns: Vec<String>,
}

/// Complete schema definition for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column definitions.
    pub columns: Vec<ColumnSchema>,
    /// Table-level primary key.
    #[serde(default)]
    pub primary_key: Option<PrimaryKeySchema>,
    /// Index definitions.
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
    /// Foreign key definitions.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySchema>,
    /// Unique constraint definitions.
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl TableSchema {
    /// Creates a new table schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Adds a column to the table.
    ///
    /// A column built with [`ColumnSchema::primary_key`] is appended to the
    /// table's primary key; the inline marker itself is left to the dialect.
    #[must_use]
    pub fn column(mut self, mut column: ColumnSchema) -> Self {
        if column.primary_key {
            column.primary_key = false;
            let pk = self
                .primary_key
                .get_or_insert_with(|| PrimaryKeySchema::for_table(&self.name, Vec::new()));
            if !pk.columns.contains(&column.name) {
                pk.columns.push(column.name.clone());
            }
        }
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = Some(PrimaryKeySchema::for_table(&self.name, columns));
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexSchema) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds an index named `IX_<table>_<columns>`.
    #[must_use]
    pub fn index_on(self, columns: &[&str], unique: bool) -> Self {
        let name = format!("IX_{}_{}", self.name, columns.join("_"));
        self.index(IndexSchema {
            name,
            columns: columns.iter().map(ToString::to_string).collect(),
            unique,
            condition: None,
        })
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeySchema) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a unique constraint.
    #[must_use]
    pub fn unique_constraint(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// The complete database schema (all tables).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// All tables in the database.
    pub tables: Vec<TableSchema>,
    /// Database-wide annotations.
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl DatabaseSchema {
    /// Creates a new empty database schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the schema.
    #[must_use]
    pub fn table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Attaches a database-wide annotation.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.annotations = self.annotations.with(key, value);
        self
    }

    /// Gets a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}
