//! Per-call record of tables that need a rebuild.

use indexmap::IndexMap;

/// A column rename waiting for its table's rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRename {
    /// Name the column has before the rename.
    pub old_name: String,
    /// Name the column has after the rename.
    pub new_name: String,
}

/// An index rename waiting for its table's rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRename {
    /// Current index name.
    pub old_name: String,
    /// Index name in the target model.
    pub new_name: String,
}

/// Pending work for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRebuild {
    /// Column renames, in batch order.
    pub column_renames: Vec<ColumnRename>,
    /// Index renames, in batch order.
    pub index_renames: Vec<IndexRename>,
}

impl TableRebuild {
    /// Returns the name `column` had in the live table before any of the
    /// pending renames.
    ///
    /// Renames are walked backwards so that `a -> b -> c` resolves `c` to `a`.
    #[must_use]
    pub fn source_column<'a>(&'a self, column: &'a str) -> &'a str {
        self.column_renames
            .iter()
            .rev()
            .fold(column, |current, rename| {
                if rename.new_name == current {
                    rename.old_name.as_str()
                } else {
                    current
                }
            })
    }
}

/// Tables queued for rebuild, in the order they were first seen.
///
/// The ledger lives for a single rewrite call and is consumed by the planner.
#[derive(Debug, Default)]
pub struct RebuildLedger {
    tables: IndexMap<String, TableRebuild>,
}

impl RebuildLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `table` for rebuild. Registering a table twice is a no-op.
    pub fn register(&mut self, table: &str) -> &mut TableRebuild {
        self.tables.entry(table.to_string()).or_default()
    }

    /// Queues `table` and records a column rename on it.
    pub fn rename_column(&mut self, table: &str, old_name: &str, new_name: &str) {
        self.register(table).column_renames.push(ColumnRename {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        });
    }

    /// Queues `table` and records an index rename on it.
    pub fn rename_index(&mut self, table: &str, old_name: &str, new_name: &str) {
        self.register(table).index_renames.push(IndexRename {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        });
    }

    /// Returns true if `table` is queued.
    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Returns the number of queued tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Consumes the ledger, yielding tables in registration order.
    pub fn drain(self) -> impl Iterator<Item = (String, TableRebuild)> {
        self.tables.into_iter()
    }
}
