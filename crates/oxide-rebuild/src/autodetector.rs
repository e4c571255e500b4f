//! Autodetector for computing migration operations between two models.
//!
//! The rebuild planner only needs one thing from a differ: "what would create
//! this model from nothing". That seam is the [`ModelDiffer`] trait, so the
//! planner can be driven by any deterministic differ. [`Autodetector`] is the
//! implementation shipped with the crate.
//!
//! Output order is fully determined by the order of tables, columns and
//! constraints in the two models, so the same pair of models always yields
//! the same operations.

use std::collections::{HashMap, HashSet};

use crate::operations::{ColumnChanges, MigrationOperation};
use crate::schema::{
    ColumnSchema, DatabaseSchema, ForeignKeySchema, IndexSchema, TableSchema, UniqueConstraint,
};

/// Computes the operations that turn one model into another.
///
/// Implementations must be deterministic and free of side effects.
pub trait ModelDiffer {
    /// Returns the operations needed to transform `from` into `to`.
    fn diff(&self, from: &DatabaseSchema, to: &DatabaseSchema) -> Vec<MigrationOperation>;
}

/// Options for the autodetector.
#[derive(Debug, Clone)]
pub struct AutodetectorOptions {
    /// Whether to detect renamed tables (heuristic).
    pub detect_renames: bool,
    /// Similarity threshold for rename detection (0.0 to 1.0).
    pub rename_threshold: f64,
}

impl Default for AutodetectorOptions {
    fn default() -> Self {
        Self {
            detect_renames: false,
            rename_threshold: 0.7,
        }
    }
}

impl AutodetectorOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables rename detection.
    #[must_use]
    pub fn with_rename_detection(mut self) -> Self {
        self.detect_renames = true;
        self
    }
}

/// Detects schema changes and generates migration operations.
#[derive(Debug, Clone, Default)]
pub struct Autodetector {
    options: AutodetectorOptions,
}

impl ModelDiffer for Autodetector {
    fn diff(&self, from: &DatabaseSchema, to: &DatabaseSchema) -> Vec<MigrationOperation> {
        Self::diff(self, from, to)
    }
}

impl Autodetector {
    /// Creates a new autodetector with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new autodetector with custom options.
    #[must_use]
    pub fn with_options(options: AutodetectorOptions) -> Self {
        Self { options }
    }

    /// Compares two schemas and returns the operations needed to transform
    /// `from` into `to`.
    #[must_use]
    pub fn diff(&self, from: &DatabaseSchema, to: &DatabaseSchema) -> Vec<MigrationOperation> {
        let mut operations = Vec::new();

        let from_names: HashSet<&str> = from.table_names().collect();
        let to_names: HashSet<&str> = to.table_names().collect();

        let new_tables: Vec<&TableSchema> = to
            .tables
            .iter()
            .filter(|t| !from_names.contains(t.name.as_str()))
            .collect();
        let dropped_tables: Vec<&TableSchema> = from
            .tables
            .iter()
            .filter(|t| !to_names.contains(t.name.as_str()))
            .collect();

        // old name -> new table
        let mut renamed: Vec<(&TableSchema, &TableSchema)> = Vec::new();
        if self.options.detect_renames {
            for &dropped in &dropped_tables {
                let candidate = new_tables.iter().find(|new| {
                    !renamed.iter().any(|(_, r)| r.name == new.name)
                        && self.tables_similar(dropped, new)
                });
                if let Some(&new) = candidate {
                    renamed.push((dropped, new));
                }
            }
        }

        for (old, new) in &renamed {
            operations.push(MigrationOperation::rename_table(&old.name, &new.name));
        }

        for &table in &new_tables {
            if renamed.iter().any(|(_, r)| r.name == table.name) {
                continue;
            }
            operations.extend(Self::create_from_empty(table));
        }

        for &table in &dropped_tables {
            if renamed.iter().any(|(old, _)| old.name == table.name) {
                continue;
            }
            operations.push(MigrationOperation::drop_table(&table.name));
        }

        for to_table in &to.tables {
            if let Some(from_table) = from.get_table(&to_table.name) {
                operations.extend(self.diff_table(from_table, to_table));
            }
        }

        for (old, new) in &renamed {
            let from_renamed = TableSchema {
                name: new.name.clone(),
                ..(*old).clone()
            };
            operations.extend(self.diff_table(&from_renamed, new));
        }

        operations
    }

    /// Returns the operations that create `table` from nothing: one
    /// `CreateTable` carrying every constraint, then one `CreateIndex` per
    /// index.
    fn create_from_empty(table: &TableSchema) -> Vec<MigrationOperation> {
        let mut operations = vec![MigrationOperation::CreateTable {
            name: table.name.clone(),
            columns: table.columns.clone(),
            primary_key: table.primary_key.clone(),
            foreign_keys: table.foreign_keys.clone(),
            unique_constraints: table.unique_constraints.clone(),
        }];

        for idx in &table.indexes {
            operations.push(Self::create_index(&table.name, idx));
        }

        operations
    }

    fn create_index(table: &str, idx: &IndexSchema) -> MigrationOperation {
        MigrationOperation::CreateIndex {
            name: idx.name.clone(),
            table: table.to_string(),
            columns: idx.columns.clone(),
            unique: idx.unique,
            condition: idx.condition.clone(),
        }
    }

    /// Compares two tables and returns the operations needed.
    fn diff_table(&self, from: &TableSchema, to: &TableSchema) -> Vec<MigrationOperation> {
        let mut operations = Vec::new();
        let table_name = &to.name;

        let from_cols: HashMap<&str, &ColumnSchema> =
            from.columns.iter().map(|c| (c.name.as_str(), c)).collect();
        let to_cols: HashMap<&str, &ColumnSchema> =
            to.columns.iter().map(|c| (c.name.as_str(), c)).collect();

        for col in &to.columns {
            if !from_cols.contains_key(col.name.as_str()) {
                operations.push(MigrationOperation::add_column(table_name, col.clone()));
            }
        }

        for col in &from.columns {
            if !to_cols.contains_key(col.name.as_str()) {
                operations.push(MigrationOperation::drop_column(table_name, &col.name));
            }
        }

        for to_col in &to.columns {
            let Some(from_col) = from_cols.get(to_col.name.as_str()) else {
                continue;
            };
            if let Some(changes) = self.diff_column(from_col, to_col) {
                operations.push(MigrationOperation::alter_column(
                    table_name,
                    &to_col.name,
                    changes,
                ));
            }
        }

        if from.primary_key != to.primary_key {
            if let Some(pk) = &from.primary_key {
                operations.push(MigrationOperation::DropPrimaryKey {
                    table: table_name.clone(),
                    name: pk.name.clone(),
                });
            }
            if let Some(pk) = &to.primary_key {
                operations.push(MigrationOperation::AddPrimaryKey {
                    table: table_name.clone(),
                    primary_key: pk.clone(),
                });
            }
        }

        operations.extend(self.diff_indexes(table_name, &from.indexes, &to.indexes));
        operations.extend(self.diff_foreign_keys(table_name, &from.foreign_keys, &to.foreign_keys));
        operations.extend(self.diff_unique_constraints(
            table_name,
            &from.unique_constraints,
            &to.unique_constraints,
        ));

        operations
    }

    /// Compares two columns and returns changes if any.
    fn diff_column(&self, from: &ColumnSchema, to: &ColumnSchema) -> Option<ColumnChanges> {
        let mut changes = ColumnChanges::new();

        if from.sql_type != to.sql_type {
            changes.sql_type = Some(to.sql_type.clone());
        }

        if from.nullable != to.nullable {
            changes.nullable = Some(to.nullable);
        }

        if from.default != to.default {
            changes.default = Some(to.default.clone());
        }

        if from.unique != to.unique {
            changes.unique = Some(to.unique);
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }

    /// Compares indexes and returns operations.
    fn diff_indexes(
        &self,
        table: &str,
        from: &[IndexSchema],
        to: &[IndexSchema],
    ) -> Vec<MigrationOperation> {
        let mut operations = Vec::new();

        let from_map: HashMap<&str, &IndexSchema> =
            from.iter().map(|i| (i.name.as_str(), i)).collect();
        let to_map: HashMap<&str, &IndexSchema> = to.iter().map(|i| (i.name.as_str(), i)).collect();

        for idx in to {
            if !from_map.contains_key(idx.name.as_str()) {
                operations.push(Self::create_index(table, idx));
            }
        }

        for idx in from {
            if !to_map.contains_key(idx.name.as_str()) {
                operations.push(MigrationOperation::DropIndex {
                    name: idx.name.clone(),
                    table: Some(table.to_string()),
                });
            }
        }

        // Modified indexes (drop + recreate)
        for to_idx in to {
            let Some(from_idx) = from_map.get(to_idx.name.as_str()) else {
                continue;
            };
            if *from_idx != to_idx {
                operations.push(MigrationOperation::DropIndex {
                    name: to_idx.name.clone(),
                    table: Some(table.to_string()),
                });
                operations.push(Self::create_index(table, to_idx));
            }
        }

        operations
    }

    /// Compares foreign keys and returns operations.
    fn diff_foreign_keys(
        &self,
        table: &str,
        from: &[ForeignKeySchema],
        to: &[ForeignKeySchema],
    ) -> Vec<MigrationOperation> {
        let mut operations = Vec::new();

        let from_map: HashMap<&str, &ForeignKeySchema> =
            from.iter().map(|fk| (fk.name.as_str(), fk)).collect();
        let to_names: HashSet<&str> = to.iter().map(|fk| fk.name.as_str()).collect();

        for fk in to {
            if !from_map.contains_key(fk.name.as_str()) {
                operations.push(MigrationOperation::add_foreign_key(table, fk.clone()));
            }
        }

        for fk in from {
            if !to_names.contains(fk.name.as_str()) {
                operations.push(MigrationOperation::drop_foreign_key(table, &fk.name));
            }
        }

        for to_fk in to {
            let Some(from_fk) = from_map.get(to_fk.name.as_str()) else {
                continue;
            };
            if *from_fk != to_fk {
                operations.push(MigrationOperation::drop_foreign_key(table, &to_fk.name));
                operations.push(MigrationOperation::add_foreign_key(table, to_fk.clone()));
            }
        }

        operations
    }

    /// Compares unique constraints and returns operations.
    fn diff_unique_constraints(
        &self,
        table: &str,
        from: &[UniqueConstraint],
        to: &[UniqueConstraint],
    ) -> Vec<MigrationOperation> {
        let mut operations = Vec::new();

        let from_map: HashMap<&str, &UniqueConstraint> =
            from.iter().map(|uc| (uc.name.as_str(), uc)).collect();
        let to_names: HashSet<&str> = to.iter().map(|uc| uc.name.as_str()).collect();

        for uc in to {
            if !from_map.contains_key(uc.name.as_str()) {
                operations.push(MigrationOperation::add_unique_constraint(
                    table,
                    &uc.name,
                    uc.columns.clone(),
                ));
            }
        }

        for uc in from {
            if !to_names.contains(uc.name.as_str()) {
                operations.push(MigrationOperation::drop_unique_constraint(table, &uc.name));
            }
        }

        for to_uc in to {
            let Some(from_uc) = from_map.get(to_uc.name.as_str()) else {
                continue;
            };
            if *from_uc != to_uc {
                operations.push(MigrationOperation::drop_unique_constraint(table, &to_uc.name));
                operations.push(MigrationOperation::add_unique_constraint(
                    table,
                    &to_uc.name,
                    to_uc.columns.clone(),
                ));
            }
        }

        operations
    }

    /// Checks if two tables are similar (for rename detection).
    fn tables_similar(&self, a: &TableSchema, b: &TableSchema) -> bool {
        let a_cols: HashSet<&str> = a.columns.iter().map(|c| c.name.as_str()).collect();
        let b_cols: HashSet<&str> = b.columns.iter().map(|c| c.name.as_str()).collect();

        let common = a_cols.intersection(&b_cols).count();
        let total = a_cols.union(&b_cols).count();

        if total == 0 {
            return false;
        }

        #[allow(clippy::cast_precision_loss)]
        let similarity = common as f64 / total as f64;
        similarity >= self.options.rename_threshold
    }
}
