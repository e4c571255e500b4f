//! Decides, operation by operation, what SQLite can run as-is.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::operations::{ExtensionColumn, MigrationOperation};
use crate::schema::{
    annotations, ColumnSchema, ForeignKeySchema, PrimaryKeySchema, UniqueConstraint,
};

use super::ledger::RebuildLedger;

/// Walks the batch once, folding foreign keys into sibling `CreateTable`s,
/// queueing rebuilds in `ledger`, and passing everything else through in
/// order.
///
/// Never fails. Operations SQLite cannot express and that are not covered
/// by a rebuild are left for the emitter to reject.
pub(crate) fn classify(
    operations: &[MigrationOperation],
    ledger: &mut RebuildLedger,
) -> Vec<MigrationOperation> {
    let created: HashSet<&str> = operations
        .iter()
        .filter_map(|op| match op {
            MigrationOperation::CreateTable { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();

    let mut folded: HashMap<&str, Vec<ForeignKeySchema>> = HashMap::new();
    for op in operations {
        if let MigrationOperation::AddForeignKey { table, foreign_key } = op {
            if created.contains(table.as_str()) {
                folded
                    .entry(table.as_str())
                    .or_default()
                    .push(foreign_key.clone());
            }
        }
    }

    let mut rewritten = Vec::with_capacity(operations.len());

    for op in operations {
        match op {
            MigrationOperation::CreateTable {
                name,
                columns,
                primary_key,
                foreign_keys,
                unique_constraints,
            } => {
                let mut foreign_keys = foreign_keys.clone();
                if let Some(extra) = folded.get(name.as_str()) {
                    debug!(table = %name, count = extra.len(), "Folding foreign keys into CreateTable");
                    foreign_keys.extend(extra.iter().cloned());
                }
                rewritten.extend(shape_create_table(
                    name,
                    columns.clone(),
                    primary_key.clone(),
                    foreign_keys,
                    unique_constraints.clone(),
                ));
            }

            MigrationOperation::AddColumn { table, column } => {
                if column.is_extension_type() {
                    debug!(table = %table, column = %column.name, "Deferring extension column");
                    rewritten.push(MigrationOperation::AddExtensionColumn(
                        ExtensionColumn::from_column(table.clone(), column),
                    ));
                } else {
                    rewritten.push(op.clone());
                }
            }

            MigrationOperation::AddForeignKey { table, .. } => {
                if !created.contains(table.as_str()) {
                    queue(ledger, table, op);
                }
            }

            MigrationOperation::AddPrimaryKey { table, .. }
            | MigrationOperation::AddUniqueConstraint { table, .. }
            | MigrationOperation::DropColumn { table, .. }
            | MigrationOperation::DropForeignKey { table, .. }
            | MigrationOperation::DropPrimaryKey { table, .. }
            | MigrationOperation::DropUniqueConstraint { table, .. }
            | MigrationOperation::AlterColumn { table, .. } => {
                queue(ledger, table, op);
            }

            MigrationOperation::RenameIndex {
                table,
                old_name,
                new_name,
            } => {
                queue(ledger, table, op);
                ledger.rename_index(table, old_name, new_name);
            }

            MigrationOperation::RenameColumn {
                table,
                old_name,
                new_name,
            } => {
                queue(ledger, table, op);
                ledger.rename_column(table, old_name, new_name);
            }

            MigrationOperation::DropTable { .. }
            | MigrationOperation::RenameTable { .. }
            | MigrationOperation::CreateIndex { .. }
            | MigrationOperation::DropIndex { .. }
            | MigrationOperation::RunSql { .. }
            | MigrationOperation::CreateSequence { .. }
            | MigrationOperation::AlterSequence { .. }
            | MigrationOperation::RenameSequence { .. }
            | MigrationOperation::DropSequence { .. }
            | MigrationOperation::RestartSequence { .. }
            | MigrationOperation::EnsureSchema { .. }
            | MigrationOperation::DropSchema { .. }
            | MigrationOperation::AlterDatabase { .. }
            | MigrationOperation::AddExtensionColumn(_) => {
                rewritten.push(op.clone());
            }
        }
    }

    rewritten
}

fn queue(ledger: &mut RebuildLedger, table: &str, op: &MigrationOperation) {
    debug!(table = %table, kind = op.kind(), "Queueing table rebuild");
    ledger.register(table);
}

/// Builds the operations that create `name` on SQLite: one `CreateTable`
/// without extension columns, followed by one `AddExtensionColumn` per
/// extension column in declaration order.
pub(crate) fn shape_create_table(
    name: &str,
    columns: Vec<ColumnSchema>,
    mut primary_key: Option<PrimaryKeySchema>,
    foreign_keys: Vec<ForeignKeySchema>,
    unique_constraints: Vec<UniqueConstraint>,
) -> Vec<MigrationOperation> {
    let (deferred, mut columns): (Vec<ColumnSchema>, Vec<ColumnSchema>) =
        columns.into_iter().partition(ColumnSchema::is_extension_type);

    lift_primary_key(&mut columns, &mut primary_key);

    let mut operations = Vec::with_capacity(1 + deferred.len());
    operations.push(MigrationOperation::CreateTable {
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
        unique_constraints,
    });
    operations.extend(deferred.iter().map(|column| {
        debug!(table = %name, column = %column.name, "Deferring extension column");
        MigrationOperation::AddExtensionColumn(ExtensionColumn::from_column(name, column))
    }));
    operations
}

/// Moves a single-column primary key onto the column itself.
///
/// SQLite only gives `AUTOINCREMENT` semantics to an inline
/// `INTEGER PRIMARY KEY`. Composite keys stay table-level and no column keeps
/// an inline marker.
pub(crate) fn lift_primary_key(
    columns: &mut [ColumnSchema],
    primary_key: &mut Option<PrimaryKeySchema>,
) {
    let Some(pk) = primary_key.as_ref() else {
        return;
    };

    if pk.columns.len() != 1 {
        for column in columns.iter_mut() {
            column.primary_key = false;
        }
        return;
    }

    let key_column = pk.columns[0].as_str();
    let Some(column) = columns.iter_mut().find(|c| c.name == key_column) else {
        return;
    };

    column.primary_key = true;
    column.nullable = false;
    if column.annotations.is_set(annotations::AUTOINCREMENT) {
        column.auto_increment = true;
    }
    *primary_key = None;
}
