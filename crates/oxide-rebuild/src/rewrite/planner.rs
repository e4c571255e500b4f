//! Turns queued rebuilds into concrete operations.
//!
//! Every table is rebuilt the way SQLite documents for schema changes it
//! cannot do in place:
//!
//! 1. `PRAGMA foreign_keys = 0`, outside any transaction
//! 2. create `<table>_new` in its final shape
//! 3. copy the rows across, reading renamed columns under their old names
//! 4. drop the old table and rename the shadow into place
//! 5. recreate the table's indexes
//! 6. `PRAGMA foreign_keys = 1`, outside any transaction

use tracing::info;

use crate::dialect::quote_identifier;
use crate::error::{RebuildError, Result};
use crate::operations::MigrationOperation;

use super::classify::shape_create_table;
use super::ledger::{RebuildLedger, TableRebuild};

pub(crate) const DISABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = 0";
pub(crate) const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = 1";

/// Plans a rebuild block for every table in `ledger`, in registration order.
///
/// `synthesized` is the differ output for "empty model to target model".
///
/// # Errors
///
/// Returns [`RebuildError::MissingSynthesizedTable`] if a queued table has no
/// `CreateTable` in `synthesized`, and [`RebuildError::AmbiguousRename`] if an
/// index rename targets an index the target model does not define on that
/// table.
pub(crate) fn plan_rebuilds(
    ledger: RebuildLedger,
    synthesized: &[MigrationOperation],
) -> Result<Vec<MigrationOperation>> {
    let mut operations = Vec::new();
    for (table, rebuild) in ledger.drain() {
        operations.extend(plan_table(&table, &rebuild, synthesized)?);
    }
    Ok(operations)
}

fn plan_table(
    table: &str,
    rebuild: &TableRebuild,
    synthesized: &[MigrationOperation],
) -> Result<Vec<MigrationOperation>> {
    let Some((columns, primary_key, foreign_keys, unique_constraints)) =
        synthesized.iter().find_map(|op| match op {
            MigrationOperation::CreateTable {
                name,
                columns,
                primary_key,
                foreign_keys,
                unique_constraints,
            } if name == table => Some((columns, primary_key, foreign_keys, unique_constraints)),
            _ => None,
        })
    else {
        return Err(RebuildError::MissingSynthesizedTable {
            table: table.to_string(),
        });
    };

    for rename in &rebuild.index_renames {
        if !defines_index(synthesized, table, &rename.new_name) {
            return Err(RebuildError::AmbiguousRename {
                table: table.to_string(),
                index: rename.new_name.clone(),
            });
        }
    }

    let shadow = format!("{table}_new");
    info!(table = %table, shadow = %shadow, columns = columns.len(), "Planning table rebuild");

    let mut operations = vec![MigrationOperation::run_sql_outside_transaction(
        DISABLE_FOREIGN_KEYS,
    )];

    // Extension columns are registered on the shadow before the copy, so
    // they take part in it.
    let insert_columns: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    operations.extend(shape_create_table(
        &shadow,
        columns.clone(),
        primary_key.clone(),
        foreign_keys.clone(),
        unique_constraints.clone(),
    ));

    operations.push(MigrationOperation::run_sql(copy_rows_sql(
        table,
        &shadow,
        &insert_columns,
        rebuild,
    )));
    operations.push(MigrationOperation::drop_table(table));
    operations.push(MigrationOperation::rename_table(&shadow, table));

    let prefix = format!("IX_{table}_");
    operations.extend(
        synthesized
            .iter()
            .filter(|op| match op {
                MigrationOperation::CreateIndex {
                    name, table: owner, ..
                } => owner == table && name.starts_with(&prefix),
                _ => false,
            })
            .cloned(),
    );

    operations.push(MigrationOperation::run_sql_outside_transaction(
        ENABLE_FOREIGN_KEYS,
    ));

    Ok(operations)
}

fn defines_index(synthesized: &[MigrationOperation], table: &str, index: &str) -> bool {
    synthesized.iter().any(|op| {
        matches!(
            op,
            MigrationOperation::CreateIndex { name, table: owner, .. }
                if owner == table && name == index
        )
    })
}

fn copy_rows_sql(table: &str, shadow: &str, columns: &[&str], rebuild: &TableRebuild) -> String {
    let insert = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let select = columns
        .iter()
        .map(|c| quote_identifier(rebuild.source_column(c)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({insert})\nSELECT {select}\nFROM {}",
        quote_identifier(shadow),
        quote_identifier(table)
    )
}
