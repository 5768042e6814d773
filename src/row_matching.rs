//! Row matching strategies
//!
//! Rows of two collections are paired before per-row comparison, either by
//! position or by extracted primary-key values. Both strategies require
//! equal row counts up front; everything else differs per mode.

use crate::data::{Row, Table};
use crate::options::RowMatchMode;
use crate::plan::{Comparand, EquivalencyStep, NodeKind, WalkContext};
use crate::value::{DataType, Value};
use indexmap::IndexMap;
use log::debug;
use std::fmt;

/// An ordered tuple of primary-key column values extracted from a row.
///
/// Used only as a dictionary key while matching rows by primary key.
/// Equality is element-wise; the hash is a deterministic combination of
/// the element hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundKey(Vec<Value>);

impl CompoundKey {
    pub fn extract(row: &Row, key_columns: &[String]) -> Self {
        CompoundKey(
            key_columns
                .iter()
                .map(|column| row.values.get(column).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}

impl fmt::Display for CompoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;

        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }

        f.write_str(" }")
    }
}

pub struct RowCollectionStep;

impl EquivalencyStep for RowCollectionStep {
    fn kind(&self) -> NodeKind {
        NodeKind::RowCollection
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let (subject_rows, subject_table, expectation_rows, expectation_table) =
            match (actual, expected) {
                (
                    Comparand::RowCollection {
                        rows: subject_rows,
                        table: subject_table,
                    },
                    Comparand::RowCollection {
                        rows: expectation_rows,
                        table: expectation_table,
                    },
                ) => (*subject_rows, *subject_table, *expectation_rows, *expectation_table),
                (other, Comparand::RowCollection { .. }) => {
                    ctx.fail(format!(
                        "Expected a row collection, but found {}",
                        other.describe()
                    ));
                    return;
                }
                (Comparand::RowCollection { .. }, other) => {
                    ctx.fail(format!(
                        "Expected {}, but found a row collection",
                        other.describe()
                    ));
                    return;
                }
                _ => unreachable!("dispatched on row collection kind"),
            };

        if subject_rows.len() != expectation_rows.len() {
            // pairing rows is meaningless once the counts differ
            ctx.fail(format!(
                "Expected row collection to contain {} row(s), but found {}",
                expectation_rows.len(),
                subject_rows.len()
            ));
            return;
        }

        let mode = ctx.options().row_match_mode();
        debug!(
            "matching {} row(s) of table {} in {} mode",
            subject_rows.len(),
            subject_table.name,
            mode
        );

        #[allow(unreachable_patterns)]
        match mode {
            RowMatchMode::Index => {
                self.match_by_index(ctx, subject_rows, subject_table, expectation_rows, expectation_table);
            }
            RowMatchMode::PrimaryKey => {
                self.match_by_primary_key(
                    ctx,
                    subject_rows,
                    subject_table,
                    expectation_rows,
                    expectation_table,
                );
            }
            other => {
                ctx.fail(format!(
                    "Unknown row match mode {other:?} when trying to compare row collections"
                ));
            }
        }
    }
}

impl RowCollectionStep {
    fn match_by_index(
        &self,
        ctx: &mut WalkContext<'_>,
        subject_rows: &[Row],
        subject_table: &Table,
        expectation_rows: &[Row],
        expectation_table: &Table,
    ) {
        for index in 0..expectation_rows.len() {
            ctx.assert_equivalency_of(
                &Comparand::Row {
                    row: &subject_rows[index],
                    table: subject_table,
                },
                &Comparand::Row {
                    row: &expectation_rows[index],
                    table: expectation_table,
                },
                Some(&format!("[{index}]")),
            );
        }
    }

    fn match_by_primary_key(
        &self,
        ctx: &mut WalkContext<'_>,
        subject_rows: &[Row],
        subject_table: &Table,
        expectation_rows: &[Row],
        expectation_table: &Table,
    ) {
        let subject_types = if subject_rows.is_empty() {
            None
        } else {
            gather_primary_key_types(ctx, subject_table, "actual")
        };

        let expectation_types = if expectation_rows.is_empty() {
            None
        } else {
            gather_primary_key_types(ctx, expectation_table, "expected")
        };

        let (Some(subject_types), Some(expectation_types)) = (subject_types, expectation_types)
        else {
            return;
        };

        if subject_types != expectation_types {
            ctx.fail(
                "Actual and expected primary keys of the table containing the rows do not \
                 have the same schema; primary-key row matching cannot be applied",
            );
            return;
        }

        let mut expectation_by_key: IndexMap<CompoundKey, &Row> = expectation_rows
            .iter()
            .map(|row| (CompoundKey::extract(row, &expectation_table.primary_key), row))
            .collect();

        for subject_row in subject_rows {
            let key = CompoundKey::extract(subject_row, &subject_table.primary_key);

            match expectation_by_key.shift_remove(&key) {
                Some(expectation_row) => {
                    ctx.assert_equivalency_of(
                        &Comparand::Row {
                            row: subject_row,
                            table: subject_table,
                        },
                        &Comparand::Row {
                            row: expectation_row,
                            table: expectation_table,
                        },
                        Some(&format!("[{key}]")),
                    );
                }
                None => {
                    ctx.fail(format!("Found unexpected row with key {key}"));
                }
            }
        }

        if expectation_by_key.len() > 1 {
            ctx.fail(format!(
                "{} rows were expected in the row collection and not found",
                expectation_by_key.len()
            ));
        } else if let Some((key, _)) = expectation_by_key.first() {
            ctx.fail(format!(
                "Expected to find a row with key {key}, but no such row was found"
            ));
        }
    }
}

/// The primary-key type signature of a table, or `None` (with a recorded
/// failure) when primary-key matching cannot be applied to it.
fn gather_primary_key_types(
    ctx: &mut WalkContext<'_>,
    table: &Table,
    comparison_term: &str,
) -> Option<Vec<DataType>> {
    if table.primary_key.is_empty() {
        ctx.fail(format!(
            "Table {:?} containing the {comparison_term} rows does not have a primary key; \
             primary-key row matching cannot be applied",
            table.name
        ));
        return None;
    }

    let mut types = Vec::with_capacity(table.primary_key.len());

    for name in &table.primary_key {
        match table.find_column(name) {
            Some(column) => types.push(column.data_type),
            None => {
                ctx.fail(format!(
                    "Primary key column {name:?} was not found in table {:?}",
                    table.name
                ));
                return None;
            }
        }
    }

    Some(types)
}
