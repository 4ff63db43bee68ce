//! Cleaning: drop duplicate rows, fill missing numeric cells with the mean.
//!
//! Both operations take a table by reference and return a new one together
//! with a small report of what changed, so the caller can tell the user
//! ("3 duplicates removed") without diffing tables.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::SweepError;
use crate::table::{Column, Table, Value};

/// What [`fill_missing`] changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    /// Number of cells that received a column mean.
    pub cells_filled: usize,
    /// Numeric columns with no observed value; their cells stay missing.
    pub all_missing_columns: Vec<String>,
}

/// Remove rows that equal an earlier row in every column.
///
/// The first occurrence of each row is kept and survivors keep their
/// relative order, so applying this twice is the same as applying it once.
/// Returns the cleaned table and the number of rows removed.
pub fn deduplicate(table: &Table) -> (Table, usize) {
    let mut seen: HashSet<Vec<&Value>> = HashSet::with_capacity(table.n_rows());
    let keep: Vec<bool> = table.rows().map(|row| seen.insert(row)).collect();
    let cleaned = table.retain_rows(|i| keep[i]);
    let removed = table.n_rows() - cleaned.n_rows();
    info!("Removed {removed} duplicate rows");
    (cleaned, removed)
}

/// Replace missing cells of every numeric column with that column's mean.
///
/// The mean is taken over the observed values before any cell is filled.
/// Non-numeric columns and observed cells are never touched. A numeric
/// column with no observed value has no mean; it is left missing and listed
/// in [`FillReport::all_missing_columns`].
///
/// # Errors
/// [`SweepError::RaggedTable`] if the rebuilt columns disagree on length.
pub fn fill_missing(table: &Table) -> Result<(Table, FillReport), SweepError> {
    let mut report = FillReport::default();

    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|col| {
            if !col.is_numeric() || col.missing_count() == 0 {
                return col.clone();
            }
            let Some(mean) = col.mean() else {
                debug!("Column '{}' has no observed values, left missing", col.name);
                report.all_missing_columns.push(col.name.clone());
                return col.clone();
            };
            report.cells_filled += col.missing_count();
            debug!("Filling column '{}' with mean {mean}", col.name);
            Column::new(
                col.name.clone(),
                col.values
                    .iter()
                    .map(|v| match v {
                        Value::Missing => Value::Float(mean),
                        other => other.clone(),
                    })
                    .collect(),
            )
        })
        .collect();

    let filled = Table::new(columns)?;
    info!("Filled {} missing numeric cells", report.cells_filled);
    Ok((filled, report))
}
