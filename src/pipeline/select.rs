//! Column selection: restrict a table to a chosen, ordered subset of columns.

use tracing::debug;

use crate::config::ColumnSelection;
use crate::error::SweepError;
use crate::table::Table;

/// Keep exactly `names`, in that order, with every row.
///
/// # Errors
/// [`SweepError::InvalidColumn`] naming the first requested column that the
/// table does not have; [`SweepError::InvalidConfig`] when `names` is empty.
pub fn select_columns<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table, SweepError> {
    if names.is_empty() {
        return Err(SweepError::InvalidConfig(
            "Column selection is empty; select at least one column".to_string(),
        ));
    }
    let columns = names
        .iter()
        .map(|name| {
            table
                .column(name.as_ref())
                .cloned()
                .ok_or_else(|| SweepError::InvalidColumn {
                    column: name.as_ref().to_string(),
                    available: table.column_names(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Selected {}/{} columns", columns.len(), table.n_cols());
    Table::new(columns)
}

/// Apply a [`ColumnSelection`]; `All` returns the table unchanged.
pub fn apply_selection(table: Table, selection: &ColumnSelection) -> Result<Table, SweepError> {
    match selection {
        ColumnSelection::All => Ok(table),
        ColumnSelection::Only(names) => select_columns(&table, names),
    }
}
