//! In-memory table model: named columns of dynamically-typed cells.
//!
//! A [`Table`] is column-major: each [`Column`] owns its values, and every
//! column has the same length. That invariant is checked once in
//! [`Table::new`]; all other constructors go through it, so code that holds
//! a `Table` can index rows without bounds surprises.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::SweepError;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common dataframe dtypes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No observed value (null / NaN).
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

/// Bit pattern used for float equality and hashing.
///
/// `-0.0` folds onto `0.0` and every NaN onto one pattern so that equal-looking
/// rows collapse during deduplication.
fn float_key(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_key(*f).hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

/// Format a float the way dataframe writers do: integral values keep a
/// trailing `.0` so they read back as floats.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A named sequence of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True when every cell is a number or missing.
    ///
    /// A column with no observed values counts as numeric, like a float
    /// column full of NaN.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|v| v.is_numeric() || v.is_missing())
    }

    /// Arithmetic mean of the non-missing numeric cells, `None` when there are none.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values
            .iter()
            .filter_map(Value::as_f64)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Rectangular grid of named columns with ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    #[serde(skip)]
    n_rows: usize,
}

impl Table {
    /// Build a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self, SweepError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(SweepError::RaggedTable {
                column: bad.name.clone(),
                expected: n_rows,
                found: bad.len(),
            });
        }
        Ok(Self { columns, n_rows })
    }

    /// Build a table from a header and row-major records.
    ///
    /// Short rows are padded with [`Value::Missing`]; long rows are an error.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SweepError> {
        let width = headers.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, Vec::with_capacity(rows.len())))
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(SweepError::RaggedTable {
                    column: format!("row {i}"),
                    expected: width,
                    found: row.len(),
                });
            }
            let pad = width - row.len();
            let cells = row
                .into_iter()
                .chain(std::iter::repeat(Value::Missing).take(pad));
            for (col, cell) in columns.iter_mut().zip(cells) {
                col.values.push(cell);
            }
        }
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Borrow one row as a vector of cell references.
    ///
    /// # Panics
    /// Panics if `index >= self.n_rows()`.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Keep only the rows whose index passes `keep`, preserving order.
    pub fn retain_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Table {
        let kept: Vec<usize> = (0..self.n_rows).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    kept.iter().map(|&i| c.values[i].clone()).collect(),
                )
            })
            .collect();
        Table {
            columns,
            n_rows: kept.len(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.retain_rows(|i| i < n)
    }
}

/// Plain-text grid for terminal previews.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_CELL: usize = 24;

        let clip = |s: String| -> String {
            if s.chars().count() > MAX_CELL {
                let mut t: String = s.chars().take(MAX_CELL - 1).collect();
                t.push('…');
                t
            } else {
                s
            }
        };

        let index_width = self.n_rows.saturating_sub(1).to_string().len();
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| {
                c.values
                    .iter()
                    .map(|v| match v {
                        Value::Missing => "NaN".to_string(),
                        other => clip(other.to_string().replace('\n', " ")),
                    })
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, vals)| {
                vals.iter()
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(clip(c.name.clone()).chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (c, &w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", clip(c.name.clone()))?;
        }
        writeln!(f)?;
        for row in 0..self.n_rows {
            write!(f, "{row:<index_width$}")?;
            for (vals, &w) in cells.iter().zip(&widths) {
                write!(f, "  {:>w$}", vals[row])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
