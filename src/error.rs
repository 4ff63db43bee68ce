//! Error types for the data-sweeper library.
//!
//! Every failure is scoped to the single file being processed. The per-file
//! entry points ([`crate::sweep`], [`crate::ingest`], [`crate::export`])
//! return `Err(SweepError)`; the batch entry point
//! [`crate::sweep_batch`] stores each error next to its file in a
//! [`crate::output::BatchReport`] so one bad upload never stops the rest.
//!
//! Nothing here is retried: every operation is deterministic, so running it
//! again on the same input gives the same error.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the data-sweeper library.
#[derive(Debug, Error)]
pub enum SweepError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of `.csv`, `.xlsx`, `.pdf`.
    #[error("Unsupported file type: {extension}")]
    UnsupportedType { extension: String },

    // ── Content errors ────────────────────────────────────────────────────
    /// The file content is malformed for its declared format.
    #[error("Failed to parse {format} content: {detail}")]
    Parse { format: &'static str, detail: String },

    /// A column selection names a column the table does not have.
    #[error("Column '{column}' does not exist (available: {})", available.join(", "))]
    InvalidColumn {
        column: String,
        available: Vec<String>,
    },

    /// Columns of a table disagree on the row count.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        found: usize,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The table cannot be represented in the target format.
    #[error("Cannot encode table as {format}: {detail}")]
    Encoding { format: &'static str, detail: String },

    /// The bar chart could not be rasterised or PNG-encoded.
    #[error("Chart rendering failed: {0}")]
    ChartRenderFailed(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SweepError {
    pub(crate) fn parse(format: &'static str, detail: impl ToString) -> Self {
        SweepError::Parse {
            format,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encoding(format: &'static str, detail: impl ToString) -> Self {
        SweepError::Encoding {
            format,
            detail: detail.to_string(),
        }
    }
}
