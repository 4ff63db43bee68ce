//! # data-sweeper
//!
//! Convert tabular files between CSV, Excel and PDF, with optional cleaning,
//! column selection and a bar chart on the way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (.csv / .xlsx / .pdf)
//!  │
//!  ├─ 1. Ingest     parse into a Table; PDFs become one "Extracted Text" cell
//!  ├─ 2. Clean      optional: drop duplicate rows, then mean-fill numeric gaps
//!  ├─ 3. Select     optional: keep an ordered subset of columns
//!  ├─ 4. Visualize  optional: bar chart of the first two numeric columns
//!  └─ 5. Export     CSV, single-sheet XLSX, or a PDF grid of the first 10 rows
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use data_sweeper::{sweep_path, SweepRequest, TargetFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = SweepRequest::builder()
//!         .remove_duplicates(true)
//!         .fill_missing(true)
//!         .target(TargetFormat::Excel)
//!         .build()?;
//!     let output = sweep_path("sales.csv", &request)?;
//!     std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
//!     eprintln!("{} duplicates removed", output.clean_stats.duplicates_removed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sweep` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! data-sweeper = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CleanOptions, ColumnSelection, SweepRequest, SweepRequestBuilder, TargetFormat};
pub use convert::{
    inspect, sweep, sweep_batch, sweep_path, sweep_to_dir, write_outputs, WrittenFiles,
};
pub use error::SweepError;
pub use output::{
    BatchReport, CleanStats, FileOutcome, FileSummary, Inspection, SweepOutput, SweepStats,
};
pub use pipeline::clean::{deduplicate, fill_missing, FillReport};
pub use pipeline::export::{export, ExportArtifact};
pub use pipeline::ingest::{ingest, EXTRACTED_TEXT_COLUMN};
pub use pipeline::input::{FileKind, UploadedFile};
pub use pipeline::pdf_grid::MAX_PDF_ROWS;
pub use pipeline::select::select_columns;
pub use pipeline::visualize::{bar_chart, render_png, BarChart, BarSeries};
pub use progress::{NoopProgressCallback, ProgressCallback, SweepProgressCallback};
pub use table::{Column, Table, Value};
