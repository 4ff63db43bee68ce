//! Pipeline stages for sweeping one uploaded file.
//!
//! Each submodule implements exactly one transformation step and is
//! synchronous: files are held whole in memory.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ingest ──▶ clean ──▶ select ──▶ visualize ──▶ export
//! (bytes)   (Table)    (dedupe,   (columns)   (bar chart)   (csv/xlsx/pdf)
//!                       fill)
//! ```
//!
//! 1. [`input`]  — wrap a path or in-memory upload, normalise the extension
//! 2. [`ingest`] — parse CSV, XLSX or PDF text into a [`crate::Table`]
//! 3. [`clean`]  — drop duplicate rows, fill missing numeric cells with the mean
//! 4. [`select`] — keep an ordered subset of columns
//! 5. [`visualize`] — bar series from the first two numeric columns, PNG render
//! 6. [`export`] — encode the table; PDF layout lives in [`pdf_grid`]

pub mod clean;
pub mod export;
pub mod ingest;
pub mod input;
pub mod pdf_grid;
pub mod select;
pub mod visualize;
