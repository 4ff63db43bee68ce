//! Result types returned by the sweep entry points.

use serde::Serialize;

use crate::error::SweepError;
use crate::pipeline::export::ExportArtifact;
use crate::pipeline::visualize::BarChart;
use crate::table::Table;

/// What the user sees about an upload before any processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: usize,
    /// Lowercased extension including the dot.
    pub extension: String,
    pub rows: usize,
    pub columns: usize,
}

impl FileSummary {
    /// Size in kibibytes, unrounded.
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// What the cleaning stage changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanStats {
    pub duplicates_removed: usize,
    pub cells_filled: usize,
    /// Numeric columns that had nothing to average and stayed missing.
    pub all_missing_columns: Vec<String>,
}

/// Wall-clock timings for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub ingest_ms: u64,
    pub export_ms: u64,
    pub total_ms: u64,
}

/// Everything produced for one successfully processed file.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutput {
    pub summary: FileSummary,
    /// First rows of the table as ingested, before cleaning.
    pub preview: Table,
    /// The table after cleaning and column selection; this is what was exported.
    pub table: Table,
    pub clean_stats: CleanStats,
    /// `None` when charting was off or there was no numeric column.
    pub chart: Option<BarChart>,
    /// PNG rendering of `chart`.
    #[serde(skip)]
    pub chart_png: Option<Vec<u8>>,
    pub artifact: ExportArtifact,
    pub stats: SweepStats,
}

/// Ingest-only view of a file.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub summary: FileSummary,
    pub preview: Table,
}

/// Result for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<SweepOutput, SweepError>,
}

/// Per-file outcomes of [`crate::sweep_batch`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &SweepOutput)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|out| (o.file_name.as_str(), out)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &SweepError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.file_name.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}
