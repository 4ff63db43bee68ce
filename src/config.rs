//! Request types for one sweep over an uploaded file.
//!
//! Every choice a user makes about a file (clean it? which columns? which
//! output format? chart or not?) lives in one [`SweepRequest`], built via
//! [`SweepRequestBuilder`]. The pipeline reads nothing else, so the same
//! request can be applied to every file in a batch and logged verbatim.

use crate::error::SweepError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for a single ingest → clean → select → chart → export run.
///
/// # Example
/// ```rust
/// use data_sweeper::{SweepRequest, TargetFormat};
///
/// let request = SweepRequest::builder()
///     .remove_duplicates(true)
///     .fill_missing(true)
///     .columns(["name", "price"])
///     .target(TargetFormat::Excel)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SweepRequest {
    /// Which cleaning steps to apply. Default: none.
    pub clean: CleanOptions,

    /// Columns kept for charting and export. Default: all, in file order.
    pub columns: ColumnSelection,

    /// Export format. Default: CSV.
    pub target: TargetFormat,

    /// Build a bar chart from the first two numeric columns. Default: false.
    pub visualize: bool,

    /// Chart raster width in pixels. Range: 64–4096. Default: 800.
    pub chart_width: u32,

    /// Chart raster height in pixels. Range: 64–4096. Default: 400.
    pub chart_height: u32,

    /// Rows kept in the preview of the ingested table. Default: 5.
    pub preview_rows: usize,

    /// Optional per-file progress events for batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SweepRequest {
    fn default() -> Self {
        Self {
            clean: CleanOptions::default(),
            columns: ColumnSelection::default(),
            target: TargetFormat::default(),
            visualize: false,
            chart_width: 800,
            chart_height: 400,
            preview_rows: 5,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SweepRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepRequest")
            .field("clean", &self.clean)
            .field("columns", &self.columns)
            .field("target", &self.target)
            .field("visualize", &self.visualize)
            .field("chart_width", &self.chart_width)
            .field("chart_height", &self.chart_height)
            .field("preview_rows", &self.preview_rows)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SweepProgressCallback>"),
            )
            .finish()
    }
}

impl SweepRequest {
    /// Create a new builder for `SweepRequest`.
    pub fn builder() -> SweepRequestBuilder {
        SweepRequestBuilder {
            request: Self::default(),
        }
    }
}

/// Builder for [`SweepRequest`].
pub struct SweepRequestBuilder {
    request: SweepRequest,
}

impl SweepRequestBuilder {
    pub fn remove_duplicates(mut self, v: bool) -> Self {
        self.request.clean.remove_duplicates = v;
        self
    }

    pub fn fill_missing(mut self, v: bool) -> Self {
        self.request.clean.fill_missing = v;
        self
    }

    pub fn clean(mut self, options: CleanOptions) -> Self {
        self.request.clean = options;
        self
    }

    /// Keep only these columns, in this order.
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.columns = ColumnSelection::Only(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn column_selection(mut self, selection: ColumnSelection) -> Self {
        self.request.columns = selection;
        self
    }

    pub fn target(mut self, format: TargetFormat) -> Self {
        self.request.target = format;
        self
    }

    pub fn visualize(mut self, v: bool) -> Self {
        self.request.visualize = v;
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.request.chart_width = width;
        self.request.chart_height = height;
        self
    }

    pub fn preview_rows(mut self, n: usize) -> Self {
        self.request.preview_rows = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.request.progress_callback = Some(cb);
        self
    }

    /// Build the request, validating constraints.
    pub fn build(self) -> Result<SweepRequest, SweepError> {
        let r = &self.request;
        for (label, px) in [("width", r.chart_width), ("height", r.chart_height)] {
            if !(64..=4096).contains(&px) {
                return Err(SweepError::InvalidConfig(format!(
                    "Chart {label} must be 64–4096 px, got {px}"
                )));
            }
        }
        if let ColumnSelection::Only(names) = &r.columns {
            if names.is_empty() {
                return Err(SweepError::InvalidConfig(
                    "Column selection is empty; select at least one column".to_string(),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
                return Err(SweepError::InvalidConfig(format!(
                    "Column '{dup}' is selected more than once"
                )));
            }
        }
        Ok(self.request)
    }
}

// ── Options ──────────────────────────────────────────────────────────────

/// Optional cleaning steps. When both are on, duplicates are removed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Drop rows identical to an earlier row.
    pub remove_duplicates: bool,
    /// Replace missing numeric cells with their column mean.
    pub fill_missing: bool,
}

impl CleanOptions {
    pub fn any(&self) -> bool {
        self.remove_duplicates || self.fill_missing
    }
}

/// Which columns survive into the chart and the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelection {
    /// Keep every column (default).
    #[default]
    All,
    /// Keep exactly these columns, in this order.
    Only(Vec<String>),
}

/// Output format of the export stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetFormat {
    /// Comma-separated text (default).
    #[default]
    Csv,
    /// Single-sheet `.xlsx` workbook.
    Excel,
    /// Bordered grid of the first rows on an A4 page.
    Pdf,
}

impl TargetFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "csv",
            TargetFormat::Excel => "xlsx",
            TargetFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "text/csv",
            TargetFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            TargetFormat::Pdf => "application/pdf",
        }
    }

    /// Human-readable label, as shown in menus.
    pub fn label(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "CSV",
            TargetFormat::Excel => "Excel",
            TargetFormat::Pdf => "PDF",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetFormat {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(TargetFormat::Csv),
            "excel" | "xlsx" => Ok(TargetFormat::Excel),
            "pdf" => Ok(TargetFormat::Pdf),
            other => Err(SweepError::InvalidConfig(format!(
                "Unknown target format '{other}' (expected csv, excel or pdf)"
            ))),
        }
    }
}
