//! Sweep entry points: run one file, or a batch, through the pipeline.
//!
//! A sweep is strictly per file: ingest, clean, select, chart, export. The
//! batch entry point runs each file in order and keeps going after a
//! failure, so the caller always gets one outcome per input.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::SweepRequest;
use crate::error::SweepError;
use crate::output::{
    BatchReport, CleanStats, FileOutcome, FileSummary, Inspection, SweepOutput, SweepStats,
};
use crate::pipeline::input::UploadedFile;
use crate::pipeline::{clean, export, ingest, select, visualize};
use crate::table::Table;

/// Process one uploaded file end to end.
///
/// # Errors
/// Any stage failure for this file: unsupported type, malformed content,
/// an unknown selected column, an encoding limit of the target format, or
/// a chart rendering failure.
pub fn sweep(file: &UploadedFile, request: &SweepRequest) -> Result<SweepOutput, SweepError> {
    let total_start = Instant::now();
    info!("Sweeping {} → {}", file.name(), request.target);

    // ── Step 1: Ingest ───────────────────────────────────────────────────
    let ingest_start = Instant::now();
    let table = ingest::ingest(file)?;
    let ingest_ms = ingest_start.elapsed().as_millis() as u64;
    let summary = summarise(file, &table);
    let preview = table.head(request.preview_rows);

    // ── Step 2: Clean ────────────────────────────────────────────────────
    let mut clean_stats = CleanStats::default();
    let mut table = table;
    if request.clean.remove_duplicates {
        let (deduped, removed) = clean::deduplicate(&table);
        clean_stats.duplicates_removed = removed;
        table = deduped;
    }
    if request.clean.fill_missing {
        let (filled, report) = clean::fill_missing(&table)?;
        clean_stats.cells_filled = report.cells_filled;
        clean_stats.all_missing_columns = report.all_missing_columns;
        table = filled;
    }

    // ── Step 3: Select ───────────────────────────────────────────────────
    let table = select::apply_selection(table, &request.columns)?;

    // ── Step 4: Chart ────────────────────────────────────────────────────
    let chart = if request.visualize {
        visualize::bar_chart(&table)
    } else {
        None
    };
    let chart_png = chart
        .as_ref()
        .map(|c| visualize::render_png(c, request.chart_width, request.chart_height))
        .transpose()?;

    // ── Step 5: Export ───────────────────────────────────────────────────
    let export_start = Instant::now();
    let artifact = export::export(&table, request.target, file.name())?;
    let export_ms = export_start.elapsed().as_millis() as u64;

    let stats = SweepStats {
        ingest_ms,
        export_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Swept {}: {} rows × {} columns in {}ms",
        file.name(),
        table.n_rows(),
        table.n_cols(),
        stats.total_ms
    );

    Ok(SweepOutput {
        summary,
        preview,
        table,
        clean_stats,
        chart,
        chart_png,
        artifact,
        stats,
    })
}

/// Read a local file and [`sweep`] it.
pub fn sweep_path(
    path: impl AsRef<Path>,
    request: &SweepRequest,
) -> Result<SweepOutput, SweepError> {
    let file = UploadedFile::open(path)?;
    sweep(&file, request)
}

/// Sweep several files in order, one outcome per file.
///
/// A failure is recorded against its file and the batch moves on.
pub fn sweep_batch(files: &[UploadedFile], request: &SweepRequest) -> BatchReport {
    let total = files.len();
    let cb = request.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_batch_start(total);
    }

    let mut report = BatchReport::default();
    for (index, file) in files.iter().enumerate() {
        if let Some(cb) = cb {
            cb.on_file_start(index, total, file.name());
        }
        let result = sweep(file, request);
        match &result {
            Ok(out) => {
                if let Some(cb) = cb {
                    cb.on_file_complete(index, total, out.artifact.len());
                }
            }
            Err(e) => {
                warn!("Skipping {}: {}", file.name(), e);
                if let Some(cb) = cb {
                    cb.on_file_error(index, total, &e.to_string());
                }
            }
        }
        report.outcomes.push(FileOutcome {
            file_name: file.name().to_string(),
            result,
        });
    }

    let succeeded = report.succeeded().count();
    info!("Batch complete: {succeeded}/{total} files");
    if let Some(cb) = cb {
        cb.on_batch_complete(total, succeeded);
    }
    report
}

/// Sweep a local file and write the results into `out_dir`.
///
/// Returns the path of the written artifact. See [`write_outputs`].
pub fn sweep_to_dir(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    request: &SweepRequest,
) -> Result<(PathBuf, SweepOutput), SweepError> {
    let output = sweep_path(path, request)?;
    let written = write_outputs(out_dir, &output)?;
    Ok((written.artifact, output))
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub artifact: PathBuf,
    pub chart: Option<PathBuf>,
}

/// Write the artifact, and the chart PNG when there is one, into `out_dir`.
///
/// The artifact is named `<stem>.<ext>`, the chart `<stem>_chart.png`. Each
/// file is written to a temporary file in `out_dir` and then renamed, so a
/// reader never sees a partial file.
pub fn write_outputs(
    out_dir: impl AsRef<Path>,
    output: &SweepOutput,
) -> Result<WrittenFiles, SweepError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(|e| SweepError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let artifact = write_atomic(
        &out_dir.join(&output.artifact.file_name),
        &output.artifact.bytes,
    )?;
    let chart = output
        .chart_png
        .as_ref()
        .map(|png| {
            let stem = Path::new(&output.artifact.file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            write_atomic(&out_dir.join(format!("{stem}_chart.png")), png)
        })
        .transpose()?;

    Ok(WrittenFiles { artifact, chart })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<PathBuf, SweepError> {
    let write_err = |e: std::io::Error| SweepError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path.to_path_buf())
}

/// Ingest a file and report its summary and first rows, without cleaning
/// or exporting.
pub fn inspect(path: impl AsRef<Path>, preview_rows: usize) -> Result<Inspection, SweepError> {
    let file = UploadedFile::open(path)?;
    let table = ingest::ingest(&file)?;
    Ok(Inspection {
        summary: summarise(&file, &table),
        preview: table.head(preview_rows),
    })
}

fn summarise(file: &UploadedFile, table: &Table) -> FileSummary {
    FileSummary {
        name: file.name().to_string(),
        size_bytes: file.size(),
        extension: file.extension().to_string(),
        rows: table.n_rows(),
        columns: table.n_cols(),
    }
}
