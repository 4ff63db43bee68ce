//! CLI binary for data-sweeper.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `SweepRequest`, runs the batch and writes each artifact to disk.

use anyhow::{Context, Result};
use clap::Parser;
use data_sweeper::{
    inspect, sweep_batch, write_outputs, ProgressCallback, SweepOutput, SweepProgressCallback,
    SweepRequest, TargetFormat, UploadedFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders a progress bar over the batch and one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being swept.
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Sweeping");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SweepProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sweeping {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, artifact_len: usize) {
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{:.1} KB", artifact_len as f64 / 1024.0)),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let first_line = error.lines().next().unwrap_or(error);
        let msg = match first_line.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };

        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files swept successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files swept  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # CSV to Excel, written to the current directory
  sweep sales.csv --to excel

  # Clean, keep two columns, chart them, export as PDF into out/
  sweep sales.csv --dedupe --fill-missing -c region,revenue --chart --to pdf -o out

  # Several files at once; a bad file does not stop the others
  sweep a.csv b.xlsx report.pdf --to csv -o converted

  # File info and the first 10 rows, no export
  sweep --inspect-only --preview 10 sales.xlsx

  # Machine-readable results
  sweep --json sales.csv > result.json

NOTES:
  PDF inputs become a single "Extracted Text" column holding the text of all
  pages. PDF exports show at most the first 10 rows.
"#;

/// Convert CSV, Excel and PDF files, with optional cleaning and charts.
#[derive(Parser, Debug)]
#[command(
    name = "sweep",
    version,
    about = "Convert CSV, Excel and PDF files, with optional cleaning and charts",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files (.csv, .xlsx, .pdf).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format: csv, excel (xlsx), pdf.
    #[arg(long = "to", env = "SWEEP_TO", default_value = "csv")]
    to: TargetFormat,

    /// Directory the converted files are written to.
    #[arg(short, long, env = "SWEEP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Remove rows identical to an earlier row.
    #[arg(long, env = "SWEEP_DEDUPE")]
    dedupe: bool,

    /// Fill missing numeric cells with the column mean.
    #[arg(long, env = "SWEEP_FILL_MISSING")]
    fill_missing: bool,

    /// Keep only these columns, in this order (comma-separated).
    #[arg(short, long, env = "SWEEP_COLUMNS", value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Write `<stem>_chart.png` with a bar chart of the first two numeric columns.
    #[arg(long, env = "SWEEP_CHART")]
    chart: bool,

    /// Chart width in pixels (64–4096).
    #[arg(long, env = "SWEEP_CHART_WIDTH", default_value_t = 800)]
    chart_width: u32,

    /// Chart height in pixels (64–4096).
    #[arg(long, env = "SWEEP_CHART_HEIGHT", default_value_t = 400)]
    chart_height: u32,

    /// Rows shown in the preview of each ingested file (0 disables it).
    #[arg(long, env = "SWEEP_PREVIEW", default_value_t = 5)]
    preview: usize,

    /// Print file info and a preview only, no cleaning or export.
    #[arg(long, env = "SWEEP_INSPECT_ONLY")]
    inspect_only: bool,

    /// Print structured JSON results on stdout.
    #[arg(long, env = "SWEEP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SWEEP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SWEEP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SWEEP_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.inspect_only {
        return run_inspect(&cli);
    }

    // ── Build request ────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn SweepProgressCallback>)
    } else {
        None
    };
    let request = build_request(&cli, progress_cb)?;

    // ── Read inputs ──────────────────────────────────────────────────────
    // Unreadable paths are reported and counted, the rest still run.
    let mut failures = 0usize;
    let mut files = Vec::with_capacity(cli.inputs.len());
    let mut json_results = Vec::new();
    for path in &cli.inputs {
        match UploadedFile::open(path) {
            Ok(f) => files.push(f),
            Err(e) => {
                failures += 1;
                if cli.json {
                    json_results.push(serde_json::json!({
                        "file": path.display().to_string(),
                        "error": e.to_string(),
                    }));
                } else {
                    eprintln!("{} {}", red("✗"), e);
                }
            }
        }
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let report = sweep_batch(&files, &request);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(output) => {
                let written = write_outputs(&cli.output_dir, output)
                    .with_context(|| format!("Failed to write results for {}", outcome.file_name));
                let written = match written {
                    Ok(w) => w,
                    Err(e) => {
                        failures += 1;
                        eprintln!("{} {:#}", red("✗"), e);
                        continue;
                    }
                };

                if cli.json {
                    json_results.push(serde_json::json!({
                        "file": outcome.file_name,
                        "written": written.artifact.display().to_string(),
                        "chart": written.chart.as_ref().map(|p| p.display().to_string()),
                        "output": output,
                    }));
                } else if !cli.quiet {
                    print_output(output, cli.preview, cli.chart);
                    eprintln!(
                        "{}  {}  {}ms  →  {}",
                        green("✔"),
                        outcome.file_name,
                        output.stats.total_ms,
                        bold(&written.artifact.display().to_string()),
                    );
                    if let Some(chart) = &written.chart {
                        eprintln!("   chart  →  {}", dim(&chart.display().to_string()));
                    }
                }
            }
            Err(e) => {
                failures += 1;
                if cli.json {
                    json_results.push(serde_json::json!({
                        "file": outcome.file_name,
                        "error": e.to_string(),
                    }));
                } else if !show_progress {
                    // The progress bar already logged this failure.
                    eprintln!("{} {}: {}", red("✗"), outcome.file_name, e);
                }
            }
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json_results).context("Failed to serialise output")?
        );
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} files failed", cli.inputs.len());
    }
    Ok(())
}

/// `--inspect-only`: file info and a preview of each input.
fn run_inspect(cli: &Cli) -> Result<()> {
    let mut results = Vec::new();
    let mut failures = 0usize;
    for path in &cli.inputs {
        match inspect(path, cli.preview) {
            Ok(info) if cli.json => results.push(serde_json::json!(info)),
            Ok(info) => {
                println!("File Name:    {}", info.summary.name);
                println!("File Size:    {:.2} KB", info.summary.size_kb());
                println!(
                    "Shape:        {} rows × {} columns",
                    info.summary.rows, info.summary.columns
                );
                if info.preview.n_rows() > 0 {
                    println!("{}", info.preview);
                }
                println!();
            }
            Err(e) => {
                failures += 1;
                if cli.json {
                    results.push(serde_json::json!({
                        "file": path.display().to_string(),
                        "error": e.to_string(),
                    }));
                } else {
                    eprintln!("{} {}", red("✗"), e);
                }
            }
        }
    }
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to serialise output")?
        );
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} files could not be inspected", cli.inputs.len());
    }
    Ok(())
}

fn print_output(output: &SweepOutput, preview_rows: usize, chart_requested: bool) {
    let s = &output.summary;
    println!("{}", bold(&s.name));
    println!(
        "  {:.2} KB, {} rows × {} columns",
        s.size_kb(),
        s.rows,
        s.columns
    );
    if preview_rows > 0 && output.preview.n_rows() > 0 {
        println!("{}", output.preview);
    }
    let c = &output.clean_stats;
    if c.duplicates_removed > 0 || c.cells_filled > 0 {
        println!(
            "  cleaned: {} duplicates removed, {} missing values filled",
            c.duplicates_removed, c.cells_filled
        );
    }
    if !c.all_missing_columns.is_empty() {
        println!(
            "  {} no values to average in: {}",
            cyan("ℹ"),
            c.all_missing_columns.join(", ")
        );
    }
    if let Some(notice) = chart_notice(output, chart_requested) {
        println!("{notice}");
    }
}

/// Notice for a requested chart that could not be drawn.
fn chart_notice(output: &SweepOutput, requested: bool) -> Option<String> {
    (requested && output.chart.is_none()).then(|| {
        format!(
            "  {} no numeric columns to chart in {}",
            cyan("ℹ"),
            output.summary.name
        )
    })
}

/// Map CLI args to `SweepRequest`.
fn build_request(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SweepRequest> {
    let mut builder = SweepRequest::builder()
        .remove_duplicates(cli.dedupe)
        .fill_missing(cli.fill_missing)
        .target(cli.to)
        .visualize(cli.chart)
        .chart_size(cli.chart_width, cli.chart_height)
        .preview_rows(cli.preview);

    if let Some(columns) = &cli.columns {
        builder = builder.columns(columns.iter().map(|c| c.trim().to_string()));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
