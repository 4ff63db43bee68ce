//! Visualisation: bar series from numeric columns, rendered to PNG.
//!
//! [`bar_chart`] is the data side: it picks at most the first two numeric
//! columns and turns them into series, one bar slot per row. A table with
//! no numeric column simply has no chart. [`render_png`] rasterises a chart
//! as grouped bars around a zero baseline.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SweepError;
use crate::table::{Table, Value};

/// Number of numeric columns charted at most.
pub const MAX_SERIES: usize = 2;

/// One bar per row; `None` where the cell is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bar chart: one slot per row label, one bar per series in each slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    /// Row labels (the 0-based row position).
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    /// Smallest and largest plotted value, always spanning zero.
    fn value_range(&self) -> (f64, f64) {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Build bar series from up to the first two numeric columns.
///
/// Returns `None` when the table has no numeric column.
pub fn bar_chart(table: &Table) -> Option<BarChart> {
    let series: Vec<BarSeries> = table
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .take(MAX_SERIES)
        .map(|c| BarSeries {
            name: c.name.clone(),
            values: c.values.iter().map(Value::as_f64).collect(),
        })
        .collect();

    if series.is_empty() {
        info!("No numeric columns to chart");
        return None;
    }
    debug!(
        "Charting {} over {} rows",
        series
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        table.n_rows()
    );
    Some(BarChart {
        labels: (0..table.n_rows()).map(|i| i.to_string()).collect(),
        series,
    })
}

/// Generates `n` visually distinct colours using evenly spaced hues.
fn series_colors(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n.max(1) as f32) * 360.0 + 210.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            Rgb([
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ])
        })
        .collect()
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for x in x0.min(w)..x1.min(w) {
        for y in y0.min(h)..y1.min(h) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Rasterise a chart to PNG bytes.
pub fn render_png(chart: &BarChart, width: u32, height: u32) -> Result<Vec<u8>, SweepError> {
    const LEFT: u32 = 40;
    const RIGHT: u32 = 10;
    const TOP: u32 = 10;
    const BOTTOM: u32 = 30;
    const AXIS: Rgb<u8> = Rgb([96, 96, 96]);

    if width <= LEFT + RIGHT || height <= TOP + BOTTOM {
        return Err(SweepError::ChartRenderFailed(format!(
            "{width}×{height} px leaves no room for the plot area"
        )));
    }

    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let (x0, x1) = (LEFT as f64, (width - RIGHT) as f64);
    let (y0, y1) = (TOP as f64, (height - BOTTOM) as f64);

    let (lo, hi) = chart.value_range();
    let span = if hi > lo { hi - lo } else { 1.0 };
    let y_of = |v: f64| y1 - (v - lo) / span * (y1 - y0);
    let baseline = y_of(0.0);

    let slots = chart.labels.len();
    let colors = series_colors(chart.series.len());
    if slots > 0 {
        let slot_w = (x1 - x0) / slots as f64;
        let bar_w = slot_w * 0.8 / chart.series.len().max(1) as f64;
        for (s_idx, (series, color)) in chart.series.iter().zip(&colors).enumerate() {
            for (row, value) in series.values.iter().enumerate() {
                let Some(v) = value.filter(|v| v.is_finite()) else {
                    continue;
                };
                let left = x0 + row as f64 * slot_w + slot_w * 0.1 + s_idx as f64 * bar_w;
                let (top, bottom) = if v >= 0.0 {
                    (y_of(v), baseline)
                } else {
                    (baseline, y_of(v))
                };
                fill_rect(
                    &mut img,
                    left.round() as u32,
                    top.round() as u32,
                    ((left + bar_w).round() as u32).max(left.round() as u32 + 1),
                    (bottom.round() as u32).max(top.round() as u32 + 1),
                    *color,
                );
            }
        }
    }

    // Axes: vertical at the left edge, horizontal at zero.
    fill_rect(&mut img, LEFT - 1, TOP, LEFT, height - BOTTOM, AXIS);
    let base = baseline.round() as u32;
    fill_rect(&mut img, LEFT - 1, base, width - RIGHT, base + 1, AXIS);

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SweepError::ChartRenderFailed(e.to_string()))?;
    Ok(buf.into_inner())
}
