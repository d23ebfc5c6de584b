//! Standalone SVG chart of close prices against their moving average.

use crate::domain::analysis::InstrumentReport;
use crate::domain::error::SmacrossError;
use std::fs;
use std::path::{Path, PathBuf};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 300.0;
const PADDING: f64 = 40.0;

fn polyline(values: &[f64], min: f64, scale_x: f64, scale_y: f64) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = PADDING + i as f64 * scale_x;
            let y = HEIGHT - PADDING - (v - min) * scale_y;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_price_chart(title: &str, prices: &[f64], moving_averages: &[f64]) -> String {
    let all = prices.iter().chain(moving_averages);
    let min = all.clone().copied().fold(f64::INFINITY, f64::min);
    let max = all.copied().fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let len = prices.len().max(moving_averages.len());
    let range = max - min;
    let scale_y = if range.is_finite() && range > 0.0 {
        plot_height / range
    } else {
        1.0
    };
    let scale_x = if len > 1 {
        plot_width / (len - 1) as f64
    } else {
        0.0
    };
    let min = if min.is_finite() { min } else { 0.0 };

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">
  <rect width="100%" height="100%" fill="white"/>
  <text x="{p:.0}" y="{ty:.0}" font-family="sans-serif" font-size="14">{title}</text>
  <line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{base:.0}" stroke="black"/>
  <line x1="{p:.0}" y1="{base:.0}" x2="{right:.0}" y2="{base:.0}" stroke="black"/>
  <polyline fill="none" stroke="#1f77b4" stroke-width="1" points="{close}"/>
  <polyline fill="none" stroke="#ff7f0e" stroke-width="1" points="{ma}"/>
</svg>
"##,
        w = WIDTH,
        h = HEIGHT,
        p = PADDING,
        ty = PADDING / 2.0,
        base = HEIGHT - PADDING,
        right = WIDTH - PADDING,
        title = escape(title),
        close = polyline(prices, min, scale_x, scale_y),
        ma = polyline(moving_averages, min, scale_x, scale_y),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Write `<dir>/<instrument id>.svg` for one report.
pub fn write_chart(dir: &Path, report: &InstrumentReport) -> Result<PathBuf, SmacrossError> {
    fs::create_dir_all(dir)?;
    let file_stem: String = report
        .row
        .instrument_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();
    let path = dir.join(format!("{}.svg", file_stem));
    let title = format!("{} {}", report.row.instrument_id, report.row.display_name);
    fs::write(
        &path,
        format_price_chart(&title, &report.prices, &report.moving_averages),
    )?;
    Ok(path)
}
