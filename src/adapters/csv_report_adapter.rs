//! CSV summary report implementing ReportPort.
//!
//! Ratios are written as percentages with two decimals, counts as integers.

use crate::domain::analysis::ReportRow;
use crate::domain::error::SmacrossError;
use crate::ports::report_port::ReportPort;
use std::path::Path;

pub const HEADER: [&str; 9] = [
    "code",
    "name",
    "earliest_date",
    "trades",
    "total_return",
    "best_return",
    "worst_return",
    "wins",
    "losses",
];

pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn to_record(row: &ReportRow) -> [String; 9] {
    [
        row.instrument_id.clone(),
        row.display_name.clone(),
        row.earliest_date.format("%Y-%m-%d").to_string(),
        row.trade_count.to_string(),
        format_percent(row.aggregate_return),
        format_percent(row.best_return),
        format_percent(row.worst_return),
        row.win_count.to_string(),
        row.loss_count.to_string(),
    ]
}

/// Render rows to CSV text, header included.
pub fn render(rows: &[ReportRow]) -> Result<String, SmacrossError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_err = |e: csv::Error| SmacrossError::DataFormat {
        reason: format!("failed to encode report: {}", e),
    };

    writer.write_record(HEADER).map_err(to_err)?;
    for row in rows {
        writer.write_record(to_record(row)).map_err(to_err)?;
    }

    let bytes = writer.into_inner().map_err(|e| SmacrossError::DataFormat {
        reason: format!("failed to flush report: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| SmacrossError::DataFormat {
        reason: format!("report is not valid UTF-8: {}", e),
    })
}

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, rows: &[ReportRow], output_path: &Path) -> Result<(), SmacrossError> {
        let content = render(rows)?;
        std::fs::write(output_path, content)?;
        tracing::info!(path = %output_path.display(), rows = rows.len(), "report written");
        Ok(())
    }
}
