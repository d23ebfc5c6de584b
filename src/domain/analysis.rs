//! Per-instrument pipeline: prices -> moving average -> trades -> report row.

use crate::domain::crossover::{self, Trade};
use crate::domain::error::SmacrossError;
use crate::domain::moving_average;
use crate::domain::price_series::{AlignedHistory, InstrumentHistory};
use crate::domain::summary::PerformanceSummary;
use chrono::NaiveDate;

/// Default moving-average window (trading days).
pub const DEFAULT_WINDOW: usize = 20;

/// One line of the output report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub instrument_id: String,
    pub display_name: String,
    pub earliest_date: NaiveDate,
    pub trade_count: usize,
    pub aggregate_return: f64,
    pub best_return: f64,
    pub worst_return: f64,
    pub win_count: usize,
    pub loss_count: usize,
}

impl ReportRow {
    fn from_summary(
        instrument_id: &str,
        display_name: &str,
        earliest_date: NaiveDate,
        summary: &PerformanceSummary,
    ) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            display_name: display_name.to_string(),
            earliest_date,
            trade_count: summary.trade_count,
            aggregate_return: summary.aggregate_return,
            best_return: summary.best_return,
            worst_return: summary.worst_return,
            win_count: summary.win_count,
            loss_count: summary.loss_count,
        }
    }
}

/// Full result for one instrument. `prices` and `moving_averages` are the
/// aligned series the simulator walked, kept for charting.
#[derive(Debug, Clone)]
pub struct InstrumentReport {
    pub row: ReportRow,
    pub summary: PerformanceSummary,
    pub trades: Vec<Trade>,
    pub prices: Vec<f64>,
    pub moving_averages: Vec<f64>,
}

/// Compute the moving average over raw history, then simulate on `prices[window..]`.
pub fn analyze_history(
    history: &InstrumentHistory,
    window: usize,
) -> Result<InstrumentReport, SmacrossError> {
    let closes = history.series.closes();
    let moving_averages = moving_average::compute(&closes, window)?;
    let prices = closes[window..].to_vec();

    evaluate(
        &history.instrument.id,
        &history.instrument.name,
        history.series.earliest_date(),
        prices,
        moving_averages,
    )
}

/// Simulate on prices that already come paired with their moving average.
pub fn analyze_aligned(history: &AlignedHistory) -> Result<InstrumentReport, SmacrossError> {
    let earliest_date =
        history
            .earliest_date()
            .ok_or_else(|| SmacrossError::InsufficientHistory {
                window: 1,
                observations: 0,
            })?;

    evaluate(
        &history.instrument.id,
        &history.instrument.name,
        earliest_date,
        history.closes(),
        history.moving_averages(),
    )
}

fn evaluate(
    instrument_id: &str,
    display_name: &str,
    earliest_date: NaiveDate,
    prices: Vec<f64>,
    moving_averages: Vec<f64>,
) -> Result<InstrumentReport, SmacrossError> {
    let trades = crossover::detect_trades(&prices, &moving_averages)?;
    let summary = PerformanceSummary::compute(instrument_id, &trades)?;
    let row = ReportRow::from_summary(instrument_id, display_name, earliest_date, &summary);

    Ok(InstrumentReport {
        row,
        summary,
        trades,
        prices,
        moving_averages,
    })
}
