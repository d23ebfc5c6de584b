#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::analysis::ReportRow;
use smacross::domain::error::SmacrossError;
use smacross::domain::price_series::{
    AlignedHistory, AlignedObservation, Instrument, InstrumentHistory, PriceObservation,
    PriceSeries,
};
use smacross::ports::history_port::HistoryPort;
use smacross::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct MockHistoryPort {
    pub data: HashMap<String, InstrumentHistory>,
    pub errors: HashMap<String, String>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, code: &str, closes: &[f64]) -> Self {
        self.data.insert(code.to_string(), make_history(code, closes));
        self
    }

    pub fn with_error(mut self, code: &str, message: &str) -> Self {
        self.errors.insert(code.to_string(), message.to_string());
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn fetch_history(&self, code: &str) -> Result<InstrumentHistory, SmacrossError> {
        if let Some(message) = self.errors.get(code) {
            return Err(SmacrossError::Api {
                message: message.clone(),
            });
        }
        self.data
            .get(code)
            .cloned()
            .ok_or_else(|| SmacrossError::Api {
                message: format!("unknown code {}", code),
            })
    }
}

/// Records what it was asked to write instead of touching the file system.
#[derive(Default)]
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(PathBuf, Vec<ReportRow>)>>,
}

impl ReportPort for RecordingReportPort {
    fn write(&self, rows: &[ReportRow], output_path: &Path) -> Result<(), SmacrossError> {
        self.written
            .borrow_mut()
            .push((output_path.to_path_buf(), rows.to_vec()));
        Ok(())
    }
}

pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
}

pub fn make_history(code: &str, closes: &[f64]) -> InstrumentHistory {
    let observations = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceObservation {
            date: day(i as i64),
            close,
        })
        .collect();
    InstrumentHistory {
        instrument: Instrument {
            id: code.to_string(),
            name: format!("{} Co", code),
        },
        series: PriceSeries::new(observations).unwrap(),
    }
}

pub fn make_aligned(code: &str, pairs: &[(f64, f64)]) -> AlignedHistory {
    AlignedHistory {
        instrument: Instrument {
            id: code.to_string(),
            name: format!("{} Co", code),
        },
        observations: pairs
            .iter()
            .enumerate()
            .map(|(i, &(close, moving_average))| AlignedObservation {
                date: day(i as i64),
                close,
                moving_average,
            })
            .collect(),
        first_seen: None,
    }
}

/// A saw-tooth series that crosses a short moving average repeatedly.
pub fn oscillating_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| if (i / 3) % 2 == 0 { 10.0 + i as f64 * 0.1 } else { 8.0 })
        .collect()
}
