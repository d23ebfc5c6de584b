//! Price history representation.
//!
//! `PriceSeries` holds closing prices sorted ascending by date with unique
//! dates. `AlignedHistory` carries closing prices that already come paired
//! with a precomputed moving average.

use crate::domain::error::SmacrossError;
use chrono::NaiveDate;

/// Identifier and display name, passed through to the report untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    /// Sorts by date and keeps the last observation seen for a repeated date.
    pub fn new(mut observations: Vec<PriceObservation>) -> Result<Self, SmacrossError> {
        if observations.is_empty() {
            return Err(SmacrossError::InsufficientHistory {
                window: 1,
                observations: 0,
            });
        }

        // stable sort keeps input order within a date, so the last one wins below
        observations.sort_by_key(|o| o.date);
        let mut deduped: Vec<PriceObservation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }

        Ok(Self {
            observations: deduped,
        })
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn earliest_date(&self) -> NaiveDate {
        self.observations[0].date
    }
}

/// Live-retrieval input: one instrument and its raw closing prices.
#[derive(Debug, Clone)]
pub struct InstrumentHistory {
    pub instrument: Instrument,
    pub series: PriceSeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedObservation {
    pub date: NaiveDate,
    pub close: f64,
    pub moving_average: f64,
}

/// CSV-ingestion input: closing prices already paired with their moving average.
#[derive(Debug, Clone)]
pub struct AlignedHistory {
    pub instrument: Instrument,
    pub observations: Vec<AlignedObservation>,
    /// First raw date seen for the instrument, including warm-up rows that
    /// had no moving average yet and so are absent from `observations`.
    pub first_seen: Option<NaiveDate>,
}

impl AlignedHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn moving_averages(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.moving_average).collect()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        let first_aligned = self.observations.first().map(|o| o.date);
        match (self.first_seen, first_aligned) {
            (Some(seen), Some(aligned)) => Some(seen.min(aligned)),
            (seen, aligned) => seen.or(aligned),
        }
    }
}
