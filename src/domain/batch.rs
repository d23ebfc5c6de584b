//! Parallel per-instrument fan-out.
//!
//! Every instrument runs as an independent task on a rayon pool. A failing
//! instrument is logged and recorded and never stops the rest of the batch.
//! Errors outside a single instrument (I/O, configuration) abort the batch.

use crate::domain::analysis::InstrumentReport;
use crate::domain::error::SmacrossError;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

#[derive(Debug)]
pub struct FailedInstrument {
    pub instrument_id: String,
    pub error: SmacrossError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful reports, in input order.
    pub reports: Vec<InstrumentReport>,
    pub failures: Vec<FailedInstrument>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }
}

/// Run `task` over `items` on a pool of `jobs` threads (0 picks rayon's default).
pub fn run_batch<T, I, F>(
    items: &[T],
    jobs: usize,
    instrument_id: I,
    task: F,
) -> Result<BatchOutcome, SmacrossError>
where
    T: Sync,
    I: Fn(&T) -> String + Sync,
    F: Fn(&T) -> Result<InstrumentReport, SmacrossError> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| SmacrossError::ConfigInvalid {
            section: "analysis".into(),
            key: "jobs".into(),
            reason: e.to_string(),
        })?;

    tracing::debug!(
        instruments = items.len(),
        threads = pool.current_num_threads(),
        "starting batch"
    );

    let results: Vec<(String, Result<InstrumentReport, SmacrossError>)> = pool.install(|| {
        items
            .par_iter()
            .map(|item| (instrument_id(item), task(item)))
            .collect()
    });

    let mut outcome = BatchOutcome::default();
    for (id, result) in results {
        match result {
            Ok(report) => {
                tracing::info!(
                    instrument = %id,
                    trades = report.row.trade_count,
                    "instrument evaluated"
                );
                outcome.reports.push(report);
            }
            Err(error) if !error.is_per_instrument() => {
                tracing::error!(instrument = %id, error = %error, "aborting batch");
                return Err(error);
            }
            Err(error) => {
                tracing::error!(instrument = %id, error = %error, "instrument failed");
                outcome.failures.push(FailedInstrument {
                    instrument_id: id,
                    error,
                });
            }
        }
    }

    Ok(outcome)
}
