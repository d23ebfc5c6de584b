//! Price history retrieval port.

use crate::domain::error::SmacrossError;
use crate::domain::price_series::InstrumentHistory;

/// Source of raw daily closing prices for one instrument, keyed by bare equity code.
///
/// Implementations are shared by every batch worker thread.
pub trait HistoryPort: Send + Sync {
    fn fetch_history(&self, code: &str) -> Result<InstrumentHistory, SmacrossError>;
}
