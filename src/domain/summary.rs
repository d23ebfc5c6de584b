//! Trade statistics reduction.

use crate::domain::crossover::Trade;
use crate::domain::error::SmacrossError;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    pub returns: Vec<f64>,
    /// sum(exit - entry) / sum(entry), weighted by capital rather than averaged.
    pub aggregate_return: f64,
    /// Best per-trade return, floored at zero.
    pub best_return: f64,
    /// Worst per-trade return, capped at zero.
    pub worst_return: f64,
    pub win_count: usize,
    pub loss_count: usize,
}

impl PerformanceSummary {
    /// Reduce a non-empty trade set. `instrument` only labels the `NoSignal` error.
    pub fn compute(instrument: &str, trades: &[Trade]) -> Result<Self, SmacrossError> {
        if trades.is_empty() {
            return Err(SmacrossError::NoSignal {
                instrument: instrument.to_string(),
            });
        }

        let returns = trades
            .iter()
            .map(Trade::return_ratio)
            .collect::<Result<Vec<f64>, _>>()?;

        let total_profit: f64 = trades.iter().map(Trade::profit).sum();
        let total_capital: f64 = trades.iter().map(|t| t.entry_price).sum();
        if total_capital == 0.0 {
            return Err(SmacrossError::DegenerateArithmetic {
                reason: format!("entry prices of {} sum to zero", instrument),
            });
        }

        let aggregate_return = total_profit / total_capital;
        if !aggregate_return.is_finite() {
            return Err(SmacrossError::DegenerateArithmetic {
                reason: format!("aggregate return of {} is not finite", instrument),
            });
        }

        let best = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = returns.iter().copied().fold(f64::INFINITY, f64::min);

        Ok(Self {
            trade_count: trades.len(),
            aggregate_return,
            best_return: best.max(0.0),
            worst_return: worst.min(0.0),
            win_count: trades.iter().filter(|t| t.is_win()).count(),
            loss_count: trades.iter().filter(|t| t.is_loss()).count(),
            returns,
        })
    }

    /// (trade_count, aggregate, best, worst, wins, losses)
    pub fn as_tuple(&self) -> (usize, f64, f64, f64, usize, usize) {
        (
            self.trade_count,
            self.aggregate_return,
            self.best_return,
            self.worst_return,
            self.win_count,
            self.loss_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_losing_trade() {
        let summary = PerformanceSummary::compute("X", &[Trade::new(12.0, 9.0)]).unwrap();
        assert_eq!(summary.trade_count, 1);
        assert_relative_eq!(summary.aggregate_return, -0.25);
        assert_relative_eq!(summary.best_return, 0.0);
        assert_relative_eq!(summary.worst_return, -0.25);
        assert_eq!(summary.win_count, 0);
        assert_eq!(summary.loss_count, 1);
    }

    #[test]
    fn mixed_trades_weighted_by_capital() {
        let trades = [Trade::new(100.0, 110.0), Trade::new(50.0, 40.0)];
        let summary = PerformanceSummary::compute("X", &trades).unwrap();

        assert_relative_eq!(summary.returns[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(summary.returns[1], -0.20, epsilon = 1e-12);
        // (10 - 10) / 150, while the mean of ratios would be -0.05
        assert_relative_eq!(summary.aggregate_return, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.best_return, 0.10, epsilon = 1e-12);
        assert_relative_eq!(summary.worst_return, -0.20, epsilon = 1e-12);
        assert_eq!(summary.win_count, 1);
        assert_eq!(summary.loss_count, 1);
    }

    #[test]
    fn all_winners_worst_is_zero() {
        let trades = [Trade::new(10.0, 11.0), Trade::new(20.0, 25.0)];
        let summary = PerformanceSummary::compute("X", &trades).unwrap();
        assert_relative_eq!(summary.worst_return, 0.0);
        assert_relative_eq!(summary.best_return, 0.25, epsilon = 1e-12);
        assert_relative_eq!(summary.aggregate_return, 6.0 / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn breakeven_counts_as_neither() {
        let trades = [Trade::new(10.0, 10.0), Trade::new(10.0, 12.0)];
        let summary = PerformanceSummary::compute("X", &trades).unwrap();
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.win_count, 1);
        assert_eq!(summary.loss_count, 0);
    }

    #[test]
    fn empty_trade_set_is_no_signal() {
        let err = PerformanceSummary::compute("600000", &[]).unwrap_err();
        assert!(matches!(err, SmacrossError::NoSignal { ref instrument } if instrument == "600000"));
    }

    #[test]
    fn zero_entry_price_is_degenerate() {
        let trades = [Trade::new(10.0, 11.0), Trade::new(0.0, 1.0)];
        let err = PerformanceSummary::compute("X", &trades).unwrap_err();
        assert!(matches!(err, SmacrossError::DegenerateArithmetic { .. }));
    }

    #[test]
    fn entries_summing_to_zero_are_degenerate() {
        let trades = [Trade::new(-5.0, -4.0), Trade::new(5.0, 6.0)];
        let err = PerformanceSummary::compute("X", &trades).unwrap_err();
        assert!(
            matches!(err, SmacrossError::DegenerateArithmetic { ref reason } if reason.contains("sum to zero"))
        );
    }

    #[test]
    fn non_finite_aggregate_is_degenerate() {
        // each ratio is finite but the summed profit overflows
        let trades = [Trade::new(1.0, f64::MAX), Trade::new(1.0, f64::MAX)];
        let err = PerformanceSummary::compute("X", &trades).unwrap_err();
        assert!(
            matches!(err, SmacrossError::DegenerateArithmetic { ref reason } if reason.contains("not finite"))
        );
    }

    #[test]
    fn infinite_entry_is_degenerate() {
        let trades = [Trade::new(f64::INFINITY, 9.0)];
        let err = PerformanceSummary::compute("X", &trades).unwrap_err();
        assert!(matches!(err, SmacrossError::DegenerateArithmetic { .. }));
    }

    #[test]
    fn tuple_order() {
        let summary = PerformanceSummary::compute("X", &[Trade::new(10.0, 12.0)]).unwrap();
        let (count, aggregate, best, worst, wins, losses) = summary.as_tuple();
        assert_eq!(count, 1);
        assert_relative_eq!(aggregate, 0.2, epsilon = 1e-12);
        assert_relative_eq!(best, 0.2, epsilon = 1e-12);
        assert_relative_eq!(worst, 0.0);
        assert_eq!(wins, 1);
        assert_eq!(losses, 0);
    }
}
