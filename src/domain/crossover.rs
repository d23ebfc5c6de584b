//! Price versus moving-average crossover detection.
//!
//! Single position at a time. A flat position opens when `price >= ma` and
//! a long position closes when `price < ma`. Touching the average therefore
//! opens but never closes. A position still open when the series ends is
//! dropped, not force-closed.

use crate::domain::error::SmacrossError;

/// One completed buy-then-sell round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    pub entry_price: f64,
    pub exit_price: f64,
}

impl Trade {
    pub fn new(entry_price: f64, exit_price: f64) -> Self {
        Self {
            entry_price,
            exit_price,
        }
    }

    pub fn profit(&self) -> f64 {
        self.exit_price - self.entry_price
    }

    /// (exit - entry) / entry. Fails instead of producing an infinite or NaN ratio.
    pub fn return_ratio(&self) -> Result<f64, SmacrossError> {
        if self.entry_price == 0.0 || !self.entry_price.is_finite() {
            return Err(SmacrossError::DegenerateArithmetic {
                reason: format!(
                    "trade entry price is {} (exit {})",
                    self.entry_price, self.exit_price
                ),
            });
        }
        let ratio = self.profit() / self.entry_price;
        if !ratio.is_finite() {
            return Err(SmacrossError::DegenerateArithmetic {
                reason: format!(
                    "return of trade {} -> {} is not finite",
                    self.entry_price, self.exit_price
                ),
            });
        }
        Ok(ratio)
    }

    pub fn is_win(&self) -> bool {
        self.exit_price > self.entry_price
    }

    pub fn is_loss(&self) -> bool {
        self.exit_price < self.entry_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long {
        entry_price: f64,
    },
}

impl Position {
    /// Advance by one (price, ma) pair. Returns the trade closed by this step, if any.
    pub fn step(&mut self, price: f64, ma: f64) -> Option<Trade> {
        let current = *self;
        match current {
            Position::Flat if price >= ma => {
                *self = Position::Long { entry_price: price };
                None
            }
            Position::Long { entry_price } if price < ma => {
                *self = Position::Flat;
                Some(Trade::new(entry_price, price))
            }
            _ => None,
        }
    }
}

/// Walk both series in lock-step and collect closed trades in exit order.
pub fn detect_trades(prices: &[f64], moving_averages: &[f64]) -> Result<Vec<Trade>, SmacrossError> {
    if prices.len() != moving_averages.len() {
        return Err(SmacrossError::LengthMismatch {
            prices: prices.len(),
            averages: moving_averages.len(),
        });
    }

    let mut position = Position::Flat;
    let trades = prices
        .iter()
        .zip(moving_averages)
        .filter_map(|(&price, &ma)| position.step(price, ma))
        .collect();

    Ok(trades)
}
