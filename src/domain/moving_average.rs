//! Trailing simple moving average.
//!
//! O(n) via differences of the running cumulative sum.
//! Output index `j` corresponds to price index `i = j + window` and holds the
//! mean of `prices[i - window + 1 ..= i]`, so the output has
//! `prices.len() - window` values and lines up with `prices[window..]`.

use crate::domain::error::SmacrossError;

pub fn compute(prices: &[f64], window: usize) -> Result<Vec<f64>, SmacrossError> {
    if window == 0 || window > prices.len() {
        return Err(SmacrossError::InsufficientHistory {
            window,
            observations: prices.len(),
        });
    }

    let mut cumsum = Vec::with_capacity(prices.len());
    let mut running = 0.0_f64;
    for &price in prices {
        running += price;
        cumsum.push(running);
    }

    let divisor = window as f64;
    Ok((window..prices.len())
        .map(|i| (cumsum[i] - cumsum[i - window]) / divisor)
        .collect())
}
