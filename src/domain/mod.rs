//! Core domain types and logic.

pub mod price_series;
pub mod moving_average;
pub mod crossover;
pub mod summary;
pub mod analysis;
pub mod security_id;
pub mod batch;
pub mod error;
