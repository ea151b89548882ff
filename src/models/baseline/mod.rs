//! Baseline forecasting models.
//!
//! Simple methods that serve as benchmarks for the fitted models.

mod naive;
mod random_walk;
mod seasonal_naive;

pub use naive::Naive;
pub use random_walk::RandomWalkWithDrift;
pub use seasonal_naive::SeasonalNaive;
