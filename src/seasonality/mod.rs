//! Seasonal structure of monthly series.
//!
//! - classical moving-average decomposition and strength measures
//! - seasonal plot rows and monthly sub-series

mod decompose;
mod profile;

pub use decompose::{
    centred_moving_average, classical_decomposition, Decomposition, DecompositionType,
};
pub use profile::{seasonal_profile, subseries, SeasonalProfile, SeasonalYear};

use crate::error::Result;

/// Seasonal strength of `series` from an additive classical decomposition.
pub fn seasonal_strength(series: &[f64], period: usize) -> Result<f64> {
    Ok(classical_decomposition(series, period, DecompositionType::Additive)?.seasonal_strength())
}
