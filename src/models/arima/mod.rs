//! Seasonal ARIMA models and automatic order selection.
//!
//! - [`ARIMA`]: (p,d,q)(P,D,Q)\[m\] estimated by conditional sum of squares
//! - [`AutoARIMA`]: Hyndman-Khandakar stepwise search

mod auto_arima;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, CandidateModel};
pub use model::{is_invertible, is_stationary, ARIMAFit, ARIMAOrder, ARIMA};
