//! # retail-forecast
//!
//! Exploratory forecasting of monthly retail sales.
//!
//! The crate loads a monthly sales table, describes its trend and
//! seasonality, runs unit-root diagnostics, fits seasonal ARIMA, ETS and
//! Holt-Winters models next to simple benchmarks, and compares them on a
//! hold-out period and with rolling-origin cross-validation.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod features;
pub mod models;
pub mod report;
pub mod seasonality;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{BoxedForecaster, Forecaster};
    pub use crate::utils::{calculate_metrics, quantile_normal, AccuracyMetrics};
}
