//! Forecasting models.

mod boxcox;
pub(crate) mod intervals;
mod traits;

pub mod arima;
pub mod baseline;
pub mod exponential;

pub use boxcox::{BoxCoxForecaster, LambdaChoice};
pub use traits::{BoxedForecaster, Forecaster, ModelRegistry, ModelSpec};
