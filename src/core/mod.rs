//! Core data structures for monthly forecasting.

mod forecast;
mod time_series;

pub use forecast::Forecast;
pub use time_series::{add_months, first_of_month, months_between, TimeSeries, MONTHLY};
