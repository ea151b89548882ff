//! Stationarity and residual diagnostics.
//!
//! # Example
//!
//! ```
//! use retail_forecast::validation::{adf_test, kpss_test, ljung_box, Deterministic};
//!
//! let series: Vec<f64> = (0..120).map(|i| ((i * 37) % 17) as f64).collect();
//! let adf = adf_test(&series, None, Deterministic::Constant).unwrap();
//! let kpss = kpss_test(&series, None, Deterministic::Constant).unwrap();
//! assert!(kpss.p_value >= 0.01 && kpss.p_value <= 0.10);
//! assert!(adf.statistic.is_finite());
//!
//! let lb = ljung_box(&series, Some(12), 0);
//! assert_eq!(lb.df, 12);
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{box_pierce, default_lags, ljung_box, PortmanteauResult};
pub use stationarity::{
    adf_max_lag, adf_test, kpss_short_lag, kpss_test, ndiffs, nsdiffs, CriticalValues,
    Deterministic, StationarityResult, SEASONAL_STRENGTH_THRESHOLD,
};
