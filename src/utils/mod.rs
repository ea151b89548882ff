//! Numerical helpers, accuracy metrics and cross-validation.

pub mod cross_validation;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use cross_validation::{rolling_origin, CVErrors, HorizonAccuracy, RollingOriginConfig};
pub use metrics::{calculate_metrics, mase_scale, AccuracyMetrics};
pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, quantile_normal, std_dev, variance};
