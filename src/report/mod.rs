//! The retail forecasting study as a reproducible report.
//!
//! [`run_report`] drives the whole analysis from a [`ReportConfig`] and
//! returns a [`Report`] that serialises to JSON or renders as text.
//!
//! # Example
//!
//! ```no_run
//! use retail_forecast::report::{run_report, ReportConfig};
//!
//! let config = ReportConfig {
//!     synthetic_years: Some(25),
//!     ..Default::default()
//! };
//! let report = run_report(&config).unwrap();
//! println!("{}", report.to_text());
//! ```

mod config;
mod pipeline;
pub mod plot;
mod render;

pub use config::{LambdaSetting, ModelKind, OrderConfig, OutputFormat, ReportConfig};
pub use pipeline::{
    build_registry, create_model, cross_validate, describe, evaluate_model, load_series,
    resolve_lambda, run_report, select_best, stationarity_report, BestModel, CVSummary,
    Correlogram, DataSummary, ModelFailure, ModelReport, Report, SeriesData, SplitSummary,
    StationarityReport, TestPair,
};
