//! Exponential smoothing models.
//!
//! - ETS (Error-Trend-Seasonal) state-space framework
//! - AutoETS (automatic model selection)
//! - Holt-Winters (additive and multiplicative seasonality)

mod auto_ets;
mod ets;
mod holt_winters;

pub use auto_ets::{AutoETS, AutoETSConfig, ETSCandidate, SelectionCriterion};
pub use ets::{
    initial_states, ETSFit, ETSSpec, ErrorType, EtsState, SeasonalType as ETSSeasonalType,
    Smoothing, TrendType, ETS,
};
pub use holt_winters::{HoltWinters, SeasonalType};
