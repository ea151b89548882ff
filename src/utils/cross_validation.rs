//! Rolling-origin cross-validation.
//!
//! A fixed-size training window slides forward one origin at a time. At
//! every origin a fresh model is fitted on the window and forecasts the next
//! `horizon` months; the forecast errors are collected per horizon step.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::metrics::mase_scale;
use serde::Serialize;
use tracing::{debug, warn};

/// Configuration for rolling-origin evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingOriginConfig {
    /// Length of every training window.
    pub window: usize,
    /// Number of steps forecast from each origin.
    pub horizon: usize,
    /// Distance between successive origins.
    pub step: usize,
    /// Seasonal period used for the MASE scale.
    pub period: usize,
}

impl RollingOriginConfig {
    pub fn new(window: usize, horizon: usize) -> Self {
        Self {
            window,
            horizon,
            step: 1,
            period: 12,
        }
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.horizon == 0 || self.step == 0 || self.window == 0 {
            return Err(ForecastError::InvalidParameter(
                "window, horizon and step must be positive".into(),
            ));
        }
        if self.window >= n {
            return Err(ForecastError::InsufficientData {
                needed: self.window + 1,
                got: n,
            });
        }
        Ok(())
    }

    /// Forecast origins (index of the first forecast month) for a series of length `n`.
    pub fn origins(&self, n: usize) -> Vec<usize> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.window..n).step_by(self.step).collect()
    }
}

/// Raw errors collected over all origins for one model.
#[derive(Debug, Clone, Serialize)]
pub struct CVErrors {
    pub model: String,
    pub config: RollingOriginConfig,
    /// Index into the series of each forecast origin.
    pub origins: Vec<usize>,
    /// `errors[i][h]` = actual - forecast at origin `i`, step `h + 1`; NaN when
    /// the target lies past the end of the data or the fold failed.
    pub errors: Vec<Vec<f64>>,
    /// Matching percentage errors (`100 * e / y`).
    pub percentage_errors: Vec<Vec<f64>>,
    /// Matching scaled errors (`e / scale` with the fold's seasonal naive scale).
    pub scaled_errors: Vec<Vec<f64>>,
    /// Number of folds where fitting or forecasting failed.
    pub failed_folds: usize,
}

/// Accuracy aggregated over the non-missing errors of one horizon step (or all).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonAccuracy {
    /// Forecast step (1-based); 0 for the overall summary.
    pub horizon: usize,
    /// Number of errors aggregated.
    pub count: usize,
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
    pub mase: f64,
}

impl CVErrors {
    /// Number of forecast origins.
    pub fn n_folds(&self) -> usize {
        self.origins.len()
    }

    /// Accuracy for each horizon step `1..=horizon`.
    pub fn horizon_summary(&self) -> Vec<HorizonAccuracy> {
        (0..self.config.horizon)
            .map(|h| {
                let column = |m: &[Vec<f64>]| m.iter().map(|row| row[h]).collect::<Vec<_>>();
                summarise(
                    h + 1,
                    &column(&self.errors),
                    &column(&self.percentage_errors),
                    &column(&self.scaled_errors),
                )
            })
            .collect()
    }

    /// Accuracy across every origin and horizon step.
    pub fn overall(&self) -> HorizonAccuracy {
        let flat = |m: &[Vec<f64>]| m.iter().flatten().copied().collect::<Vec<_>>();
        summarise(
            0,
            &flat(&self.errors),
            &flat(&self.percentage_errors),
            &flat(&self.scaled_errors),
        )
    }
}

fn summarise(horizon: usize, errors: &[f64], pct: &[f64], scaled: &[f64]) -> HorizonAccuracy {
    let finite = |v: &[f64]| v.iter().copied().filter(|x| x.is_finite()).collect::<Vec<_>>();
    let e = finite(errors);
    let p = finite(pct);
    let s = finite(scaled);
    let mean_abs = |v: &[f64]| {
        if v.is_empty() {
            f64::NAN
        } else {
            v.iter().map(|x| x.abs()).sum::<f64>() / v.len() as f64
        }
    };
    let rmse = if e.is_empty() {
        f64::NAN
    } else {
        (e.iter().map(|x| x * x).sum::<f64>() / e.len() as f64).sqrt()
    };
    HorizonAccuracy {
        horizon,
        count: e.len(),
        rmse,
        mae: mean_abs(&e),
        mape: mean_abs(&p),
        mase: mean_abs(&s),
    }
}

/// Run rolling-origin evaluation of the models produced by `factory`.
///
/// A fold whose fit or forecast fails contributes a row of NaN and is
/// counted in [`CVErrors::failed_folds`]; it never aborts the run.
///
/// # Example
/// ```
/// use retail_forecast::core::TimeSeries;
/// use retail_forecast::models::baseline::SeasonalNaive;
/// use retail_forecast::utils::cross_validation::{rolling_origin, RollingOriginConfig};
///
/// let values: Vec<f64> = (0..60).map(|i| 100.0 + (i % 12) as f64).collect();
/// let series = TimeSeries::from_values(values).unwrap();
/// let config = RollingOriginConfig::new(36, 6);
/// let cv = rolling_origin(&series, &config, "snaive", || SeasonalNaive::new(12)).unwrap();
/// assert_eq!(cv.n_folds(), 24);
/// assert!(cv.overall().mae < 1e-9);
/// ```
pub fn rolling_origin<M, Factory>(
    series: &TimeSeries,
    config: &RollingOriginConfig,
    model_name: &str,
    factory: Factory,
) -> Result<CVErrors>
where
    M: Forecaster,
    Factory: Fn() -> M,
{
    let n = series.len();
    config.validate(n)?;
    let values = series.values();
    let h = config.horizon;

    let origins = config.origins(n);
    let mut errors = Vec::with_capacity(origins.len());
    let mut percentage_errors = Vec::with_capacity(origins.len());
    let mut scaled_errors = Vec::with_capacity(origins.len());
    let mut failed_folds = 0;

    for &origin in &origins {
        let train = series.slice(origin - config.window, origin)?;
        let scale = mase_scale(train.values(), config.period).unwrap_or(f64::NAN);

        let mut model = factory();
        let forecast = model.fit(&train).and_then(|_| model.predict(h));

        let mut row = vec![f64::NAN; h];
        let mut pct_row = vec![f64::NAN; h];
        let mut scaled_row = vec![f64::NAN; h];

        match forecast {
            Ok(forecast) => {
                for (j, &yhat) in forecast.point().iter().enumerate().take(h) {
                    let target = origin + j;
                    if target >= n {
                        break;
                    }
                    let e = values[target] - yhat;
                    row[j] = e;
                    if values[target] != 0.0 {
                        pct_row[j] = 100.0 * e / values[target];
                    }
                    scaled_row[j] = e / scale;
                }
            }
            Err(err) => {
                failed_folds += 1;
                warn!(model = model_name, origin, error = %err, "cross-validation fold failed");
            }
        }

        errors.push(row);
        percentage_errors.push(pct_row);
        scaled_errors.push(scaled_row);
    }

    debug!(
        model = model_name,
        folds = origins.len(),
        failed = failed_folds,
        "rolling-origin evaluation finished"
    );

    Ok(CVErrors {
        model: model_name.to_string(),
        config: config.clone(),
        origins,
        errors,
        percentage_errors,
        scaled_errors,
        failed_folds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::baseline::{Naive, SeasonalNaive};
    use approx::assert_relative_eq;

    fn linear(n: usize) -> TimeSeries {
        TimeSeries::from_values((0..n).map(|i| 10.0 + i as f64).collect()).unwrap()
    }

    #[test]
    fn origins_slide_over_the_whole_series() {
        let config = RollingOriginConfig::new(10, 3).with_step(2);
        assert_eq!(config.origins(16), vec![10, 12, 14]);
    }

    #[test]
    fn naive_on_linear_trend_has_known_errors() {
        let series = linear(20);
        let config = RollingOriginConfig::new(10, 3).with_period(1);
        let cv = rolling_origin(&series, &config, "naive", Naive::new).unwrap();

        assert_eq!(cv.n_folds(), 10);
        // naive forecast lags the trend by h steps
        assert_relative_eq!(cv.errors[0][0], 1.0);
        assert_relative_eq!(cv.errors[0][2], 3.0);
        // last origin can only evaluate one step
        assert!(cv.errors[9][1].is_nan());

        let per_h = cv.horizon_summary();
        assert_eq!(per_h.len(), 3);
        assert_eq!(per_h[0].count, 10);
        assert_eq!(per_h[2].count, 8);
        assert_relative_eq!(per_h[1].mae, 2.0);
        // scale of a unit-slope window is 1
        assert_relative_eq!(per_h[1].mase, 2.0);
    }

    #[test]
    fn overall_pools_all_errors() {
        let series = linear(20);
        let config = RollingOriginConfig::new(10, 2).with_period(1);
        let cv = rolling_origin(&series, &config, "naive", Naive::new).unwrap();
        let overall = cv.overall();
        assert_eq!(overall.horizon, 0);
        assert_eq!(overall.count, 19);
        assert_relative_eq!(overall.mae, (10.0 + 2.0 * 9.0) / 19.0, epsilon = 1e-12);
    }

    #[test]
    fn failed_folds_are_recorded_not_fatal() {
        // seasonal naive needs a full season; window of 6 is too short
        let series = linear(20);
        let config = RollingOriginConfig::new(6, 2);
        let cv = rolling_origin(&series, &config, "snaive", || SeasonalNaive::new(12)).unwrap();
        assert_eq!(cv.failed_folds, cv.n_folds());
        assert_eq!(cv.overall().count, 0);
        assert!(cv.overall().rmse.is_nan());
    }

    #[test]
    fn window_longer_than_series_is_rejected() {
        let series = linear(10);
        let config = RollingOriginConfig::new(10, 1);
        assert!(matches!(
            rolling_origin(&series, &config, "naive", Naive::new),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
