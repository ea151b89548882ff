//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};
use crate::features::acf;
use serde::Serialize;

/// Point-forecast accuracy summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean error (bias), `mean(actual - predicted)`.
    pub me: f64,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error in percent; `None` if an actual is zero.
    pub mape: Option<f64>,
    /// Symmetric MAPE in percent.
    pub smape: f64,
    /// Mean absolute scaled error; `None` without a usable scale.
    pub mase: Option<f64>,
    /// Lag-1 autocorrelation of the errors.
    pub acf1: Option<f64>,
}

/// In-sample MAE of the seasonal naive method on `training`.
///
/// This is the MASE denominator: `mean |y_t - y_{t-m}|`. With `period` of 1
/// it falls back to the naive method. Returns `None` when the training data
/// is too short or perfectly repetitive.
pub fn mase_scale(training: &[f64], period: usize) -> Option<f64> {
    let m = period.max(1);
    if training.len() <= m {
        return None;
    }
    let scale = training
        .iter()
        .skip(m)
        .zip(training)
        .map(|(curr, prev)| (curr - prev).abs())
        .sum::<f64>()
        / (training.len() - m) as f64;
    (scale > 0.0 && scale.is_finite()).then_some(scale)
}

/// Compute accuracy metrics of `predicted` against `actual`.
///
/// `scale` is the MASE denominator, normally from [`mase_scale`] on the
/// training data the forecast was produced from.
pub fn calculate_metrics(
    actual: &[f64],
    predicted: &[f64],
    scale: Option<f64>,
) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let n = errors.len() as f64;

    let me = errors.iter().sum::<f64>() / n;
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();

    let mape = if actual.iter().any(|&a| a == 0.0) {
        None
    } else {
        Some(
            100.0
                * actual
                    .iter()
                    .zip(&errors)
                    .map(|(a, e)| (e / a).abs())
                    .sum::<f64>()
                / n,
        )
    };

    let smape = 100.0
        * actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| {
                let denom = a.abs() + p.abs();
                if denom == 0.0 {
                    0.0
                } else {
                    2.0 * (a - p).abs() / denom
                }
            })
            .sum::<f64>()
        / n;

    let mase = scale.filter(|s| *s > 0.0).map(|s| mae / s);

    let acf1 = if errors.len() > 2 {
        acf(&errors, 1).get(1).copied().filter(|v| v.is_finite())
    } else {
        None
    };

    Ok(AccuracyMetrics {
        me,
        mae,
        rmse,
        mape,
        smape,
        mase,
        acf1,
    })
}

/// Absolute percentage error of a single forecast, in percent.
pub fn ape(actual: f64, predicted: f64) -> f64 {
    if actual == 0.0 {
        f64::NAN
    } else {
        100.0 * ((actual - predicted) / actual).abs()
    }
}
