//! Box-Cox power transformation.
//!
//! Retail sales grow roughly exponentially and their seasonal swings scale
//! with the level. A Box-Cox transform stabilises the variance before
//! fitting additive models.

use crate::error::{ForecastError, Result};

/// Method used to choose lambda automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LambdaMethod {
    /// Guerrero (1993): minimise the coefficient of variation of
    /// `sd / mean^(1 - lambda)` across seasonal sub-series.
    #[default]
    Guerrero,
    /// Profile log-likelihood of a normal model on the transformed data.
    LogLikelihood,
}

/// Search interval for lambda.
pub const LAMBDA_LOWER: f64 = -1.0;
pub const LAMBDA_UPPER: f64 = 2.0;

/// Box-Cox transform of a single value. NaN for non-positive input.
pub fn boxcox_value(x: f64, lambda: f64) -> f64 {
    if x <= 0.0 {
        f64::NAN
    } else if lambda.abs() < 1e-10 {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse transform of a single value.
pub fn inv_boxcox_value(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < 1e-10 {
        y.exp()
    } else {
        let base = lambda * y + 1.0;
        if base <= 0.0 {
            // below the transform's range; the limit of the inverse is 0
            if lambda > 0.0 {
                0.0
            } else {
                f64::NAN
            }
        } else {
            base.powf(1.0 / lambda)
        }
    }
}

/// Transform a series. Fails on non-positive data.
pub fn boxcox(series: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if let Some(bad) = series.iter().find(|&&x| x <= 0.0 || !x.is_finite()) {
        return Err(ForecastError::InvalidParameter(format!(
            "Box-Cox requires strictly positive finite data, found {}",
            bad
        )));
    }
    Ok(series.iter().map(|&x| boxcox_value(x, lambda)).collect())
}

/// Invert [`boxcox`].
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| inv_boxcox_value(y, lambda))
        .collect()
}

/// Choose lambda for `series` with seasonal `period`.
pub fn boxcox_lambda(series: &[f64], period: usize, method: LambdaMethod) -> Result<f64> {
    if series.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "Box-Cox lambda requires strictly positive data".into(),
        ));
    }
    let objective: Box<dyn Fn(f64) -> f64> = match method {
        LambdaMethod::Guerrero => {
            let groups = subseries_stats(series, period.max(2));
            if groups.len() < 2 {
                return Err(ForecastError::InsufficientData {
                    needed: 2 * period.max(2),
                    got: series.len(),
                });
            }
            Box::new(move |lambda| guerrero_cv(&groups, lambda))
        }
        LambdaMethod::LogLikelihood => {
            if series.len() < 3 {
                return Err(ForecastError::InsufficientData {
                    needed: 3,
                    got: series.len(),
                });
            }
            let data = series.to_vec();
            Box::new(move |lambda| -profile_loglik(&data, lambda))
        }
    };
    Ok(minimise_on_interval(&*objective, LAMBDA_LOWER, LAMBDA_UPPER))
}

/// Mean and standard deviation of consecutive non-overlapping blocks.
fn subseries_stats(series: &[f64], period: usize) -> Vec<(f64, f64)> {
    series
        .chunks_exact(period)
        .map(|block| {
            let m = block.iter().sum::<f64>() / period as f64;
            let v = block.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (period - 1) as f64;
            (m, v.sqrt())
        })
        .collect()
}

fn guerrero_cv(groups: &[(f64, f64)], lambda: f64) -> f64 {
    let ratios: Vec<f64> = groups
        .iter()
        .map(|&(m, s)| s / m.powf(1.0 - lambda))
        .collect();
    let k = ratios.len() as f64;
    let mean = ratios.iter().sum::<f64>() / k;
    let sd = (ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (k - 1.0)).sqrt();
    if mean == 0.0 {
        f64::INFINITY
    } else {
        sd / mean
    }
}

fn profile_loglik(series: &[f64], lambda: f64) -> f64 {
    let n = series.len() as f64;
    let t: Vec<f64> = series.iter().map(|&x| boxcox_value(x, lambda)).collect();
    let mean = t.iter().sum::<f64>() / n;
    let var = t.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if var <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    -0.5 * n * var.ln() + (lambda - 1.0) * log_sum
}

/// Grid search followed by golden-section refinement.
fn minimise_on_interval(f: &dyn Fn(f64) -> f64, lo: f64, hi: f64) -> f64 {
    let steps = 300;
    let width = (hi - lo) / steps as f64;
    let mut best = lo;
    let mut best_val = f64::INFINITY;
    for i in 0..=steps {
        let x = lo + width * i as f64;
        let v = f(x);
        if v < best_val {
            best_val = v;
            best = x;
        }
    }

    let mut a = (best - width).max(lo);
    let mut b = (best + width).min(hi);
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    for _ in 0..60 {
        let c = b - ratio * (b - a);
        let d = a + ratio * (b - a);
        if f(c) < f(d) {
            b = d;
        } else {
            a = c;
        }
    }
    let refined = (a + b) / 2.0;
    if f(refined) <= best_val {
        refined
    } else {
        best
    }
}
