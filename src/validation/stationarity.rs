//! Unit-root and stationarity tests, and differencing-order selection.
//!
//! The ADF test has a unit root as its null hypothesis (rejection means
//! stationary). KPSS has stationarity as its null (rejection means a unit
//! root). Both p-values are interpolated from published tables.

use crate::error::{ForecastError, Result};
use crate::seasonality::seasonal_strength;
use crate::transform::{difference, seasonal_difference};
use crate::utils::ols::ols_fit;
use serde::Serialize;
use tracing::debug;

/// Deterministic terms included in a unit-root regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Deterministic {
    /// Intercept only (level stationarity).
    #[default]
    Constant,
    /// Intercept and linear time trend.
    Trend,
}

/// Result of a stationarity test.
#[derive(Debug, Clone, Serialize)]
pub struct StationarityResult {
    pub test: &'static str,
    pub statistic: f64,
    pub p_value: f64,
    /// Lag order (ADF) or truncation lag (KPSS).
    pub lags: usize,
    /// Whether the series looks stationary at the 5% level.
    pub is_stationary: bool,
    pub critical_values: CriticalValues,
}

/// Critical values at common significance levels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CriticalValues {
    pub cv_1pct: f64,
    pub cv_5pct: f64,
    pub cv_10pct: f64,
}

const SIGNIFICANCE: f64 = 0.05;

// Fuller (1976) percentiles of the Dickey-Fuller t distribution.
const ADF_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];
const ADF_PROBS: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];
const ADF_CONSTANT: [[f64; 8]; 6] = [
    [-3.75, -3.33, -3.00, -2.62, -0.37, 0.00, 0.34, 0.72],
    [-3.58, -3.22, -2.93, -2.60, -0.40, -0.03, 0.29, 0.66],
    [-3.51, -3.17, -2.89, -2.58, -0.42, -0.05, 0.26, 0.63],
    [-3.46, -3.14, -2.88, -2.57, -0.42, -0.06, 0.24, 0.62],
    [-3.44, -3.13, -2.87, -2.57, -0.43, -0.07, 0.24, 0.61],
    [-3.43, -3.12, -2.86, -2.57, -0.44, -0.07, 0.23, 0.60],
];
const ADF_TREND: [[f64; 8]; 6] = [
    [-4.38, -3.95, -3.60, -3.24, -1.14, -0.80, -0.50, -0.15],
    [-4.15, -3.80, -3.50, -3.18, -1.19, -0.87, -0.58, -0.24],
    [-4.04, -3.73, -3.45, -3.15, -1.22, -0.90, -0.62, -0.28],
    [-3.99, -3.69, -3.43, -3.13, -1.23, -0.92, -0.64, -0.31],
    [-3.98, -3.68, -3.42, -3.13, -1.24, -0.93, -0.65, -0.32],
    [-3.96, -3.66, -3.41, -3.12, -1.25, -0.94, -0.66, -0.33],
];

// Kwiatkowski et al. (1992), Table 1.
const KPSS_PROBS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_LEVEL: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_TREND: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// Default maximum ADF lag, `floor(12 (n/100)^(1/4))`.
pub fn adf_max_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Default KPSS truncation lag, `floor(4 (n/100)^(1/4))`.
pub fn kpss_short_lag(n: usize) -> usize {
    (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

/// Augmented Dickey-Fuller test.
///
/// Regresses `dy_t` on the deterministic terms, `y_{t-1}` and `k` lagged
/// differences. With `lags = None` the order is chosen by AIC over
/// `0..=adf_max_lag(n)` on a common estimation sample, then the chosen
/// regression is refitted on all available observations.
pub fn adf_test(
    series: &[f64],
    lags: Option<usize>,
    deterministic: Deterministic,
) -> Result<StationarityResult> {
    let n = series.len();
    if n < 10 {
        return Err(ForecastError::InsufficientData { needed: 10, got: n });
    }
    let dy = difference(series, 1);
    let n_terms = match deterministic {
        Deterministic::Constant => 2,
        Deterministic::Trend => 3,
    };
    // keep at least a handful of residual degrees of freedom
    let feasible = dy.len().saturating_sub(n_terms + 5) / 2;

    let k = match lags {
        Some(k) => k.min(feasible),
        None => {
            let max_lag = adf_max_lag(n).min(feasible);
            let mut best = (0, f64::INFINITY);
            for k in 0..=max_lag {
                let aic = adf_regression(series, &dy, k, max_lag, deterministic)
                    .map(|(_, fit)| fit.aic())
                    .unwrap_or(f64::INFINITY);
                if aic < best.1 {
                    best = (k, aic);
                }
            }
            debug!(lag = best.0, max_lag, "ADF lag selected by AIC");
            best.0
        }
    };

    let (statistic, _) = adf_regression(series, &dy, k, k, deterministic)?;
    let table = match deterministic {
        Deterministic::Constant => &ADF_CONSTANT,
        Deterministic::Trend => &ADF_TREND,
    };
    let quantiles = interpolate_rows(table, n as f64);
    let p_value = interpolate_p(statistic, &quantiles, &ADF_PROBS);
    let critical_values = CriticalValues {
        cv_1pct: quantiles[0],
        cv_5pct: quantiles[2],
        cv_10pct: quantiles[3],
    };

    Ok(StationarityResult {
        test: "ADF",
        statistic,
        p_value,
        lags: k,
        is_stationary: p_value < SIGNIFICANCE,
        critical_values,
    })
}

/// Run one ADF regression using observations from `skip + 1` onward.
/// Returns the t-statistic on the lagged level and the fit.
fn adf_regression(
    series: &[f64],
    dy: &[f64],
    k: usize,
    skip: usize,
    deterministic: Deterministic,
) -> Result<(f64, crate::utils::ols::OLSResult)> {
    // dy[t] = y[t+1] - y[t]; response rows t in skip..dy.len()
    let rows: Vec<usize> = (skip..dy.len()).collect();
    let y: Vec<f64> = rows.iter().map(|&t| dy[t]).collect();

    let mut columns = vec![rows.iter().map(|&t| series[t]).collect::<Vec<f64>>()];
    columns.push(vec![1.0; rows.len()]);
    if deterministic == Deterministic::Trend {
        columns.push(rows.iter().map(|&t| (t + 1) as f64).collect());
    }
    for lag in 1..=k {
        columns.push(rows.iter().map(|&t| dy[t - lag]).collect());
    }

    let fit = ols_fit(&y, &columns)?;
    Ok((fit.t_value(0), fit))
}

/// KPSS test of level or trend stationarity.
///
/// The long-run variance uses a Bartlett kernel with truncation lag
/// `lags`, defaulting to [`kpss_short_lag`]. The p-value is interpolated
/// from the KPSS table and therefore clipped to `[0.01, 0.10]`.
pub fn kpss_test(
    series: &[f64],
    lags: Option<usize>,
    deterministic: Deterministic,
) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(ForecastError::InsufficientData { needed: 4, got: n });
    }
    let residuals = match deterministic {
        Deterministic::Constant => {
            let mean = series.iter().sum::<f64>() / n as f64;
            series.iter().map(|x| x - mean).collect::<Vec<f64>>()
        }
        Deterministic::Trend => {
            let t: Vec<f64> = (1..=n).map(|i| i as f64).collect();
            let fit = ols_fit(series, &[vec![1.0; n], t.clone()])?;
            series
                .iter()
                .zip(&t)
                .map(|(y, t)| y - fit.coefficients[0] - fit.coefficients[1] * t)
                .collect()
        }
    };

    let l = lags.unwrap_or_else(|| kpss_short_lag(n)).min(n - 1);
    let nf = n as f64;
    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / nf;
    for j in 1..=l {
        let weight = 1.0 - j as f64 / (l as f64 + 1.0);
        let gamma: f64 = residuals
            .iter()
            .skip(j)
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / nf;
        long_run += 2.0 * weight * gamma;
    }

    let mut cumsum = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|r| {
            cumsum += r;
            cumsum * cumsum
        })
        .sum::<f64>()
        / (nf * nf);

    let statistic = if long_run > 1e-300 { eta / long_run } else { 0.0 };
    let table = match deterministic {
        Deterministic::Constant => &KPSS_LEVEL,
        Deterministic::Trend => &KPSS_TREND,
    };
    let p_value = kpss_p_value(statistic, table);

    Ok(StationarityResult {
        test: "KPSS",
        statistic,
        p_value,
        lags: l,
        is_stationary: p_value >= SIGNIFICANCE,
        critical_values: CriticalValues {
            cv_1pct: table[3],
            cv_5pct: table[1],
            cv_10pct: table[0],
        },
    })
}

fn kpss_p_value(statistic: f64, table: &[f64; 4]) -> f64 {
    if statistic <= table[0] {
        return KPSS_PROBS[0];
    }
    if statistic >= table[3] {
        return KPSS_PROBS[3];
    }
    for i in 0..3 {
        if statistic <= table[i + 1] {
            let w = (statistic - table[i]) / (table[i + 1] - table[i]);
            return KPSS_PROBS[i] + w * (KPSS_PROBS[i + 1] - KPSS_PROBS[i]);
        }
    }
    KPSS_PROBS[3]
}

/// Linear interpolation of the table rows at sample size `n`.
fn interpolate_rows(table: &[[f64; 8]; 6], n: f64) -> [f64; 8] {
    if n <= ADF_SIZES[0] {
        return table[0];
    }
    for i in 0..ADF_SIZES.len() - 1 {
        if n <= ADF_SIZES[i + 1] {
            let w = (n - ADF_SIZES[i]) / (ADF_SIZES[i + 1] - ADF_SIZES[i]);
            let mut row = [0.0; 8];
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = table[i][j] + w * (table[i + 1][j] - table[i][j]);
            }
            return row;
        }
    }
    table[ADF_SIZES.len() - 1]
}

/// Interpolate a p-value from increasing `quantiles`, clipped to the table.
fn interpolate_p(statistic: f64, quantiles: &[f64; 8], probs: &[f64; 8]) -> f64 {
    if !statistic.is_finite() {
        return f64::NAN;
    }
    if statistic <= quantiles[0] {
        return probs[0];
    }
    if statistic >= quantiles[7] {
        return probs[7];
    }
    for i in 0..7 {
        if statistic <= quantiles[i + 1] {
            let w = (statistic - quantiles[i]) / (quantiles[i + 1] - quantiles[i]);
            return probs[i] + w * (probs[i + 1] - probs[i]);
        }
    }
    probs[7]
}

/// Number of first differences needed for KPSS to stop rejecting at `alpha`.
pub fn ndiffs(series: &[f64], alpha: f64, max_d: usize) -> Result<usize> {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d {
        let kpss = kpss_test(&current, None, Deterministic::Constant)?;
        debug!(d, statistic = kpss.statistic, p_value = kpss.p_value, "ndiffs KPSS");
        if kpss.p_value >= alpha {
            break;
        }
        let next = difference(&current, 1);
        if next.len() < 4 || next.iter().all(|v| (v - next[0]).abs() < 1e-12) {
            d += 1;
            break;
        }
        current = next;
        d += 1;
    }
    Ok(d)
}

/// Seasonal strength above which another seasonal difference is taken.
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Number of seasonal differences needed, using the seasonal strength rule.
pub fn nsdiffs(series: &[f64], period: usize, max_d: usize) -> Result<usize> {
    if period < 2 {
        return Ok(0);
    }
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d && current.len() >= 2 * period {
        let strength = seasonal_strength(&current, period)?;
        debug!(d, strength, "nsdiffs seasonal strength");
        if strength < SEASONAL_STRENGTH_THRESHOLD {
            break;
        }
        current = seasonal_difference(&current, 1, period);
        d += 1;
    }
    Ok(d)
}
