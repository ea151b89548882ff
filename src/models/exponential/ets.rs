//! ETS (Error-Trend-Seasonal) state-space forecasting model.
//!
//! Implements the innovations state-space models of Hyndman et al. (2008)
//! with additive or multiplicative errors, no / additive / damped trend and
//! no / additive / multiplicative seasonality. Smoothing parameters and the
//! initial level and slope are estimated by maximum likelihood. The initial
//! seasonal states come from a classical decomposition of the first years.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::intervals::normal_intervals;
use crate::models::Forecaster;
use crate::seasonality::{classical_decomposition, DecompositionType};
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::std_dev;

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ErrorType {
    #[default]
    Additive,
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TrendType {
    #[default]
    None,
    Additive,
    /// Additive damped trend
    AdditiveDamped,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SeasonalType {
    #[default]
    None,
    Additive,
    Multiplicative,
}

/// ETS model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ETSSpec {
    pub error: ErrorType,
    pub trend: TrendType,
    pub seasonal: SeasonalType,
}

impl ETSSpec {
    pub fn new(error: ErrorType, trend: TrendType, seasonal: SeasonalType) -> Self {
        Self {
            error,
            trend,
            seasonal,
        }
    }

    /// ETS(A,N,N) - simple exponential smoothing.
    pub fn ann() -> Self {
        Self::new(ErrorType::Additive, TrendType::None, SeasonalType::None)
    }

    /// ETS(A,A,N) - Holt's linear method.
    pub fn aan() -> Self {
        Self::new(ErrorType::Additive, TrendType::Additive, SeasonalType::None)
    }

    /// ETS(A,A,A) - additive Holt-Winters.
    pub fn aaa() -> Self {
        Self::new(ErrorType::Additive, TrendType::Additive, SeasonalType::Additive)
    }

    /// ETS(M,A,M) - multiplicative Holt-Winters.
    pub fn mam() -> Self {
        Self::new(
            ErrorType::Multiplicative,
            TrendType::Additive,
            SeasonalType::Multiplicative,
        )
    }

    pub fn has_trend(&self) -> bool {
        !matches!(self.trend, TrendType::None)
    }

    pub fn has_seasonal(&self) -> bool {
        !matches!(self.seasonal, SeasonalType::None)
    }

    pub fn is_damped(&self) -> bool {
        matches!(self.trend, TrendType::AdditiveDamped)
    }

    /// Whether any component requires strictly positive data.
    pub fn is_multiplicative(&self) -> bool {
        self.error == ErrorType::Multiplicative || self.seasonal == SeasonalType::Multiplicative
    }

    /// Number of smoothing parameters (alpha, beta, gamma, phi).
    fn n_smoothing(&self) -> usize {
        1 + usize::from(self.has_trend())
            + usize::from(self.has_seasonal())
            + usize::from(self.is_damped())
    }
}

impl Default for ETSSpec {
    fn default() -> Self {
        Self::ann()
    }
}

impl fmt::Display for ETSSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = match self.error {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        };
        let t = match self.trend {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
        };
        let s = match self.seasonal {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        write!(f, "ETS({},{},{})", e, t, s)
    }
}

/// Smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Smoothing {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

/// Model state: level, slope and the last `m` seasonal states.
///
/// `season[i]` holds the seasonal state for observations with index
/// congruent to `i` modulo the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtsState {
    pub level: f64,
    pub slope: f64,
    pub season: Vec<f64>,
}

/// Estimated parameters and fit statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ETSFit {
    pub model: String,
    pub smoothing: Smoothing,
    pub initial: EtsState,
    pub sigma2: f64,
    pub loglik: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
}

/// Result of running the filter over the data.
struct Filtered {
    state: EtsState,
    fitted: Vec<f64>,
    errors: Vec<f64>,
    sse: f64,
    sum_log_mu: f64,
}

/// Run the state-space recursions from `init`.
///
/// Returns `None` when a multiplicative model leaves the positive region.
fn filter(
    spec: &ETSSpec,
    values: &[f64],
    period: usize,
    p: &Smoothing,
    init: &EtsState,
) -> Option<Filtered> {
    let m = period.max(1);
    let mut l = init.level;
    let mut b = init.slope;
    let mut season = init.season.clone();
    let mut fitted = Vec::with_capacity(values.len());
    let mut errors = Vec::with_capacity(values.len());
    let mut sse = 0.0;
    let mut sum_log_mu = 0.0;

    for (t, &y) in values.iter().enumerate() {
        let tb = match spec.trend {
            TrendType::None => 0.0,
            TrendType::Additive => b,
            TrendType::AdditiveDamped => p.phi * b,
        };
        let lt = l + tb;
        let s = match spec.seasonal {
            SeasonalType::None => 0.0,
            _ => season[t % m],
        };
        let mu = match spec.seasonal {
            SeasonalType::None => lt,
            SeasonalType::Additive => lt + s,
            SeasonalType::Multiplicative => lt * s,
        };
        if !mu.is_finite() {
            return None;
        }

        let e = match spec.error {
            ErrorType::Additive => y - mu,
            ErrorType::Multiplicative => {
                if mu <= 0.0 {
                    return None;
                }
                sum_log_mu += mu.ln();
                (y - mu) / mu
            }
        };

        // error-correction updates
        let (new_l, new_b, new_s) = match (spec.error, spec.seasonal) {
            (ErrorType::Additive, SeasonalType::None) => (lt + p.alpha * e, tb + p.beta * e, s),
            (ErrorType::Additive, SeasonalType::Additive) => {
                (lt + p.alpha * e, tb + p.beta * e, s + p.gamma * e)
            }
            (ErrorType::Additive, SeasonalType::Multiplicative) => {
                if s <= 0.0 || lt <= 0.0 {
                    return None;
                }
                (lt + p.alpha * e / s, tb + p.beta * e / s, s + p.gamma * e / lt)
            }
            (ErrorType::Multiplicative, SeasonalType::None) => {
                (lt * (1.0 + p.alpha * e), tb + p.beta * lt * e, s)
            }
            (ErrorType::Multiplicative, SeasonalType::Additive) => {
                let scale = lt + s;
                (
                    lt + p.alpha * scale * e,
                    tb + p.beta * scale * e,
                    s + p.gamma * scale * e,
                )
            }
            (ErrorType::Multiplicative, SeasonalType::Multiplicative) => (
                lt * (1.0 + p.alpha * e),
                tb + p.beta * lt * e,
                s * (1.0 + p.gamma * e),
            ),
        };
        l = new_l;
        b = new_b;
        if spec.has_seasonal() {
            season[t % m] = new_s;
        }

        fitted.push(mu);
        errors.push(e);
        sse += e * e;
    }

    Some(Filtered {
        state: EtsState {
            level: l,
            slope: b,
            season,
        },
        fitted,
        errors,
        sse,
        sum_log_mu,
    })
}

/// Heuristic initial states.
///
/// Seasonal states come from a classical decomposition of the first
/// (up to four) cycles; level and slope from a regression on the first ten
/// seasonally adjusted observations.
pub fn initial_states(
    values: &[f64],
    trend: TrendType,
    seasonal: SeasonalType,
    period: usize,
) -> Result<EtsState> {
    let m = period.max(1);
    let season = match seasonal {
        SeasonalType::None => Vec::new(),
        SeasonalType::Additive | SeasonalType::Multiplicative => {
            let kind = if seasonal == SeasonalType::Additive {
                DecompositionType::Additive
            } else {
                DecompositionType::Multiplicative
            };
            let window = values.len().min(4 * m).max(2 * m);
            let window = window.min(values.len());
            classical_decomposition(&values[..window], m, kind)?.seasonal_indices
        }
    };

    let adjusted: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(t, &y)| match seasonal {
            SeasonalType::None => y,
            SeasonalType::Additive => y - season[t % m],
            SeasonalType::Multiplicative => y / season[t % m],
        })
        .collect();

    let k = adjusted.len().min(10);
    let (level, slope) = if trend == TrendType::None || k < 3 {
        (adjusted[..k.max(1)].iter().sum::<f64>() / k.max(1) as f64, 0.0)
    } else {
        let t: Vec<f64> = (1..=k).map(|i| i as f64).collect();
        let fit = ols_fit(&adjusted[..k], &[vec![1.0; k], t])?;
        (fit.coefficients[0], fit.coefficients[1])
    };

    Ok(EtsState {
        level,
        slope,
        season,
    })
}

/// Parameter bounds used during estimation.
const ALPHA_BOUNDS: (f64, f64) = (1e-4, 0.9999);
const PHI_BOUNDS: (f64, f64) = (0.8, 0.98);
/// Floor for the innovation variance of a perfect fit.
const MIN_VARIANCE: f64 = 1e-300;

/// ETS state-space model.
#[derive(Debug, Clone)]
pub struct ETS {
    spec: ETSSpec,
    seasonal_period: usize,
    fixed: Option<Smoothing>,
    fit: Option<ETSFit>,
    state: Option<EtsState>,
    n: usize,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl ETS {
    pub fn new(spec: ETSSpec, seasonal_period: usize) -> Self {
        Self {
            spec,
            seasonal_period: seasonal_period.max(1),
            fixed: None,
            fit: None,
            state: None,
            n: 0,
            fitted: None,
            residuals: None,
        }
    }

    /// Use fixed smoothing parameters instead of estimating them.
    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.fixed = Some(smoothing);
        self
    }

    pub fn spec(&self) -> ETSSpec {
        self.spec
    }

    pub fn summary(&self) -> Option<&ETSFit> {
        self.fit.as_ref()
    }

    pub fn smoothing(&self) -> Option<Smoothing> {
        self.fit.as_ref().map(|f| f.smoothing)
    }

    pub fn aic(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.aic)
    }

    pub fn aicc(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.aicc)
    }

    pub fn bic(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.bic)
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.loglik)
    }

    /// Final state after the last observation.
    pub fn state(&self) -> Option<&EtsState> {
        self.state.as_ref()
    }

    /// Parameters counted in the information criteria, including initial
    /// states (m - 1 free seasonal states) and the error variance.
    fn n_estimated(&self) -> usize {
        let mut k = self.spec.n_smoothing() + 1;
        if self.spec.has_trend() {
            k += 1;
        }
        if self.spec.has_seasonal() {
            k += self.seasonal_period - 1;
        }
        k + 1
    }

    /// Map an unconstrained-ish vector onto smoothing parameters and the
    /// initial level/slope. beta and gamma are fractions of their upper
    /// bounds, so `beta < alpha` and `gamma < 1 - alpha` always hold.
    fn decode(&self, x: &[f64], base: &EtsState, scale: f64) -> (Smoothing, EtsState) {
        let mut it = x.iter().copied();
        let alpha = it.next().unwrap_or(0.5);
        let beta = if self.spec.has_trend() {
            it.next().unwrap_or(0.1) * alpha
        } else {
            0.0
        };
        let gamma = if self.spec.has_seasonal() {
            it.next().unwrap_or(0.1) * (1.0 - alpha)
        } else {
            0.0
        };
        let phi = if self.spec.is_damped() {
            it.next().unwrap_or(0.98)
        } else {
            1.0
        };
        let mut state = base.clone();
        state.level += scale * it.next().unwrap_or(0.0);
        if self.spec.has_trend() {
            state.slope += 0.1 * scale * it.next().unwrap_or(0.0);
        }
        (
            Smoothing {
                alpha,
                beta,
                gamma,
                phi,
            },
            state,
        )
    }

    fn neg_loglik(&self, values: &[f64], p: &Smoothing, init: &EtsState) -> f64 {
        match filter(&self.spec, values, self.seasonal_period, p, init) {
            Some(f) => {
                let n = values.len() as f64;
                0.5 * n * (f.sse / n).max(MIN_VARIANCE).ln() + f.sum_log_mu
            }
            None => f64::INFINITY,
        }
    }

    /// Coefficients `c_j` of the linear innovations representation.
    fn c_coefficients(&self, p: &Smoothing, horizon: usize) -> Vec<f64> {
        let m = self.seasonal_period;
        let mut c = Vec::with_capacity(horizon);
        let mut phi_sum = 0.0;
        for j in 1..horizon {
            phi_sum += match self.spec.trend {
                TrendType::None => 0.0,
                TrendType::Additive => 1.0,
                TrendType::AdditiveDamped => p.phi.powi(j as i32),
            };
            let seasonal = if self.spec.has_seasonal() && j % m == 0 {
                p.gamma
            } else {
                0.0
            };
            c.push(p.alpha + p.beta * phi_sum + seasonal);
        }
        c
    }
}

impl Default for ETS {
    fn default() -> Self {
        Self::new(ETSSpec::ann(), 1)
    }
}

impl Forecaster for ETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues(
                "ETS cannot be fitted to a series with missing values".into(),
            ));
        }
        let m = self.seasonal_period;
        if self.spec.has_seasonal() && m < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} needs a seasonal period of at least 2",
                self.spec
            )));
        }
        let needed = if self.spec.has_seasonal() {
            2 * m
        } else {
            3
        }
        .max(self.n_estimated() + 2);
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if self.spec.is_multiplicative() && values.iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} requires strictly positive data",
                self.spec
            )));
        }

        let base = initial_states(values, self.spec.trend, self.spec.seasonal, m)?;
        let scale = std_dev(values).max(1e-8);

        let (smoothing, init) = match self.fixed {
            Some(p) => (p, base),
            None => {
                let mut x0 = vec![0.5];
                let mut bounds = vec![ALPHA_BOUNDS];
                if self.spec.has_trend() {
                    x0.push(0.1);
                    bounds.push((1e-4, 0.9999));
                }
                if self.spec.has_seasonal() {
                    x0.push(0.1);
                    bounds.push((1e-4, 0.9999));
                }
                if self.spec.is_damped() {
                    x0.push(0.95);
                    bounds.push(PHI_BOUNDS);
                }
                x0.push(0.0);
                bounds.push((-5.0, 5.0));
                if self.spec.has_trend() {
                    x0.push(0.0);
                    bounds.push((-5.0, 5.0));
                }

                let config = NelderMeadConfig {
                    max_iter: 300 * x0.len(),
                    initial_step: 0.4,
                    ..Default::default()
                };
                let objective = |x: &[f64]| {
                    let (p, init) = self.decode(x, &base, scale);
                    self.neg_loglik(values, &p, &init)
                };
                let first = nelder_mead(&objective, &x0, Some(&bounds), config.clone());
                let second = nelder_mead(&objective, &first.optimal_point, Some(&bounds), config);
                let best = if second.optimal_value <= first.optimal_value {
                    second
                } else {
                    first
                };
                if !best.optimal_value.is_finite() {
                    return Err(ForecastError::ComputationError(format!(
                        "{} estimation failed to find admissible parameters",
                        self.spec
                    )));
                }
                self.decode(&best.optimal_point, &base, scale)
            }
        };

        let filtered = filter(&self.spec, values, m, &smoothing, &init).ok_or_else(|| {
            ForecastError::ComputationError(format!("{} filter diverged", self.spec))
        })?;

        let n = values.len() as f64;
        let sigma2 = (filtered.sse / n).max(MIN_VARIANCE);
        let loglik = -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
            - filtered.sum_log_mu;
        let k = self.n_estimated() as f64;
        let aic = -2.0 * loglik + 2.0 * k;
        let aicc = if n - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = aic + (n.ln() - 2.0) * k;
        debug!(model = %self.spec, aicc, alpha = smoothing.alpha, "ETS fitted");

        let residuals: Vec<f64> = values
            .iter()
            .zip(&filtered.fitted)
            .map(|(y, f)| y - f)
            .collect();

        self.n = values.len();
        self.state = Some(filtered.state);
        self.fitted = Some(filtered.fitted);
        self.residuals = Some(residuals);
        self.fit = Some(ETSFit {
            model: self.spec.to_string(),
            smoothing,
            initial: init,
            sigma2,
            loglik,
            aic,
            aicc,
            bic,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let p = self.smoothing().ok_or(ForecastError::FitRequired)?;
        let m = self.seasonal_period;

        let mut damped = 0.0;
        let point = (1..=horizon)
            .map(|h| {
                damped += match self.spec.trend {
                    TrendType::None => 0.0,
                    TrendType::Additive => 1.0,
                    TrendType::AdditiveDamped => p.phi.powi(h as i32),
                };
                let lt = state.level + damped * state.slope;
                let s = |idx: usize| state.season[idx % m];
                match self.spec.seasonal {
                    SeasonalType::None => lt,
                    SeasonalType::Additive => lt + s(self.n + h - 1),
                    SeasonalType::Multiplicative => lt * s(self.n + h - 1),
                }
            })
            .collect();
        Ok(Forecast::from_values(point))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?.point().to_vec();
        let fit = self.fit.as_ref().ok_or(ForecastError::FitRequired)?;
        let c = self.c_coefficients(&fit.smoothing, horizon);
        let sigma = fit.sigma2.sqrt();

        let mut acc = 1.0;
        let se: Vec<f64> = (0..horizon)
            .map(|h| {
                if h > 0 {
                    acc += c[h - 1] * c[h - 1];
                }
                match self.spec.error {
                    ErrorType::Additive => sigma * acc.sqrt(),
                    // relative error scaled by the forecast level
                    ErrorType::Multiplicative => point[h].abs() * sigma * acc.sqrt(),
                }
            })
            .collect();
        normal_intervals(point, &se, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ETS"
    }

    fn describe(&self) -> String {
        match &self.fit {
            Some(fit) => format!(
                "{} alpha={:.4} beta={:.4} gamma={:.4} phi={:.3} AICc={:.2}",
                self.spec,
                fit.smoothing.alpha,
                fit.smoothing.beta,
                fit.smoothing.gamma,
                fit.smoothing.phi,
                fit.aicc
            ),
            None => self.spec.to_string(),
        }
    }

    fn n_params(&self) -> usize {
        self.spec.n_smoothing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::distributions::Distribution;
    use rand::{rngs::StdRng, SeedableRng};
    use statrs::distribution::Normal;

    fn noise(n: usize, sd: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sd).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn seasonal_series(n: usize) -> Vec<f64> {
        let pattern = [0.9, 0.85, 0.95, 1.0, 1.02, 1.0, 1.05, 1.04, 0.98, 1.0, 1.06, 1.25];
        let e = noise(n, 0.01, 31);
        (0..n)
            .map(|i| 1000.0 * (1.0 + 0.005 * i as f64) * pattern[i % 12] * (1.0 + e[i]))
            .collect()
    }

    #[test]
    fn spec_display() {
        assert_eq!(ETSSpec::mam().to_string(), "ETS(M,A,M)");
        let damped = ETSSpec::new(ErrorType::Additive, TrendType::AdditiveDamped, SeasonalType::None);
        assert_eq!(damped.to_string(), "ETS(A,Ad,N)");
        assert!(damped.is_damped());
        assert!(!damped.is_multiplicative());
    }

    #[test]
    fn ses_on_constant_plus_noise_forecasts_flat() {
        let y: Vec<f64> = noise(100, 1.0, 3).iter().map(|e| 50.0 + e).collect();
        let mut model = ETS::new(ETSSpec::ann(), 1);
        model.fit(&TimeSeries::from_values(y).unwrap()).unwrap();
        let f = model.predict(5).unwrap();
        assert!(f.point().iter().all(|&v| (v - f.point()[0]).abs() < 1e-12));
        assert!((f.point()[0] - 50.0).abs() < 1.0);
        let alpha = model.smoothing().unwrap().alpha;
        assert!(alpha < 0.5, "alpha = {}", alpha);
    }

    #[test]
    fn holt_tracks_linear_trend() {
        let y: Vec<f64> = (0..60).map(|i| 10.0 + 2.0 * i as f64).collect();
        let mut model = ETS::new(ETSSpec::aan(), 1);
        model.fit(&TimeSeries::from_values(y).unwrap()).unwrap();
        let f = model.predict(3).unwrap();
        assert_relative_eq!(f.point()[0], 130.0, epsilon = 0.5);
        assert_relative_eq!(f.point()[2], 134.0, epsilon = 0.5);
    }

    #[test]
    fn multiplicative_seasonal_model_fits() {
        let y = seasonal_series(96);
        let series = TimeSeries::from_values(y.clone()).unwrap();
        let mut model = ETS::new(ETSSpec::mam(), 12);
        model.fit(&series).unwrap();

        let p = model.smoothing().unwrap();
        assert!(p.beta <= p.alpha);
        assert!(p.gamma <= 1.0 - p.alpha);

        let f = model.predict_with_intervals(12, 0.95).unwrap();
        // December peak is carried forward
        let dec = f.point()[11];
        assert!(f.point()[..11].iter().all(|&v| v < dec));
        for i in 0..12 {
            assert!(f.lower().unwrap()[i] < f.point()[i]);
            assert!(f.upper().unwrap()[i] > f.point()[i]);
        }
        let fit = model.summary().unwrap();
        assert!(fit.aicc > fit.aic);
    }

    #[test]
    fn damped_forecasts_flatten() {
        let y: Vec<f64> = (0..80).map(|i| 100.0 + 3.0 * i as f64).collect::<Vec<_>>();
        let e = noise(80, 1.0, 5);
        let y: Vec<f64> = y.iter().zip(&e).map(|(a, b)| a + b).collect();
        let spec = ETSSpec::new(ErrorType::Additive, TrendType::AdditiveDamped, SeasonalType::None);
        let mut model = ETS::new(spec, 1);
        model.fit(&TimeSeries::from_values(y).unwrap()).unwrap();
        let f = model.predict(40).unwrap();
        let early = f.point()[1] - f.point()[0];
        let late = f.point()[39] - f.point()[38];
        assert!(late < early);
        let phi = model.smoothing().unwrap().phi;
        assert!((0.8..=0.98).contains(&phi));
    }

    #[test]
    fn interval_width_grows() {
        let y = seasonal_series(72);
        let mut model = ETS::new(ETSSpec::aaa(), 12);
        model.fit(&TimeSeries::from_values(y).unwrap()).unwrap();
        let f = model.predict_with_intervals(24, 0.8).unwrap();
        let width = |i: usize| f.upper().unwrap()[i] - f.lower().unwrap()[i];
        assert!(width(23) > width(0));
    }

    #[test]
    fn fixed_smoothing_is_used() {
        let y: Vec<f64> = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0];
        let p = Smoothing {
            alpha: 1.0,
            beta: 0.0,
            gamma: 0.0,
            phi: 1.0,
        };
        let mut model = ETS::new(ETSSpec::ann(), 1).with_smoothing(p);
        model.fit(&TimeSeries::from_values(y).unwrap()).unwrap();
        // alpha = 1 reduces to the naive method
        assert_relative_eq!(model.predict(1).unwrap().point()[0], 14.0, epsilon = 1e-12);
    }

    #[test]
    fn multiplicative_needs_positive_data() {
        let y: Vec<f64> = (0..40).map(|i| i as f64 - 5.0).collect();
        let mut model = ETS::new(ETSSpec::mam(), 4);
        assert!(matches!(
            model.fit(&TimeSeries::from_values(y).unwrap()),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn short_seasonal_series_is_rejected() {
        let y = seasonal_series(20);
        let mut model = ETS::new(ETSSpec::aaa(), 12);
        assert!(matches!(
            model.fit(&TimeSeries::from_values(y).unwrap()),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
