//! Holt-Winters forecasting model.
//!
//! Also known as triple exponential smoothing, this model handles
//! data with both trend and seasonality. Smoothing parameters are chosen by
//! minimising the in-sample sum of squared one-step errors.

use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::exponential::ets::{self, EtsState, TrendType};
use crate::models::intervals::{normal_intervals, residual_variance};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// Type of seasonal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalType {
    /// Additive seasonality: y_t = l_t + b_t + s_t + e_t
    #[default]
    Additive,
    /// Multiplicative seasonality: y_t = (l_t + b_t) * s_t + e_t
    Multiplicative,
}

impl From<SeasonalType> for ets::SeasonalType {
    fn from(s: SeasonalType) -> Self {
        match s {
            SeasonalType::Additive => ets::SeasonalType::Additive,
            SeasonalType::Multiplicative => ets::SeasonalType::Multiplicative,
        }
    }
}

/// Holt-Winters forecaster.
///
/// The model equations for additive seasonality (φ = 1 without damping):
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + φb_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)φb_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_{t-1} - φb_{t-1}) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + (φ + ... + φ^h) b_t + s_{t+h-m}`
///
/// Multiplicative seasonality replaces the subtractions of the seasonal
/// state by divisions and the final sum by a product.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    phi: Option<f64>,
    seasonal_period: usize,
    seasonal_type: SeasonalType,
    damped: bool,
    optimize: bool,
    level: Option<f64>,
    trend: Option<f64>,
    /// Seasonal states indexed by position modulo the period.
    seasonals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    n: usize,
}

/// In-sample pass: final states, one-step predictions and SSE.
struct Pass {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Create a model with fixed smoothing parameters.
    pub fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        seasonal_period: usize,
        seasonal_type: SeasonalType,
    ) -> Self {
        Self {
            alpha: Some(alpha.clamp(0.0001, 0.9999)),
            beta: Some(beta.clamp(0.0001, 0.9999)),
            gamma: Some(gamma.clamp(0.0001, 0.9999)),
            phi: None,
            seasonal_period,
            seasonal_type,
            damped: false,
            optimize: false,
            level: None,
            trend: None,
            seasonals: None,
            fitted: None,
            residuals: None,
            residual_variance: None,
            n: 0,
        }
    }

    /// Create a model whose parameters are estimated from the data.
    pub fn auto(seasonal_period: usize, seasonal_type: SeasonalType) -> Self {
        Self {
            alpha: None,
            beta: None,
            gamma: None,
            optimize: true,
            ..Self::new(0.5, 0.1, 0.1, seasonal_period, seasonal_type)
        }
    }

    pub fn additive(seasonal_period: usize) -> Self {
        Self::auto(seasonal_period, SeasonalType::Additive)
    }

    pub fn multiplicative(seasonal_period: usize) -> Self {
        Self::auto(seasonal_period, SeasonalType::Multiplicative)
    }

    /// Enable a damped trend; φ is estimated in [0.8, 0.98] when optimising.
    pub fn damped(mut self) -> Self {
        self.damped = true;
        self
    }

    /// Fix the damping parameter (implies a damped trend).
    pub fn with_phi(mut self, phi: f64) -> Self {
        self.damped = true;
        self.phi = Some(phi.clamp(0.8, 0.98));
        self
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Damping parameter; 1 for an undamped trend.
    pub fn phi(&self) -> f64 {
        if self.damped {
            self.phi.unwrap_or(0.98)
        } else {
            1.0
        }
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    pub fn seasonal_type(&self) -> SeasonalType {
        self.seasonal_type
    }

    pub fn is_damped(&self) -> bool {
        self.damped
    }

    /// Seasonal states ordered by position in the cycle.
    pub fn seasonals(&self) -> Option<&[f64]> {
        self.seasonals.as_deref()
    }

    /// Starting level, slope and seasonals; these depend on the data only.
    fn initial_states(&self, values: &[f64]) -> Result<EtsState> {
        let trend = if self.damped {
            TrendType::AdditiveDamped
        } else {
            TrendType::Additive
        };
        ets::initial_states(values, trend, self.seasonal_type.into(), self.seasonal_period)
    }

    fn run(
        &self,
        values: &[f64],
        init: &EtsState,
        alpha: f64,
        beta: f64,
        gamma: f64,
        phi: f64,
    ) -> Pass {
        let m = self.seasonal_period;
        let mut level = init.level;
        let mut slope = init.slope;
        let mut seasonals = init.season.clone();
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let base = level + phi * slope;
            let s = seasonals[t % m];
            let (pred, new_level, new_season) = match self.seasonal_type {
                SeasonalType::Additive => {
                    let l = alpha * (y - s) + (1.0 - alpha) * base;
                    (base + s, l, gamma * (y - base) + (1.0 - gamma) * s)
                }
                SeasonalType::Multiplicative => {
                    let l = alpha * (y / s) + (1.0 - alpha) * base;
                    (base * s, l, gamma * (y / base) + (1.0 - gamma) * s)
                }
            };
            slope = beta * (new_level - level) + (1.0 - beta) * phi * slope;
            level = new_level;
            seasonals[t % m] = new_season;
            let e = y - pred;
            sse += e * e;
            fitted.push(pred);
        }

        Pass {
            level,
            trend: slope,
            seasonals,
            fitted,
            sse,
        }
    }

    fn sse(&self, values: &[f64], init: &EtsState, x: &[f64]) -> f64 {
        let phi = if self.damped { x[3] } else { 1.0 };
        let pass = self.run(values, init, x[0], x[1], x[2], phi);
        if pass.sse.is_finite() {
            pass.sse
        } else {
            f64::INFINITY
        }
    }

    fn damped_sum(&self, h: usize) -> f64 {
        let phi = self.phi();
        if !self.damped {
            return h as f64;
        }
        (1..=h).map(|j| phi.powi(j as i32)).sum()
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.seasonal_period;
        if m < 2 {
            return Err(ForecastError::InvalidParameter(
                "Holt-Winters needs a seasonal period of at least 2".into(),
            ));
        }
        if values.len() < 2 * m {
            return Err(ForecastError::InsufficientData {
                needed: 2 * m,
                got: values.len(),
            });
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues(
                "Holt-Winters cannot be fitted to a series with missing values".into(),
            ));
        }
        if self.seasonal_type == SeasonalType::Multiplicative && !series.is_strictly_positive() {
            return Err(ForecastError::InvalidParameter(
                "multiplicative Holt-Winters requires strictly positive data".into(),
            ));
        }

        let init = self.initial_states(values)?;
        if self.optimize {
            let mut x0 = vec![0.3, 0.05, 0.1];
            let mut bounds = vec![(0.0001, 0.9999); 3];
            if self.damped {
                x0.push(self.phi.unwrap_or(0.95));
                bounds.push((0.8, 0.98));
            }
            let config = NelderMeadConfig {
                max_iter: 2000,
                initial_step: 0.5,
                ..Default::default()
            };
            let result = nelder_mead(|x| self.sse(values, &init, x), &x0, Some(&bounds), config);
            if !result.optimal_value.is_finite() {
                return Err(ForecastError::ComputationError(
                    "Holt-Winters optimisation failed".into(),
                ));
            }
            let x = result.optimal_point;
            self.alpha = Some(x[0]);
            self.beta = Some(x[1]);
            self.gamma = Some(x[2]);
            if self.damped {
                self.phi = Some(x[3]);
            }
        }

        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;
        let beta = self.beta.ok_or(ForecastError::FitRequired)?;
        let gamma = self.gamma.ok_or(ForecastError::FitRequired)?;
        let pass = self.run(values, &init, alpha, beta, gamma, self.phi());
        debug!(alpha, beta, gamma, phi = self.phi(), sse = pass.sse, "Holt-Winters fitted");

        let residuals: Vec<f64> = values.iter().zip(&pass.fitted).map(|(y, f)| y - f).collect();
        self.residual_variance = residual_variance(&residuals, self.n_params());
        self.level = Some(pass.level);
        self.trend = Some(pass.trend);
        self.seasonals = Some(pass.seasonals);
        self.fitted = Some(pass.fitted);
        self.residuals = Some(residuals);
        self.n = values.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        let seasonals = self.seasonals.as_ref().ok_or(ForecastError::FitRequired)?;
        let m = self.seasonal_period;

        let point = (1..=horizon)
            .map(|h| {
                let base = level + self.damped_sum(h) * trend;
                let s = seasonals[(self.n + h - 1) % m];
                match self.seasonal_type {
                    SeasonalType::Additive => base + s,
                    SeasonalType::Multiplicative => base * s,
                }
            })
            .collect();
        Ok(Forecast::from_values(point))
    }

    /// Intervals from the additive-error innovations form,
    /// `σ² (1 + Σ c_j²)` with `c_j = α(1 + β Σφ^i) + γ·1{j ≡ 0 mod m}`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?.point().to_vec();
        let sigma2 = self.residual_variance.ok_or(ForecastError::FitRequired)?;
        let alpha = self.alpha.unwrap_or(0.0);
        let beta = self.beta.unwrap_or(0.0);
        let gamma = self.gamma.unwrap_or(0.0);
        let m = self.seasonal_period;

        let mut acc = 1.0;
        let se: Vec<f64> = (0..horizon)
            .map(|h| {
                if h > 0 {
                    let c = alpha * (1.0 + beta * self.damped_sum(h))
                        + if h % m == 0 { gamma * (1.0 - alpha) } else { 0.0 };
                    acc += c * c;
                }
                (sigma2 * acc).sqrt()
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
        match (self.seasonal_type, self.damped) {
            (SeasonalType::Additive, false) => "HoltWinters(additive)",
            (SeasonalType::Additive, true) => "HoltWinters(additive, damped)",
            (SeasonalType::Multiplicative, false) => "HoltWinters(multiplicative)",
            (SeasonalType::Multiplicative, true) => "HoltWinters(multiplicative, damped)",
        }
    }

    fn describe(&self) -> String {
        match (self.alpha, self.beta, self.gamma) {
            (Some(a), Some(b), Some(g)) if self.fitted.is_some() => format!(
                "{} alpha={:.4} beta={:.4} gamma={:.4} phi={:.3}",
                self.name(),
                a,
                b,
                g,
                self.phi()
            ),
            _ => self.name().to_string(),
        }
    }

    fn n_params(&self) -> usize {
        3 + usize::from(self.damped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PATTERN: [f64; 4] = [10.0, -5.0, 3.0, -8.0];

    fn additive_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 0.5 * i as f64 + PATTERN[i % 4] + ((i * 7) % 3) as f64 * 0.2)
            .collect()
    }

    fn multiplicative_series(n: usize) -> Vec<f64> {
        let pattern = [1.2, 0.8, 1.1, 0.9];
        (0..n)
            .map(|i| (100.0 + 2.0 * i as f64) * pattern[i % 4])
            .collect()
    }

    #[test]
    fn additive_recovers_pattern() {
        let ts = TimeSeries::from_values(additive_series(48)).unwrap();
        let mut model = HoltWinters::additive(4);
        model.fit(&ts).unwrap();
        let f = model.predict(4).unwrap();
        // 48 is a multiple of the period, so step one lands on the first slot
        let expected = 100.0 + 0.5 * 48.0 + PATTERN[0];
        assert_relative_eq!(f.point()[0], expected, epsilon = 2.0);
        assert!(f.point()[0] > f.point()[1]);
        assert!(f.point()[3] < f.point()[2]);
    }

    #[test]
    fn fit_starts_from_data_initial_states() {
        let values = additive_series(48);
        let ts = TimeSeries::from_values(values.clone()).unwrap();
        let mut model = HoltWinters::additive(4);
        model.fit(&ts).unwrap();

        let init = model.initial_states(&values).unwrap();
        let first = model.fitted_values().unwrap()[0];
        assert_relative_eq!(first, init.level + init.slope + init.season[0], epsilon = 1e-9);

        let params = [
            model.alpha().unwrap(),
            model.beta().unwrap(),
            model.gamma().unwrap(),
        ];
        let pass = model.run(&values, &init, params[0], params[1], params[2], 1.0);
        assert_eq!(pass.fitted.as_slice(), model.fitted_values().unwrap());
        assert_relative_eq!(model.sse(&values, &init, &params), pass.sse);
    }

    #[test]
    fn multiplicative_fits_scaled_pattern() {
        let ts = TimeSeries::from_values(multiplicative_series(40)).unwrap();
        let mut model = HoltWinters::multiplicative(4);
        model.fit(&ts).unwrap();
        let f = model.predict(4).unwrap();
        let truth: Vec<f64> = (40..44)
            .map(|i| (100.0 + 2.0 * i as f64) * [1.2, 0.8, 1.1, 0.9][i % 4])
            .collect();
        for (p, t) in f.point().iter().zip(&truth) {
            assert_relative_eq!(*p, *t, max_relative = 0.03);
        }
        assert_eq!(model.name(), "HoltWinters(multiplicative)");
    }

    #[test]
    fn damping_slows_growth() {
        let ts = TimeSeries::from_values(additive_series(48)).unwrap();
        let mut plain = HoltWinters::new(0.3, 0.1, 0.1, 4, SeasonalType::Additive);
        let mut damped = HoltWinters::new(0.3, 0.1, 0.1, 4, SeasonalType::Additive).with_phi(0.85);
        plain.fit(&ts).unwrap();
        damped.fit(&ts).unwrap();
        let p = plain.predict(24).unwrap();
        let d = damped.predict(24).unwrap();
        assert!(d.point()[23] < p.point()[23]);
        assert_relative_eq!(damped.phi(), 0.85);
    }

    #[test]
    fn estimated_parameters_are_in_bounds() {
        let ts = TimeSeries::from_values(additive_series(60)).unwrap();
        let mut model = HoltWinters::additive(4).damped();
        model.fit(&ts).unwrap();
        for p in [model.alpha(), model.beta(), model.gamma()] {
            let p = p.unwrap();
            assert!((0.0..1.0).contains(&p));
        }
        assert!((0.8..=0.98).contains(&model.phi()));
    }

    #[test]
    fn intervals_widen_with_horizon() {
        let ts = TimeSeries::from_values(additive_series(48)).unwrap();
        let mut model = HoltWinters::additive(4);
        model.fit(&ts).unwrap();
        let f = model.predict_with_intervals(8, 0.9).unwrap();
        let lower = f.lower().unwrap();
        let upper = f.upper().unwrap();
        assert!(upper[7] - lower[7] > upper[0] - lower[0]);
    }

    #[test]
    fn rejects_bad_input() {
        let short = TimeSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            HoltWinters::additive(4).fit(&short),
            Err(ForecastError::InsufficientData { .. })
        ));

        let negative = TimeSeries::from_values((0..16).map(|i| i as f64 - 8.0).collect()).unwrap();
        assert!(matches!(
            HoltWinters::multiplicative(4).fit(&negative),
            Err(ForecastError::InvalidParameter(_))
        ));

        assert!(matches!(
            HoltWinters::additive(4).predict(1),
            Err(ForecastError::FitRequired)
        ));
    }
}
