//! Automatic ETS model selection.
//!
//! AutoETS fits every admissible ETS specification and keeps the one with
//! the lowest information criterion.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::exponential::ets::{ETSSpec, ErrorType, SeasonalType, TrendType, ETS};
use crate::models::Forecaster;

/// Selection criterion for AutoETS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SelectionCriterion {
    /// Akaike Information Criterion
    AIC,
    /// Corrected Akaike Information Criterion
    #[default]
    AICc,
    /// Bayesian Information Criterion
    BIC,
}

/// Configuration for AutoETS.
#[derive(Debug, Clone)]
pub struct AutoETSConfig {
    pub criterion: SelectionCriterion,
    /// Seasonal period; 1 disables seasonal candidates.
    pub seasonal_period: usize,
    pub allow_multiplicative_error: bool,
    pub allow_multiplicative_seasonal: bool,
    pub allow_damped: bool,
}

impl Default for AutoETSConfig {
    fn default() -> Self {
        Self {
            criterion: SelectionCriterion::AICc,
            seasonal_period: 12,
            allow_multiplicative_error: true,
            allow_multiplicative_seasonal: true,
            allow_damped: true,
        }
    }
}

impl AutoETSConfig {
    pub fn non_seasonal() -> Self {
        Self {
            seasonal_period: 1,
            ..Default::default()
        }
    }

    pub fn with_period(period: usize) -> Self {
        Self {
            seasonal_period: period.max(1),
            ..Default::default()
        }
    }

    /// Restrict to additive models only.
    pub fn additive_only(mut self) -> Self {
        self.allow_multiplicative_error = false;
        self.allow_multiplicative_seasonal = false;
        self
    }

    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Candidate specifications admissible for data of length `n`.
    ///
    /// Seasonal candidates need at least two full cycles. Multiplicative
    /// error with additive season is numerically unstable and is skipped,
    /// as are multiplicative components when the data is not strictly
    /// positive.
    pub fn candidates(&self, n: usize, positive: bool) -> Vec<ETSSpec> {
        let mut errors = vec![ErrorType::Additive];
        if self.allow_multiplicative_error && positive {
            errors.push(ErrorType::Multiplicative);
        }
        let mut trends = vec![TrendType::None, TrendType::Additive];
        if self.allow_damped {
            trends.push(TrendType::AdditiveDamped);
        }
        let mut seasons = vec![SeasonalType::None];
        if self.seasonal_period > 1 && n >= 2 * self.seasonal_period {
            seasons.push(SeasonalType::Additive);
            if self.allow_multiplicative_seasonal && positive {
                seasons.push(SeasonalType::Multiplicative);
            }
        }

        let mut specs = Vec::new();
        for &error in &errors {
            for &trend in &trends {
                for &seasonal in &seasons {
                    if error == ErrorType::Multiplicative && seasonal == SeasonalType::Additive {
                        continue;
                    }
                    specs.push(ETSSpec::new(error, trend, seasonal));
                }
            }
        }
        specs
    }
}

/// One row of the candidate table.
#[derive(Debug, Clone, Serialize)]
pub struct ETSCandidate {
    pub spec: ETSSpec,
    pub model: String,
    /// Criterion value, `None` when the fit failed.
    pub score: Option<f64>,
}

/// Automatic ETS model selection.
#[derive(Debug, Clone)]
pub struct AutoETS {
    config: AutoETSConfig,
    selected_model: Option<ETS>,
    candidates: Vec<ETSCandidate>,
}

impl AutoETS {
    pub fn new() -> Self {
        Self::with_config(AutoETSConfig::default())
    }

    pub fn with_config(config: AutoETSConfig) -> Self {
        Self {
            config,
            selected_model: None,
            candidates: Vec::new(),
        }
    }

    pub fn non_seasonal() -> Self {
        Self::with_config(AutoETSConfig::non_seasonal())
    }

    pub fn with_period(period: usize) -> Self {
        Self::with_config(AutoETSConfig::with_period(period))
    }

    pub fn config(&self) -> &AutoETSConfig {
        &self.config
    }

    pub fn selected_spec(&self) -> Option<ETSSpec> {
        self.selected_model.as_ref().map(|m| m.spec())
    }

    pub fn selected_model(&self) -> Option<&ETS> {
        self.selected_model.as_ref()
    }

    /// Every candidate tried during the last fit, in search order.
    pub fn candidates(&self) -> &[ETSCandidate] {
        &self.candidates
    }

    fn score(&self, model: &ETS) -> Option<f64> {
        let value = match self.config.criterion {
            SelectionCriterion::AIC => model.aic(),
            SelectionCriterion::AICc => model.aicc(),
            SelectionCriterion::BIC => model.bic(),
        }?;
        value.is_finite().then_some(value)
    }

    fn fitted(&self) -> Result<&ETS> {
        self.selected_model.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for AutoETS {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        let positive = series.is_strictly_positive();
        let specs = self.config.candidates(series.len(), positive);

        self.candidates.clear();
        self.selected_model = None;
        let mut best: Option<(f64, ETS)> = None;

        for spec in specs {
            let mut model = ETS::new(spec, self.config.seasonal_period);
            let score = match model.fit(series) {
                Ok(()) => self.score(&model),
                Err(e) => {
                    debug!(model = %spec, error = %e, "ETS candidate skipped");
                    None
                }
            };
            self.candidates.push(ETSCandidate {
                spec,
                model: spec.to_string(),
                score,
            });
            if let Some(s) = score {
                if best.as_ref().map_or(true, |(b, _)| s < *b) {
                    best = Some((s, model));
                }
            }
        }

        let (score, model) = best.ok_or_else(|| {
            ForecastError::ComputationError("no ETS candidate could be fitted".into())
        })?;
        info!(
            model = %model.spec(),
            score,
            tried = self.candidates.len(),
            "AutoETS selected model"
        );
        self.selected_model = Some(model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.fitted()?.predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.fitted()?.predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoETS"
    }

    fn describe(&self) -> String {
        self.selected_model
            .as_ref()
            .map_or_else(|| self.name().to_string(), |m| m.describe())
    }

    fn n_params(&self) -> usize {
        self.selected_model.as_ref().map_or(0, |m| m.n_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 1.5 * i as f64 + ((i * 7) % 5) as f64 * 0.3)
            .collect()
    }

    fn multiplicative_seasonal(n: usize) -> Vec<f64> {
        let pattern = [0.8, 0.9, 1.0, 1.1, 1.0, 0.95, 1.0, 1.05, 1.0, 0.95, 1.05, 1.2];
        (0..n)
            .map(|i| {
                let wobble = 1.0 + 0.01 * (((i * 13) % 7) as f64 - 3.0) / 3.0;
                200.0 * 1.01f64.powi(i as i32) * pattern[i % 12] * wobble
            })
            .collect()
    }

    #[test]
    fn candidate_set_respects_exclusions() {
        let config = AutoETSConfig::default();
        let all = config.candidates(60, true);
        // 2 errors x 3 trends x 3 seasons minus the three M-error/A-season combos
        assert_eq!(all.len(), 15);
        assert!(!all
            .iter()
            .any(|s| s.error == ErrorType::Multiplicative && s.seasonal == SeasonalType::Additive));

        let negative = config.candidates(60, false);
        assert!(negative.iter().all(|s| !s.is_multiplicative()));
        assert_eq!(negative.len(), 6);

        let short = config.candidates(20, true);
        assert!(short.iter().all(|s| !s.has_seasonal()));
    }

    #[test]
    fn additive_only_config() {
        let config = AutoETSConfig::with_period(4).additive_only();
        let specs = config.candidates(40, true);
        assert!(specs.iter().all(|s| !s.is_multiplicative()));
    }

    #[test]
    fn selects_trend_model_for_trending_data() {
        let series = TimeSeries::from_values(trending(60)).unwrap();
        let mut auto = AutoETS::non_seasonal();
        auto.fit(&series).unwrap();
        let spec = auto.selected_spec().unwrap();
        assert!(spec.has_trend(), "selected {}", spec);
        assert!(!spec.has_seasonal());
        assert!(!auto.candidates().is_empty());
    }

    #[test]
    fn selects_seasonal_model_for_seasonal_data() {
        let series = TimeSeries::from_values(multiplicative_seasonal(96)).unwrap();
        let mut auto = AutoETS::with_period(12);
        auto.fit(&series).unwrap();
        let spec = auto.selected_spec().unwrap();
        assert!(spec.has_seasonal(), "selected {}", spec);

        let f = auto.predict_with_intervals(12, 0.95).unwrap();
        assert_eq!(f.horizon(), 12);
        assert!(f.point().iter().all(|v| v.is_finite()));

        let best = auto
            .candidates()
            .iter()
            .filter_map(|c| c.score)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(auto.selected_model().unwrap().aicc(), Some(best));
    }

    #[test]
    fn predict_before_fit_fails() {
        let auto = AutoETS::new();
        assert!(matches!(auto.predict(3), Err(ForecastError::FitRequired)));
    }
}
