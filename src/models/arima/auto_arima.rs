//! Automatic seasonal ARIMA selection (Hyndman-Khandakar stepwise search).

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{ARIMAOrder, ARIMA};
use crate::models::Forecaster;
use crate::transform::seasonal_difference;
use crate::validation::{ndiffs, nsdiffs};

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Bound on p + q + P + Q.
    pub max_order: usize,
    /// Seasonal period (1 for non-seasonal).
    pub seasonal_period: usize,
    /// Maximum number of models visited after the initial four.
    pub max_steps: usize,
    /// KPSS significance level for choosing d.
    pub alpha: f64,
    /// Fixed differencing orders, bypassing the tests.
    pub d: Option<usize>,
    pub cap_d: Option<usize>,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_cap_p: 2,
            max_cap_q: 2,
            max_cap_d: 1,
            max_order: 5,
            seasonal_period: 12,
            max_steps: 94,
            alpha: 0.05,
            d: None,
            cap_d: None,
        }
    }
}

impl AutoARIMAConfig {
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period.max(1);
        self
    }

    /// Fix the differencing orders instead of testing for them.
    pub fn with_differencing(mut self, d: usize, cap_d: usize) -> Self {
        self.d = Some(d);
        self.cap_d = Some(cap_d);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// One model visited by the search.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateModel {
    pub order: ARIMAOrder,
    pub constant: bool,
    /// `None` when the fit failed.
    pub aicc: Option<f64>,
}

impl CandidateModel {
    pub fn label(&self) -> String {
        if self.constant {
            format!("{} with constant", self.order)
        } else {
            self.order.to_string()
        }
    }
}

/// Automatic ARIMA model selection by AICc.
///
/// Differencing orders come from [`nsdiffs`] (seasonal strength) and
/// [`ndiffs`] (KPSS). The search then starts from four models and moves one
/// order at a time while AICc improves.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected: Option<ARIMA>,
    tried: Vec<CandidateModel>,
}

impl AutoARIMA {
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected: None,
            tried: Vec::new(),
        }
    }

    /// Seasonal search with the given period and default limits.
    pub fn seasonal(period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::default().with_seasonal_period(period))
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    pub fn selected_order(&self) -> Option<ARIMAOrder> {
        self.selected.as_ref().map(|m| m.order())
    }

    /// The fitted model chosen by the search.
    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected.as_ref()
    }

    /// Every model visited, in visiting order.
    pub fn tried_models(&self) -> &[CandidateModel] {
        &self.tried
    }

    fn choose_differencing(&self, values: &[f64]) -> Result<(usize, usize)> {
        let m = self.config.seasonal_period;
        let cap_d = match self.config.cap_d {
            Some(cap_d) => cap_d,
            None if m > 1 && values.len() >= 2 * m + 2 => {
                nsdiffs(values, m, self.config.max_cap_d)?
            }
            None => 0,
        };
        let d = match self.config.d {
            Some(d) => d,
            None => {
                let w = seasonal_difference(values, cap_d, m);
                ndiffs(&w, self.config.alpha, self.config.max_d)?
            }
        };
        Ok((d, cap_d))
    }

    fn within_limits(&self, o: &ARIMAOrder) -> bool {
        let c = &self.config;
        o.p <= c.max_p
            && o.q <= c.max_q
            && o.cap_p <= c.max_cap_p
            && o.cap_q <= c.max_cap_q
            && o.p + o.q + o.cap_p + o.cap_q <= c.max_order
    }

    fn evaluate(
        &mut self,
        series: &TimeSeries,
        order: ARIMAOrder,
        constant: bool,
        seen: &mut HashSet<(ARIMAOrder, bool)>,
    ) -> Option<(f64, ARIMA)> {
        if !self.within_limits(&order) || !seen.insert((order, constant)) {
            return None;
        }
        let mut model = ARIMA::new(order).with_constant(constant);
        let result = model.fit(series).ok().and_then(|_| model.aicc());
        let aicc = result.filter(|a| a.is_finite());
        debug!(order = %order, constant, aicc = ?aicc, "AutoARIMA candidate");
        self.tried.push(CandidateModel {
            order,
            constant,
            aicc,
        });
        aicc.map(|a| (a, model))
    }

    /// Evaluate a candidate and keep it if it beats `best`.
    fn consider(
        &mut self,
        series: &TimeSeries,
        order: ARIMAOrder,
        constant: bool,
        seen: &mut HashSet<(ARIMAOrder, bool)>,
        best: &mut Option<(f64, ARIMA)>,
    ) -> bool {
        match self.evaluate(series, order, constant, seen) {
            Some((aicc, model)) if best.as_ref().map_or(true, |(b, _)| aicc < *b) => {
                *best = Some((aicc, model));
                true
            }
            _ => false,
        }
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.tried.clear();
        self.selected = None;
        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues(
                "AutoARIMA cannot be fitted to a series with missing values".into(),
            ));
        }

        let m = self.config.seasonal_period;
        let (d, cap_d) = self.choose_differencing(values)?;
        let seasonal = m > 1;
        let allow_constant = d + cap_d <= 1;
        debug!(d, cap_d, "AutoARIMA differencing orders");

        let make = |p, q, cap_p, cap_q| {
            let order = ARIMAOrder::new(p, d, q);
            if seasonal {
                order.seasonal(cap_p, cap_d, cap_q, m)
            } else {
                order
            }
        };
        let (sp, sq) = if seasonal { (1, 1) } else { (0, 0) };
        let starts = [
            make(2, 2, sp, sq),
            make(0, 0, 0, 0),
            make(1, 0, sp, 0),
            make(0, 1, 0, sq),
        ];

        let mut seen = HashSet::new();
        let mut best: Option<(f64, ARIMA)> = None;
        for order in starts {
            self.consider(series, order, allow_constant, &mut seen, &mut best);
        }
        if allow_constant {
            // the null model is also tried without a constant
            self.consider(series, make(0, 0, 0, 0), false, &mut seen, &mut best);
        }

        let mut steps = 0;
        loop {
            let Some((_, current)) = best.as_ref() else {
                break;
            };
            let o = current.order();
            let constant = current.has_constant();
            let mut neighbours: Vec<(ARIMAOrder, bool)> = Vec::new();
            let shift = |v: usize, delta: i32| -> Option<usize> {
                let shifted = v as i64 + delta as i64;
                (shifted >= 0).then_some(shifted as usize)
            };
            for (dp, dq, dcp, dcq) in [
                (-1, 0, 0, 0),
                (1, 0, 0, 0),
                (0, -1, 0, 0),
                (0, 1, 0, 0),
                (-1, -1, 0, 0),
                (1, 1, 0, 0),
                (0, 0, -1, 0),
                (0, 0, 1, 0),
                (0, 0, 0, -1),
                (0, 0, 0, 1),
                (0, 0, -1, -1),
                (0, 0, 1, 1),
            ] {
                if !seasonal && (dcp != 0 || dcq != 0) {
                    continue;
                }
                if let (Some(p), Some(q), Some(cap_p), Some(cap_q)) = (
                    shift(o.p, dp),
                    shift(o.q, dq),
                    shift(o.cap_p, dcp),
                    shift(o.cap_q, dcq),
                ) {
                    neighbours.push((make(p, q, cap_p, cap_q), constant));
                }
            }
            if allow_constant {
                neighbours.push((o, !constant));
            }

            let mut improved = false;
            for (order, c) in neighbours {
                if steps >= self.config.max_steps {
                    break;
                }
                if seen.contains(&(order, c)) || !self.within_limits(&order) {
                    continue;
                }
                steps += 1;
                if self.consider(series, order, c, &mut seen, &mut best) {
                    improved = true;
                    break;
                }
            }
            if !improved || steps >= self.config.max_steps {
                break;
            }
        }

        let (aicc, model) = best.ok_or_else(|| {
            ForecastError::ComputationError("no ARIMA candidate could be fitted".into())
        })?;
        info!(
            order = %model.order(),
            constant = model.has_constant(),
            aicc,
            candidates = self.tried.len(),
            "AutoARIMA selected model"
        );
        self.selected = Some(model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }

    fn describe(&self) -> String {
        self.selected
            .as_ref()
            .map_or_else(|| self.name().to_string(), |m| m.describe())
    }

    fn n_params(&self) -> usize {
        self.selected.as_ref().map_or(0, |m| m.n_params())
    }
}
