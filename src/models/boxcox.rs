//! Forecasting on the Box-Cox scale.

use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::transform::{boxcox, boxcox_lambda, inv_boxcox_value, LambdaMethod};

/// How the wrapper picks lambda.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LambdaChoice {
    /// Guerrero's method on each training series.
    Auto,
    Fixed(f64),
}

/// Wraps a forecaster so it is fitted on Box-Cox transformed data.
///
/// Point forecasts and interval bounds are back-transformed, so the point
/// forecast is the median rather than the mean on the original scale.
/// Fitted values and residuals are reported on the original scale.
///
/// # Example
///
/// ```
/// use retail_forecast::core::TimeSeries;
/// use retail_forecast::models::baseline::SeasonalNaive;
/// use retail_forecast::models::{BoxCoxForecaster, Forecaster, LambdaChoice};
///
/// let values: Vec<f64> = (0..36).map(|i| 100.0 * 1.02f64.powi(i) * (1.0 + (i % 12) as f64 / 20.0)).collect();
/// let series = TimeSeries::from_values(values).unwrap().with_period(12);
///
/// let mut model = BoxCoxForecaster::new(SeasonalNaive::new(12), LambdaChoice::Fixed(0.0));
/// model.fit(&series).unwrap();
/// let forecast = model.predict(12).unwrap();
/// assert!((forecast.point()[0] - series.values()[24]).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct BoxCoxForecaster<F> {
    inner: F,
    choice: LambdaChoice,
    lambda: Option<f64>,
    name: String,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl<F: Forecaster> BoxCoxForecaster<F> {
    pub fn new(inner: F, choice: LambdaChoice) -> Self {
        let name = format!("{}+BoxCox", inner.name());
        Self {
            inner,
            choice,
            lambda: None,
            name,
            fitted: None,
            residuals: None,
        }
    }

    /// Override the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lambda used by the last fit.
    pub fn lambda(&self) -> Option<f64> {
        self.lambda
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Forecaster> Forecaster for BoxCoxForecaster<F> {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let lambda = match self.choice {
            LambdaChoice::Fixed(l) => l,
            LambdaChoice::Auto => {
                boxcox_lambda(series.values(), series.period(), LambdaMethod::Guerrero)?
            }
        };
        let transformed = series.with_values(boxcox(series.values(), lambda)?)?;
        self.inner.fit(&transformed)?;
        debug!(model = self.inner.name(), lambda, "fitted on Box-Cox scale");

        let fitted: Vec<f64> = self
            .inner
            .fitted_values()
            .ok_or(ForecastError::FitRequired)?
            .iter()
            .map(|&v| inv_boxcox_value(v, lambda))
            .collect();
        let residuals = series
            .values()
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        self.lambda = Some(lambda);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let lambda = self.lambda.ok_or(ForecastError::FitRequired)?;
        Ok(self
            .inner
            .predict(horizon)?
            .map(|v| inv_boxcox_value(v, lambda)))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let lambda = self.lambda.ok_or(ForecastError::FitRequired)?;
        Ok(self
            .inner
            .predict_with_intervals(horizon, level)?
            .map(|v| inv_boxcox_value(v, lambda)))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        match self.lambda {
            Some(lambda) => format!("{}, Box-Cox lambda={:.3}", self.inner.describe(), lambda),
            None => self.inner.describe(),
        }
    }

    fn n_params(&self) -> usize {
        self.inner.n_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::baseline::{Naive, RandomWalkWithDrift};
    use approx::assert_relative_eq;

    fn growth(n: usize) -> TimeSeries {
        TimeSeries::from_values((0..n).map(|i| 50.0 * 1.05f64.powi(i as i32)).collect())
            .unwrap()
    }

    #[test]
    fn log_drift_extrapolates_exponential_growth() {
        let mut model =
            BoxCoxForecaster::new(RandomWalkWithDrift::new(), LambdaChoice::Fixed(0.0));
        model.fit(&growth(30)).unwrap();
        let f = model.predict(2).unwrap();
        assert_relative_eq!(f.point()[0], 50.0 * 1.05f64.powi(30), max_relative = 1e-9);
        assert_relative_eq!(f.point()[1], 50.0 * 1.05f64.powi(31), max_relative = 1e-9);
        assert_eq!(model.name(), "Drift+BoxCox");
    }

    #[test]
    fn bounds_are_back_transformed() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + 10.0 * ((i * 7) % 5) as f64)
            .collect();
        let series = TimeSeries::from_values(values).unwrap();
        let mut model = BoxCoxForecaster::new(Naive::new(), LambdaChoice::Fixed(0.5));
        model.fit(&series).unwrap();
        let f = model.predict_with_intervals(6, 0.9).unwrap();
        let lower = f.lower().unwrap();
        let upper = f.upper().unwrap();
        for i in 0..6 {
            assert!(lower[i] < f.point()[i] && f.point()[i] < upper[i]);
        }
        // back-transformed intervals are skewed upwards
        assert!(upper[5] - f.point()[5] > f.point()[5] - lower[5]);
    }

    #[test]
    fn residuals_are_on_original_scale() {
        let series = growth(20);
        let mut fixed = BoxCoxForecaster::new(Naive::new(), LambdaChoice::Fixed(1.0));
        fixed.fit(&series).unwrap();
        let residuals = fixed.residuals().unwrap();
        assert_relative_eq!(residuals[1], series.values()[1] - series.values()[0], epsilon = 1e-9);
    }

    #[test]
    fn auto_lambda_for_seasonal_series() {
        let values: Vec<f64> = (0..48)
            .map(|i| 100.0 * 1.03f64.powi(i) * (1.0 + 0.3 * ((i % 12) as f64 / 11.0)))
            .collect();
        let series = TimeSeries::from_values(values).unwrap().with_period(12);
        let mut model = BoxCoxForecaster::new(Naive::new(), LambdaChoice::Auto);
        model.fit(&series).unwrap();
        let lambda = model.lambda().unwrap();
        assert!((-1.0..=2.0).contains(&lambda));
    }

    #[test]
    fn non_positive_data_is_rejected() {
        let series = TimeSeries::from_values(vec![1.0, 0.0, 2.0, 3.0]).unwrap();
        let mut model = BoxCoxForecaster::new(Naive::new(), LambdaChoice::Fixed(0.0));
        assert!(model.fit(&series).is_err());
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
    }
}
