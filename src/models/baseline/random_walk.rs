//! Random walk with drift.
//!
//! Forecasts the last value plus a drift term equal to the average change.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::intervals::{normal_intervals, residual_variance};
use crate::models::Forecaster;

/// Random walk with drift forecaster.
///
/// The forecast is `y_hat[T+h] = y[T] + h * drift` where drift is
/// `(y[T] - y[1]) / (T - 1)`.
#[derive(Debug, Clone, Default)]
pub struct RandomWalkWithDrift {
    last_value: Option<f64>,
    drift: Option<f64>,
    n: usize,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
}

impl RandomWalkWithDrift {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated drift per period.
    pub fn drift(&self) -> Option<f64> {
        self.drift
    }
}

impl Forecaster for RandomWalkWithDrift {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let n = values.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }

        let drift = (values[n - 1] - values[0]) / (n - 1) as f64;
        let fitted: Vec<f64> = (0..n)
            .map(|i| if i == 0 { f64::NAN } else { values[i - 1] + drift })
            .collect();
        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        self.sigma2 = residual_variance(&residuals, 1);
        self.last_value = Some(values[n - 1]);
        self.drift = Some(drift);
        self.n = n;
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let last = self.last_value.ok_or(ForecastError::FitRequired)?;
        let drift = self.drift.ok_or(ForecastError::FitRequired)?;
        let point = (1..=horizon).map(|h| last + h as f64 * drift).collect();
        Ok(Forecast::from_values(point))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?.point().to_vec();
        let sigma = self.sigma2.unwrap_or(0.0).sqrt();
        // drift estimation error adds the h/T term
        let t = self.n as f64;
        let se: Vec<f64> = (1..=horizon)
            .map(|h| {
                let h = h as f64;
                sigma * (h * (1.0 + h / t)).sqrt()
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
        "Drift"
    }

    fn n_params(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn drift_is_average_change() {
        let ts = TimeSeries::from_values(vec![10.0, 13.0, 12.0, 19.0]).unwrap();
        let mut model = RandomWalkWithDrift::new();
        model.fit(&ts).unwrap();
        assert_relative_eq!(model.drift().unwrap(), 3.0);
        assert_eq!(model.predict(2).unwrap().point(), &[22.0, 25.0]);
    }

    #[test]
    fn residuals_sum_to_zero() {
        let ts = TimeSeries::from_values(vec![5.0, 7.0, 6.0, 10.0, 9.0, 13.0]).unwrap();
        let mut model = RandomWalkWithDrift::new();
        model.fit(&ts).unwrap();
        let total: f64 = model.residuals().unwrap()[1..].iter().sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn intervals_contain_point() {
        let ts = TimeSeries::from_values(vec![5.0, 7.0, 6.0, 10.0, 9.0, 13.0]).unwrap();
        let mut model = RandomWalkWithDrift::new();
        model.fit(&ts).unwrap();
        let f = model.predict_with_intervals(5, 0.8).unwrap();
        for i in 0..5 {
            assert!(f.lower().unwrap()[i] < f.point()[i]);
            assert!(f.upper().unwrap()[i] > f.point()[i]);
        }
    }

    #[test]
    fn needs_two_observations() {
        let ts = TimeSeries::from_values(vec![5.0]).unwrap();
        assert!(RandomWalkWithDrift::new().fit(&ts).is_err());
    }
}
