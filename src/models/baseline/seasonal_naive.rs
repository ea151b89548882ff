//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the last cycle.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::intervals::{normal_intervals, residual_variance};
use crate::models::Forecaster;

/// Seasonal Naive forecaster.
///
/// Each forecast equals the last observation from the same season.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    last_season: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
}

impl SeasonalNaive {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            last_season: None,
            fitted: None,
            residuals: None,
            sigma2: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.period;
        if values.len() < m {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: values.len(),
            });
        }

        let fitted: Vec<f64> = (0..values.len())
            .map(|i| if i < m { f64::NAN } else { values[i - m] })
            .collect();
        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        self.sigma2 = residual_variance(&residuals, 0);
        self.last_season = Some(values[values.len() - m..].to_vec());
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let season = self.last_season.as_ref().ok_or(ForecastError::FitRequired)?;
        let point = (0..horizon).map(|h| season[h % self.period]).collect();
        Ok(Forecast::from_values(point))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?.point().to_vec();
        let sigma = self.sigma2.unwrap_or(0.0).sqrt();
        // sd grows with the number of completed cycles, sqrt(k + 1)
        let se: Vec<f64> = (0..horizon)
            .map(|h| sigma * ((h / self.period) as f64 + 1.0).sqrt())
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
        "SeasonalNaive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quarterly() -> TimeSeries {
        TimeSeries::from_values(vec![10.0, 20.0, 30.0, 40.0, 12.0, 22.0, 31.0, 43.0])
            .unwrap()
            .with_period(4)
    }

    #[test]
    fn repeats_last_cycle() {
        let mut model = SeasonalNaive::new(4);
        model.fit(&quarterly()).unwrap();
        let f = model.predict(6).unwrap();
        assert_eq!(f.point(), &[12.0, 22.0, 31.0, 43.0, 12.0, 22.0]);
    }

    #[test]
    fn residuals_are_seasonal_differences() {
        let mut model = SeasonalNaive::new(4);
        model.fit(&quarterly()).unwrap();
        let r = model.residuals().unwrap();
        assert!(r[..4].iter().all(|v| v.is_nan()));
        assert_eq!(&r[4..], &[2.0, 2.0, 1.0, 3.0]);
    }

    #[test]
    fn intervals_step_up_each_cycle() {
        let mut model = SeasonalNaive::new(4);
        model.fit(&quarterly()).unwrap();
        let f = model.predict_with_intervals(8, 0.9).unwrap();
        let width = |i: usize| f.upper().unwrap()[i] - f.lower().unwrap()[i];
        assert_relative_eq!(width(0), width(3));
        assert_relative_eq!(width(4) / width(0), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn short_series_is_rejected() {
        let short = TimeSeries::from_values(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            SeasonalNaive::new(12).fit(&short),
            Err(ForecastError::InsufficientData { needed: 12, got: 2 })
        ));
    }
}
