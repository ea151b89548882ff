//! Classical moving-average decomposition.

use crate::error::{ForecastError, Result};
use crate::utils::stats::variance;
use serde::Serialize;

/// How the seasonal component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DecompositionType {
    /// `y = T + S + R`
    #[default]
    Additive,
    /// `y = T * S * R`
    Multiplicative,
}

/// Output of [`classical_decomposition`].
///
/// The trend (and so the remainder) is NaN for the first and last half
/// season, where the centred moving average is undefined.
#[derive(Debug, Clone, Serialize)]
pub struct Decomposition {
    pub kind: DecompositionType,
    pub period: usize,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
    /// One index per position in the cycle, starting at the first observation.
    pub seasonal_indices: Vec<f64>,
}

impl Decomposition {
    /// Strength of seasonality in [0, 1] (Wang, Smith & Hyndman 2006).
    ///
    /// Multiplicative decompositions are measured on the log scale.
    pub fn seasonal_strength(&self) -> f64 {
        let (s, r): (Vec<f64>, Vec<f64>) = self
            .seasonal
            .iter()
            .zip(&self.remainder)
            .filter(|(_, r)| r.is_finite())
            .map(|(&s, &r)| match self.kind {
                DecompositionType::Additive => (s, r),
                DecompositionType::Multiplicative => (s.ln(), r.ln()),
            })
            .unzip();
        strength(&s, &r)
    }

    /// Strength of trend in [0, 1].
    pub fn trend_strength(&self) -> f64 {
        let (t, r): (Vec<f64>, Vec<f64>) = self
            .trend
            .iter()
            .zip(&self.remainder)
            .filter(|(t, r)| t.is_finite() && r.is_finite())
            .map(|(&t, &r)| match self.kind {
                DecompositionType::Additive => (t, r),
                DecompositionType::Multiplicative => (t.ln(), r.ln()),
            })
            .unzip();
        strength(&t, &r)
    }
}

fn strength(component: &[f64], remainder: &[f64]) -> f64 {
    if remainder.len() < 2 {
        return 0.0;
    }
    let combined: Vec<f64> = component.iter().zip(remainder).map(|(c, r)| c + r).collect();
    let var_combined = variance(&combined);
    if !(var_combined > 1e-12) {
        return 0.0;
    }
    (1.0 - variance(remainder) / var_combined).clamp(0.0, 1.0)
}

/// Centred moving average of order `period` (2 x m for even m).
pub fn centred_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return out;
    }
    let half = period / 2;
    if period % 2 == 1 {
        for t in half..n - half {
            out[t] = series[t - half..=t + half].iter().sum::<f64>() / period as f64;
        }
    } else {
        for t in half..n - half {
            let inner: f64 = series[t - half + 1..t + half].iter().sum();
            let ends = 0.5 * (series[t - half] + series[t + half]);
            out[t] = (inner + ends) / period as f64;
        }
    }
    out
}

/// Decompose `series` into trend, seasonal and remainder.
pub fn classical_decomposition(
    series: &[f64],
    period: usize,
    kind: DecompositionType,
) -> Result<Decomposition> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(
            "decomposition needs a seasonal period of at least 2".into(),
        ));
    }
    if series.len() < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: series.len(),
        });
    }
    if kind == DecompositionType::Multiplicative && series.iter().any(|&v| v <= 0.0) {
        return Err(ForecastError::InvalidParameter(
            "multiplicative decomposition requires positive data".into(),
        ));
    }

    let trend = centred_moving_average(series, period);
    let detrended: Vec<f64> = series
        .iter()
        .zip(&trend)
        .map(|(&y, &t)| match kind {
            DecompositionType::Additive => y - t,
            DecompositionType::Multiplicative => y / t,
        })
        .collect();

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, v) in detrended.iter().enumerate() {
        if v.is_finite() {
            sums[i % period] += v;
            counts[i % period] += 1;
        }
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
        .collect();
    let centre = indices.iter().sum::<f64>() / period as f64;
    for idx in indices.iter_mut() {
        match kind {
            DecompositionType::Additive => *idx -= centre,
            DecompositionType::Multiplicative => *idx /= centre,
        }
    }

    let seasonal: Vec<f64> = (0..series.len()).map(|i| indices[i % period]).collect();
    let remainder: Vec<f64> = detrended
        .iter()
        .zip(&seasonal)
        .map(|(&d, &s)| match kind {
            DecompositionType::Additive => d - s,
            DecompositionType::Multiplicative => d / s,
        })
        .collect();

    Ok(Decomposition {
        kind,
        period,
        trend,
        seasonal,
        remainder,
        seasonal_indices: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PATTERN: [f64; 4] = [5.0, -2.0, 1.0, -4.0];

    fn additive_series(n: usize) -> Vec<f64> {
        (0..n).map(|i| 20.0 + 0.5 * i as f64 + PATTERN[i % 4]).collect()
    }

    #[test]
    fn moving_average_of_line_is_the_line() {
        let x: Vec<f64> = (0..12).map(|i| 2.0 * i as f64).collect();
        let ma = centred_moving_average(&x, 4);
        assert!(ma[0].is_nan() && ma[1].is_nan());
        assert!(ma[10].is_nan() && ma[11].is_nan());
        for t in 2..10 {
            assert_relative_eq!(ma[t], x[t], epsilon = 1e-12);
        }
        let odd = centred_moving_average(&x, 3);
        assert_relative_eq!(odd[1], 2.0);
    }

    #[test]
    fn additive_pattern_is_recovered() {
        let d = classical_decomposition(&additive_series(40), 4, DecompositionType::Additive)
            .unwrap();
        for (i, p) in PATTERN.iter().enumerate() {
            assert_relative_eq!(d.seasonal_indices[i], p, epsilon = 1e-9);
        }
        assert!(d.seasonal_strength() > 0.99);
        assert!(d.trend_strength() > 0.99);
    }

    #[test]
    fn multiplicative_indices_average_to_one() {
        let series: Vec<f64> = (0..48)
            .map(|i| (100.0 + i as f64) * [1.2, 0.8, 1.1, 0.9][i % 4])
            .collect();
        let d = classical_decomposition(&series, 4, DecompositionType::Multiplicative).unwrap();
        let mean = d.seasonal_indices.iter().sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 1.0, epsilon = 1e-12);
        assert!(d.seasonal_indices[0] > 1.1);
    }

    #[test]
    fn series_without_season_has_low_strength() {
        let series: Vec<f64> = (0..60).map(|i| ((i * 37) % 11) as f64).collect();
        let d = classical_decomposition(&series, 12, DecompositionType::Additive).unwrap();
        assert!(d.seasonal_strength() < 0.64);
    }

    #[test]
    fn short_series_is_rejected() {
        assert!(matches!(
            classical_decomposition(&[1.0; 7], 4, DecompositionType::Additive),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
