//! Normal prediction intervals shared by the models.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::utils::stats::interval_z;

/// Reject interval levels outside the open unit interval.
pub fn check_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {}",
            level
        )))
    }
}

/// Build `point ± z * se` intervals at coverage `level`.
pub fn normal_intervals(point: Vec<f64>, se: &[f64], level: f64) -> Result<Forecast> {
    check_level(level)?;
    if point.len() != se.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: point.len(),
            got: se.len(),
        });
    }
    let z = interval_z(level);
    let lower = point.iter().zip(se).map(|(p, s)| p - z * s).collect();
    let upper = point.iter().zip(se).map(|(p, s)| p + z * s).collect();
    Ok(Forecast::from_values_with_intervals(point, lower, upper, level))
}

/// Mean squared value of the finite residuals.
pub fn residual_variance(residuals: &[f64], n_params: usize) -> Option<f64> {
    let finite: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    let dof = finite.len().checked_sub(n_params).filter(|&d| d > 0)?;
    Some(finite.iter().map(|r| r * r).sum::<f64>() / dof as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn intervals_are_symmetric() {
        let f = normal_intervals(vec![10.0, 20.0], &[1.0, 2.0], 0.95).unwrap();
        let lower = f.lower().unwrap();
        let upper = f.upper().unwrap();
        assert_relative_eq!(upper[0] - 10.0, 10.0 - lower[0]);
        assert_relative_eq!(upper[1] - 20.0, 2.0 * 1.959964, epsilon = 1e-5);
        assert_eq!(f.level(), Some(0.95));
    }

    #[test]
    fn bad_level_is_rejected() {
        assert!(normal_intervals(vec![1.0], &[1.0], 1.0).is_err());
        assert!(normal_intervals(vec![1.0], &[1.0], 0.0).is_err());
        assert!(normal_intervals(vec![1.0], &[1.0, 2.0], 0.8).is_err());
    }

    #[test]
    fn residual_variance_skips_nan() {
        let v = residual_variance(&[f64::NAN, 1.0, -1.0, 2.0], 1).unwrap();
        assert_relative_eq!(v, 3.0);
        assert!(residual_variance(&[f64::NAN, 1.0], 1).is_none());
    }
}
