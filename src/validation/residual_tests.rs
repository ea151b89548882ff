//! Portmanteau tests for autocorrelation left in model residuals.

use crate::features::acf;
use crate::utils::stats::chi_squared_sf;
use serde::Serialize;

/// Result of a Ljung-Box or Box-Pierce test.
#[derive(Debug, Clone, Serialize)]
pub struct PortmanteauResult {
    pub test: &'static str,
    /// Test statistic Q
    pub statistic: f64,
    pub p_value: f64,
    /// Number of autocorrelations summed
    pub lags: usize,
    /// Degrees of freedom after the fitted-parameter adjustment
    pub df: usize,
}

impl PortmanteauResult {
    /// True if the test fails to reject independence at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Default number of lags for residual checks on seasonal data:
/// `min(2m, n/5)` with at least one lag, or 10 without a season.
pub fn default_lags(n: usize, period: usize) -> usize {
    let base = if period > 1 { 2 * period } else { 10 };
    base.min(n / 5).max(1)
}

fn prepare(residuals: &[f64], lags: Option<usize>) -> Option<(Vec<f64>, usize)> {
    let finite: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.len() < 3 {
        return None;
    }
    let lags = lags
        .unwrap_or_else(|| default_lags(finite.len(), 1))
        .clamp(1, finite.len() - 1);
    Some((finite, lags))
}

fn degenerate(test: &'static str, statistic: f64, p_value: f64, lags: usize, df: usize) -> PortmanteauResult {
    PortmanteauResult {
        test,
        statistic,
        p_value,
        lags,
        df,
    }
}

/// Ljung-Box test.
///
/// `fitted_params` is subtracted from the lag count to obtain the degrees
/// of freedom (at least one). Non-finite residuals are dropped first.
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> PortmanteauResult {
    let Some((finite, lags)) = prepare(residuals, lags) else {
        return degenerate("Ljung-Box", f64::NAN, f64::NAN, 0, 0);
    };
    let n = finite.len() as f64;
    let r = acf(&finite, lags);
    let q = n * (n + 2.0)
        * (1..r.len())
            .map(|k| r[k] * r[k] / (n - k as f64))
            .sum::<f64>();
    let df = lags.saturating_sub(fitted_params).max(1);
    degenerate("Ljung-Box", q, chi_squared_sf(q, df), lags, df)
}

/// Box-Pierce test.
pub fn box_pierce(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> PortmanteauResult {
    let Some((finite, lags)) = prepare(residuals, lags) else {
        return degenerate("Box-Pierce", f64::NAN, f64::NAN, 0, 0);
    };
    let r = acf(&finite, lags);
    let q = finite.len() as f64 * r.iter().skip(1).map(|x| x * x).sum::<f64>();
    let df = lags.saturating_sub(fitted_params).max(1);
    degenerate("Box-Pierce", q, chi_squared_sf(q, df), lags, df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn white_noise(n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(42);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn white_noise_passes() {
        let r = ljung_box(&white_noise(300), Some(10), 0);
        assert_eq!(r.df, 10);
        assert!(r.is_white_noise(0.01), "{:?}", r);
    }

    #[test]
    fn autocorrelated_residuals_fail() {
        let e = white_noise(300);
        let mut x = vec![0.0; 300];
        for t in 1..300 {
            x[t] = 0.8 * x[t - 1] + e[t];
        }
        let r = ljung_box(&x, Some(10), 0);
        assert!(r.p_value < 0.001);
        assert!(!box_pierce(&x, Some(10), 0).is_white_noise(0.05));
    }

    #[test]
    fn fitted_params_reduce_df() {
        let r = ljung_box(&white_noise(100), Some(12), 3);
        assert_eq!(r.df, 9);
        let floor = ljung_box(&white_noise(100), Some(2), 5);
        assert_eq!(floor.df, 1);
    }

    #[test]
    fn ljung_box_exceeds_box_pierce() {
        let x = white_noise(60);
        let lb = ljung_box(&x, Some(6), 0);
        let bp = box_pierce(&x, Some(6), 0);
        assert!(lb.statistic > bp.statistic);
    }

    #[test]
    fn constant_residuals_are_white() {
        let r = ljung_box(&[1.0; 20], Some(4), 0);
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_residuals() {
        assert!(ljung_box(&[1.0, f64::NAN, 2.0], None, 0).statistic.is_nan());
    }

    #[test]
    fn default_lag_rule() {
        assert_eq!(default_lags(200, 12), 24);
        assert_eq!(default_lags(50, 12), 10);
        assert_eq!(default_lags(3, 12), 1);
    }
}
