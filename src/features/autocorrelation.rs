//! Sample autocorrelation and partial autocorrelation.

/// Sample autocorrelation function for lags `0..=max_lag`.
///
/// Uses the standard biased estimator (denominator `n` at every lag), so the
/// result is a valid positive semi-definite sequence. Entry 0 is always 1.
/// Lags at or beyond the series length are omitted.
pub fn acf(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = series.iter().map(|x| x - mean).collect();
    let c0: f64 = centered.iter().map(|x| x * x).sum();

    let last = max_lag.min(n - 1);
    (0..=last)
        .map(|k| {
            if c0 == 0.0 {
                return if k == 0 { 1.0 } else { 0.0 };
            }
            centered
                .iter()
                .skip(k)
                .zip(&centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / c0
        })
        .collect()
}

/// Partial autocorrelation for lags `1..=max_lag` (Durbin-Levinson).
///
/// Element `i` of the result is the PACF at lag `i + 1`.
pub fn pacf(series: &[f64], max_lag: usize) -> Vec<f64> {
    let rho = acf(series, max_lag);
    let max_lag = rho.len().saturating_sub(1);
    let mut result = Vec::with_capacity(max_lag);
    let mut phi_prev: Vec<f64> = Vec::new();

    for k in 1..=max_lag {
        let num = rho[k]
            - phi_prev
                .iter()
                .enumerate()
                .map(|(j, p)| p * rho[k - 1 - j])
                .sum::<f64>();
        let den = 1.0
            - phi_prev
                .iter()
                .enumerate()
                .map(|(j, p)| p * rho[j + 1])
                .sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut phi = Vec::with_capacity(k);
        for j in 0..k - 1 {
            phi.push(phi_prev[j] - phi_kk * phi_prev[k - 2 - j]);
        }
        phi.push(phi_kk);
        result.push(phi_kk);
        phi_prev = phi;
    }
    result
}

/// Approximate 95% bound for sample autocorrelations of white noise.
pub fn white_noise_bound(n: usize) -> f64 {
    if n == 0 {
        f64::NAN
    } else {
        1.96 / (n as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn acf_lag_zero_is_one() {
        let r = acf(&[1.0, 3.0, 2.0, 5.0, 4.0], 2);
        assert_eq!(r.len(), 3);
        assert_relative_eq!(r[0], 1.0);
    }

    #[test]
    fn acf_of_alternating_series_is_negative_at_lag_one() {
        let x: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let r = acf(&x, 2);
        assert!(r[1] < -0.9);
        assert!(r[2] > 0.9);
    }

    #[test]
    fn acf_truncates_to_available_lags() {
        assert_eq!(acf(&[1.0, 2.0, 3.0], 10).len(), 3);
        assert!(acf(&[], 3).is_empty());
    }

    #[test]
    fn constant_series_has_no_autocorrelation() {
        let r = acf(&[2.0; 10], 3);
        assert_eq!(r, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn pacf_first_lag_equals_acf() {
        let x: Vec<f64> = (0..50).map(|i| ((i * 7) % 11) as f64).collect();
        let r = acf(&x, 1);
        let p = pacf(&x, 3);
        assert_eq!(p.len(), 3);
        assert_relative_eq!(p[0], r[1], epsilon = 1e-12);
    }

    #[test]
    fn pacf_of_ar1_cuts_off() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let mut x = vec![0.0];
        for i in 1..400 {
            let e: f64 = rng.gen_range(-0.5..0.5);
            x.push(0.7 * x[i - 1] + e);
        }
        let p = pacf(&x, 3);
        assert!(p[0] > 0.5);
        assert!(p[1].abs() < 0.15);
        assert!(p[2].abs() < 0.15);
    }

    #[test]
    fn bound_shrinks_with_sample_size() {
        assert_relative_eq!(white_noise_bound(100), 0.196);
        assert!(white_noise_bound(0).is_nan());
    }
}
