//! Ordinary least squares with coefficient standard errors.
//!
//! Used by the unit-root regressions, where the test statistic is the
//! t-value of a single coefficient.

use crate::error::{ForecastError, Result};

/// Fitted least-squares regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// One coefficient per design column, in column order.
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Residual variance `rss / (n - k)`.
    pub sigma2: f64,
    /// Number of observations.
    pub n: usize,
}

impl OLSResult {
    /// t-statistic of coefficient `i`.
    pub fn t_value(&self, i: usize) -> f64 {
        match (self.coefficients.get(i), self.std_errors.get(i)) {
            (Some(&b), Some(&se)) if se > 0.0 => b / se,
            _ => f64::NAN,
        }
    }

    /// Number of estimated coefficients.
    pub fn k(&self) -> usize {
        self.coefficients.len()
    }

    /// Gaussian AIC, `n ln(rss/n) + 2k`.
    pub fn aic(&self) -> f64 {
        let n = self.n as f64;
        n * (self.rss / n).ln() + 2.0 * self.k() as f64
    }
}

/// Regress `y` on the design `columns`.
///
/// Each entry of `columns` is one regressor with the same length as `y`.
/// Include a column of ones for an intercept.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "regression needs at least one column".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    for col in columns {
        if col.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        xty[i] = dot(&columns[i], y);
        for j in 0..=i {
            let v = dot(&columns[i], &columns[j]);
            xtx[i][j] = v;
            xtx[j][i] = v;
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("design matrix is singular".into())
    })?;
    let beta = cholesky_solve(&chol, &xty);

    let mut rss = 0.0;
    for t in 0..n {
        let fitted: f64 = (0..k).map(|j| columns[j][t] * beta[j]).sum();
        rss += (y[t] - fitted).powi(2);
    }
    let sigma2 = rss / (n - k) as f64;

    let std_errors = (0..k)
        .map(|j| {
            let mut e = vec![0.0; k];
            e[j] = 1.0;
            let col = cholesky_solve(&chol, &e);
            (sigma2 * col[j]).max(0.0).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients: beta,
        std_errors,
        rss,
        sigma2,
        n,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Lower-triangular Cholesky factor, `None` if not positive definite.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let s: f64 = (0..j).map(|m| l[i][m] * l[j][m]).sum();
            if i == j {
                let d = a[i][i] - s;
                if d <= 1e-12 * scale {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (a[i][j] - s) / l[j][j];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let s: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
        z[i] = (b[i] - s) / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s: f64 = (i + 1..n).map(|j| l[j][i] * x[j]).sum();
        x[i] = (z[i] - s) / l[i][i];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_exact_line() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = ols_fit(&y, &[vec![1.0; 10], x]).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], 2.0, epsilon = 1e-9);
        assert!(fit.rss < 1e-12);
    }

    #[test]
    fn standard_errors_match_closed_form() {
        // Simple regression: se(b1) = sqrt(sigma2 / Sxx)
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![1.1, 1.9, 3.2, 3.8, 5.1, 6.0];
        let fit = ols_fit(&y, &[vec![1.0; 6], x.clone()]).unwrap();
        let mx = x.iter().sum::<f64>() / 6.0;
        let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
        assert_relative_eq!(fit.std_errors[1], (fit.sigma2 / sxx).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(fit.t_value(1), fit.coefficients[1] / fit.std_errors[1]);
    }

    #[test]
    fn singular_design_is_an_error() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let result = ols_fit(&y, &[vec![1.0; 4], vec![2.0; 4]]);
        assert!(matches!(result, Err(ForecastError::ComputationError(_))));
    }

    #[test]
    fn too_few_observations() {
        let result = ols_fit(&[1.0, 2.0], &[vec![1.0; 2], vec![0.0, 1.0]]);
        assert!(matches!(result, Err(ForecastError::InsufficientData { .. })));
    }
}
