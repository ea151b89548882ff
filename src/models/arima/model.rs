//! Seasonal ARIMA(p,d,q)(P,D,Q)[s] estimated by conditional sum of squares.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::intervals::normal_intervals;
use crate::models::Forecaster;
use crate::transform::{difference, difference_polynomial, integrate, poly_mul, seasonal_difference};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, std_dev};

/// Model order (p, d, q)(P, D, Q)[s].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ARIMAOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl ARIMAOrder {
    /// Non-seasonal order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p: 0,
            cap_d: 0,
            cap_q: 0,
            s: 1,
        }
    }

    /// Add a seasonal part with period `s`.
    pub fn seasonal(mut self, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        self.cap_p = cap_p;
        self.cap_d = cap_d;
        self.cap_q = cap_q;
        self.s = s.max(1);
        self
    }

    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// Observations consumed by differencing.
    pub fn diff_len(&self) -> usize {
        self.d + self.cap_d * self.s
    }

    /// Highest lag of the expanded AR polynomial.
    pub fn ar_lag(&self) -> usize {
        self.p + self.cap_p * self.s
    }

    /// Highest lag of the expanded MA polynomial.
    pub fn ma_lag(&self) -> usize {
        self.q + self.cap_q * self.s
    }

    /// Whether a constant may be included (d + D <= 1).
    pub fn allows_constant(&self) -> bool {
        self.d + self.cap_d <= 1
    }
}

impl Default for ARIMAOrder {
    fn default() -> Self {
        Self::new(1, 1, 1).seasonal(0, 1, 1, 12)
    }
}

impl fmt::Display for ARIMAOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}

/// Estimated coefficients and fit statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ARIMAFit {
    pub order: String,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub sar: Vec<f64>,
    pub sma: Vec<f64>,
    /// Mean (d + D = 0) or drift (d + D = 1) of the differenced series.
    pub constant: Option<f64>,
    pub sigma2: f64,
    pub loglik: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    /// Observations contributing to the sum of squares.
    pub n_used: usize,
}

/// Seasonal ARIMA forecaster.
///
/// For the differenced series `w_t = (1-B)^d (1-B^s)^D y_t` the model is
/// `phi(B) Phi(B^s) (w_t - mu) = theta(B) Theta(B^s) e_t`. Coefficients are
/// found by minimising the conditional sum of squares with Nelder-Mead,
/// rejecting non-stationary or non-invertible polynomials.
#[derive(Debug, Clone)]
pub struct ARIMA {
    order: ARIMAOrder,
    include_constant: bool,
    fit: Option<ARIMAFit>,
    /// Expanded AR coefficients `a_k`, k = 1..: w_t - mu = sum a_k (w_{t-k} - mu) + ...
    ar_full: Vec<f64>,
    /// Expanded MA coefficients `b_k`, k = 1..
    ma_full: Vec<f64>,
    mu: f64,
    history: Vec<f64>,
    differenced: Vec<f64>,
    innovations: Vec<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl ARIMA {
    pub fn new(order: ARIMAOrder) -> Self {
        Self {
            order,
            include_constant: true,
            fit: None,
            ar_full: Vec::new(),
            ma_full: Vec::new(),
            mu: 0.0,
            history: Vec::new(),
            differenced: Vec::new(),
            innovations: Vec::new(),
            fitted: None,
            residuals: None,
        }
    }

    /// Non-seasonal ARIMA(p, d, q).
    pub fn non_seasonal(p: usize, d: usize, q: usize) -> Self {
        Self::new(ARIMAOrder::new(p, d, q))
    }

    /// Request or suppress the constant. It is only ever used when d + D <= 1.
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    pub fn order(&self) -> ARIMAOrder {
        self.order
    }

    pub fn has_constant(&self) -> bool {
        self.include_constant && self.order.allows_constant()
    }

    /// Coefficients and information criteria after fitting.
    pub fn summary(&self) -> Option<&ARIMAFit> {
        self.fit.as_ref()
    }

    pub fn aicc(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.aicc)
    }

    pub fn aic(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.aic)
    }

    pub fn bic(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.bic)
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.sigma2)
    }

    fn n_coefficients(&self) -> usize {
        let o = &self.order;
        o.p + o.q + o.cap_p + o.cap_q + usize::from(self.has_constant())
    }

    /// Split a parameter vector into its polynomial parts.
    fn unpack<'a>(&self, params: &'a [f64]) -> Params<'a> {
        let o = &self.order;
        let (ar, rest) = params.split_at(o.p);
        let (sar, rest) = rest.split_at(o.cap_p);
        let (ma, rest) = rest.split_at(o.q);
        let (sma, rest) = rest.split_at(o.cap_q);
        Params {
            ar,
            sar,
            ma,
            sma,
            mu: rest.first().copied(),
        }
    }

    fn expand(&self, p: &Params<'_>) -> (Vec<f64>, Vec<f64>) {
        let s = self.order.s;
        let ar_poly = poly_mul(&lag_poly(p.ar, 1, -1.0), &lag_poly(p.sar, s, -1.0));
        let ma_poly = poly_mul(&lag_poly(p.ma, 1, 1.0), &lag_poly(p.sma, s, 1.0));
        let ar_full = ar_poly.iter().skip(1).map(|c| -c).collect();
        let ma_full = ma_poly.iter().skip(1).copied().collect();
        (ar_full, ma_full)
    }

    fn admissible(p: &Params<'_>) -> bool {
        is_stationary(p.ar) && is_stationary(p.sar) && is_invertible(p.ma) && is_invertible(p.sma)
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::new(ARIMAOrder::default())
    }
}

struct Params<'a> {
    ar: &'a [f64],
    sar: &'a [f64],
    ma: &'a [f64],
    sma: &'a [f64],
    mu: Option<f64>,
}

/// `1 + sign * sum c_i B^(i * lag)` as ascending coefficients.
fn lag_poly(coefs: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * lag + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * lag] = sign * c;
    }
    poly
}

/// Stationarity of `1 - sum phi_i B^i` by the step-down recursion: every
/// implied partial autocorrelation must lie strictly inside (-1, 1).
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 - 1e-6 {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - r * r;
        let prev: Vec<f64> = (0..k - 1).map(|j| (a[j] + r * a[k - 2 - j]) / denom).collect();
        a = prev;
    }
    true
}

/// Invertibility of `1 + sum theta_i B^i`.
pub fn is_invertible(theta: &[f64]) -> bool {
    let negated: Vec<f64> = theta.iter().map(|t| -t).collect();
    is_stationary(&negated)
}

/// Conditional innovations of `w` given expanded polynomials.
///
/// Innovations before `start` are taken as zero.
fn innovations(w: &[f64], ar: &[f64], ma: &[f64], mu: f64, start: usize) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut pred = 0.0;
        for (k, a) in ar.iter().enumerate() {
            pred += a * (w[t - 1 - k] - mu);
        }
        for (k, b) in ma.iter().enumerate() {
            if t > k {
                pred += b * e[t - 1 - k];
            }
        }
        e[t] = (w[t] - mu) - pred;
    }
    e
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues(
                "ARIMA cannot be fitted to a series with missing values".into(),
            ));
        }
        let o = self.order;
        if o.cap_d > 0 && o.s < 2 {
            return Err(ForecastError::InvalidParameter(
                "seasonal differencing needs a seasonal period of at least 2".into(),
            ));
        }

        let w = difference(&seasonal_difference(values, o.cap_d, o.s), o.d);
        let start = o.ar_lag();
        let k = self.n_coefficients();
        let needed = o.diff_len() + start + k + 2;
        if values.len() < needed || w.len() <= start + k + 1 {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w_mean = mean(&w);
        let w_sd = std_dev(&w).max(1e-8);
        let n_arma = k - usize::from(self.has_constant());
        let n_used = (w.len() - start) as f64;

        // the constant is searched as a standardised offset from the sample mean
        let objective = |params: &[f64]| -> f64 {
            let p = self.unpack(params);
            if !Self::admissible(&p) {
                return f64::INFINITY;
            }
            let mu = p.mu.map_or(0.0, |u| w_mean + w_sd * u);
            let (ar, ma) = self.expand(&p);
            let e = innovations(&w, &ar, &ma, mu, start);
            let css: f64 = e[start..].iter().map(|x| x * x).sum();
            0.5 * n_used * (css / n_used).ln()
        };

        let mut initial = vec![0.0; k];
        let config = NelderMeadConfig {
            max_iter: 400 * (k + 1),
            initial_step: 0.4,
            ..Default::default()
        };
        let mut best = nelder_mead(&objective, &initial, None, config.clone());
        if k > 0 {
            // restart from the optimum to escape a collapsed simplex
            initial.copy_from_slice(&best.optimal_point);
            let second = nelder_mead(&objective, &initial, None, config);
            if second.optimal_value <= best.optimal_value {
                best = second;
            }
        }
        if !best.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{} estimation did not find admissible coefficients",
                o
            )));
        }

        let params = best.optimal_point;
        let p = self.unpack(&params);
        let mu = p.mu.map_or(0.0, |u| w_mean + w_sd * u);
        let (ar_full, ma_full) = self.expand(&p);
        let e = innovations(&w, &ar_full, &ma_full, mu, start);
        let css: f64 = e[start..].iter().map(|x| x * x).sum();
        let sigma2 = css / n_used;
        let loglik = -0.5 * n_used * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let n_par = (k + 1) as f64;
        let aic = -2.0 * loglik + 2.0 * n_par;
        let aicc = if n_used - n_par - 1.0 > 0.0 {
            aic + 2.0 * n_par * (n_par + 1.0) / (n_used - n_par - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = aic + (n_used.ln() - 2.0) * n_par;

        let fit = ARIMAFit {
            order: o.to_string(),
            ar: p.ar.to_vec(),
            ma: p.ma.to_vec(),
            sar: p.sar.to_vec(),
            sma: p.sma.to_vec(),
            constant: p.mu.map(|_| mu),
            sigma2,
            loglik,
            aic,
            aicc,
            bic,
            n_used: n_used as usize,
        };
        debug!(order = %o, aicc, sigma2, iterations = best.iterations, "ARIMA fitted");

        // one-step errors on y equal those on w, aligned after differencing
        let offset = values.len() - w.len();
        let mut residuals = vec![f64::NAN; values.len()];
        for t in start..w.len() {
            residuals[offset + t] = e[t];
        }
        let fitted = values.iter().zip(&residuals).map(|(y, r)| y - r).collect();

        self.ar_full = ar_full;
        self.ma_full = ma_full;
        self.mu = mu;
        self.history = values.to_vec();
        self.differenced = w;
        self.innovations = e;
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        if self.fit.is_none() {
            return Err(ForecastError::FitRequired);
        }
        let mut w = self.differenced.clone();
        let mut e = self.innovations.clone();
        let n = w.len();
        for _ in 0..horizon {
            let t = w.len();
            let mut pred = self.mu;
            for (k, a) in self.ar_full.iter().enumerate() {
                pred += a * (w[t - 1 - k] - self.mu);
            }
            for (k, b) in self.ma_full.iter().enumerate().take(t) {
                pred += b * e[t - 1 - k];
            }
            w.push(pred);
            e.push(0.0);
        }

        let o = &self.order;
        let poly = difference_polynomial(o.d, o.cap_d, o.s);
        Ok(Forecast::from_values(integrate(&w[n..], &self.history, &poly)))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?.point().to_vec();
        let sigma2 = self.sigma2().ok_or(ForecastError::FitRequired)?;
        let psi = self.psi_weights(horizon);
        let mut acc = 0.0;
        let se: Vec<f64> = psi
            .iter()
            .map(|p| {
                acc += p * p;
                (sigma2 * acc).sqrt()
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
        "ARIMA"
    }

    fn describe(&self) -> String {
        let constant = match (self.has_constant(), self.order.d + self.order.cap_d) {
            (false, _) => "",
            (true, 0) => " with non-zero mean",
            (true, _) => " with drift",
        };
        match self.aicc() {
            Some(aicc) => format!("{}{} AICc={:.2}", self.order, constant, aicc),
            None => format!("{}{}", self.order, constant),
        }
    }

    fn n_params(&self) -> usize {
        self.n_coefficients()
    }
}

impl ARIMA {
    /// First `h` psi-weights of the integrated model, psi_0 = 1.
    pub fn psi_weights(&self, h: usize) -> Vec<f64> {
        let o = &self.order;
        let mut ar_poly = vec![1.0];
        ar_poly.extend(self.ar_full.iter().map(|a| -a));
        let full = poly_mul(&ar_poly, &difference_polynomial(o.d, o.cap_d, o.s));
        let phi: Vec<f64> = full.iter().skip(1).map(|c| -c).collect();

        let mut psi = Vec::with_capacity(h);
        for j in 0..h {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut v = self.ma_full.get(j - 1).copied().unwrap_or(0.0);
            for (k, a) in phi.iter().enumerate().take(j) {
                v += a * psi[j - 1 - k];
            }
            psi.push(v);
        }
        psi
    }
}
