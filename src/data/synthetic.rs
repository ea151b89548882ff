//! Reproducible retail-like test data.

use chrono::NaiveDate;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// Seasonal factors, January first. December carries the holiday peak and
/// January/February the post-holiday trough.
pub const RETAIL_SEASONALITY: [f64; 12] = [
    0.86, 0.84, 0.97, 0.98, 1.05, 1.03, 1.01, 1.03, 0.98, 1.00, 1.02, 1.23,
];

/// Monthly sales starting January 1991 with about 0.4% monthly growth,
/// [`RETAIL_SEASONALITY`] and AR(1) multiplicative noise (sd 1.5%).
///
/// The same `seed` always gives the same series.
///
/// # Example
///
/// ```
/// use retail_forecast::data::synthetic_retail;
///
/// let a = synthetic_retail(10, 7).unwrap();
/// let b = synthetic_retail(10, 7).unwrap();
/// assert_eq!(a.len(), 120);
/// assert_eq!(a.values(), b.values());
/// ```
pub fn synthetic_retail(years: usize, seed: u64) -> Result<TimeSeries> {
    if years == 0 {
        return Err(ForecastError::InvalidParameter(
            "synthetic series needs at least one year".into(),
        ));
    }
    let start = NaiveDate::from_ymd_opt(1991, 1, 1)
        .ok_or_else(|| ForecastError::InvalidParameter("invalid start date".into()))?;
    let noise = Normal::new(0.0, 0.015)
        .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut e = 0.0;
    let values = (0..years * 12)
        .map(|t| {
            e = 0.4 * e + noise.sample(&mut rng);
            let level = 20_000.0 * (0.004 * t as f64).exp();
            level * RETAIL_SEASONALITY[t % 12] * e.exp()
        })
        .collect();

    Ok(TimeSeries::monthly(start, values)?.with_name("synthetic retail"))
}
