//! Monthly time series container.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// Number of observations per year for monthly data.
pub const MONTHLY: usize = 12;

/// A regularly spaced monthly series.
///
/// Observations are contiguous calendar months starting at `start`, which is
/// always normalised to the first day of its month.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    start: NaiveDate,
    values: Vec<f64>,
    period: usize,
    name: Option<String>,
}

impl TimeSeries {
    /// Create a monthly series with a seasonal period of 12.
    pub fn monthly(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(Self {
            start: first_of_month(start),
            values,
            period: MONTHLY,
            name: None,
        })
    }

    /// Build a series from values only, starting January 2000.
    ///
    /// Useful for models and tests that only care about the values.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1)
            .ok_or_else(|| ForecastError::InvalidParameter("invalid start date".into()))?;
        Self::monthly(start, values)
    }

    /// Override the seasonal period.
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period.max(1);
        self
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seasonal period (observations per cycle).
    pub fn period(&self) -> usize {
        self.period
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First month of the series.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Month following the last observation.
    pub fn end_exclusive(&self) -> NaiveDate {
        add_months(self.start, self.values.len())
    }

    /// Date of observation `index`.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        add_months(self.start, index)
    }

    /// All observation dates.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.values.len()).map(|i| self.date_at(i)).collect()
    }

    /// Calendar month (1..=12) of observation `index`.
    pub fn month_of(&self, index: usize) -> u32 {
        self.date_at(index).month()
    }

    /// Calendar year of observation `index`.
    pub fn year_of(&self, index: usize) -> i32 {
        self.date_at(index).year()
    }

    /// Sub-series `[start, end)` keeping the calendar alignment.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start >= end || end > self.values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid slice [{}, {}) for series of length {}",
                start,
                end,
                self.values.len()
            )));
        }
        Ok(TimeSeries {
            start: self.date_at(start),
            values: self.values[start..end].to_vec(),
            period: self.period,
            name: self.name.clone(),
        })
    }

    /// First `n` observations.
    pub fn head(&self, n: usize) -> Result<TimeSeries> {
        self.slice(0, n.min(self.len()))
    }

    /// Observations from `index` to the end.
    pub fn tail_from(&self, index: usize) -> Result<TimeSeries> {
        self.slice(index, self.len())
    }

    /// Split into a training part of length `n` and the remaining test part.
    pub fn split_at(&self, n: usize) -> Result<(TimeSeries, TimeSeries)> {
        if n == 0 || n >= self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "split point {} must lie inside a series of length {}",
                n,
                self.len()
            )));
        }
        Ok((self.slice(0, n)?, self.slice(n, self.len())?))
    }

    /// Apply `f` to every value, keeping dates and metadata.
    pub fn map_values<F>(&self, f: F) -> TimeSeries
    where
        F: Fn(f64) -> f64,
    {
        TimeSeries {
            start: self.start,
            values: self.values.iter().map(|&v| f(v)).collect(),
            period: self.period,
            name: self.name.clone(),
        }
    }

    /// Replace the values with an equally long vector.
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() != self.values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.values.len(),
                got: values.len(),
            });
        }
        Ok(TimeSeries {
            start: self.start,
            values,
            period: self.period,
            name: self.name.clone(),
        })
    }

    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// True when every observation is strictly positive.
    pub fn is_strictly_positive(&self) -> bool {
        self.values.iter().all(|&v| v > 0.0)
    }
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `date` shifted forward by `months` calendar months.
pub fn add_months(date: NaiveDate, months: usize) -> NaiveDate {
    date.checked_add_months(Months::new(months as u32))
        .unwrap_or(NaiveDate::MAX)
}

/// Number of whole months from `from` to `to` (may be negative).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn monthly_normalises_start_to_first_of_month() {
        let ts = TimeSeries::monthly(NaiveDate::from_ymd_opt(1991, 3, 17).unwrap(), vec![1.0])
            .unwrap();
        assert_eq!(ts.start(), ym(1991, 3));
        assert_eq!(ts.period(), 12);
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(
            TimeSeries::monthly(ym(2000, 1), vec![]),
            Err(ForecastError::EmptyData)
        );
    }

    #[test]
    fn dates_roll_over_year_boundaries() {
        let ts = TimeSeries::monthly(ym(1999, 11), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ts.date_at(2), ym(2000, 1));
        assert_eq!(ts.month_of(3), 2);
        assert_eq!(ts.year_of(0), 1999);
        assert_eq!(ts.end_exclusive(), ym(2000, 3));
    }

    #[test]
    fn slice_keeps_calendar_alignment() {
        let ts = TimeSeries::monthly(ym(2010, 1), (0..24).map(f64::from).collect()).unwrap();
        let part = ts.slice(13, 20).unwrap();
        assert_eq!(part.start(), ym(2011, 2));
        assert_eq!(part.values(), &[13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0]);
        assert!(ts.slice(5, 5).is_err());
        assert!(ts.slice(0, 25).is_err());
    }

    #[test]
    fn split_at_partitions_series() {
        let ts = TimeSeries::monthly(ym(2010, 1), (0..30).map(f64::from).collect()).unwrap();
        let (train, test) = ts.split_at(24).unwrap();
        assert_eq!(train.len(), 24);
        assert_eq!(test.len(), 6);
        assert_eq!(test.start(), ym(2012, 1));
        assert!(ts.split_at(30).is_err());
    }

    #[test]
    fn months_between_counts_calendar_months() {
        assert_eq!(months_between(ym(1999, 11), ym(2000, 2)), 3);
        assert_eq!(months_between(ym(2000, 2), ym(1999, 11)), -3);
    }

    #[test]
    fn missing_and_positive_checks() {
        let ts = TimeSeries::from_values(vec![1.0, f64::NAN]).unwrap();
        assert!(ts.has_missing_values());
        let ts = TimeSeries::from_values(vec![1.0, 0.0]).unwrap();
        assert!(!ts.is_strictly_positive());
    }
}
