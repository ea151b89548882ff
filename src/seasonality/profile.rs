//! Calendar views of a monthly series: seasonal plot rows and sub-series.

use crate::core::TimeSeries;
use crate::utils::stats::finite_mean;
use serde::Serialize;

/// One calendar year of a seasonal plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalYear {
    pub year: i32,
    /// Indexed by position in the cycle (January = 0 for monthly data).
    pub values: Vec<Option<f64>>,
}

/// Data behind a seasonal plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalProfile {
    pub period: usize,
    /// Mean of each cycle position over all years.
    pub means: Vec<f64>,
    pub years: Vec<SeasonalYear>,
}

impl SeasonalProfile {
    /// Cycle position with the highest mean.
    pub fn peak(&self) -> Option<usize> {
        self.means
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    /// Cycle position with the lowest mean.
    pub fn trough(&self) -> Option<usize> {
        self.means
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

fn cycle_position(series: &TimeSeries, index: usize) -> usize {
    if series.period() == 12 {
        series.month_of(index) as usize - 1
    } else {
        index % series.period().max(1)
    }
}

/// Group observations by calendar year and cycle position.
///
/// Non-monthly periods fall back to consecutive blocks of `period`
/// observations, labelled with the year of their first observation.
pub fn seasonal_profile(series: &TimeSeries) -> SeasonalProfile {
    let period = series.period().max(1);
    let monthly = period == 12;
    let mut years: Vec<SeasonalYear> = Vec::new();

    for (i, &v) in series.values().iter().enumerate() {
        let pos = cycle_position(series, i);
        let starts_row = years.is_empty()
            || if monthly {
                years.last().map(|y| y.year) != Some(series.year_of(i))
            } else {
                pos == 0
            };
        if starts_row {
            years.push(SeasonalYear {
                year: series.year_of(i),
                values: vec![None; period],
            });
        }
        if let Some(row) = years.last_mut() {
            row.values[pos] = v.is_finite().then_some(v);
        }
    }

    let means = subseries(series).iter().map(|s| finite_mean(s)).collect();
    SeasonalProfile {
        period,
        means,
        years,
    }
}

/// Values of each cycle position in time order, for sub-series plots.
pub fn subseries(series: &TimeSeries) -> Vec<Vec<f64>> {
    let period = series.period().max(1);
    let mut out = vec![Vec::new(); period];
    for (i, &v) in series.values().iter().enumerate() {
        out[cycle_position(series, i)].push(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series_from_march() -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
        // Mar 2019 .. Feb 2021, December doubled
        let values: Vec<f64> = (0..24)
            .map(|i| {
                let month = (2 + i) % 12;
                if month == 11 {
                    200.0
                } else {
                    100.0 + i as f64
                }
            })
            .collect();
        TimeSeries::monthly(start, values).unwrap()
    }

    #[test]
    fn rows_follow_calendar_years() {
        let profile = seasonal_profile(&series_from_march());
        let years: Vec<i32> = profile.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(profile.years[0].values[0], None);
        assert_eq!(profile.years[0].values[2], Some(100.0));
        assert_eq!(profile.years[2].values[1], Some(123.0));
        assert_eq!(profile.years[2].values[2], None);
    }

    #[test]
    fn december_is_the_peak() {
        let profile = seasonal_profile(&series_from_march());
        assert_eq!(profile.peak(), Some(11));
        assert_relative_eq!(profile.means[11], 200.0);
    }

    #[test]
    fn subseries_groups_by_month() {
        let sub = subseries(&series_from_march());
        assert_eq!(sub.len(), 12);
        assert_eq!(sub[2], vec![100.0, 112.0]);
        assert!(sub.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn non_monthly_period_uses_blocks() {
        let s = TimeSeries::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .unwrap()
            .with_period(4);
        let profile = seasonal_profile(&s);
        assert_eq!(profile.years.len(), 2);
        assert_relative_eq!(profile.means[0], 3.0);
        assert_eq!(profile.trough(), Some(0));
    }
}
