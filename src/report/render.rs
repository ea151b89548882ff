//! Markdown-like text rendering of a [`Report`].

use std::fmt::{self, Write};

use super::pipeline::{CVSummary, Report, StationarityReport, TestPair, MONTH_ABBR};
use super::plot::{acf_chart, line_chart, ChartSeries};
use crate::utils::HorizonAccuracy;
use crate::validation::StationarityResult;

/// Forecast markers, one per model in report order.
const SYMBOLS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Months of history shown before the test period in the forecast chart.
const CONTEXT_MONTHS: usize = 48;

fn opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        _ => "-".to_string(),
    }
}

fn test_line(r: &StationarityResult) -> String {
    format!(
        "| {:<5} | {:>9.4} | {:>7.4} | {:>4} | {:>8.3} | {:>8.3} | {:<14} |",
        r.test,
        r.statistic,
        r.p_value,
        r.lags,
        r.critical_values.cv_5pct,
        r.critical_values.cv_10pct,
        if r.is_stationary {
            "stationary"
        } else {
            "non-stationary"
        }
    )
}

fn write_tests(out: &mut String, title: &str, pair: &TestPair) -> fmt::Result {
    writeln!(out, "{}:\n", title)?;
    writeln!(
        out,
        "| test  | statistic | p-value | lags |  cv 5%   |  cv 10%  | conclusion     |"
    )?;
    writeln!(
        out,
        "|-------|-----------|---------|------|----------|----------|----------------|"
    )?;
    writeln!(out, "{}", test_line(&pair.adf))?;
    writeln!(out, "{}\n", test_line(&pair.kpss))
}

fn write_stationarity(out: &mut String, s: &StationarityReport, width: usize) -> fmt::Result {
    writeln!(out, "## Stationarity\n")?;
    match s.lambda {
        Some(l) => writeln!(out, "Tests run on the Box-Cox scale (lambda = {:.3}).\n", l)?,
        None => writeln!(out, "Tests run on the original scale.\n")?,
    }
    write_tests(out, "Level (ADF with trend, KPSS level)", &s.level)?;
    writeln!(
        out,
        "Suggested differencing: D = {} seasonal, d = {} first.\n",
        s.seasonal_diffs, s.first_diffs
    )?;
    if let Some(pair) = &s.differenced {
        write_tests(out, "After differencing", pair)?;
        if pair.agree_stationary() {
            writeln!(out, "Both tests agree the differenced series is stationary.\n")?;
        }
    }
    if let Some(c) = &s.differenced_correlogram {
        writeln!(out, "```")?;
        write!(out, "{}", acf_chart("ACF of differenced series", &c.acf, c.bound, width / 4))?;
        writeln!(out, "```\n")?;
    }
    Ok(())
}

impl Report {
    /// Render the report as text with charts sized from the config.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> fmt::Result {
        let width = self.config.chart_width;
        let height = self.config.chart_height;
        let d = &self.data;

        writeln!(
            out,
            "# Retail sales forecasting report: {}\n",
            d.name.as_deref().unwrap_or("series")
        )?;

        writeln!(out, "## Data\n")?;
        writeln!(out, "- period: {} to {} ({} months)", d.start, d.end, d.observations)?;
        writeln!(out, "- mean {:.2}, sd {:.2}, min {:.2}, max {:.2}", d.mean, d.std_dev, d.min, d.max)?;
        writeln!(
            out,
            "- strength of trend {}, of seasonality {}",
            opt(d.trend_strength, 3),
            opt(d.seasonal_strength, 3)
        )?;
        if let (Some(peak), Some(trough)) = (&d.peak, &d.trough) {
            writeln!(out, "- seasonal peak {}, trough {}", peak, trough)?;
        }
        writeln!(out)?;

        writeln!(out, "## Time plot\n\n```")?;
        write!(
            out,
            "{}",
            line_chart(&[ChartSeries::new("sales", &self.series.values, '*')], width, height)
        )?;
        writeln!(out, "```\n")?;

        writeln!(out, "## Seasonal plot\n\n```")?;
        let years: Vec<(String, Vec<f64>)> = self
            .profile
            .years
            .iter()
            .rev()
            .take(SYMBOLS.len())
            .rev()
            .map(|y| {
                let values = y.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                (y.year.to_string(), values)
            })
            .collect();
        let year_series: Vec<ChartSeries<'_>> = years
            .iter()
            .zip(SYMBOLS)
            .map(|((label, values), symbol)| ChartSeries::new(label, values, symbol))
            .collect();
        write!(out, "{}", line_chart(&year_series, width.min(48), height))?;
        writeln!(out, "```\n")?;

        writeln!(out, "## Seasonal sub-series means\n")?;
        for (i, m) in self.profile.means.iter().enumerate() {
            let label = if self.profile.period == 12 {
                MONTH_ABBR[i].to_string()
            } else {
                format!("{:>3}", i + 1)
            };
            writeln!(out, "- {}: {:.2}", label, m)?;
        }
        writeln!(out)?;

        writeln!(out, "## Autocorrelation\n\n```")?;
        let c = &self.correlogram;
        write!(out, "{}", acf_chart("ACF", &c.acf, c.bound, width / 4))?;
        write!(out, "{}", acf_chart("PACF", &c.pacf, c.bound, width / 4))?;
        writeln!(out, "```\n")?;

        write_stationarity(out, &self.stationarity, width)?;

        let s = &self.split;
        writeln!(out, "## Model fits\n")?;
        writeln!(
            out,
            "Training: {} months from {}. Test: {} months from {}.\n",
            s.train_len, s.train_start, s.test_len, s.test_start
        )?;
        for m in &self.models {
            writeln!(out, "- **{}**: {}", m.model, m.description)?;
        }
        for f in &self.failures {
            writeln!(out, "- **{}**: failed ({})", f.model, f.error)?;
        }
        writeln!(out)?;

        writeln!(out, "## Forecasts\n\n```")?;
        let start = s.train_len.saturating_sub(CONTEXT_MONTHS);
        let actual = &self.series.values[start..];
        let mut lines = vec![ChartSeries::new("actual", actual, '*')];
        for (m, symbol) in self.models.iter().zip(SYMBOLS) {
            lines.push(
                ChartSeries::new(&m.model, m.forecast.point(), symbol)
                    .with_offset(s.train_len - start),
            );
        }
        write!(out, "{}", line_chart(&lines, width, height))?;
        writeln!(out, "```\n")?;

        writeln!(out, "## Hold-out accuracy\n")?;
        writeln!(out, "| model | ME | RMSE | MAE | MAPE | MASE | ACF1 |")?;
        writeln!(out, "|-------|----|------|-----|------|------|------|")?;
        for m in &self.models {
            let t = &m.test;
            writeln!(
                out,
                "| {} | {:.2} | {:.2} | {:.2} | {} | {} | {} |",
                m.model,
                t.me,
                t.rmse,
                t.mae,
                opt(t.mape, 2),
                opt(t.mase, 3),
                opt(t.acf1, 3)
            )?;
        }
        writeln!(out)?;

        writeln!(out, "## Residual checks (Ljung-Box)\n")?;
        writeln!(out, "| model | Q | df | p-value | white noise |")?;
        writeln!(out, "|-------|---|----|---------|-------------|")?;
        for m in &self.models {
            let lb = &m.ljung_box;
            writeln!(
                out,
                "| {} | {:.2} | {} | {:.4} | {} |",
                m.model,
                lb.statistic,
                lb.df,
                lb.p_value,
                if lb.is_white_noise(0.05) { "yes" } else { "no" }
            )?;
        }
        writeln!(out)?;

        if !self.cross_validation.is_empty() {
            writeln!(
                out,
                "## Cross-validation (window {}, step {})\n",
                self.config.cv_window, self.config.cv_step
            )?;
            write_cv(out, &self.cross_validation, self.config.cv_horizon)?;
        }

        writeln!(out, "## Best model\n")?;
        match &self.best_model {
            Some(b) => writeln!(
                out,
                "{} (mean {} MASE {:.3}, RMSE {:.2})",
                b.model,
                if b.basis == "cv" { "cross-validated" } else { "hold-out" },
                b.mase,
                b.rmse
            )?,
            None => writeln!(out, "No model could be scored.")?,
        }
        Ok(())
    }
}

fn write_cv_table<F>(out: &mut String, rows: &[CVSummary], horizon: usize, metric: F) -> fmt::Result
where
    F: Fn(&HorizonAccuracy) -> f64,
{
    write!(out, "| model |")?;
    for h in 1..=horizon {
        write!(out, " h={} |", h)?;
    }
    writeln!(out, " mean | folds |")?;
    write!(out, "|-------|")?;
    for _ in 0..horizon + 2 {
        write!(out, "-----|")?;
    }
    writeln!(out)?;
    for cv in rows {
        write!(out, "| {} |", cv.model)?;
        for h in &cv.by_horizon {
            write!(out, " {} |", opt(Some(metric(h)), 2))?;
        }
        writeln!(
            out,
            " {} | {} ({} failed) |",
            opt(Some(metric(&cv.overall)), 2),
            cv.folds,
            cv.failed_folds
        )?;
    }
    writeln!(out)
}

fn write_cv(out: &mut String, rows: &[CVSummary], horizon: usize) -> fmt::Result {
    writeln!(out, "MAPE by horizon:\n")?;
    write_cv_table(out, rows, horizon, |h| h.mape)?;
    writeln!(out, "MASE by horizon:\n")?;
    write_cv_table(out, rows, horizon, |h| h.mase)?;
    writeln!(out, "RMSE by horizon:\n")?;
    write_cv_table(out, rows, horizon, |h| h.rmse)
}

impl StationarityReport {
    pub fn to_text(&self, chart_width: usize) -> String {
        let mut out = String::new();
        let _ = write_stationarity(&mut out, self, chart_width);
        out
    }
}

impl CVSummary {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## Cross-validation: {}\n", self.model);
        let _ = write_cv(&mut out, std::slice::from_ref(self), self.by_horizon.len());
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
