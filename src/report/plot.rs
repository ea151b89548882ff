//! Plain-text charts for terminal reports.

use std::fmt::Write;

/// One line on a [`line_chart`]. Values are placed at x positions
/// `offset..offset + values.len()`; NaN values are skipped.
#[derive(Debug, Clone)]
pub struct ChartSeries<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
    pub offset: usize,
    pub symbol: char,
}

impl<'a> ChartSeries<'a> {
    pub fn new(label: &'a str, values: &'a [f64], symbol: char) -> Self {
        Self {
            label,
            values,
            offset: 0,
            symbol,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Draw several series on a shared `width` x `height` character grid.
///
/// Later series overwrite earlier ones where they collide. The y axis is
/// labelled with the range of all finite values.
///
/// # Example
///
/// ```
/// use retail_forecast::report::plot::{line_chart, ChartSeries};
///
/// let values: Vec<f64> = (0..24).map(|i| (i as f64 / 3.0).sin()).collect();
/// let chart = line_chart(&[ChartSeries::new("sin", &values, '*')], 40, 8);
/// assert_eq!(chart.lines().count(), 8 + 2);
/// ```
pub fn line_chart(series: &[ChartSeries<'_>], width: usize, height: usize) -> String {
    let width = width.max(2);
    let height = height.max(2);
    let points = series
        .iter()
        .map(|s| s.offset + s.values.len())
        .max()
        .unwrap_or(0);
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if points == 0 || !lo.is_finite() {
        return String::from("(no data)\n");
    }
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut grid = vec![vec![' '; width]; height];
    for s in series {
        for (i, &v) in s.values.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            let x = s.offset + i;
            let col = if points > 1 {
                x * (width - 1) / (points - 1)
            } else {
                0
            };
            let row = ((hi - v) / span * (height - 1) as f64).round() as usize;
            grid[row.min(height - 1)][col.min(width - 1)] = s.symbol;
        }
    }

    let top = format_axis(hi);
    let bottom = format_axis(lo);
    let label_width = top.len().max(bottom.len());
    let mut out = String::new();
    for (r, row) in grid.iter().enumerate() {
        let label = if r == 0 {
            top.as_str()
        } else if r == height - 1 {
            bottom.as_str()
        } else {
            ""
        };
        let line: String = row.iter().collect();
        let _ = writeln!(out, "{:>w$} |{}", label, line.trim_end(), w = label_width);
    }
    let _ = writeln!(out, "{:>w$} +{}", "", "-".repeat(width), w = label_width);
    let legend: Vec<String> = series
        .iter()
        .map(|s| format!("{} {}", s.symbol, s.label))
        .collect();
    let _ = writeln!(out, "{:>w$}  {}", "", legend.join("   "), w = label_width);
    out
}

/// Horizontal bar chart of autocorrelations with `±bound` markers.
///
/// Lags whose coefficient exceeds the bound are flagged with `*`.
pub fn acf_chart(title: &str, values: &[f64], bound: f64, half_width: usize) -> String {
    let half = half_width.max(4);
    let scale = |v: f64| ((v.abs().min(1.0)) * half as f64).round() as usize;
    let bound_pos = scale(bound);

    let mut out = String::new();
    let _ = writeln!(out, "{} (bound ±{:.3})", title, bound);
    for (i, &v) in values.iter().enumerate() {
        let mut cells = vec![' '; 2 * half + 1];
        cells[half] = '|';
        if bound_pos <= half {
            cells[half - bound_pos] = ':';
            cells[half + bound_pos] = ':';
        }
        if v.is_finite() {
            let len = scale(v);
            for k in 1..=len {
                let idx = if v >= 0.0 { half + k } else { half - k };
                cells[idx] = '#';
            }
        }
        let flag = if v.abs() > bound { "*" } else { "" };
        let bar: String = cells.into_iter().collect();
        let _ = writeln!(out, "{:>4} {} {:>6.3}{}", i + 1, bar, v, flag);
    }
    out
}

fn format_axis(v: f64) -> String {
    if v.abs() >= 1e5 {
        format!("{:.3e}", v)
    } else if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}
