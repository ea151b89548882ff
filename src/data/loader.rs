//! CSV loading for monthly sales tables.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{months_between, TimeSeries};
use crate::error::{ForecastError, Result};

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Table layout of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Detect from the header row.
    #[default]
    Auto,
    /// One row per month: a date column and a value column.
    Long,
    /// One row per year with twelve month columns.
    Wide,
}

/// Options for [`load_csv`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Date column (long) or year column (wide). Detected when `None`.
    pub date_column: Option<String>,
    /// Value column for the long layout. Detected when `None`.
    pub value_column: Option<String>,
    pub layout: Layout,
    /// Name attached to the resulting series.
    pub name: Option<String>,
}

impl LoadOptions {
    pub fn with_columns(mut self, date: impl Into<String>, value: impl Into<String>) -> Self {
        self.date_column = Some(date.into());
        self.value_column = Some(value.into());
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Load a monthly series from a CSV file with a header row.
///
/// # Example
///
/// ```no_run
/// use retail_forecast::data::{load_csv, LoadOptions};
///
/// let series = load_csv("retail.csv", &LoadOptions::default()).unwrap();
/// println!("{} months from {}", series.len(), series.start());
/// ```
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Io(format!("{}: {}", path.display(), e)))?;
    let mut series = read_csv(BufReader::new(file), options)?;
    if series.name().is_none() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            series = series.with_name(stem);
        }
    }
    Ok(series)
}

/// Parse CSV text from any reader. See [`load_csv`].
pub fn read_csv<R: Read>(reader: R, options: &LoadOptions) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let layout = match options.layout {
        Layout::Auto => detect_layout(&headers),
        explicit => explicit,
    };
    info!(?layout, columns = headers.len(), "reading sales table");

    let observations = match layout {
        Layout::Wide => read_wide(&mut reader, &headers, options)?,
        _ => read_long(&mut reader, &headers, options)?,
    };
    let series = assemble(observations)?;
    Ok(match &options.name {
        Some(name) => series.with_name(name.clone()),
        None => series,
    })
}

/// Wide when all twelve month names appear as headers.
pub fn detect_layout(headers: &csv::StringRecord) -> Layout {
    let months = headers.iter().filter(|h| month_index(h).is_some()).count();
    if months >= 12 {
        Layout::Wide
    } else {
        Layout::Long
    }
}

/// Month number (1-based) of an English month name or abbreviation.
fn month_index(name: &str) -> Option<u32> {
    let lower = name.trim().to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| lower.starts_with(m) && is_month_word(&lower))
        .map(|i| i as u32 + 1)
}

fn is_month_word(lower: &str) -> bool {
    const FULL: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    lower.len() == 3 || FULL.iter().any(|f| f.starts_with(lower)) || lower == "sept"
}

/// Parse a month reference.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD`, `YYYY/MM`, `Mon YYYY`, `YYYY Mon` and
/// `Mon-YY`. Days are discarded.
pub fn parse_month(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return NaiveDate::from_ymd_opt(d.year(), d.month(), 1);
    }
    for sep in ['-', '/'] {
        if let Some((a, b)) = text.split_once(sep) {
            if let (Ok(y), Ok(m)) = (a.parse::<i32>(), b.parse::<u32>()) {
                if a.len() == 4 {
                    return NaiveDate::from_ymd_opt(y, m, 1);
                }
            }
            // Mon-YY
            if let (Some(m), Ok(y)) = (month_index(a), b.parse::<i32>()) {
                let year = match b.len() {
                    2 if y > 50 => 1900 + y,
                    2 => 2000 + y,
                    _ => y,
                };
                return NaiveDate::from_ymd_opt(year, m, 1);
            }
        }
    }
    let mut parts = text.split_whitespace();
    let (a, b) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    match (month_index(a), b.parse::<i32>()) {
        (Some(m), Ok(y)) => NaiveDate::from_ymd_opt(y, m, 1),
        _ => match (a.parse::<i32>(), month_index(b)) {
            (Ok(y), Some(m)) => NaiveDate::from_ymd_opt(y, m, 1),
            _ => None,
        },
    }
}

/// Parse a number, tolerating thousands separators and surrounding spaces.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| ForecastError::Csv(format!("column '{}' not found", name)))
}

fn line_of(record: &csv::StringRecord) -> usize {
    record.position().map_or(0, |p| p.line() as usize)
}

type Observations = Vec<(NaiveDate, f64, usize)>;

fn read_long<R: Read>(
    reader: &mut csv::Reader<R>,
    headers: &csv::StringRecord,
    options: &LoadOptions,
) -> Result<Observations> {
    let date_idx = match &options.date_column {
        Some(name) => find_column(headers, name)?,
        None => headers
            .iter()
            .position(|h| {
                let h = h.to_ascii_lowercase();
                h.contains("date") || h == "month" || h == "period"
            })
            .unwrap_or(0),
    };
    let value_idx = match &options.value_column {
        Some(name) => find_column(headers, name)?,
        None => headers
            .iter()
            .enumerate()
            .position(|(i, h)| {
                i != date_idx && matches!(h.to_ascii_lowercase().as_str(), "value" | "sales")
            })
            .or_else(|| (0..headers.len()).find(|&i| i != date_idx))
            .ok_or_else(|| ForecastError::Csv("no value column found".into()))?,
    };
    debug!(
        date = ?headers.get(date_idx),
        value = ?headers.get(value_idx),
        "long layout columns"
    );

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let date_field = record.get(date_idx).unwrap_or("");
        let date = parse_month(date_field).ok_or_else(|| ForecastError::Parse {
            line,
            message: format!("unrecognised date '{}'", date_field),
        })?;
        let value_field = record.get(value_idx).unwrap_or("");
        let value = parse_number(value_field).ok_or_else(|| ForecastError::Parse {
            line,
            message: format!("invalid value '{}'", value_field),
        })?;
        out.push((date, value, line));
    }
    Ok(out)
}

fn read_wide<R: Read>(
    reader: &mut csv::Reader<R>,
    headers: &csv::StringRecord,
    options: &LoadOptions,
) -> Result<Observations> {
    let year_idx = match &options.date_column {
        Some(name) => find_column(headers, name)?,
        None => headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("year"))
            .unwrap_or(0),
    };
    let month_cols: Vec<(usize, u32)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != year_idx)
        .filter_map(|(i, h)| month_index(h).map(|m| (i, m)))
        .collect();

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        let year_field = record.get(year_idx).unwrap_or("");
        if year_field.is_empty() {
            continue;
        }
        let year: i32 = year_field.parse().map_err(|_| ForecastError::Parse {
            line,
            message: format!("invalid year '{}'", year_field),
        })?;
        for &(idx, month) in &month_cols {
            let field = record.get(idx).unwrap_or("");
            // blank cells mark months not yet observed
            if field.is_empty() {
                continue;
            }
            let value = parse_number(field).ok_or_else(|| ForecastError::Parse {
                line,
                message: format!("invalid value '{}' for {}", field, headers.get(idx).unwrap_or("")),
            })?;
            let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                ForecastError::Parse {
                    line,
                    message: format!("invalid year {}", year),
                }
            })?;
            out.push((date, value, line));
        }
    }
    Ok(out)
}

/// Sort by month and check the calendar is complete.
fn assemble(observations: Observations) -> Result<TimeSeries> {
    let mut by_month: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value, line) in observations {
        if let Some((_, first)) = by_month.insert(date, (value, line)) {
            return Err(ForecastError::Parse {
                line,
                message: format!(
                    "duplicate month {} (first seen on line {})",
                    date.format("%Y-%m"),
                    first
                ),
            });
        }
    }
    let start = *by_month.keys().next().ok_or(ForecastError::EmptyData)?;

    let mut values = Vec::with_capacity(by_month.len());
    let mut previous = start;
    for (i, (&date, &(value, _))) in by_month.iter().enumerate() {
        if i > 0 && months_between(previous, date) != 1 {
            return Err(ForecastError::MissingValues(format!(
                "gap between {} and {}",
                previous.format("%Y-%m"),
                date.format("%Y-%m")
            )));
        }
        values.push(value);
        previous = date;
    }
    info!(
        months = values.len(),
        start = %start.format("%Y-%m"),
        "loaded monthly series"
    );
    TimeSeries::monthly(start, values)
}
