//! # retail-forecast
//!
//! Command-line front end for the monthly retail sales study.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use retail_forecast::core::add_months;
use retail_forecast::report::{
    build_registry, create_model, cross_validate, load_series, resolve_lambda, run_report,
    stationarity_report, LambdaSetting, ModelKind, OutputFormat, ReportConfig,
};

#[derive(Parser)]
#[command(name = "retail-forecast", version)]
#[command(about = "Forecasting study of monthly retail sales", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Monthly sales CSV (long `date,value` or wide month-column layout)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// TOML configuration file; command-line flags override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use a synthetic retail series of this many years instead of a file
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "30")]
    synthetic: Option<usize>,

    /// Seed for the synthetic series
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Box-Cox lambda for the ARIMA models: none, auto or a number
    #[arg(long, global = true)]
    lambda: Option<LambdaSetting>,

    /// Seasonal period
    #[arg(long, global = true)]
    period: Option<usize>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full study and print the report
    Report {
        /// Months held out for the accuracy comparison
        #[arg(long)]
        test_horizon: Option<usize>,

        /// Skip rolling-origin cross-validation
        #[arg(long)]
        skip_cv: bool,

        /// Restrict to these models (repeat or comma-separate)
        #[arg(short, long, value_delimiter = ',')]
        models: Vec<ModelKind>,
    },

    /// Stationarity tests and suggested differencing
    Stationarity,

    /// Fit one model on the whole series and forecast ahead
    Forecast {
        /// Model name (naive, snaive, drift, arima, auto-arima, ets, hw-additive, hw-multiplicative)
        #[arg(short, long, default_value = "auto-arima")]
        model: ModelKind,

        /// Months to forecast
        #[arg(long, default_value = "12")]
        horizon: usize,

        /// Prediction interval coverage
        #[arg(long)]
        level: Option<f64>,
    },

    /// Rolling-origin cross-validation of one model
    Cv {
        #[arg(short, long)]
        model: ModelKind,

        /// Training window length
        #[arg(long)]
        window: Option<usize>,

        /// Forecast horizon per fold
        #[arg(long)]
        horizon: Option<usize>,

        /// Origin step between folds
        #[arg(long)]
        step: Option<usize>,
    },
}

#[derive(Serialize)]
struct ForecastRow {
    date: String,
    point: f64,
    lower: Option<f64>,
    upper: Option<f64>,
}

#[derive(Serialize)]
struct ForecastOutput {
    model: String,
    description: String,
    level: f64,
    lambda: Option<f64>,
    forecasts: Vec<ForecastRow>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(input) = &cli.input {
        config.input = Some(input.clone());
        config.synthetic_years = None;
    }
    if let Some(years) = cli.synthetic {
        config.synthetic_years = Some(years);
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(lambda) = cli.lambda {
        config.lambda = lambda;
    }
    if let Some(period) = cli.period {
        config.period = period;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    Ok(config)
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = build_config(&cli)?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Report {
            test_horizon,
            skip_cv,
            models,
        } => {
            if let Some(h) = test_horizon {
                config.test_horizon = h;
            }
            config.skip_cv |= skip_cv;
            if !models.is_empty() {
                config.models = models;
            }
            let report = run_report(&config).context("report failed")?;
            let text = match config.format {
                OutputFormat::Text => report.to_text(),
                OutputFormat::Json => to_json(&report)?,
            };
            emit(output, &text)
        }

        Commands::Stationarity => {
            config.validate()?;
            let series = load_series(&config)?;
            let lambda = resolve_lambda(config.lambda, &series)?;
            let result = stationarity_report(&series, lambda, config.acf_lags)?;
            let text = match config.format {
                OutputFormat::Text => result.to_text(config.chart_width),
                OutputFormat::Json => to_json(&result)?,
            };
            emit(output, &text)
        }

        Commands::Forecast {
            model,
            horizon,
            level,
        } => {
            if horizon == 0 {
                bail!("--horizon must be positive");
            }
            if let Some(level) = level {
                config.level = level;
            }
            config.validate()?;
            let series = load_series(&config)?;
            let lambda = if model.uses_boxcox() {
                resolve_lambda(config.lambda, &series)?
            } else {
                None
            };
            let mut forecaster =
                create_model(model, config.period, config.arima_order(), lambda);
            forecaster
                .fit(&series)
                .with_context(|| format!("failed to fit {}", model))?;
            let forecast = forecaster.predict_with_intervals(horizon, config.level)?;
            debug!(model = %forecaster.describe(), horizon, "forecast produced");

            let start = series.end_exclusive();
            let forecasts: Vec<ForecastRow> = (0..forecast.horizon())
                .map(|i| ForecastRow {
                    date: add_months(start, i).format("%Y-%m").to_string(),
                    point: forecast.point()[i],
                    lower: forecast.lower().map(|l| l[i]),
                    upper: forecast.upper().map(|u| u[i]),
                })
                .collect();
            let result = ForecastOutput {
                model: model.label().to_string(),
                description: forecaster.describe(),
                level: config.level,
                lambda,
                forecasts,
            };
            let text = match config.format {
                OutputFormat::Text => forecast_table(&result),
                OutputFormat::Json => to_json(&result)?,
            };
            emit(output, &text)
        }

        Commands::Cv {
            model,
            window,
            horizon,
            step,
        } => {
            if let Some(w) = window {
                config.cv_window = w;
            }
            if let Some(h) = horizon {
                config.cv_horizon = h;
            }
            if let Some(s) = step {
                config.cv_step = s;
            }
            config.models = vec![model];
            config.validate()?;
            let series = load_series(&config)?;
            let lambda = if model.uses_boxcox() {
                let window = config.cv_window.min(series.len());
                resolve_lambda(config.lambda, &series.head(window)?)?
            } else {
                None
            };
            let registry = build_registry(&config, lambda);
            let spec = registry
                .get(model.label())
                .with_context(|| format!("model {} not registered", model))?;
            let summary = cross_validate(&series, spec, &config)?;
            let text = match config.format {
                OutputFormat::Text => summary.to_text(),
                OutputFormat::Json => to_json(&summary)?,
            };
            emit(output, &text)
        }
    }
}

fn forecast_table(result: &ForecastOutput) -> String {
    let mut out = format!("{}\n\n", result.description);
    let pct = (result.level * 100.0).round();
    out.push_str(&format!(
        "{:<8} {:>14} {:>14} {:>14}\n",
        "month",
        "forecast",
        format!("lo {}", pct),
        format!("hi {}", pct)
    ));
    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
    for row in &result.forecasts {
        out.push_str(&format!(
            "{:<8} {:>14.2} {:>14} {:>14}\n",
            row.date,
            row.point,
            cell(row.lower),
            cell(row.upper)
        ));
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn flags_override_config_file() {
        let file = config_file(
            "synthetic_years = 12\nseed = 1\nperiod = 4\nlambda = \"none\"\nformat = \"json\"\ncv_window = 60\n",
        );
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "retail-forecast",
            "report",
            "--config",
            path,
            "--seed",
            "9",
            "--lambda",
            "0.5",
            "--period",
            "12",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(config.seed, 9);
        assert_eq!(config.lambda, LambdaSetting::Fixed(0.5));
        assert_eq!(config.period, 12);
        // untouched keys keep the file's values
        assert_eq!(config.synthetic_years, Some(12));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.cv_window, 60);
    }

    #[test]
    fn input_flag_replaces_synthetic_from_file() {
        let file = config_file("synthetic_years = 12\n");
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "retail-forecast",
            "stationarity",
            "-c",
            path,
            "--input",
            "sales.csv",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.synthetic_years, None);
        assert_eq!(config.input, Some(PathBuf::from("sales.csv")));
    }

    #[test]
    fn bare_synthetic_flag_uses_default_years() {
        let cli = Cli::try_parse_from(["retail-forecast", "report", "--synthetic"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.synthetic_years, Some(30));
        assert_eq!(config.lambda, LambdaSetting::Auto);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli::try_parse_from([
            "retail-forecast",
            "report",
            "--config",
            "/nonexistent/report.toml",
        ])
        .unwrap();
        let err = build_config(&cli).err().unwrap();
        assert!(format!("{:#}", err).contains("report.toml"));
    }
}
