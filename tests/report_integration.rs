//! End-to-end runs of the report pipeline on synthetic and file data.

use std::io::Write;

use retail_forecast::data::synthetic_retail;
use retail_forecast::report::{
    run_report, LambdaSetting, ModelKind, OutputFormat, ReportConfig,
};
use tempfile::NamedTempFile;

fn synthetic_config(years: usize) -> ReportConfig {
    ReportConfig {
        synthetic_years: Some(years),
        seed: 7,
        ..Default::default()
    }
}

#[test]
fn full_report_on_synthetic_data() {
    let config = ReportConfig {
        models: vec![
            ModelKind::SeasonalNaive,
            ModelKind::Arima,
            ModelKind::Ets,
            ModelKind::HwMultiplicative,
        ],
        cv_window: 144,
        cv_horizon: 6,
        cv_step: 12,
        ..synthetic_config(16)
    };
    let report = run_report(&config).unwrap();

    assert_eq!(report.data.observations, 192);
    assert_eq!(report.split.train_len, 168);
    assert_eq!(report.split.test_len, 24);
    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    assert_eq!(report.models.len(), 4);
    for m in &report.models {
        assert_eq!(m.forecast.horizon(), 24);
        assert!(m.test.mase.is_some());
        assert!(m.forecast.point().iter().all(|v| v.is_finite() && *v > 0.0));
    }

    // lambda is fixed once and reported with the stationarity checks
    assert!(report.stationarity.lambda.is_some());
    assert_eq!(report.stationarity.seasonal_diffs, 1);

    assert_eq!(report.cross_validation.len(), 4);
    for cv in &report.cross_validation {
        assert_eq!(cv.by_horizon.len(), 6);
        assert!(cv.folds > 0);
    }
    let best = report.best_model.as_ref().unwrap();
    assert_eq!(best.basis, "cv");
    let best_cv = report
        .cross_validation
        .iter()
        .map(|c| c.overall.mase)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.mase, best_cv);

    let text = report.to_text();
    for section in [
        "## Data",
        "## Seasonal plot",
        "## Stationarity",
        "## Hold-out accuracy",
        "## Cross-validation",
        "## Best model",
    ] {
        assert!(text.contains(section), "missing {}", section);
    }
}

#[test]
fn report_serialises_to_json() {
    let config = ReportConfig {
        models: vec![ModelKind::Naive, ModelKind::SeasonalNaive],
        skip_cv: true,
        format: OutputFormat::Json,
        lambda: LambdaSetting::None,
        ..synthetic_config(10)
    };
    let report = run_report(&config).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["split"]["test_len"], 24);
    assert_eq!(json["models"].as_array().unwrap().len(), 2);
    assert!(json["cross_validation"].as_array().unwrap().is_empty());
    assert_eq!(json["best_model"]["basis"], "holdout");
    assert!(json["stationarity"]["lambda"].is_null());
}

#[test]
fn report_from_csv_file() {
    let series = synthetic_retail(8, 3).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "month,sales").unwrap();
    for (date, value) in series.dates().iter().zip(series.values()) {
        writeln!(file, "{},{:.2}", date.format("%Y-%m"), value).unwrap();
    }
    file.flush().unwrap();

    let config = ReportConfig {
        input: Some(file.path().to_path_buf()),
        models: vec![ModelKind::SeasonalNaive, ModelKind::HwAdditive],
        test_horizon: 12,
        skip_cv: true,
        ..Default::default()
    };
    let report = run_report(&config).unwrap();
    assert_eq!(report.data.observations, 96);
    assert_eq!(report.series.dates[0], "1991-01");
    assert_eq!(report.split.test_start, "1998-01");
}

#[test]
fn config_file_drives_report() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
synthetic_years = 9
test_horizon = 12
skip_cv = true
lambda = 0.0
models = ["naive", "drift"]
"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = ReportConfig::from_file(file.path()).unwrap();
    assert_eq!(config.lambda, LambdaSetting::Fixed(0.0));
    let report = run_report(&config).unwrap();
    let names: Vec<&str> = report.models.iter().map(|m| m.model.as_str()).collect();
    assert_eq!(names, vec!["Naive", "Drift"]);
}

#[test]
fn missing_input_is_rejected() {
    let err = run_report(&ReportConfig::default()).unwrap_err();
    assert!(err.to_string().contains("configuration error"));
}

#[test]
fn zero_month_disables_boxcox_instead_of_failing() {
    let series = synthetic_retail(8, 3).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,value").unwrap();
    for (i, (date, value)) in series.dates().iter().zip(series.values()).enumerate() {
        let value = if i == 5 { 0.0 } else { *value };
        writeln!(file, "{},{:.2}", date.format("%Y-%m"), value).unwrap();
    }
    file.flush().unwrap();

    let config = ReportConfig {
        input: Some(file.path().to_path_buf()),
        models: vec![ModelKind::SeasonalNaive, ModelKind::Naive],
        skip_cv: true,
        ..Default::default()
    };
    assert_eq!(config.lambda, LambdaSetting::Auto);
    let report = run_report(&config).unwrap();
    assert_eq!(report.models.len(), 2);
    assert!(report.failures.is_empty());
    assert!(report.stationarity.lambda.is_none());
}
