//! The end-to-end study: load, describe, test, fit, evaluate, compare.

use serde::Serialize;
use tracing::{info, warn};

use crate::core::{Forecast, TimeSeries};
use crate::data::{load_csv, synthetic_retail};
use crate::error::{ForecastError, Result};
use crate::features::{acf, pacf, white_noise_bound};
use crate::models::arima::{ARIMAOrder, AutoARIMA, AutoARIMAConfig, ARIMA};
use crate::models::baseline::{Naive, RandomWalkWithDrift, SeasonalNaive};
use crate::models::exponential::{AutoETS, HoltWinters};
use crate::models::{
    BoxCoxForecaster, BoxedForecaster, Forecaster, LambdaChoice, ModelRegistry, ModelSpec,
};
use crate::seasonality::{
    classical_decomposition, seasonal_profile, DecompositionType, SeasonalProfile,
};
use crate::transform::{boxcox, boxcox_lambda, difference, seasonal_difference, LambdaMethod};
use crate::utils::cross_validation::{rolling_origin, HorizonAccuracy, RollingOriginConfig};
use crate::utils::metrics::{calculate_metrics, mase_scale, AccuracyMetrics};
use crate::utils::stats::{mean, std_dev};
use crate::validation::{
    adf_test, default_lags, kpss_test, ljung_box, ndiffs, nsdiffs, Deterministic,
    PortmanteauResult, StationarityResult,
};

use super::config::{LambdaSetting, ModelKind, ReportConfig};

pub(crate) const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Significance level for differencing decisions.
const ALPHA: f64 = 0.05;

/// Descriptive statistics of the input series.
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub name: Option<String>,
    pub start: String,
    pub end: String,
    pub observations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub seasonal_strength: Option<f64>,
    pub trend_strength: Option<f64>,
    pub peak: Option<String>,
    pub trough: Option<String>,
}

/// Dates and values for a time plot.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesData {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

/// ACF and PACF for lags `1..=lags`.
#[derive(Debug, Clone, Serialize)]
pub struct Correlogram {
    pub lags: usize,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    pub bound: f64,
}

impl Correlogram {
    pub fn of(values: &[f64], lags: usize) -> Self {
        let acf = acf(values, lags).into_iter().skip(1).collect::<Vec<_>>();
        Self {
            lags: acf.len(),
            acf,
            pacf: pacf(values, lags),
            bound: white_noise_bound(values.len()),
        }
    }
}

/// ADF and KPSS on one version of the series.
#[derive(Debug, Clone, Serialize)]
pub struct TestPair {
    pub adf: StationarityResult,
    pub kpss: StationarityResult,
}

impl TestPair {
    fn run(values: &[f64], adf_deterministic: Deterministic) -> Result<Self> {
        Ok(Self {
            adf: adf_test(values, None, adf_deterministic)?,
            kpss: kpss_test(values, None, Deterministic::Constant)?,
        })
    }

    /// Both tests agree the series is stationary.
    pub fn agree_stationary(&self) -> bool {
        self.adf.is_stationary && self.kpss.is_stationary
    }
}

/// Unit-root diagnostics and the implied differencing.
#[derive(Debug, Clone, Serialize)]
pub struct StationarityReport {
    /// Box-Cox lambda applied before testing.
    pub lambda: Option<f64>,
    /// ADF with trend, KPSS level, on the (transformed) series.
    pub level: TestPair,
    pub seasonal_diffs: usize,
    pub first_diffs: usize,
    /// Tests after applying the differences above, when any are needed.
    pub differenced: Option<TestPair>,
    /// Correlogram of the differenced series.
    pub differenced_correlogram: Option<Correlogram>,
}

/// Train/test partition used for the accuracy comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub train_start: String,
    pub train_len: usize,
    pub test_start: String,
    pub test_len: usize,
}

/// One model fitted on the training part and scored on the test part.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub description: String,
    pub forecast: Forecast,
    pub training: Option<AccuracyMetrics>,
    pub test: AccuracyMetrics,
    pub ljung_box: PortmanteauResult,
}

/// A model that could not be fitted.
#[derive(Debug, Clone, Serialize)]
pub struct ModelFailure {
    pub model: String,
    pub error: String,
}

/// Rolling-origin results for one model.
#[derive(Debug, Clone, Serialize)]
pub struct CVSummary {
    pub model: String,
    pub folds: usize,
    pub failed_folds: usize,
    pub by_horizon: Vec<HorizonAccuracy>,
    pub overall: HorizonAccuracy,
}

/// The recommended model.
#[derive(Debug, Clone, Serialize)]
pub struct BestModel {
    pub model: String,
    /// `cv` or `holdout`, whichever scores were available.
    pub basis: &'static str,
    pub mase: f64,
    pub rmse: f64,
}

/// Full output of [`run_report`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: ReportConfig,
    pub data: DataSummary,
    pub series: SeriesData,
    pub profile: SeasonalProfile,
    pub correlogram: Correlogram,
    pub stationarity: StationarityReport,
    pub split: SplitSummary,
    pub models: Vec<ModelReport>,
    pub failures: Vec<ModelFailure>,
    pub cross_validation: Vec<CVSummary>,
    pub best_model: Option<BestModel>,
}

fn month_label(series: &TimeSeries, index: usize) -> String {
    series.date_at(index).format("%Y-%m").to_string()
}

/// Read the configured input, or generate the synthetic series.
pub fn load_series(config: &ReportConfig) -> Result<TimeSeries> {
    let series = match (config.synthetic_years, &config.input) {
        (Some(years), _) => synthetic_retail(years, config.seed)?,
        (None, Some(path)) => load_csv(path, &config.load_options())?,
        (None, None) => {
            return Err(ForecastError::Config(
                "no input file given and synthetic data not requested".into(),
            ))
        }
    };
    Ok(series.with_period(config.period))
}

/// Turn the lambda setting into a value, estimating it from `train` when
/// set to auto.
pub fn resolve_lambda(setting: LambdaSetting, train: &TimeSeries) -> Result<Option<f64>> {
    if setting != LambdaSetting::None && !train.is_strictly_positive() {
        warn!("series has non-positive values; Box-Cox disabled");
        return Ok(None);
    }
    match setting {
        LambdaSetting::None => Ok(None),
        LambdaSetting::Fixed(l) => Ok(Some(l)),
        LambdaSetting::Auto => {
            let lambda = boxcox_lambda(train.values(), train.period(), LambdaMethod::Guerrero)?;
            info!(lambda, "Box-Cox lambda chosen by Guerrero's method");
            Ok(Some(lambda))
        }
    }
}

/// A fresh, unfitted model of the given kind.
///
/// ARIMA-family models are wrapped in a Box-Cox transform when `lambda` is
/// set; the exponential smoothing models work on the original scale.
pub fn create_model(
    kind: ModelKind,
    period: usize,
    order: ARIMAOrder,
    lambda: Option<f64>,
) -> BoxedForecaster {
    let wrap = |inner: BoxedForecaster| -> BoxedForecaster {
        match lambda {
            Some(l) if kind.uses_boxcox() => Box::new(
                BoxCoxForecaster::new(inner, LambdaChoice::Fixed(l)).with_name(kind.label()),
            ),
            _ => inner,
        }
    };
    match kind {
        ModelKind::Naive => Box::new(Naive::new()),
        ModelKind::SeasonalNaive => Box::new(SeasonalNaive::new(period)),
        ModelKind::Drift => Box::new(RandomWalkWithDrift::new()),
        ModelKind::Arima => wrap(Box::new(ARIMA::new(order))),
        ModelKind::AutoArima => {
            let config = AutoARIMAConfig::default().with_seasonal_period(period);
            wrap(Box::new(AutoARIMA::with_config(config)))
        }
        ModelKind::Ets => Box::new(AutoETS::with_period(period)),
        ModelKind::HwAdditive => Box::new(HoltWinters::additive(period)),
        ModelKind::HwMultiplicative => Box::new(HoltWinters::multiplicative(period)),
    }
}

/// Registry of the configured models, keyed by [`ModelKind::label`].
pub fn build_registry(config: &ReportConfig, lambda: Option<f64>) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    let period = config.period;
    let order = config.arima_order();
    for &kind in &config.models {
        registry.register(ModelSpec::new(
            kind.label(),
            move || create_model(kind, period, order, lambda),
            true,
        ));
    }
    registry
}

/// Summary statistics and decomposition strengths.
pub fn describe(series: &TimeSeries) -> DataSummary {
    let values = series.values();
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let kind = if series.is_strictly_positive() {
        DecompositionType::Multiplicative
    } else {
        DecompositionType::Additive
    };
    let decomposition = classical_decomposition(values, series.period(), kind).ok();
    let profile = seasonal_profile(series);
    let position_name = |pos: usize| {
        if series.period() == 12 {
            MONTH_ABBR[pos].to_string()
        } else {
            format!("position {}", pos + 1)
        }
    };

    DataSummary {
        name: series.name().map(str::to_string),
        start: month_label(series, 0),
        end: month_label(series, series.len() - 1),
        observations: series.len(),
        mean: mean(values),
        std_dev: std_dev(values),
        min,
        max,
        seasonal_strength: decomposition.as_ref().map(|d| d.seasonal_strength()),
        trend_strength: decomposition.as_ref().map(|d| d.trend_strength()),
        peak: profile.peak().map(position_name),
        trough: profile.trough().map(position_name),
    }
}

/// Unit-root tests on the (Box-Cox transformed) series and after the
/// differencing suggested by `nsdiffs` and `ndiffs`.
pub fn stationarity_report(
    series: &TimeSeries,
    lambda: Option<f64>,
    acf_lags: usize,
) -> Result<StationarityReport> {
    let lambda = lambda.filter(|_| {
        let positive = series.is_strictly_positive();
        if !positive {
            warn!("series has non-positive values; stationarity tests run on the original scale");
        }
        positive
    });
    let values = match lambda {
        Some(l) => boxcox(series.values(), l)?,
        None => series.values().to_vec(),
    };
    let period = series.period();
    let level = TestPair::run(&values, Deterministic::Trend)?;

    let seasonal_diffs = nsdiffs(&values, period, 1)?;
    let seasonally_differenced = seasonal_difference(&values, seasonal_diffs, period);
    let first_diffs = ndiffs(&seasonally_differenced, ALPHA, 2)?;
    let differenced_values = difference(&seasonally_differenced, first_diffs);
    info!(
        seasonal_diffs,
        first_diffs,
        adf_p = level.adf.p_value,
        kpss_p = level.kpss.p_value,
        "stationarity diagnostics"
    );

    let (differenced, differenced_correlogram) = if seasonal_diffs + first_diffs > 0 {
        (
            Some(TestPair::run(&differenced_values, Deterministic::Constant)?),
            Some(Correlogram::of(&differenced_values, acf_lags)),
        )
    } else {
        (None, None)
    };

    Ok(StationarityReport {
        lambda,
        level,
        seasonal_diffs,
        first_diffs,
        differenced,
        differenced_correlogram,
    })
}

/// Fit `spec` on `train`, forecast over `test` and score it.
pub fn evaluate_model(
    spec: &ModelSpec,
    train: &TimeSeries,
    test: &TimeSeries,
    level: f64,
) -> Result<ModelReport> {
    let mut model = spec.create();
    model.fit(train)?;
    let forecast = model.predict_with_intervals(test.len(), level)?;
    let scale = mase_scale(train.values(), train.period());
    let test_metrics = calculate_metrics(test.values(), forecast.point(), scale)?;

    let training = match (model.fitted_values(), model.residuals()) {
        (Some(fitted), Some(_)) => {
            let (actual, predicted): (Vec<f64>, Vec<f64>) = train
                .values()
                .iter()
                .zip(fitted)
                .filter(|(_, f)| f.is_finite())
                .map(|(a, f)| (*a, *f))
                .unzip();
            calculate_metrics(&actual, &predicted, scale).ok()
        }
        _ => None,
    };

    let residuals = model.residuals().unwrap_or(&[]);
    let lags = default_lags(train.len(), train.period());
    let ljung_box = ljung_box(residuals, Some(lags), model.n_params());

    info!(
        model = %spec.name,
        description = %model.describe(),
        rmse = test_metrics.rmse,
        mase = ?test_metrics.mase,
        "hold-out evaluation"
    );

    Ok(ModelReport {
        model: spec.name.clone(),
        description: model.describe(),
        forecast,
        training,
        test: test_metrics,
        ljung_box,
    })
}

/// Rolling-origin evaluation of one registry entry.
pub fn cross_validate(
    series: &TimeSeries,
    spec: &ModelSpec,
    config: &ReportConfig,
) -> Result<CVSummary> {
    let cv_config = RollingOriginConfig::new(config.cv_window, config.cv_horizon)
        .with_step(config.cv_step)
        .with_period(config.period);
    let errors = rolling_origin(series, &cv_config, &spec.name, || spec.create())?;
    let overall = errors.overall();
    info!(
        model = %spec.name,
        folds = errors.n_folds(),
        failed = errors.failed_folds,
        mase = overall.mase,
        "cross-validation finished"
    );
    Ok(CVSummary {
        model: spec.name.clone(),
        folds: errors.n_folds(),
        failed_folds: errors.failed_folds,
        by_horizon: errors.horizon_summary(),
        overall,
    })
}

/// Lowest mean cross-validated MASE, ties broken by RMSE. Falls back to
/// the hold-out scores when no model was cross-validated.
pub fn select_best(cv: &[CVSummary], models: &[ModelReport]) -> Option<BestModel> {
    let by_score = |a: &(f64, f64), b: &(f64, f64)| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1));

    let from_cv = cv
        .iter()
        .filter(|c| c.overall.mase.is_finite())
        .map(|c| (c.model.as_str(), (c.overall.mase, c.overall.rmse)))
        .min_by(|a, b| by_score(&a.1, &b.1))
        .map(|(model, (mase, rmse))| BestModel {
            model: model.to_string(),
            basis: "cv",
            mase,
            rmse,
        });
    from_cv.or_else(|| {
        models
            .iter()
            .filter_map(|m| m.test.mase.map(|mase| (m.model.as_str(), (mase, m.test.rmse))))
            .min_by(|a, b| by_score(&a.1, &b.1))
            .map(|(model, (mase, rmse))| BestModel {
                model: model.to_string(),
                basis: "holdout",
                mase,
                rmse,
            })
    })
}

/// Run the whole study.
pub fn run_report(config: &ReportConfig) -> Result<Report> {
    config.validate()?;
    let series = load_series(config)?;
    let n = series.len();
    let min_train = 2 * config.period + 2;
    if n < config.test_horizon + min_train {
        return Err(ForecastError::Config(format!(
            "series has {} observations; a {}-month test period needs at least {}",
            n,
            config.test_horizon,
            config.test_horizon + min_train
        )));
    }
    info!(observations = n, start = %month_label(&series, 0), "series loaded");

    let data = describe(&series);
    let profile = seasonal_profile(&series);
    let correlogram = Correlogram::of(series.values(), config.acf_lags);

    let (train, test) = series.split_at(n - config.test_horizon)?;
    let lambda = resolve_lambda(config.lambda, &train)?;
    let stationarity = stationarity_report(&series, lambda, config.acf_lags)?;

    let registry = build_registry(config, lambda);
    let mut models = Vec::new();
    let mut failures = Vec::new();
    for spec in registry.iter() {
        match evaluate_model(spec, &train, &test, config.level) {
            Ok(report) => models.push(report),
            Err(e) => {
                warn!(model = %spec.name, error = %e, "model could not be evaluated");
                failures.push(ModelFailure {
                    model: spec.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let mut cross_validation = Vec::new();
    if config.skip_cv {
        info!("cross-validation skipped");
    } else if config.cv_window >= n {
        warn!(
            window = config.cv_window,
            observations = n,
            "series too short for the cross-validation window"
        );
    } else {
        for spec in registry.iter() {
            match cross_validate(&series, spec, config) {
                Ok(summary) => cross_validation.push(summary),
                Err(e) => warn!(model = %spec.name, error = %e, "cross-validation failed"),
            }
        }
    }

    let best_model = select_best(&cross_validation, &models);
    if let Some(best) = &best_model {
        info!(model = %best.model, basis = best.basis, mase = best.mase, "best model");
    }

    Ok(Report {
        config: config.clone(),
        series: SeriesData {
            dates: (0..n).map(|i| month_label(&series, i)).collect(),
            values: series.values().to_vec(),
        },
        split: SplitSummary {
            train_start: month_label(&train, 0),
            train_len: train.len(),
            test_start: month_label(&test, 0),
            test_len: test.len(),
        },
        data,
        profile,
        correlogram,
        stationarity,
        models,
        failures,
        cross_validation,
        best_model,
    })
}
