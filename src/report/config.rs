//! Report configuration, loaded from TOML and overridden from the command line.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{Layout, LoadOptions};
use crate::error::{ForecastError, Result};
use crate::models::arima::ARIMAOrder;

/// Box-Cox setting: off, chosen automatically, or a fixed lambda.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LambdaRepr", into = "LambdaRepr")]
pub enum LambdaSetting {
    None,
    #[default]
    Auto,
    Fixed(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LambdaRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LambdaRepr> for LambdaSetting {
    type Error = ForecastError;

    fn try_from(repr: LambdaRepr) -> Result<Self> {
        match repr {
            LambdaRepr::Number(v) => Ok(LambdaSetting::Fixed(v)),
            LambdaRepr::Text(s) => s.parse(),
        }
    }
}

impl From<LambdaSetting> for LambdaRepr {
    fn from(setting: LambdaSetting) -> Self {
        match setting {
            LambdaSetting::None => LambdaRepr::Text("none".into()),
            LambdaSetting::Auto => LambdaRepr::Text("auto".into()),
            LambdaSetting::Fixed(v) => LambdaRepr::Number(v),
        }
    }
}

impl FromStr for LambdaSetting {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(LambdaSetting::None),
            "auto" => Ok(LambdaSetting::Auto),
            other => other.parse::<f64>().map(LambdaSetting::Fixed).map_err(|_| {
                ForecastError::Config(format!(
                    "lambda must be 'none', 'auto' or a number, got '{}'",
                    s
                ))
            }),
        }
    }
}

/// Models the report can fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Naive,
    SeasonalNaive,
    Drift,
    /// ARIMA with the configured order.
    Arima,
    AutoArima,
    /// AutoETS selection.
    Ets,
    HwAdditive,
    HwMultiplicative,
}

impl ModelKind {
    pub const ALL: [ModelKind; 8] = [
        ModelKind::Naive,
        ModelKind::SeasonalNaive,
        ModelKind::Drift,
        ModelKind::Arima,
        ModelKind::AutoArima,
        ModelKind::Ets,
        ModelKind::HwAdditive,
        ModelKind::HwMultiplicative,
    ];

    /// Registry name, also accepted on the command line.
    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Naive => "Naive",
            ModelKind::SeasonalNaive => "SNaive",
            ModelKind::Drift => "Drift",
            ModelKind::Arima => "ARIMA",
            ModelKind::AutoArima => "AutoARIMA",
            ModelKind::Ets => "ETS",
            ModelKind::HwAdditive => "HW-additive",
            ModelKind::HwMultiplicative => "HW-multiplicative",
        }
    }

    /// Whether the Box-Cox setting applies to this model.
    pub fn uses_boxcox(self) -> bool {
        matches!(self, ModelKind::Arima | ModelKind::AutoArima)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        let kind = match key.as_str() {
            "naive" => ModelKind::Naive,
            "snaive" | "seasonal-naive" => ModelKind::SeasonalNaive,
            "drift" | "rwf" => ModelKind::Drift,
            "arima" => ModelKind::Arima,
            "auto-arima" | "autoarima" => ModelKind::AutoArima,
            "ets" | "auto-ets" | "autoets" => ModelKind::Ets,
            "hw-additive" | "hw" => ModelKind::HwAdditive,
            "hw-multiplicative" => ModelKind::HwMultiplicative,
            _ => {
                return Err(ForecastError::Config(format!(
                    "unknown model '{}' (expected one of: {})",
                    s,
                    ModelKind::ALL.map(|k| k.label()).join(", ")
                )))
            }
        };
        Ok(kind)
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "md" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ForecastError::Config(format!(
                "unknown output format '{}'",
                s
            ))),
        }
    }
}

/// Manual ARIMA order `(p,d,q)(P,D,Q)`; the seasonal period comes from
/// [`ReportConfig::period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    pub order: [usize; 3],
    pub seasonal: [usize; 3],
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            order: [1, 1, 1],
            seasonal: [0, 1, 1],
        }
    }
}

impl OrderConfig {
    pub fn to_order(self, period: usize) -> ARIMAOrder {
        let [p, d, q] = self.order;
        let [cap_p, cap_d, cap_q] = self.seasonal;
        if period > 1 {
            ARIMAOrder::new(p, d, q).seasonal(cap_p, cap_d, cap_q, period)
        } else {
            ARIMAOrder::new(p, d, q)
        }
    }
}

/// Everything the report pipeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// CSV input; ignored when `synthetic_years` is set.
    pub input: Option<PathBuf>,
    pub date_column: Option<String>,
    pub value_column: Option<String>,
    pub layout: Layout,
    /// Use a synthetic series of this many years instead of a file.
    pub synthetic_years: Option<usize>,
    pub seed: u64,
    pub period: usize,
    /// Months held out for the accuracy comparison.
    pub test_horizon: usize,
    pub cv_window: usize,
    pub cv_horizon: usize,
    pub cv_step: usize,
    pub lambda: LambdaSetting,
    pub arima: OrderConfig,
    /// Prediction interval coverage.
    pub level: f64,
    pub acf_lags: usize,
    pub models: Vec<ModelKind>,
    /// Skip rolling-origin evaluation.
    pub skip_cv: bool,
    pub format: OutputFormat,
    pub chart_width: usize,
    pub chart_height: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: None,
            date_column: None,
            value_column: None,
            layout: Layout::Auto,
            synthetic_years: None,
            seed: 42,
            period: 12,
            test_horizon: 24,
            cv_window: 120,
            cv_horizon: 12,
            cv_step: 1,
            lambda: LambdaSetting::Auto,
            arima: OrderConfig::default(),
            level: 0.95,
            acf_lags: 36,
            models: ModelKind::ALL.to_vec(),
            skip_cv: false,
            format: OutputFormat::Text,
            chart_width: 72,
            chart_height: 16,
        }
    }
}

impl ReportConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ReportConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Read a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded report configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ForecastError::Config(msg));
        if self.input.is_none() && self.synthetic_years.is_none() {
            return fail("either `input` or `synthetic_years` must be set".into());
        }
        if self.synthetic_years == Some(0) {
            return fail("`synthetic_years` must be positive".into());
        }
        if self.period == 0 {
            return fail("`period` must be positive".into());
        }
        if self.test_horizon == 0 {
            return fail("`test_horizon` must be positive".into());
        }
        if self.cv_horizon == 0 || self.cv_step == 0 || self.cv_window == 0 {
            return fail("`cv_window`, `cv_horizon` and `cv_step` must be positive".into());
        }
        if !(self.level > 0.0 && self.level < 1.0) {
            return fail(format!("`level` must be in (0, 1), got {}", self.level));
        }
        if let LambdaSetting::Fixed(l) = self.lambda {
            if !(-1.0..=2.0).contains(&l) {
                return fail(format!("`lambda` must be in [-1, 2], got {}", l));
            }
        }
        if self.models.is_empty() {
            return fail("`models` must name at least one model".into());
        }
        if self.chart_width < 10 || self.chart_height < 3 {
            return fail("charts need a width of at least 10 and height of at least 3".into());
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_column: self.date_column.clone(),
            value_column: self.value_column.clone(),
            layout: self.layout,
            name: None,
        }
    }

    pub fn arima_order(&self) -> ARIMAOrder {
        self.arima.to_order(self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = ReportConfig {
            synthetic_years: Some(20),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        let back = ReportConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = ReportConfig::from_toml_str(
            r#"
            input = "retail.csv"
            lambda = 0.0
            models = ["naive", "auto-arima", "hw-multiplicative"]

            [arima]
            order = [2, 1, 0]
            seasonal = [1, 1, 0]
            "#,
        )
        .unwrap();
        assert_eq!(config.lambda, LambdaSetting::Fixed(0.0));
        assert_eq!(config.cv_window, 120);
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.arima_order().to_string(), "ARIMA(2,1,0)(1,1,0)[12]");
        config.validate().unwrap();
    }

    #[test]
    fn lambda_keywords() {
        let config = ReportConfig::from_toml_str("lambda = \"none\"").unwrap();
        assert_eq!(config.lambda, LambdaSetting::None);
        assert_eq!("auto".parse::<LambdaSetting>().unwrap(), LambdaSetting::Auto);
        assert_eq!("0.5".parse::<LambdaSetting>().unwrap(), LambdaSetting::Fixed(0.5));
        assert!("sometimes".parse::<LambdaSetting>().is_err());
        assert!(ReportConfig::from_toml_str("lambda = \"maybe\"").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ReportConfig::from_toml_str("horizon = 3"),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn validation_failures() {
        let base = ReportConfig {
            synthetic_years: Some(10),
            ..Default::default()
        };
        assert!(ReportConfig::default().validate().is_err());
        for bad in [
            ReportConfig { level: 1.5, ..base.clone() },
            ReportConfig { test_horizon: 0, ..base.clone() },
            ReportConfig { lambda: LambdaSetting::Fixed(3.0), ..base.clone() },
            ReportConfig { models: vec![], ..base.clone() },
        ] {
            assert!(matches!(bad.validate(), Err(ForecastError::Config(_))));
        }
    }

    #[test]
    fn model_names_parse() {
        assert_eq!("SNaive".parse::<ModelKind>().unwrap(), ModelKind::SeasonalNaive);
        assert_eq!("auto_arima".parse::<ModelKind>().unwrap(), ModelKind::AutoArima);
        for kind in ModelKind::ALL {
            assert_eq!(kind.label().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("prophet".parse::<ModelKind>().is_err());
    }
}
