//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals at coverage `level` (e.g. 0.95).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample one-step predictions, aligned with the training data.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted). Undefined leading entries are NaN.
    fn residuals(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;

    /// One-line description of the fitted model, e.g. its selected order.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Number of estimated parameters, used for residual-test degrees of freedom.
    fn n_params(&self) -> usize {
        0
    }

    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

impl<F: Forecaster + ?Sized> Forecaster for Box<F> {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        (**self).fit(series)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        (**self).predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        (**self).predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        (**self).fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        (**self).residuals()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn n_params(&self) -> usize {
        (**self).n_params()
    }

    fn is_fitted(&self) -> bool {
        (**self).is_fitted()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use retail_forecast::models::{BoxedForecaster, Forecaster};
/// use retail_forecast::models::baseline::Naive;
///
/// let model: BoxedForecaster = Box::new(Naive::new());
/// assert_eq!(model.name(), "Naive");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// A named factory producing fresh, unfitted models.
///
/// Cross-validation calls [`ModelSpec::create`] once per fold.
///
/// # Example
///
/// ```
/// use retail_forecast::models::ModelSpec;
/// use retail_forecast::models::baseline::{Naive, SeasonalNaive};
///
/// let specs = vec![
///     ModelSpec::new("Naive", || Box::new(Naive::new()), true),
///     ModelSpec::with_period("SeasonalNaive", |p| Box::new(SeasonalNaive::new(p)), 12, true),
/// ];
///
/// for spec in &specs {
///     let model = spec.create();
///     assert!(!model.is_fitted());
/// }
/// ```
pub struct ModelSpec {
    /// Display name of the model
    pub name: String,
    factory: Box<dyn Fn() -> BoxedForecaster + Send + Sync>,
    /// Whether the model produces its own prediction intervals
    pub has_intervals: bool,
}

impl ModelSpec {
    pub fn new<F>(name: impl Into<String>, factory: F, has_intervals: bool) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            has_intervals,
        }
    }

    /// Create a model spec whose factory takes the seasonal period.
    pub fn with_period<F>(
        name: impl Into<String>,
        factory: F,
        period: usize,
        has_intervals: bool,
    ) -> Self
    where
        F: Fn(usize) -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(move || factory(period)),
            has_intervals,
        }
    }

    /// Create a new model instance.
    pub fn create(&self) -> BoxedForecaster {
        (self.factory)()
    }
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .field("has_intervals", &self.has_intervals)
            .finish()
    }
}

/// Ordered collection of model specifications.
///
/// # Example
///
/// ```
/// use retail_forecast::models::{ModelRegistry, ModelSpec};
/// use retail_forecast::models::baseline::Naive;
///
/// let mut registry = ModelRegistry::new();
/// registry.register(ModelSpec::new("Naive", || Box::new(Naive::new()), true));
///
/// let spec = registry.get("naive").unwrap();
/// assert_eq!(spec.create().name(), "Naive");
/// ```
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model specification. A spec with the same name replaces
    /// the earlier one.
    pub fn register(&mut self, spec: ModelSpec) {
        match self.models.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.models.push(spec),
        }
    }

    /// Look up a spec by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeSeries;
    use crate::models::baseline::{Naive, RandomWalkWithDrift, SeasonalNaive};

    fn make_test_series(n: usize) -> TimeSeries {
        let values: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        TimeSeries::from_values(values).unwrap()
    }

    #[test]
    fn test_boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(Naive::new());
        assert!(!model.is_fitted());

        model.fit(&make_test_series(20)).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.has_intervals());
        assert_eq!(model.residuals().unwrap().len(), 20);
    }

    #[test]
    fn test_model_spec_creates_independent_instances() {
        let spec = ModelSpec::new("Naive", || Box::new(Naive::new()), true);
        let mut model1 = spec.create();
        let model2 = spec.create();

        model1.fit(&make_test_series(20)).unwrap();

        assert!(model1.is_fitted());
        assert!(!model2.is_fitted());
    }

    #[test]
    fn test_model_spec_with_period() {
        let spec = ModelSpec::with_period(
            "SeasonalNaive",
            |p| Box::new(SeasonalNaive::new(p)),
            4,
            true,
        );
        let mut model = spec.create();
        model.fit(&make_test_series(8)).unwrap();
        assert_eq!(model.predict(4).unwrap().point(), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_registry_lookup_and_replace() {
        let mut registry = ModelRegistry::new();
        assert!(registry.is_empty());

        registry.register(ModelSpec::new("Naive", || Box::new(Naive::new()), true));
        registry.register(ModelSpec::new(
            "Drift",
            || Box::new(RandomWalkWithDrift::new()),
            true,
        ));
        registry.register(ModelSpec::new("Naive", || Box::new(Naive::new()), false));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["Naive", "Drift"]);
        assert!(!registry.get("NAIVE").unwrap().has_intervals);
        assert!(registry.get("ets").is_none());
    }

    #[test]
    fn test_registry_batch_fit_predict() {
        let mut registry = ModelRegistry::new();
        registry.register(ModelSpec::new("Naive", || Box::new(Naive::new()), true));
        registry.register(ModelSpec::new(
            "Drift",
            || Box::new(RandomWalkWithDrift::new()),
            true,
        ));

        let ts = make_test_series(30);
        let results: Vec<Vec<f64>> = registry
            .iter()
            .filter_map(|spec| {
                let mut model = spec.create();
                model.fit(&ts).ok()?;
                model.predict(5).ok().map(|f| f.point().to_vec())
            })
            .collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], vec![30.0; 5]);
        assert_eq!(results[1][0], 31.0);
    }
}
