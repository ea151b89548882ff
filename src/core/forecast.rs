//! Forecast result structure for holding predictions.

use serde::Serialize;

/// Point forecasts with optional prediction interval bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Forecast {
    point: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lower: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upper: Option<Vec<f64>>,
    /// Coverage of the interval, e.g. 0.95.
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point predictions only.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
            level: None,
        }
    }

    /// Point predictions with interval bounds at `level`.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Apply a monotone increasing transform to points and bounds.
    pub fn map<F>(&self, f: F) -> Forecast
    where
        F: Fn(f64) -> f64,
    {
        Forecast {
            point: self.point.iter().map(|&v| f(v)).collect(),
            lower: self.lower.as_ref().map(|l| l.iter().map(|&v| f(v)).collect()),
            upper: self.upper.as_ref().map(|u| u.iter().map(|&v| f(v)).collect()),
            level: self.level,
        }
    }

    /// Keep only the first `h` steps.
    pub fn truncated(&self, h: usize) -> Forecast {
        let h = h.min(self.point.len());
        Forecast {
            point: self.point[..h].to_vec(),
            lower: self.lower.as_ref().map(|l| l[..h].to_vec()),
            upper: self.upper.as_ref().map(|u| u[..h].to_vec()),
            level: self.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_forecast_has_no_intervals() {
        let f = Forecast::from_values(vec![1.0, 2.0]);
        assert_eq!(f.horizon(), 2);
        assert!(!f.has_intervals());
        assert_eq!(f.level(), None);
    }

    #[test]
    fn map_transforms_every_component() {
        let f = Forecast::from_values_with_intervals(
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
            vec![1.0, 2.0],
            0.8,
        );
        let g = f.map(|v| v * 10.0);
        assert_eq!(g.point(), &[0.0, 10.0]);
        assert_eq!(g.lower().unwrap(), &[-10.0, 0.0]);
        assert_eq!(g.upper().unwrap(), &[10.0, 20.0]);
        assert_eq!(g.level(), Some(0.8));
    }

    #[test]
    fn truncated_keeps_prefix() {
        let f = Forecast::from_values_with_intervals(
            vec![1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0],
            vec![2.0, 3.0, 4.0],
            0.95,
        );
        let t = f.truncated(2);
        assert_eq!(t.point(), &[1.0, 2.0]);
        assert_eq!(t.upper().unwrap(), &[2.0, 3.0]);
        assert_eq!(f.truncated(10).horizon(), 3);
    }
}
