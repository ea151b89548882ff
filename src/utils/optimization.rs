//! Derivative-free minimisation used for model parameter estimation.

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Tuning knobs for the simplex search.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values falls below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// Minimise `objective` starting from `initial`.
///
/// Points are clamped into `bounds` (one `(min, max)` per dimension) before
/// every evaluation, so the objective never sees an out-of-range vector.
/// Non-finite objective values are treated as `+inf`.
///
/// # Example
/// ```
/// use retail_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let start = clamp_to(initial, bounds);
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step * 0.25
        };
        vertex[i] += step;
        // Step back inside the box when the push hit a bound.
        let clamped = clamp_to(&vertex, bounds);
        if (clamped[i] - start[i]).abs() < 1e-12 {
            vertex[i] = start[i] - step;
        }
        simplex.push(clamp_to(&vertex, bounds));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if spread.is_finite() && spread.abs() <= config.tolerance * (1.0 + values[best].abs()) {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);

        let reflected = clamp_to(&along(&centroid, &simplex[worst], -config.alpha), bounds);
        let f_reflected = eval(&reflected);

        if f_reflected < values[best] {
            let expanded = clamp_to(&along(&centroid, &simplex[worst], -config.gamma), bounds);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
            continue;
        }

        let (candidate, f_candidate) = if f_reflected < values[worst] {
            let outside = clamp_to(&along(&centroid, &reflected, config.rho), bounds);
            let f = eval(&outside);
            (outside, f)
        } else {
            let inside = clamp_to(&along(&centroid, &simplex[worst], config.rho), bounds);
            let f = eval(&inside);
            (inside, f)
        };

        if f_candidate < values[worst].min(f_reflected) {
            simplex[worst] = candidate;
            values[worst] = f_candidate;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&simplex[i])
                .map(|(a, x)| a + config.sigma * (x - a))
                .collect();
            simplex[i] = clamp_to(&shrunk, bounds);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

/// `centroid + t * (point - centroid)`.
fn along(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + t * (p - c))
        .collect()
}

fn centroid_without(simplex: &[Vec<f64>], skip: usize) -> Vec<f64> {
    let dim = simplex[0].len();
    let mut c = vec![0.0; dim];
    for (i, v) in simplex.iter().enumerate() {
        if i != skip {
            for (acc, x) in c.iter_mut().zip(v) {
                *acc += x;
            }
        }
    }
    let k = (simplex.len() - 1) as f64;
    c.iter_mut().for_each(|x| *x /= k);
    c
}

fn clamp_to(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        Some(b) => point
            .iter()
            .zip(b)
            .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
            .collect(),
        None => point.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimises_quadratic() {
        let r = nelder_mead(
            |x| (x[0] - 1.5).powi(2) + 3.0 * (x[1] - 0.5).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(r.converged);
        assert_relative_eq!(r.optimal_point[0], 1.5, epsilon = 1e-3);
        assert_relative_eq!(r.optimal_point[1], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let r = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.5],
            Some(&[(0.0, 1.0)]),
            NelderMeadConfig::default(),
        );
        assert!(r.optimal_point[0] <= 1.0);
        assert_relative_eq!(r.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn rosenbrock_is_solved() {
        let r = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.2, 1.0],
            None,
            NelderMeadConfig::default().with_max_iter(5000),
        );
        assert_relative_eq!(r.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(r.optimal_point[1], 1.0, epsilon = 2e-2);
    }

    #[test]
    fn non_finite_objective_is_avoided() {
        let r = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.2).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );
        assert!(r.optimal_value.is_finite());
        assert_relative_eq!(r.optimal_point[0], 0.2, epsilon = 1e-3);
    }
}
