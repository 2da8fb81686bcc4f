//! Global optimization of the design parameters.
//!
//! + [DifferentialEvolution] minimizes a [SingleObjective](crate::objective::SingleObjective)
//!   over a fixed number of generations.
//! + [Nsga2] approximates the Pareto front of a
//!   [MultiObjective](crate::objective::MultiObjective).
//!
//! Both drivers record an [OptimizationHistory] with one entry per generation
//! and use a seeded random number generator. With the `rayon` feature, the
//! members of a population are evaluated in parallel.
use crate::errors::{CascadeError, CascadeResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

mod differential_evolution;
mod nsga2;
pub mod pareto;
pub use differential_evolution::{DeResult, DifferentialEvolution};
pub use nsga2::{Nsga2, ParetoResult};

/// Closed intervals of the three design parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl Bounds {
    pub fn new(bounds: [(f64, f64); 3]) -> CascadeResult<Self> {
        let bounds = Self {
            lower: bounds.map(|b| b.0),
            upper: bounds.map(|b| b.1),
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// A/V in [1000, 2000] 1/cm, d in [1, 3] cm and porosity in [0.2, 0.5].
    pub fn reactor_design() -> Self {
        Self {
            lower: [1000.0, 1.0, 0.2],
            upper: [2000.0, 3.0, 0.5],
        }
    }

    pub fn validate(&self) -> CascadeResult<()> {
        for (i, (l, u)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !(l.is_finite() && u.is_finite() && l < u) {
                return Err(CascadeError::InvalidConfig(format!(
                    "invalid bounds [{l}, {u}] of parameter {i}"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, x: &[f64; 3]) -> bool {
        (0..3).all(|i| x[i] >= self.lower[i] && x[i] <= self.upper[i])
    }

    /// Map a point of the unit cube into the bounds.
    pub fn scale(&self, u: &[f64; 3]) -> [f64; 3] {
        std::array::from_fn(|i| self.lower[i] + u[i] * (self.upper[i] - self.lower[i]))
    }

    /// Map a point within the bounds onto the unit cube.
    pub fn unscale(&self, x: &[f64; 3]) -> [f64; 3] {
        std::array::from_fn(|i| (x[i] - self.lower[i]) / (self.upper[i] - self.lower[i]))
    }
}

/// Progress of an optimization after a generation.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    /// Generation, starting at 1.
    pub iteration: usize,
    pub objectives: Vec<f64>,
    /// Design parameters of the best member.
    pub x: [f64; 3],
}

/// Append-only record of the progress of an optimization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizationHistory {
    names: Vec<String>,
    entries: Vec<HistoryEntry>,
}

impl OptimizationHistory {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            entries: Vec::new(),
        }
    }

    /// Append an entry with the next iteration index.
    pub fn record(&mut self, objectives: Vec<f64>, x: [f64; 3]) {
        self.entries.push(HistoryEntry {
            iteration: self.entries.len() + 1,
            objectives,
            x,
        });
    }

    /// Names of the objectives.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}

pub(crate) fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Evaluate `f` for all points and return the first error. The points are
/// independent, so they are distributed over the rayon thread pool if the
/// feature is enabled.
#[cfg(feature = "rayon")]
pub(crate) fn evaluate_population<T, F>(points: &[[f64; 3]], f: F) -> CascadeResult<Vec<T>>
where
    T: Send,
    F: Fn(&[f64; 3]) -> CascadeResult<T> + Sync + Send,
{
    use rayon::prelude::*;
    points.par_iter().map(f).collect()
}

#[cfg(not(feature = "rayon"))]
pub(crate) fn evaluate_population<T, F>(points: &[[f64; 3]], f: F) -> CascadeResult<Vec<T>>
where
    F: Fn(&[f64; 3]) -> CascadeResult<T>,
{
    points.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() -> CascadeResult<()> {
        let bounds = Bounds::new([(1000.0, 2000.0), (1.0, 3.0), (0.2, 0.5)])?;
        assert_eq!(bounds, Bounds::reactor_design());
        assert_eq!(bounds.scale(&[0.5, 0.0, 0.0]), [1500.0, 1.0, 0.2]);
        assert_eq!(bounds.unscale(&[1500.0, 1.0, 0.2]), [0.5, 0.0, 0.0]);
        assert!(bounds.contains(&[1000.0, 3.0, 0.3]));
        assert!(!bounds.contains(&[999.0, 3.0, 0.3]));
        assert!(Bounds::new([(1.0, 1.0), (0.0, 1.0), (0.0, 1.0)]).is_err());
        assert!(Bounds::new([(0.0, 1.0), (0.0, f64::INFINITY), (0.0, 1.0)]).is_err());
        Ok(())
    }

    #[test]
    fn history_is_numbered() {
        let mut history = OptimizationHistory::new(vec!["f".into()]);
        history.record(vec![3.0], [0.0; 3]);
        history.record(vec![2.0], [1.0; 3]);
        let iterations: Vec<_> = history.entries().iter().map(|e| e.iteration).collect();
        assert_eq!(iterations, vec![1, 2]);
        assert_eq!(history.last().map(|e| e.objectives[0]), Some(2.0));
    }

    #[test]
    fn population_evaluation_keeps_order() -> CascadeResult<()> {
        let points: Vec<_> = (0..20).map(|i| [i as f64, 0.0, 0.0]).collect();
        let values = evaluate_population(&points, |x| Ok(2.0 * x[0]))?;
        assert!(values.iter().enumerate().all(|(i, &v)| v == 2.0 * i as f64));
        Ok(())
    }

    #[test]
    fn population_evaluation_returns_errors() {
        let points: Vec<_> = (0..20).map(|i| [i as f64, 0.0, 0.0]).collect();
        let result = evaluate_population(&points, |x| match x[0] as usize {
            7 => Err(CascadeError::InvalidConfig("no CH4".into())),
            _ => Ok(x[0]),
        });
        assert!(matches!(result, Err(CascadeError::InvalidConfig(_))));
    }
}
