//! Objectives that map design parameters `[A/V, d, porosity]` to values that
//! are minimized by the optimizers in [crate::optimize].
//!
//! The adapters are total over the design space: a failed or impossible
//! simulation is mapped to a large finite value so that the optimizers can
//! move away from it. Errors that do not depend on the design, like a
//! mechanism without CH4, are returned.
use crate::cascade::{CstrCascade, SimulationOptions, SimulationResult};
use crate::errors::{CascadeError, CascadeResult};
use crate::geometry::DesignParameters;
use serde::{Deserialize, Serialize};

/// Values that replace the results of failed simulations and the penalty
/// for exceeding the catalyst volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyOptions {
    /// Objective value of a failed simulation.
    pub failure: f64,
    /// Objective value of a failed simulation in the constrained problem.
    pub constraint_failure: f64,
    /// Factor of the relative constraint violation.
    pub coefficient: f64,
    /// Exponent of the relative constraint violation.
    pub exponent: f64,
    /// Slope of the catalyst volume of failed designs with respect to the
    /// sum of the design parameters.
    pub failure_slope: f64,
}

impl Default for PenaltyOptions {
    fn default() -> Self {
        Self {
            failure: 1e3,
            constraint_failure: 100.0,
            coefficient: 50.0,
            exponent: 2.0,
            failure_slope: 1e-6,
        }
    }
}

impl PenaltyOptions {
    /// Penalty for a catalyst volume above `v_cat_max`.
    pub fn volume_penalty(&self, v_cat: f64, v_cat_max: f64) -> f64 {
        if v_cat <= v_cat_max {
            return 0.0;
        }
        let violation = (v_cat - v_cat_max) / (v_cat_max + 1e-30);
        self.coefficient * violation.powf(self.exponent)
    }

    /// Catalyst volume assigned to a failed design. Distinct designs get
    /// distinct values.
    pub fn failure_volume(&self, x: &[f64; 3]) -> f64 {
        self.failure + self.failure_slope * x.iter().sum::<f64>()
    }
}

/// Objective and inequality constraint of a design.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub objectives: Vec<f64>,
    /// Constraint `g`, feasible for `g <= 0`.
    pub constraint: Option<f64>,
}

impl Evaluation {
    pub fn new(objectives: Vec<f64>) -> Self {
        Self {
            objectives,
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: f64) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Amount by which the constraint is violated.
    pub fn violation(&self) -> f64 {
        self.constraint.map_or(0.0, |g| g.max(0.0))
    }

    pub fn is_feasible(&self) -> bool {
        self.violation() == 0.0
    }
}

/// A scalar function of the design parameters that is minimized.
pub trait SingleObjective: Send + Sync {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<f64>;

    /// Column name of the objective.
    fn name(&self) -> String {
        "f".into()
    }
}

impl<F: Fn(&[f64; 3]) -> f64 + Send + Sync> SingleObjective for F {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<f64> {
        Ok(self(x))
    }
}

/// A vector of objectives that are minimized simultaneously.
pub trait MultiObjective: Send + Sync {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<Evaluation>;

    /// Objectives in physical units, as reported to the user.
    ///
    /// Defaults to the objectives used in the optimization.
    fn unscaled(&self, x: &[f64; 3]) -> CascadeResult<Vec<f64>> {
        self.evaluate(x).map(|e| e.objectives)
    }

    /// Convert objectives as seen by the optimizer into physical units.
    ///
    /// Defaults to the identity.
    fn unscale(&self, objectives: &[f64]) -> Vec<f64> {
        objectives.to_vec()
    }

    /// Column names of the objectives.
    fn names(&self) -> Vec<String> {
        vec!["f1".into(), "f2".into()]
    }
}

impl<F: Fn(&[f64; 3]) -> Evaluation + Send + Sync> MultiObjective for F {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<Evaluation> {
        Ok(self(x))
    }
}

/// Simulate a design. `None` if the design is impossible or the simulation
/// fails.
fn simulate_design(
    model: &CstrCascade,
    x: &[f64; 3],
    options: &SimulationOptions,
) -> CascadeResult<Option<SimulationResult>> {
    match model.simulate(DesignParameters::from(*x), options) {
        Ok(result) if result.ch4.is_finite() => Ok(Some(result)),
        Ok(_) => Ok(None),
        Err(CascadeError::SimulationFailed { .. } | CascadeError::InvalidDesign(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn simulate_ch4(
    model: &CstrCascade,
    x: &[f64; 3],
    options: &SimulationOptions,
) -> CascadeResult<Option<f64>> {
    Ok(simulate_design(model, x, options)?.map(|result| result.ch4))
}

/// Outlet mole fraction of CH4, or the failure value if the simulation fails.
pub fn objective_ch4(model: &CstrCascade, x: &[f64; 3]) -> CascadeResult<f64> {
    let ch4 = simulate_ch4(model, x, &SimulationOptions::default())?;
    Ok(ch4.unwrap_or(PenaltyOptions::default().failure))
}

/// Outlet mole fraction of CH4 with a penalty for catalyst volumes above
/// `v_cat_max` in m³.
pub fn objective_ch4_with_volume_constraint(
    model: &CstrCascade,
    x: &[f64; 3],
    v_cat_max: f64,
    penalty: &PenaltyOptions,
) -> CascadeResult<f64> {
    constrained_ch4(model, x, v_cat_max, penalty, &SimulationOptions::default())
}

fn constrained_ch4(
    model: &CstrCascade,
    x: &[f64; 3],
    v_cat_max: f64,
    penalty: &PenaltyOptions,
    options: &SimulationOptions,
) -> CascadeResult<f64> {
    let v_cat = model.catalyst_volume(DesignParameters::from(*x));
    Ok(match simulate_ch4(model, x, options)? {
        Some(ch4) => ch4 + penalty.volume_penalty(v_cat, v_cat_max),
        None => penalty.constraint_failure,
    })
}

/// Outlet mole fraction of CH4 and catalyst volume in m³.
pub fn multi_objective_vector(model: &CstrCascade, x: &[f64; 3]) -> CascadeResult<[f64; 2]> {
    tradeoff(model, x, &PenaltyOptions::default(), &SimulationOptions::default())
}

fn tradeoff(
    model: &CstrCascade,
    x: &[f64; 3],
    penalty: &PenaltyOptions,
    options: &SimulationOptions,
) -> CascadeResult<[f64; 2]> {
    Ok(match simulate_design(model, x, options)? {
        Some(result) => [result.ch4, result.v_cat],
        None => [penalty.failure, penalty.failure_volume(x)],
    })
}

/// Minimize the outlet mole fraction of CH4.
#[derive(Clone, Debug)]
pub struct Ch4Objective {
    cascade: CstrCascade,
    options: SimulationOptions,
    penalty: PenaltyOptions,
}

impl Ch4Objective {
    pub fn new(cascade: CstrCascade) -> Self {
        Self {
            cascade,
            options: SimulationOptions::default(),
            penalty: PenaltyOptions::default(),
        }
    }

    pub fn options(mut self, options: SimulationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn penalty(mut self, penalty: PenaltyOptions) -> Self {
        self.penalty = penalty;
        self
    }
}

impl SingleObjective for Ch4Objective {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<f64> {
        let ch4 = simulate_ch4(&self.cascade, x, &self.options)?;
        Ok(ch4.unwrap_or(self.penalty.failure))
    }

    fn name(&self) -> String {
        "CH4".into()
    }
}

/// Minimize the outlet mole fraction of CH4 with a penalty on the catalyst
/// volume.
#[derive(Clone, Debug)]
pub struct ConstrainedCh4Objective {
    cascade: CstrCascade,
    v_cat_max: f64,
    options: SimulationOptions,
    penalty: PenaltyOptions,
}

impl ConstrainedCh4Objective {
    /// Maximum catalyst volume in m³.
    pub fn new(cascade: CstrCascade, v_cat_max: f64) -> Self {
        Self {
            cascade,
            v_cat_max,
            options: SimulationOptions::default(),
            penalty: PenaltyOptions::default(),
        }
    }

    pub fn options(mut self, options: SimulationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn penalty(mut self, penalty: PenaltyOptions) -> Self {
        self.penalty = penalty;
        self
    }
}

impl SingleObjective for ConstrainedCh4Objective {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<f64> {
        constrained_ch4(&self.cascade, x, self.v_cat_max, &self.penalty, &self.options)
    }

    fn name(&self) -> String {
        "CH4_penalized".into()
    }
}

/// Simultaneous minimization of the outlet mole fraction of CH4 and the
/// catalyst volume.
///
/// The objectives are divided by `ch4_scale` and `vcat_scale` during the
/// optimization. With a maximum catalyst volume, designs above it are
/// infeasible.
#[derive(Clone, Debug)]
pub struct CatalystTradeoff {
    cascade: CstrCascade,
    options: SimulationOptions,
    penalty: PenaltyOptions,
    ch4_scale: f64,
    vcat_scale: f64,
    v_cat_max: Option<f64>,
}

impl CatalystTradeoff {
    pub fn new(cascade: CstrCascade) -> Self {
        Self {
            cascade,
            options: SimulationOptions::default(),
            penalty: PenaltyOptions::default(),
            ch4_scale: 1.0,
            vcat_scale: 1e-9,
            v_cat_max: None,
        }
    }

    pub fn options(mut self, options: SimulationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn penalty(mut self, penalty: PenaltyOptions) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn scales(mut self, ch4_scale: f64, vcat_scale: f64) -> Self {
        self.ch4_scale = ch4_scale;
        self.vcat_scale = vcat_scale;
        self
    }

    /// Maximum catalyst volume in m³.
    pub fn v_cat_max(mut self, v_cat_max: Option<f64>) -> Self {
        self.v_cat_max = v_cat_max;
        self
    }
}

impl MultiObjective for CatalystTradeoff {
    fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<Evaluation> {
        let [ch4, v_cat] = tradeoff(&self.cascade, x, &self.penalty, &self.options)?;
        let evaluation = Evaluation::new(vec![
            ch4 / (self.ch4_scale + 1e-30),
            v_cat / (self.vcat_scale + 1e-30),
        ]);
        Ok(match self.v_cat_max {
            Some(v_cat_max) => evaluation.with_constraint(v_cat - v_cat_max),
            None => evaluation,
        })
    }

    /// CH4 from a fresh simulation (NaN if it fails) and the geometric
    /// catalyst volume.
    fn unscaled(&self, x: &[f64; 3]) -> CascadeResult<Vec<f64>> {
        let ch4 = simulate_ch4(&self.cascade, x, &self.options)?;
        Ok(vec![
            ch4.unwrap_or(f64::NAN),
            self.cascade.catalyst_volume(DesignParameters::from(*x)),
        ])
    }

    fn unscale(&self, objectives: &[f64]) -> Vec<f64> {
        vec![
            objectives[0] * (self.ch4_scale + 1e-30),
            objectives[1] * (self.vcat_scale + 1e-30),
        ]
    }

    fn names(&self) -> Vec<String> {
        vec!["CH4_out".into(), "V_cat_m3".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn volume_penalty() {
        let penalty = PenaltyOptions::default();
        assert_eq!(penalty.volume_penalty(1e-9, 2e-9), 0.0);
        assert_eq!(penalty.volume_penalty(2e-9, 2e-9), 0.0);
        assert_relative_eq!(penalty.volume_penalty(3e-9, 2e-9), 12.5, max_relative = 1e-12);
        let linear = PenaltyOptions {
            exponent: 1.0,
            ..Default::default()
        };
        assert_relative_eq!(linear.volume_penalty(3e-9, 2e-9), 25.0, max_relative = 1e-12);
    }

    #[test]
    fn failure_volume_separates_designs() {
        let penalty = PenaltyOptions::default();
        let a = penalty.failure_volume(&[1000.0, 1.0, 0.2]);
        let b = penalty.failure_volume(&[1000.0, 1.0, 0.3]);
        assert_relative_eq!(a, 1e3 + 1e-6 * 1001.2, max_relative = 1e-14);
        assert!(b > a);
    }

    #[test]
    fn evaluation_feasibility() {
        let e = Evaluation::new(vec![1.0, 2.0]);
        assert!(e.is_feasible());
        let e = e.with_constraint(0.5);
        assert!(!e.is_feasible());
        assert_eq!(e.violation(), 0.5);
        assert!(Evaluation::new(vec![1.0]).with_constraint(-1.0).is_feasible());
    }

    #[test]
    fn closures_are_objectives() -> CascadeResult<()> {
        let sphere = |x: &[f64; 3]| x.iter().map(|xi| xi * xi).sum::<f64>();
        assert_eq!(SingleObjective::evaluate(&sphere, &[1.0, 2.0, 3.0])?, 14.0);
        let pair = |x: &[f64; 3]| Evaluation::new(vec![x[0], 1.0 - x[0]]);
        assert_eq!(MultiObjective::unscaled(&pair, &[0.25, 0.0, 0.0])?, vec![0.25, 0.75]);
        Ok(())
    }
}
