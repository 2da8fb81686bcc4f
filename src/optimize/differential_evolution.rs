use super::{evaluate_population, rng, Bounds, OptimizationHistory};
use crate::errors::{CascadeError, CascadeResult};
use crate::objective::SingleObjective;
use pfr_kinetics::{log_iter, log_result, Verbosity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Differential evolution with the `best1bin` strategy.
///
/// The population of `popsize * 3` members is initialized by Latin hypercube
/// sampling. In every generation the mutation factor is drawn uniformly from
/// `mutation`, a trial vector is built for every member from the best member
/// and binomial crossover, and after evaluating all trial vectors, every
/// member is replaced by its trial vector if that is not worse. The
/// optimization always runs for `max_iter` generations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialEvolution {
    /// Population size per design parameter.
    pub popsize: usize,
    /// Number of generations.
    pub max_iter: usize,
    /// Interval of the dithered mutation factor.
    pub mutation: (f64, f64),
    /// Crossover probability.
    pub recombination: f64,
    pub seed: Option<u64>,
    #[serde(skip)]
    pub verbosity: Verbosity,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            popsize: 15,
            max_iter: 100,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            seed: None,
            verbosity: Verbosity::None,
        }
    }
}

/// Outcome of a differential evolution run.
#[derive(Clone, Debug)]
pub struct DeResult {
    /// Best design parameters.
    pub x: [f64; 3],
    /// Objective value of the best design.
    pub fun: f64,
    /// Number of objective evaluations.
    pub nfev: usize,
    /// Number of generations.
    pub nit: usize,
    pub history: OptimizationHistory,
}

impl DifferentialEvolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popsize(mut self, popsize: usize) -> Self {
        self.popsize = popsize;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn mutation(mut self, min: f64, max: f64) -> Self {
        self.mutation = (min, max);
        self
    }

    pub fn recombination(mut self, recombination: f64) -> Self {
        self.recombination = recombination;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    fn validate(&self) -> CascadeResult<()> {
        if self.popsize * 3 < 3 {
            return Err(CascadeError::InvalidConfig(
                "differential evolution needs at least 3 members".into(),
            ));
        }
        let (min, max) = self.mutation;
        if !(0.0..=2.0).contains(&min) || !(min..=2.0).contains(&max) {
            return Err(CascadeError::InvalidConfig(format!(
                "mutation interval ({min}, {max}) is not within [0, 2]"
            )));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(CascadeError::InvalidConfig(format!(
                "recombination {} is not within [0, 1]",
                self.recombination
            )));
        }
        Ok(())
    }

    /// Minimize `objective` within `bounds`.
    pub fn minimize<O: SingleObjective>(
        &self,
        objective: &O,
        bounds: &Bounds,
    ) -> CascadeResult<DeResult> {
        self.validate()?;
        bounds.validate()?;
        let verbosity = self.verbosity;
        let mut rng = rng(self.seed);
        let n = self.popsize * 3;
        let mut history = OptimizationHistory::new(vec![objective.name()]);

        // members live in the unit cube
        let mut population = latin_hypercube(n, &mut rng);
        let f = |u: &[f64; 3]| objective.evaluate(&bounds.scale(u));
        let mut energies = evaluate_population(&population, f)?;
        let mut nfev = n;
        promote_best(&mut population, &mut energies);

        log_iter!(verbosity, " iter |   f(best)    |  A/V / cm^-1  |   d / cm   | porosity");
        log_iter!(verbosity, "{:-<68}", "");
        for nit in 1..=self.max_iter {
            let scale = rng.gen_range(self.mutation.0..=self.mutation.1);
            let trials: Vec<[f64; 3]> = (0..n)
                .map(|i| self.trial(i, &population, scale, &mut rng))
                .collect();
            let trial_energies = evaluate_population(&trials, f)?;
            nfev += n;

            for (i, (trial, energy)) in trials.into_iter().zip(trial_energies).enumerate() {
                if energy <= energies[i] || energies[i].is_nan() {
                    population[i] = trial;
                    energies[i] = energy;
                }
            }
            promote_best(&mut population, &mut energies);

            let x = bounds.scale(&population[0]);
            history.record(vec![energies[0]], x);
            log_iter!(
                verbosity,
                " {:4} | {:12.6e} | {:13.5} | {:10.5} | {:8.5}",
                nit,
                energies[0],
                x[0],
                x[1],
                x[2]
            );
        }

        let result = DeResult {
            x: bounds.scale(&population[0]),
            fun: energies[0],
            nfev,
            nit: self.max_iter,
            history,
        };
        log_result!(
            verbosity,
            "Differential evolution finished after {} generation(s) and {} evaluation(s): f = {:e}\n",
            result.nit,
            result.nfev,
            result.fun
        );
        Ok(result)
    }

    /// `best1bin` trial vector of member `i`.
    fn trial<R: Rng>(
        &self,
        i: usize,
        population: &[[f64; 3]],
        scale: f64,
        rng: &mut R,
    ) -> [f64; 3] {
        let (r0, r1) = donors(i, population.len(), rng);
        let best = &population[0];
        let mut trial = population[i];
        let fill_point = rng.gen_range(0..3);
        for k in 0..3 {
            if k == fill_point || rng.gen::<f64>() < self.recombination {
                trial[k] = best[k] + scale * (population[r0][k] - population[r1][k]);
            }
        }
        // parameters that leave the unit cube are resampled
        for t in trial.iter_mut() {
            if !(0.0..=1.0).contains(t) {
                *t = rng.gen();
            }
        }
        trial
    }
}

/// Two distinct random members other than `i`.
fn donors<R: Rng>(i: usize, n: usize, rng: &mut R) -> (usize, usize) {
    let mut candidates: Vec<usize> = (0..n).filter(|&j| j != i).collect();
    let (chosen, _) = candidates.partial_shuffle(rng, 2);
    (chosen[0], chosen[1])
}

/// Latin hypercube sample of `n` points in the unit cube.
fn latin_hypercube<R: Rng>(n: usize, rng: &mut R) -> Vec<[f64; 3]> {
    let segment = 1.0 / n as f64;
    let mut population = vec![[0.0; 3]; n];
    for k in 0..3 {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        for (member, &j) in population.iter_mut().zip(&order) {
            member[k] = (j as f64 + rng.gen::<f64>()) * segment;
        }
    }
    population
}

/// Move the member with the lowest objective value to the front.
fn promote_best(population: &mut [[f64; 3]], energies: &mut [f64]) {
    let best = energies
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i);
    population.swap(0, best);
    energies.swap(0, best);
}
