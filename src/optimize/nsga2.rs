use super::pareto::{crowding_distance, dominates, non_dominated_sort_by};
use super::{evaluate_population, rng, Bounds, OptimizationHistory};
use crate::errors::{CascadeError, CascadeResult};
use crate::objective::{Evaluation, MultiObjective};
use pfr_kinetics::{log_iter, log_result, Verbosity};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MAX_MATING_ATTEMPTS: usize = 100;

/// Elitist non-dominated sorting genetic algorithm (NSGA-II).
///
/// Parents are chosen by binary tournaments and recombined with simulated
/// binary crossover (SBX) followed by polynomial mutation. Offspring that
/// duplicate other members are discarded. Parents and offspring compete for
/// survival by constrained non-dominated rank and crowding distance.
/// The initial population counts as the first generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nsga2 {
    pub pop_size: usize,
    pub generations: usize,
    pub crossover_probability: f64,
    /// Distribution index of the crossover.
    pub eta_crossover: f64,
    /// Distribution index of the mutation.
    pub eta_mutation: f64,
    /// Mutation probability per parameter, `1/3` if not specified.
    pub mutation_probability: Option<f64>,
    pub eliminate_duplicates: bool,
    /// Return only the non-dominated members of the final population.
    pub first_front_only: bool,
    pub seed: Option<u64>,
    #[serde(skip)]
    pub verbosity: Verbosity,
}

impl Default for Nsga2 {
    fn default() -> Self {
        Self {
            pop_size: 50,
            generations: 100,
            crossover_probability: 0.9,
            eta_crossover: 8.0,
            eta_mutation: 10.0,
            mutation_probability: None,
            eliminate_duplicates: true,
            first_front_only: true,
            seed: Some(1),
            verbosity: Verbosity::None,
        }
    }
}

/// Final population of an NSGA-II run.
#[derive(Clone, Debug)]
pub struct ParetoResult {
    pub x: Vec<[f64; 3]>,
    /// Objectives as seen by the optimizer.
    pub objectives: Vec<Vec<f64>>,
    /// Objectives in physical units, recomputed for the final designs.
    pub true_objectives: Vec<Vec<f64>>,
    /// Number of final designs whose objectives could not be recomputed.
    pub failures: usize,
    pub names: Vec<String>,
    pub history: OptimizationHistory,
}

impl ParetoResult {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Clone, Debug)]
struct Individual {
    x: [f64; 3],
    evaluation: Evaluation,
    rank: usize,
    crowding: f64,
}

/// Deb's constrained dominance: feasible members dominate infeasible ones,
/// infeasible members are compared by their violation.
fn constrained_dominates(a: &Evaluation, b: &Evaluation) -> bool {
    match (a.violation(), b.violation()) {
        (va, vb) if va == 0.0 && vb == 0.0 => dominates(&a.objectives, &b.objectives),
        (va, vb) => va < vb,
    }
}

impl Nsga2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop_size(mut self, pop_size: usize) -> Self {
        self.pop_size = pop_size;
        self
    }

    pub fn generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn crossover(mut self, probability: f64, eta: f64) -> Self {
        self.crossover_probability = probability;
        self.eta_crossover = eta;
        self
    }

    pub fn mutation(mut self, probability: Option<f64>, eta: f64) -> Self {
        self.mutation_probability = probability;
        self.eta_mutation = eta;
        self
    }

    pub fn eliminate_duplicates(mut self, eliminate_duplicates: bool) -> Self {
        self.eliminate_duplicates = eliminate_duplicates;
        self
    }

    pub fn first_front_only(mut self, first_front_only: bool) -> Self {
        self.first_front_only = first_front_only;
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
        if self.pop_size < 2 {
            return Err(CascadeError::InvalidConfig(format!(
                "NSGA-II needs a population of at least 2, got {}",
                self.pop_size
            )));
        }
        if self.generations < 1 {
            return Err(CascadeError::InvalidConfig(
                "NSGA-II needs at least one generation".into(),
            ));
        }
        let p_m = self.mutation_probability.unwrap_or(1.0 / 3.0);
        if !(0.0..=1.0).contains(&self.crossover_probability) || !(0.0..=1.0).contains(&p_m) {
            return Err(CascadeError::InvalidConfig(
                "probabilities have to be within [0, 1]".into(),
            ));
        }
        if !(self.eta_crossover >= 0.0 && self.eta_mutation >= 0.0) {
            return Err(CascadeError::InvalidConfig(
                "distribution indices must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Approximate the Pareto front of `problem` within `bounds`.
    pub fn minimize<P: MultiObjective>(
        &self,
        problem: &P,
        bounds: &Bounds,
    ) -> CascadeResult<ParetoResult> {
        self.validate()?;
        bounds.validate()?;
        let verbosity = self.verbosity;
        let mut rng = rng(self.seed);
        let names = problem.names();
        let mut history = OptimizationHistory::new(names.clone());
        let evaluate = |x: &[f64; 3]| problem.evaluate(x);

        // initial population, sampled uniformly
        let mut points: Vec<[f64; 3]> = Vec::with_capacity(self.pop_size);
        for _ in 0..MAX_MATING_ATTEMPTS {
            while points.len() < self.pop_size {
                let x = bounds.scale(&[rng.gen(), rng.gen(), rng.gen()]);
                points.push(x);
            }
            if self.eliminate_duplicates {
                dedup(&mut points, &[]);
            }
            if points.len() == self.pop_size {
                break;
            }
        }
        let mut population = self.individuals(&points, evaluate_population(&points, evaluate)?);
        self.survive(&mut population, self.pop_size);
        self.record(&mut history, &population, problem);

        log_iter!(verbosity, "  gen | feasible | front size |   best f1    |   best f2");
        log_iter!(verbosity, "{:-<62}", "");
        self.log_generation(1, &population);
        for generation in 2..=self.generations {
            let offspring = self.mate(&population, bounds, &mut rng);
            let evaluations = evaluate_population(&offspring, evaluate)?;
            population.extend(self.individuals(&offspring, evaluations));
            self.survive(&mut population, self.pop_size);
            self.record(&mut history, &population, problem);
            self.log_generation(generation, &population);
        }

        if self.first_front_only {
            population.retain(|i| i.rank == 0);
            if population.iter().any(|i| i.evaluation.is_feasible()) {
                population.retain(|i| i.evaluation.is_feasible());
            }
        }
        let x: Vec<_> = population.iter().map(|i| i.x).collect();
        let true_objectives = evaluate_population(&x, |x| problem.unscaled(x))?;
        let failures = true_objectives
            .iter()
            .filter(|f| f.iter().any(|v| v.is_nan()))
            .count();
        log_result!(
            verbosity,
            "NSGA-II finished after {} generation(s): {} design(s), {} failure(s)\n",
            self.generations,
            x.len(),
            failures
        );
        Ok(ParetoResult {
            objectives: population.into_iter().map(|i| i.evaluation.objectives).collect(),
            x,
            true_objectives,
            failures,
            names,
            history,
        })
    }

    fn individuals(&self, points: &[[f64; 3]], evaluations: Vec<Evaluation>) -> Vec<Individual> {
        points
            .iter()
            .zip(evaluations)
            .map(|(&x, evaluation)| Individual {
                x,
                evaluation,
                rank: 0,
                crowding: 0.0,
            })
            .collect()
    }

    /// Reduce the population to `n` members by rank and crowding distance
    /// and update both for the survivors.
    fn survive(&self, population: &mut Vec<Individual>, n: usize) {
        let fronts = non_dominated_sort_by(population.len(), |i, j| {
            constrained_dominates(&population[i].evaluation, &population[j].evaluation)
        });
        let objectives: Vec<Vec<f64>> = population
            .iter()
            .map(|i| i.evaluation.objectives.clone())
            .collect();
        let mut survivors = Vec::with_capacity(n);
        for (rank, front) in fronts.iter().enumerate() {
            if survivors.len() >= n {
                break;
            }
            let distance = crowding_distance(&objectives, front);
            let mut members: Vec<(usize, f64)> = front.iter().copied().zip(distance).collect();
            if survivors.len() + members.len() > n {
                members.sort_by(|a, b| b.1.total_cmp(&a.1));
                members.truncate(n - survivors.len());
            }
            for (i, crowding) in members {
                population[i].rank = rank;
                population[i].crowding = crowding;
                survivors.push(i);
            }
        }
        survivors.sort_unstable();
        let mut k = 0;
        population.retain(|_| {
            let keep = survivors.binary_search(&k).is_ok();
            k += 1;
            keep
        });
    }

    /// Binary tournament on violation, rank and crowding distance.
    fn tournament<'a, R: Rng>(&self, population: &'a [Individual], rng: &mut R) -> &'a Individual {
        let a = &population[rng.gen_range(0..population.len())];
        let b = &population[rng.gen_range(0..population.len())];
        let (va, vb) = (a.evaluation.violation(), b.evaluation.violation());
        if va != vb {
            return if va < vb { a } else { b };
        }
        if a.rank != b.rank {
            return if a.rank < b.rank { a } else { b };
        }
        if a.crowding != b.crowding {
            return if a.crowding > b.crowding { a } else { b };
        }
        if rng.gen::<bool>() {
            a
        } else {
            b
        }
    }

    /// Create `pop_size` offspring that do not duplicate the population.
    fn mate<R: Rng>(
        &self,
        population: &[Individual],
        bounds: &Bounds,
        rng: &mut R,
    ) -> Vec<[f64; 3]> {
        let existing: Vec<[f64; 3]> = population.iter().map(|i| i.x).collect();
        let mut offspring = Vec::with_capacity(self.pop_size);
        for _ in 0..MAX_MATING_ATTEMPTS {
            while offspring.len() < self.pop_size {
                let p1 = self.tournament(population, rng);
                let p2 = self.tournament(population, rng);
                let (mut c1, mut c2) = self.sbx(&p1.x, &p2.x, bounds, rng);
                self.polynomial_mutation(&mut c1, bounds, rng);
                self.polynomial_mutation(&mut c2, bounds, rng);
                offspring.push(c1);
                offspring.push(c2);
            }
            if self.eliminate_duplicates {
                dedup(&mut offspring, &existing);
            }
            if offspring.len() >= self.pop_size {
                break;
            }
        }
        offspring.truncate(self.pop_size);
        offspring
    }

    /// Simulated binary crossover of two parents.
    fn sbx<R: Rng>(
        &self,
        p1: &[f64; 3],
        p2: &[f64; 3],
        bounds: &Bounds,
        rng: &mut R,
    ) -> ([f64; 3], [f64; 3]) {
        let (mut c1, mut c2) = (*p1, *p2);
        if rng.gen::<f64>() >= self.crossover_probability {
            return (c1, c2);
        }
        let eta = self.eta_crossover;
        for k in 0..3 {
            if rng.gen::<bool>() || (p1[k] - p2[k]).abs() <= 1e-14 {
                continue;
            }
            let (xl, xu) = (bounds.lower[k], bounds.upper[k]);
            let (y1, y2) = if p1[k] < p2[k] { (p1[k], p2[k]) } else { (p2[k], p1[k]) };
            let delta = y2 - y1;
            let u: f64 = rng.gen();

            let spread = |beta: f64| {
                let alpha = 2.0 - beta.powf(-(eta + 1.0));
                if u <= 1.0 / alpha {
                    (u * alpha).powf(1.0 / (eta + 1.0))
                } else {
                    (1.0 / (2.0 - u * alpha)).powf(1.0 / (eta + 1.0))
                }
            };
            let low = 0.5 * (y1 + y2 - spread(1.0 + 2.0 * (y1 - xl) / delta) * delta);
            let high = 0.5 * (y1 + y2 + spread(1.0 + 2.0 * (xu - y2) / delta) * delta);
            let (low, high) = (low.clamp(xl, xu), high.clamp(xl, xu));

            if rng.gen::<bool>() {
                c1[k] = high;
                c2[k] = low;
            } else {
                c1[k] = low;
                c2[k] = high;
            }
        }
        (c1, c2)
    }

    /// Polynomial mutation within the bounds.
    fn polynomial_mutation<R: Rng>(&self, x: &mut [f64; 3], bounds: &Bounds, rng: &mut R) {
        let probability = self.mutation_probability.unwrap_or(1.0 / 3.0);
        let eta = self.eta_mutation;
        let power = 1.0 / (eta + 1.0);
        for (k, xk) in x.iter_mut().enumerate() {
            if rng.gen::<f64>() >= probability {
                continue;
            }
            let (xl, xu) = (bounds.lower[k], bounds.upper[k]);
            let range = xu - xl;
            let delta1 = (*xk - xl) / range;
            let delta2 = (xu - *xk) / range;
            let u: f64 = rng.gen();
            let deltaq = if u <= 0.5 {
                let xy = 1.0 - delta1;
                let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(eta + 1.0);
                val.powf(power) - 1.0
            } else {
                let xy = 1.0 - delta2;
                let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(eta + 1.0);
                1.0 - val.powf(power)
            };
            *xk = (*xk + deltaq * range).clamp(xl, xu);
        }
    }

    /// Best value of every objective and the parameters of the member with
    /// the best first objective.
    /// Record the best value of every objective in physical units and the
    /// member with the best first objective.
    fn record<P: MultiObjective>(
        &self,
        history: &mut OptimizationHistory,
        population: &[Individual],
        problem: &P,
    ) {
        let n_obj = population.first().map_or(0, |i| i.evaluation.objectives.len());
        let best: Vec<f64> = (0..n_obj)
            .map(|m| {
                population
                    .iter()
                    .map(|i| i.evaluation.objectives[m])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let x = population
            .iter()
            .min_by(|a, b| a.evaluation.objectives[0].total_cmp(&b.evaluation.objectives[0]))
            .map_or([f64::NAN; 3], |i| i.x);
        history.record(problem.unscale(&best), x);
    }

    fn log_generation(&self, generation: usize, population: &[Individual]) {
        if self.verbosity < Verbosity::Iter {
            return;
        }
        let feasible = population.iter().filter(|i| i.evaluation.is_feasible()).count();
        let front = population.iter().filter(|i| i.rank == 0).count();
        let best = |m: usize| {
            population
                .iter()
                .filter_map(|i| i.evaluation.objectives.get(m).copied())
                .fold(f64::INFINITY, f64::min)
        };
        log_iter!(
            self.verbosity,
            " {:4} | {:8} | {:10} | {:12.6e} | {:12.6e}",
            generation,
            feasible,
            front,
            best(0),
            best(1)
        );
    }
}

/// Remove points that duplicate earlier points or any of `existing`.
fn dedup(points: &mut Vec<[f64; 3]>, existing: &[[f64; 3]]) {
    let mut unique: Vec<[f64; 3]> = Vec::with_capacity(points.len());
    for p in points.drain(..) {
        if !existing.iter().chain(&unique).any(|q| is_duplicate(&p, q)) {
            unique.push(p);
        }
    }
    *points = unique;
}

fn is_duplicate(a: &[f64; 3], b: &[f64; 3]) -> bool {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt() <= 1e-16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::pareto::is_non_dominated_set;

    #[test]
    fn constrained_dominance() {
        let feasible = Evaluation::new(vec![2.0, 2.0]).with_constraint(-1.0);
        let better = Evaluation::new(vec![1.0, 1.0]).with_constraint(0.0);
        let infeasible = Evaluation::new(vec![0.0, 0.0]).with_constraint(1.0);
        let worse = Evaluation::new(vec![0.0, 0.0]).with_constraint(2.0);
        assert!(constrained_dominates(&better, &feasible));
        assert!(constrained_dominates(&feasible, &infeasible));
        assert!(!constrained_dominates(&infeasible, &feasible));
        assert!(constrained_dominates(&infeasible, &worse));
    }

    #[test]
    fn variation_stays_in_bounds() {
        let nsga2 = Nsga2::new();
        let bounds = Bounds::reactor_design();
        let mut rng = rng(Some(7));
        for _ in 0..1000 {
            let p1 = bounds.scale(&[rng.gen(), rng.gen(), rng.gen()]);
            let p2 = bounds.scale(&[rng.gen(), rng.gen(), rng.gen()]);
            let (mut c1, mut c2) = nsga2.sbx(&p1, &p2, &bounds, &mut rng);
            nsga2.polynomial_mutation(&mut c1, &bounds, &mut rng);
            nsga2.polynomial_mutation(&mut c2, &bounds, &mut rng);
            assert!(bounds.contains(&c1) && bounds.contains(&c2));
        }
    }

    #[test]
    fn survival_keeps_first_front() {
        let nsga2 = Nsga2::new();
        let points = [[0.0, 1.0, 4.0], [1.0, 0.0, 3.0], [2.0, 2.0, 0.0], [3.0, 3.0, 0.0]];
        let evaluations = points.iter().map(|x| Evaluation::new(vec![x[0], x[1]])).collect();
        let mut population = nsga2.individuals(&points, evaluations);
        nsga2.survive(&mut population, 2);
        let x: Vec<_> = population.iter().map(|i| i.x).collect();
        assert_eq!(x, vec![points[0], points[1]]);
        assert!(population.iter().all(|i| i.rank == 0));
    }

    #[test]
    fn history_is_unscaled() -> CascadeResult<()> {
        struct Scaled;
        impl MultiObjective for Scaled {
            fn evaluate(&self, x: &[f64; 3]) -> CascadeResult<Evaluation> {
                Ok(Evaluation::new(vec![x[0], (1.0 - x[0]) / 1e-9]))
            }
            fn unscale(&self, objectives: &[f64]) -> Vec<f64> {
                vec![objectives[0], objectives[1] * 1e-9]
            }
        }
        let bounds = Bounds::new([(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)])?;
        let result = Nsga2::new().pop_size(10).generations(3).minimize(&Scaled, &bounds)?;
        for entry in result.history.entries() {
            assert!(entry.objectives[1] <= 1.0, "{:?}", entry.objectives);
        }
        let scaled = result.objectives.iter().map(|f| f[1]).fold(f64::INFINITY, f64::min);
        let last = result.history.last().map(|e| e.objectives[1]);
        assert_eq!(last, Some(scaled * 1e-9));
        Ok(())
    }

    #[test]
    fn duplicates_are_removed() {
        let mut points = vec![[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [0.0, 0.0, 0.0]];
        dedup(&mut points, &[[0.0, 0.0, 0.0]]);
        assert_eq!(points, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn small_front() -> CascadeResult<()> {
        let bounds = Bounds::new([(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)])?;
        let problem = |x: &[f64; 3]| Evaluation::new(vec![x[0], 1.0 - x[0] + x[1] + x[2]]);
        let result = Nsga2::new().pop_size(20).generations(20).minimize(&problem, &bounds)?;
        assert!(!result.is_empty());
        assert_eq!(result.history.len(), 20);
        assert!(is_non_dominated_set(&result.objectives));
        assert_eq!(result.failures, 0);
        Ok(())
    }
}
