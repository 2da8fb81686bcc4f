use super::{IdealGasReactor, MassFlowController, PressureController, Reservoir};
use crate::errors::{KineticsError, KineticsResult};
use crate::kinetics::Kinetics;
use crate::solver::SolverOptions;
use crate::RGAS;
use ndarray::{Array1, Array2};
use num_dual::linalg::LU;
use num_dual::{Dual64, DualNum};
use std::sync::Arc;

const MAX_ITER_NEWTON: usize = 10;
const MAX_ITER_STEADY: usize = 10_000;
const RTOL: f64 = 1e-9;
const ATOL: f64 = 1e-15;
const INITIAL_STEP: f64 = 1e-9;
const MIN_STEP: f64 = 1e-20;
const DAMPING: f64 = 0.9;

/// Information about an accepted time step.
#[derive(Clone, Copy, Debug)]
struct StepInfo {
    dt: f64,
    change: f64,
    iterations: usize,
}

/// Reactor network of a single reactor with an inlet and an outlet.
///
/// The state vector consists of the mass of the reactor contents, the
/// temperature, the mass fractions and the coverages of the surface. It is
/// integrated in time with the implicit Euler method. The Jacobian of the
/// Newton iterations is obtained from forward automatic differentiation.
/// One of the coverage equations (that of the most abundant surface species)
/// is replaced by the site balance.
///
/// After modifying the upstream reservoir, [ReactorNet::reinitialize] has to be
/// called before the network is advanced further.
#[derive(Clone, Debug)]
pub struct ReactorNet {
    upstream: Reservoir,
    inlet: MassFlowController,
    reactor: IdealGasReactor,
    outlet: PressureController,
    downstream: Reservoir,
    kinetics: Kinetics,
    state: Vec<f64>,
    time: f64,
    step_size: f64,
    rtol: f64,
    atol: f64,
    initial_step: f64,
    steady_time: Option<f64>,
}

impl ReactorNet {
    pub fn new(
        upstream: Reservoir,
        inlet: MassFlowController,
        reactor: IdealGasReactor,
        outlet: PressureController,
        downstream: Reservoir,
    ) -> KineticsResult<Self> {
        for (role, reservoir) in [("upstream", &upstream), ("downstream", &downstream)] {
            let phase = reservoir.phase();
            if phase.name() != reactor.contents().name()
                || !Arc::ptr_eq(phase.mechanism(), reactor.contents().mechanism())
            {
                return Err(KineticsError::Error(format!(
                    "The {role} reservoir contains `{}` instead of `{}`.",
                    phase.name(),
                    reactor.contents().name()
                )));
            }
        }
        let kinetics = Kinetics::new(reactor.contents(), reactor.surface().map(|s| s.phase()))?;
        let mut net = Self {
            upstream,
            inlet,
            reactor,
            outlet,
            downstream,
            kinetics,
            state: Vec::new(),
            time: 0.0,
            step_size: INITIAL_STEP,
            rtol: RTOL,
            atol: ATOL,
            initial_step: INITIAL_STEP,
            steady_time: None,
        };
        net.reinitialize();
        Ok(net)
    }

    /// Set relative and absolute tolerances of the Newton iterations.
    pub fn set_tolerances(&mut self, rtol: f64, atol: f64) {
        self.rtol = rtol;
        self.atol = atol;
    }

    /// Set the initial time step in s.
    pub fn set_initial_step(&mut self, dt: f64) {
        self.initial_step = dt;
        self.step_size = dt;
    }

    /// Set the time scale in s over which the state of a steady network may
    /// not change by more than the tolerance. Defaults to the residence time.
    pub fn set_steady_time(&mut self, time: f64) {
        self.steady_time = Some(time);
    }

    /// Mass of the reactor contents divided by the inlet mass flow rate in s.
    pub fn residence_time(&self) -> f64 {
        self.reactor.mass() / self.inlet.mass_flow_rate()
    }

    fn steady_time(&self) -> f64 {
        self.steady_time
            .or_else(|| Some(self.residence_time()).filter(|t| t.is_finite()))
            .unwrap_or(1.0)
    }

    /// Read the state of the reactor and its surface and restart the time
    /// step control.
    pub fn reinitialize(&mut self) {
        let contents = self.reactor.contents();
        let n = 2 + contents.n_species() + self.reactor.n_surface_species();
        let mut state = Vec::with_capacity(n);
        state.push(self.reactor.mass());
        state.push(contents.temperature());
        state.extend(contents.mass_fractions().iter());
        if let Some(surface) = self.reactor.surface() {
            state.extend(surface.coverages().iter());
        }
        self.state = state;
        self.step_size = self.initial_step;
    }

    /// Time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn reactor(&self) -> &IdealGasReactor {
        &self.reactor
    }

    pub fn upstream(&self) -> &Reservoir {
        &self.upstream
    }

    pub fn upstream_mut(&mut self) -> &mut Reservoir {
        &mut self.upstream
    }

    pub fn downstream(&self) -> &Reservoir {
        &self.downstream
    }

    pub fn inlet(&self) -> &MassFlowController {
        &self.inlet
    }

    pub fn outlet(&self) -> &PressureController {
        &self.outlet
    }

    pub fn temperature(&self) -> f64 {
        self.reactor.temperature()
    }

    pub fn pressure(&self) -> f64 {
        self.reactor.pressure()
    }

    pub fn mole_fractions(&self) -> Array1<f64> {
        self.reactor.mole_fractions()
    }

    /// Coverages of the reactor surface (empty if there is no surface).
    pub fn coverages(&self) -> Array1<f64> {
        self.reactor
            .surface()
            .map_or_else(|| Array1::zeros(0), |s| s.coverages().clone())
    }

    /// The current state vector.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Time derivatives of the state vector.
    pub fn derivatives(&self) -> Vec<f64> {
        self.rhs(&self.state)
    }

    /// Take a single time step and return the new time.
    pub fn step(&mut self) -> KineticsResult<f64> {
        self.integrate(f64::INFINITY, self.rtol)?;
        Ok(self.time)
    }

    /// Integrate up to the given time in s.
    pub fn advance(&mut self, time: f64) -> KineticsResult<()> {
        while self.time < time {
            self.integrate(time, self.rtol)?;
        }
        Ok(())
    }

    /// Integrate until the state does not change anymore and return the
    /// number of time steps.
    ///
    /// The network is steady once the scaled rate of change of the state,
    /// multiplied by the steady time scale, is below one.
    pub fn advance_to_steady_state(&mut self, options: SolverOptions) -> KineticsResult<usize> {
        let (max_iter, rtol, verbosity) = options.unwrap_or(MAX_ITER_STEADY, self.rtol);

        log_iter!(
            verbosity,
            " step |    time     |  step size  | Newton |   change    | temperature"
        );
        log_iter!(verbosity, "{:-<74}", "");
        for i in 1..=max_iter {
            let info = self.integrate(f64::INFINITY, rtol)?;
            log_iter!(
                verbosity,
                " {:4} | {:11.5e} | {:11.5e} | {:6} | {:11.5e} | {:11.5}",
                i,
                self.time,
                info.dt,
                info.iterations,
                info.change,
                self.state[1]
            );
            if info.change * self.steady_time() < info.dt {
                log_result!(
                    verbosity,
                    "Steady state reached in {} step(s) at t = {:e} s\n",
                    i,
                    self.time
                );
                return Ok(i);
            }
        }
        log_result!(verbosity, "Steady state not reached in {} step(s)\n", max_iter);
        Err(KineticsError::NotConverged(
            "ReactorNet::advance_to_steady_state".into(),
        ))
    }

    fn n_gas(&self) -> usize {
        self.reactor.contents().n_species()
    }

    fn integrate(&mut self, t_end: f64, rtol: f64) -> KineticsResult<StepInfo> {
        loop {
            let clipped = self.step_size >= t_end - self.time;
            let dt = if clipped { t_end - self.time } else { self.step_size };
            match self.newton(&self.state, dt, rtol) {
                Ok((state, iterations)) => {
                    let change = (state
                        .iter()
                        .zip(&self.state)
                        .map(|(y1, y0)| ((y1 - y0) / (self.atol + rtol * y1.abs())).powi(2))
                        .sum::<f64>()
                        / state.len() as f64)
                        .sqrt();
                    self.state = state;
                    self.time = if clipped { t_end } else { self.time + dt };
                    if iterations <= 4 {
                        self.step_size *= 2.0;
                    }
                    self.sync_reactor()?;
                    return Ok(StepInfo {
                        dt,
                        change,
                        iterations,
                    });
                }
                Err(e) => {
                    self.step_size /= 4.0;
                    if self.step_size < MIN_STEP {
                        return Err(KineticsError::Error(format!(
                            "ReactorNet: time step fell below {MIN_STEP:e} s at t = {:e} s ({e})",
                            self.time
                        )));
                    }
                }
            }
        }
    }

    fn sync_reactor(&mut self) -> KineticsResult<()> {
        let n_gas = self.n_gas();
        let y = &self.state;
        let density = y[0] / self.reactor.volume;
        let mass_fractions = Array1::from(y[2..2 + n_gas].to_vec());
        let coverages = Array1::from(y[2 + n_gas..].to_vec());
        self.reactor
            .update_state(y[1], density, &mass_fractions, &coverages)
    }

    fn newton(&self, y0: &[f64], dt: f64, rtol: f64) -> KineticsResult<(Vec<f64>, usize)> {
        let mut y = y0.to_vec();
        for iter in 1..=MAX_ITER_NEWTON {
            let (res, jacobian) = self.jacobian(&y, y0, dt, self.site_balance_row(&y));
            let dy = -LU::new(jacobian)?.solve(&res);

            let mut error: f64 = 0.0;
            for ((i, y), &dy) in y.iter_mut().enumerate().zip(&dy) {
                // mass fractions and coverages are clipped individually and
                // count as converged once they drop below the absolute tolerance
                if i >= 2 && *y + dy < 0.0 {
                    let step = DAMPING * *y;
                    *y -= step;
                    if *y >= self.atol {
                        error = error.max(step / (self.atol + rtol * *y));
                    }
                } else {
                    *y += dy;
                    error = error.max(dy.abs() / (self.atol + rtol * y.abs()));
                }
            }
            if !(y[0] > 0.0 && y[1] > 0.0) || y.iter().any(|v| !v.is_finite()) {
                return Err(KineticsError::IterationFailed("ReactorNet::newton".into()));
            }
            if error < 1.0 {
                return Ok((y, iter));
            }
        }
        Err(KineticsError::NotConverged("ReactorNet::newton".into()))
    }

    fn site_balance_row(&self, y: &[f64]) -> Option<usize> {
        let coverages = &y[2 + self.n_gas()..];
        (0..coverages.len()).max_by(|&a, &b| coverages[a].total_cmp(&coverages[b]))
    }

    fn jacobian(
        &self,
        y: &[f64],
        y0: &[f64],
        dt: f64,
        site_row: Option<usize>,
    ) -> (Array1<f64>, Array2<f64>) {
        let n = y.len();
        let mut res = Array1::zeros(n);
        let mut jacobian = Array2::zeros((n, n));
        let mut y_dual: Vec<Dual64> = y.iter().map(|&y| Dual64::from(y)).collect();
        for j in 0..n {
            y_dual[j] = y_dual[j].derivative();
            let r = self.residual(&y_dual, y0, dt, site_row);
            for (i, r) in r.iter().enumerate() {
                jacobian[[i, j]] = r.eps;
                res[i] = r.re;
            }
            y_dual[j] = Dual64::from(y[j]);
        }
        (res, jacobian)
    }

    fn residual<D: DualNum<f64> + Copy>(
        &self,
        y: &[D],
        y0: &[f64],
        dt: f64,
        site_row: Option<usize>,
    ) -> Vec<D> {
        let mut res: Vec<D> = y
            .iter()
            .zip(y0)
            .zip(self.rhs(y))
            .map(|((&y, &y0), f)| (y - y0) / dt - f)
            .collect();
        if let Some(j) = site_row {
            let offset = 2 + self.n_gas();
            res[offset + j] = y[offset..].iter().fold(D::zero(), |acc, &theta| acc + theta) - 1.0;
        }
        res
    }

    fn rhs<D: DualNum<f64> + Copy>(&self, y: &[D]) -> Vec<D> {
        let contents = self.reactor.contents();
        let molar_masses = contents.molar_masses();
        let n_gas = contents.n_species();
        let volume = self.reactor.volume;
        let (mass, temperature) = (y[0], y[1]);
        let mass_fractions = &y[2..2 + n_gas];
        let coverages = &y[2 + n_gas..];

        let density = mass / volume;
        let concentrations: Vec<D> = mass_fractions
            .iter()
            .zip(molar_masses)
            .map(|(&y, &w)| if y.re() > 0.0 { y * density / w } else { D::zero() })
            .collect();
        let pressure =
            concentrations.iter().fold(D::zero(), |acc, &c| acc + c) * temperature * RGAS;

        let rates = self
            .kinetics
            .production_rates(temperature, &concentrations, coverages);
        let area = self.reactor.surface.as_ref().map_or(0.0, |s| s.area);
        // mass production per species in kg/s
        let wdot: Vec<D> = (0..n_gas)
            .map(|k| (rates.gas[k] * volume + rates.adsorption[k] * area) * molar_masses[k])
            .collect();
        let mdot_surface = wdot.iter().fold(D::zero(), |acc, &w| acc + w);
        let mdot_in = self.inlet.mass_flow_rate();
        let mdot_out = self
            .outlet
            .mass_flow_rate(mdot_in, pressure, self.downstream.pressure());
        let y_in = self.upstream.mass_fractions();

        let mut dydt = Vec::with_capacity(y.len());
        dydt.push(mdot_surface - mdot_out + mdot_in);

        let dtdt = if self.reactor.energy {
            let u = contents.int_energies_dual(temperature);
            let cv = contents.cv_mass_dual(temperature, mass_fractions);
            let mut q =
                -mdot_out * pressure * volume / mass + self.upstream.enthalpy_mass() * mdot_in;
            for k in 0..n_gas {
                q -= u[k] * (y_in[k] * mdot_in / molar_masses[k]);
                q -= u[k] * wdot[k] / molar_masses[k];
            }
            for wall in &self.reactor.walls {
                q -= wall.heat_rate(temperature);
            }
            q / (mass * cv)
        } else {
            D::zero()
        };
        dydt.push(dtdt);

        for k in 0..n_gas {
            let y_k = mass_fractions[k];
            dydt.push(((-y_k + y_in[k]) * mdot_in + wdot[k] - y_k * mdot_surface) / mass);
        }
        if let Some(surface) = &self.reactor.surface {
            let site_density = surface.phase.site_density();
            dydt.extend(
                rates
                    .surface
                    .iter()
                    .zip(surface.phase.sites())
                    .map(|(&s, &n)| s * (n / site_density)),
            );
        }
        dydt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::Mechanism;
    use crate::phase::IdealGas;
    use crate::reactor::Wall;
    use approx::assert_relative_eq;

    fn network(energy: bool, wall: Option<Wall>) -> KineticsResult<ReactorNet> {
        let mechanism = Arc::new(Mechanism::from_json(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../data/methane_pox_on_pt.json"
        ))?);
        let mut gas = IdealGas::new(&mechanism, "gas")?;
        gas.set_tpx(900.0, 1e5, "CH4:1, AR:1")?;
        let upstream = Reservoir::new(gas.clone());
        let downstream = Reservoir::new(gas.clone());
        gas.set_tpx(600.0, 1e5, "AR:1")?;
        let mut reactor = IdealGasReactor::new(gas, 1e-6, energy)?;
        if let Some(wall) = wall {
            reactor.add_wall(wall);
        }
        ReactorNet::new(
            upstream,
            MassFlowController::new(1e-6)?,
            reactor,
            PressureController::new(1e-5)?,
            downstream,
        )
    }

    #[test]
    fn isothermal_flushing() -> KineticsResult<()> {
        let mut net = network(false, None)?;
        net.advance_to_steady_state(SolverOptions::default())?;
        let x = net.mole_fractions();
        let ch4 = net.reactor().contents().species_index("CH4")?;
        assert_relative_eq!(x[ch4], 0.5, max_relative = 1e-6);
        assert_relative_eq!(net.temperature(), 600.0);
        assert_relative_eq!(net.pressure(), 1e5, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn adiabatic_mixing_reaches_inlet_temperature() -> KineticsResult<()> {
        let mut net = network(true, None)?;
        let steps = net.advance_to_steady_state(SolverOptions::default())?;
        assert!(steps > 1);
        assert_relative_eq!(net.temperature(), 900.0, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn heat_loss_lowers_temperature() -> KineticsResult<()> {
        let wall = Wall::new(1e-3, 10.0, 300.0)?;
        let mut net = network(true, Some(wall))?;
        net.advance_to_steady_state(SolverOptions::default())?;
        assert!(net.temperature() < 900.0);
        assert!(net.temperature() > 300.0);
        Ok(())
    }

    #[test]
    fn advance_to_time() -> KineticsResult<()> {
        let mut net = network(false, None)?;
        net.advance(1e-3)?;
        assert_eq!(net.time(), 1e-3);
        let t = net.step()?;
        assert!(t > 1e-3);
        // the upstream state is only seen after synchronization
        net.upstream_mut().phase_mut().set_tpx(900.0, 1e5, "AR:1")?;
        let before = net.upstream().mass_fractions().to_vec();
        net.upstream_mut().sync_state();
        assert_ne!(before, net.upstream().mass_fractions().to_vec());
        net.reinitialize();
        net.advance_to_steady_state(SolverOptions::default())?;
        let ar = net.reactor().contents().species_index("AR")?;
        assert_relative_eq!(net.mole_fractions()[ar], 1.0, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn steady_state_is_stationary_over_a_residence_time() -> KineticsResult<()> {
        let mut net = network(false, None)?;
        net.advance_to_steady_state(SolverOptions::default())?;
        let tau = net.residence_time();
        assert!(tau > 0.0 && tau.is_finite());
        let rate = net
            .derivatives()
            .iter()
            .zip(net.state())
            .map(|(dy, y)| dy.abs() / (ATOL + RTOL * y.abs()))
            .fold(0.0, f64::max);
        assert!(rate * tau < 10.0, "{rate}");

        // a long time scale delays the steady state
        let mut slow = network(false, None)?;
        slow.set_steady_time(1e3 * tau);
        let steps = slow.advance_to_steady_state(SolverOptions::default())?;
        assert!(slow.time() > net.time());
        assert!(steps > 1);
        Ok(())
    }

    #[test]
    fn step_limit() {
        let mut net = network(true, None).unwrap();
        assert!(matches!(
            net.advance_to_steady_state(SolverOptions::new().max_iter(3)),
            Err(KineticsError::NotConverged(_))
        ));
    }
}
