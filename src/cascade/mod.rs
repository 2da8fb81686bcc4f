//! Plug-flow reactor approximated by a cascade of CSTRs.
use crate::config::ReactorConfig;
use crate::errors::CascadeResult;
use crate::geometry::{DesignParameters, StageGeometry};
use pfr_kinetics::{log_iter, log_result, Interface, SolverOptions, Verbosity};
use serde::{Deserialize, Serialize};

mod profile;
mod session;
pub use profile::{StageProfile, StageRecord};
pub use session::CascadeSession;

/// Heat exchange of every stage with the surroundings through the reactor wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeatLoss {
    /// Ambient temperature in °C.
    pub ambient_temperature: f64,
    /// Overall heat transfer coefficient in W/(m² K).
    pub heat_transfer_coefficient: f64,
}

/// Options of a single cascade simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulationOptions {
    /// Record the state of every stage.
    pub profile: bool,
    /// Heat loss through the reactor wall.
    pub heat_loss: Option<HeatLoss>,
    /// Options of the steady-state relaxation of each stage.
    pub solver: SolverOptions,
    /// Output of the stage march.
    pub verbosity: Verbosity,
}

impl SimulationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn heat_loss(mut self, ambient_temperature: f64, heat_transfer_coefficient: f64) -> Self {
        self.heat_loss = Some(HeatLoss {
            ambient_temperature,
            heat_transfer_coefficient,
        });
        self
    }

    pub fn solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Outlet conditions of a cascade.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Mole fraction of CH4 at the outlet.
    pub ch4: f64,
    /// Outlet temperature in K.
    pub t_out: f64,
    /// Highest stage temperature in K (the outlet temperature without profile).
    pub t_max: f64,
    /// Outlet pressure in Pa.
    pub p_out: f64,
    /// Catalytic area per stage in m².
    pub area_stage: f64,
    /// Gas volume per stage in m³.
    pub volume_stage: f64,
    /// Volume of the catalyst in m³.
    pub v_cat: f64,
    pub profile: Option<StageProfile>,
}

/// Cascade of identical CSTRs with catalytic surfaces.
///
/// Every call of [CstrCascade::simulate] builds its own [CascadeSession], so a
/// cascade can be shared between threads.
#[derive(Clone, Debug)]
pub struct CstrCascade {
    config: ReactorConfig,
}

impl CstrCascade {
    pub fn new(config: ReactorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Geometric catalyst volume of a design in m³.
    pub fn catalyst_volume(&self, params: DesignParameters) -> f64 {
        params.catalyst_volume(self.config.length(), self.config.units())
    }

    /// March through all stages and return the outlet conditions.
    pub fn simulate(
        &self,
        params: DesignParameters,
        options: &SimulationOptions,
    ) -> CascadeResult<SimulationResult> {
        let config = &self.config;
        let geometry = StageGeometry::new(config, params)?;
        let mut session = CascadeSession::new(config, &geometry, options.heat_loss)?;
        let ch4 = session.reactor().contents().species_index("CH4")?;
        let verbosity = options.verbosity;

        let mut profile = options.profile.then(|| {
            let surface = config.track_coverages().then(|| {
                session
                    .reactor()
                    .surface()
                    .map(|s| names(s.phase()))
                    .unwrap_or_default()
            });
            StageProfile::new(config.tracked_species().to_vec(), surface)
        });

        log_iter!(
            verbosity,
            " stage |   z / m    | temperature |   pressure   |   x(CH4)    | steps"
        );
        log_iter!(verbosity, "{:-<72}", "");
        let mut steps = 0;
        for stage in 1..=config.stages() {
            if stage > 1 {
                session.hand_off()?;
            }
            let n = session.relax(options.solver)?;
            steps += n;
            let reactor = session.reactor();
            log_iter!(
                verbosity,
                " {:5} | {:10.4e} | {:11.5} | {:12.5e} | {:11.5e} | {:5}",
                stage,
                session.position(),
                reactor.temperature(),
                reactor.pressure(),
                reactor.mole_fractions()[ch4],
                n
            );
            if let Some(profile) = profile.as_mut() {
                profile.push(session.record(config)?);
            }
        }

        let reactor = session.reactor();
        let t_out = reactor.temperature();
        let result = SimulationResult {
            ch4: reactor.mole_fractions()[ch4],
            t_out,
            t_max: profile
                .as_ref()
                .and_then(|p| p.max_temperature())
                .unwrap_or(t_out),
            p_out: reactor.pressure(),
            area_stage: geometry.area,
            volume_stage: geometry.volume,
            v_cat: geometry.catalyst_volume,
            profile,
        };
        log_result!(
            verbosity,
            "Cascade of {} stage(s) relaxed in {} step(s): T_out = {:.2} K, x(CH4) = {:.5e}\n",
            config.stages(),
            steps,
            result.t_out,
            result.ch4
        );
        Ok(result)
    }
}

fn names(surface: &Interface) -> Vec<String> {
    surface.species_names().into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CascadeError;
    use approx::assert_relative_eq;
    use pfr_kinetics::{Mechanism, ONE_ATM};
    use std::sync::Arc;

    fn cascade(stages: usize, energy: bool) -> CstrCascade {
        let mechanism = Arc::new(
            Mechanism::from_json(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/data/methane_pox_on_pt.json"
            ))
            .unwrap(),
        );
        let config = ReactorConfig::builder(&mechanism)
            .inlet_temperature_celsius(800.0)
            .pressure(ONE_ATM)
            .length(0.003)
            .mass_flow_rate(1e-6)
            .stages(stages)
            .energy(energy)
            .tracked_species(&["CH4", "O2", "H2", "CO"])
            .track_coverages(true)
            .build()
            .unwrap();
        CstrCascade::new(config)
    }

    #[test]
    fn single_stage() -> CascadeResult<()> {
        let cascade = cascade(1, false);
        let params = DesignParameters::new(1500.0, 2.0, 0.35);
        let result = cascade.simulate(params, &SimulationOptions::new().profile(true))?;
        assert_relative_eq!(result.t_out, 1073.15, max_relative = 1e-10);
        assert_relative_eq!(result.t_max, result.t_out);
        assert_relative_eq!(result.p_out, ONE_ATM, max_relative = 1e-6);
        assert!(result.ch4 > 0.0 && result.ch4 < 1.0 / 1.7);
        assert_relative_eq!(result.v_cat, cascade.catalyst_volume(params));

        let profile = result.profile.unwrap();
        assert_eq!(profile.len(), 1);
        assert_relative_eq!(profile.mole_fraction("CH4")?[0], result.ch4);
        assert_eq!(profile.surface_species().map(|s| s.len()), Some(11));
        Ok(())
    }

    #[test]
    fn heat_loss_cools_the_reactor() -> CascadeResult<()> {
        let cascade = cascade(3, true);
        let params = DesignParameters::new(1500.0, 2.0, 0.35);
        let adiabatic = cascade.simulate(params, &SimulationOptions::new())?;
        let cooled = cascade.simulate(params, &SimulationOptions::new().heat_loss(300.0, 10.0))?;
        assert!(cooled.t_out < adiabatic.t_out);

        // without the energy equation the wall has no effect
        let cascade = CstrCascade::new(cascade.config().with_energy(false));
        let options = SimulationOptions::new().heat_loss(300.0, 10.0);
        let isothermal = cascade.simulate(params, &options)?;
        assert_relative_eq!(isothermal.t_out, 1073.15, max_relative = 1e-10);
        Ok(())
    }

    #[test]
    fn invalid_design_is_not_a_simulation_failure() {
        let cascade = cascade(2, false);
        let result = cascade.simulate([1500.0, 2.0, 1.2].into(), &SimulationOptions::new());
        assert!(matches!(result, Err(CascadeError::InvalidDesign(_))));
    }
}
