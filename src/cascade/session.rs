use super::profile::StageRecord;
use super::HeatLoss;
use crate::config::ReactorConfig;
use crate::errors::{CascadeError, CascadeResult};
use crate::geometry::StageGeometry;
use crate::CELSIUS;
use ndarray::Array1;
use pfr_kinetics::{
    IdealGasReactor, Interface, MassFlowController, PressureController, ReactorNet,
    ReactorSurface, Reservoir, SolverOptions, Wall,
};

/// A reactor network that is marched through the stages of a cascade.
///
/// The session owns a single stage reactor that is fed from an upstream
/// reservoir. After the stage is relaxed to steady state,
/// [CascadeSession::hand_off] turns the outlet of the stage into the inlet of
/// the next one. The reactor keeps its state, which is the initial guess for
/// the following stage.
pub struct CascadeSession {
    net: ReactorNet,
    stage: usize,
    position: f64,
    stage_length: f64,
}

impl CascadeSession {
    /// Assemble the network of a single stage at inlet conditions.
    ///
    /// The heat loss is only applied if the energy equation is enabled.
    pub fn new(
        config: &ReactorConfig,
        geometry: &StageGeometry,
        heat_loss: Option<HeatLoss>,
    ) -> CascadeResult<Self> {
        let gas = config.inlet_gas()?;
        let surface = Interface::new(config.mechanism(), config.surface(), &gas)?;

        let upstream = Reservoir::new(gas.clone());
        let downstream = Reservoir::new(gas.clone());
        let mut reactor = IdealGasReactor::new(gas, geometry.volume, config.energy())?;
        reactor.add_surface(ReactorSurface::new(surface, geometry.area)?)?;
        if let (Some(loss), true) = (heat_loss, config.energy()) {
            reactor.add_wall(Wall::new(
                geometry.wall_area,
                loss.heat_transfer_coefficient,
                loss.ambient_temperature + CELSIUS,
            )?);
        }

        let inlet = MassFlowController::new(config.mass_flow_rate())?;
        let outlet = PressureController::new(config.pressure_coefficient())?;
        let net = ReactorNet::new(upstream, inlet, reactor, outlet, downstream)?;
        let stage_length = config.length() / config.stages() as f64;
        Ok(Self {
            net,
            stage: 1,
            position: stage_length,
            stage_length,
        })
    }

    /// Index of the current stage (starting at 1).
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Axial position of the outlet of the current stage in m.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn reactor(&self) -> &IdealGasReactor {
        self.net.reactor()
    }

    pub fn coverages(&self) -> Array1<f64> {
        self.net.coverages()
    }

    /// Relax the current stage to steady state and return the number of
    /// pseudo-time steps.
    pub fn relax(&mut self, options: SolverOptions) -> CascadeResult<usize> {
        let stage = self.stage;
        self.net
            .advance_to_steady_state(options)
            .map_err(|source| CascadeError::SimulationFailed { stage, source })
    }

    /// Use the state of the current stage as the inlet of the next stage.
    pub fn hand_off(&mut self) -> CascadeResult<()> {
        let stage = self.stage;
        let (temperature, density, mass_fractions) = self.net.reactor().contents().tdy();
        let upstream = self.net.upstream_mut();
        upstream
            .phase_mut()
            .set_tdy(temperature, density, &mass_fractions)
            .map_err(|source| CascadeError::SimulationFailed { stage, source })?;
        upstream.sync_state();
        self.net.reinitialize();
        self.stage += 1;
        self.position += self.stage_length;
        Ok(())
    }

    /// Profile entry of the current stage.
    pub fn record(&self, config: &ReactorConfig) -> CascadeResult<StageRecord> {
        let contents = self.net.reactor().contents();
        let x = contents.mole_fractions();
        let mole_fractions = config
            .tracked_species()
            .iter()
            .map(|s| Ok(x[contents.species_index(s)?]))
            .collect::<CascadeResult<_>>()?;
        Ok(StageRecord {
            stage: self.stage,
            position: self.position,
            temperature: contents.temperature(),
            pressure: contents.pressure(),
            mole_fractions,
            coverages: config.track_coverages().then(|| self.net.coverages().to_vec()),
        })
    }
}
