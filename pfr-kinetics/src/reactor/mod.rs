//! Well-mixed reactors and the network that connects them to their
//! surroundings.
//!
//! A [ReactorNet] consists of an upstream [Reservoir] that feeds an
//! [IdealGasReactor] through a [MassFlowController]. The outlet flow is
//! determined by a [PressureController] that keeps the reactor close to the
//! pressure of the downstream [Reservoir]. The reactor may carry a
//! [ReactorSurface] and heat loss [Wall]s.
use crate::errors::{KineticsError, KineticsResult};
use crate::phase::{IdealGas, Interface};
use ndarray::Array1;
use num_dual::DualNum;
use std::sync::Arc;

mod flow;
mod net;
pub use flow::{MassFlowController, PressureController, Reservoir};
pub use net::ReactorNet;

/// A reacting surface attached to a reactor.
#[derive(Clone, Debug)]
pub struct ReactorSurface {
    phase: Interface,
    area: f64,
}

impl ReactorSurface {
    /// Create a surface with the given area in m².
    pub fn new(phase: Interface, area: f64) -> KineticsResult<Self> {
        if !(area.is_finite() && area > 0.0) {
            return Err(KineticsError::InvalidState(
                "ReactorSurface::new".into(),
                "area".into(),
                area,
            ));
        }
        Ok(Self { phase, area })
    }

    /// Surface area in m².
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn phase(&self) -> &Interface {
        &self.phase
    }

    pub fn coverages(&self) -> &Array1<f64> {
        self.phase.coverages()
    }
}

/// Heat exchange with surroundings at constant temperature,
/// `Q = U A (T - T_ambient)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    /// Area in m².
    pub area: f64,
    /// Overall heat transfer coefficient in W/(m² K).
    pub heat_transfer_coefficient: f64,
    /// Temperature of the surroundings in K.
    pub ambient_temperature: f64,
}

impl Wall {
    pub fn new(
        area: f64,
        heat_transfer_coefficient: f64,
        ambient_temperature: f64,
    ) -> KineticsResult<Self> {
        for (name, value) in [
            ("area", area),
            ("heat transfer coefficient", heat_transfer_coefficient),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(KineticsError::InvalidState("Wall::new".into(), name.into(), value));
            }
        }
        if !(ambient_temperature.is_finite() && ambient_temperature > 0.0) {
            return Err(KineticsError::InvalidState(
                "Wall::new".into(),
                "ambient temperature".into(),
                ambient_temperature,
            ));
        }
        Ok(Self {
            area,
            heat_transfer_coefficient,
            ambient_temperature,
        })
    }

    /// Heat flow from the reactor to the surroundings in W.
    pub fn heat_rate<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        (temperature - self.ambient_temperature) * (self.heat_transfer_coefficient * self.area)
    }
}

/// Rigid, well-mixed reactor filled with an ideal gas.
#[derive(Clone, Debug)]
pub struct IdealGasReactor {
    contents: IdealGas,
    volume: f64,
    energy: bool,
    surface: Option<ReactorSurface>,
    walls: Vec<Wall>,
}

impl IdealGasReactor {
    /// Create a reactor with the given volume in m³, initialized with the
    /// state of `contents`. If `energy` is false, the temperature is kept
    /// constant.
    pub fn new(contents: IdealGas, volume: f64, energy: bool) -> KineticsResult<Self> {
        if !(volume.is_finite() && volume > 0.0) {
            return Err(KineticsError::InvalidState(
                "IdealGasReactor::new".into(),
                "volume".into(),
                volume,
            ));
        }
        Ok(Self {
            contents,
            volume,
            energy,
            surface: None,
            walls: Vec::new(),
        })
    }

    /// Attach a reacting surface. A reactor carries at most one surface.
    pub fn add_surface(&mut self, surface: ReactorSurface) -> KineticsResult<()> {
        if self.surface.is_some() {
            return Err(KineticsError::Error(
                "The reactor already carries a surface.".into(),
            ));
        }
        let phase = surface.phase();
        if !Arc::ptr_eq(phase.mechanism(), self.contents.mechanism())
            || phase.gas() != self.contents.name()
        {
            return Err(KineticsError::Error(format!(
                "The interface `{}` is not adjacent to the gas `{}`.",
                phase.name(),
                self.contents.name()
            )));
        }
        self.surface = Some(surface);
        Ok(())
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    pub fn contents(&self) -> &IdealGas {
        &self.contents
    }

    pub fn surface(&self) -> Option<&ReactorSurface> {
        self.surface.as_ref()
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Volume in m³.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn energy_enabled(&self) -> bool {
        self.energy
    }

    /// Mass of the contents in kg.
    pub fn mass(&self) -> f64 {
        self.contents.density() * self.volume
    }

    pub fn temperature(&self) -> f64 {
        self.contents.temperature()
    }

    pub fn pressure(&self) -> f64 {
        self.contents.pressure()
    }

    pub fn mole_fractions(&self) -> Array1<f64> {
        self.contents.mole_fractions()
    }

    pub(crate) fn n_surface_species(&self) -> usize {
        self.surface.as_ref().map_or(0, |s| s.phase.n_species())
    }

    pub(crate) fn update_state(
        &mut self,
        temperature: f64,
        density: f64,
        mass_fractions: &Array1<f64>,
        coverages: &Array1<f64>,
    ) -> KineticsResult<()> {
        self.contents.set_tdy(temperature, density, mass_fractions)?;
        if let Some(s) = self.surface.as_mut() {
            s.phase.set_coverages(coverages)?;
        }
        Ok(())
    }
}
