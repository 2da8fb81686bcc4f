use crate::errors::{KineticsError, KineticsResult};
use crate::phase::IdealGas;
use num_dual::DualNum;

/// Reservoir with a fixed state that acts as inlet or pressure reference.
///
/// The state seen by a [ReactorNet](super::ReactorNet) is a snapshot of the
/// phase. Changes to the phase become effective only after calling
/// [Reservoir::sync_state].
#[derive(Clone, Debug)]
pub struct Reservoir {
    phase: IdealGas,
    temperature: f64,
    pressure: f64,
    mass_fractions: Vec<f64>,
    enthalpy_mass: f64,
}

impl Reservoir {
    pub fn new(phase: IdealGas) -> Self {
        Self {
            temperature: phase.temperature(),
            pressure: phase.pressure(),
            mass_fractions: phase.mass_fractions().to_vec(),
            enthalpy_mass: phase.enthalpy_mass(),
            phase,
        }
    }

    pub fn phase(&self) -> &IdealGas {
        &self.phase
    }

    /// Mutable access to the phase of the reservoir.
    pub fn phase_mut(&mut self) -> &mut IdealGas {
        &mut self.phase
    }

    /// Update the state of the reservoir from its phase.
    pub fn sync_state(&mut self) {
        self.temperature = self.phase.temperature();
        self.pressure = self.phase.pressure();
        self.mass_fractions = self.phase.mass_fractions().to_vec();
        self.enthalpy_mass = self.phase.enthalpy_mass();
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn mass_fractions(&self) -> &[f64] {
        &self.mass_fractions
    }

    /// Specific enthalpy in J/kg.
    pub fn enthalpy_mass(&self) -> f64 {
        self.enthalpy_mass
    }
}

/// Flow device with a prescribed mass flow rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassFlowController {
    mass_flow_rate: f64,
}

impl MassFlowController {
    /// Mass flow rate in kg/s.
    pub fn new(mass_flow_rate: f64) -> KineticsResult<Self> {
        if !(mass_flow_rate.is_finite() && mass_flow_rate >= 0.0) {
            return Err(KineticsError::InvalidState(
                "MassFlowController::new".into(),
                "mass flow rate".into(),
                mass_flow_rate,
            ));
        }
        Ok(Self { mass_flow_rate })
    }

    pub fn mass_flow_rate(&self) -> f64 {
        self.mass_flow_rate
    }
}

/// Outlet device whose flow follows the inlet mass flow controller, corrected
/// for the pressure difference: `mdot = mdot_in + K (p - p_downstream)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureController {
    coefficient: f64,
}

impl PressureController {
    /// Pressure coefficient `K` in kg/(s Pa).
    pub fn new(coefficient: f64) -> KineticsResult<Self> {
        if !(coefficient.is_finite() && coefficient >= 0.0) {
            return Err(KineticsError::InvalidState(
                "PressureController::new".into(),
                "pressure coefficient".into(),
                coefficient,
            ));
        }
        Ok(Self { coefficient })
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Outlet mass flow rate in kg/s. Backflow is not permitted.
    pub fn mass_flow_rate<D: DualNum<f64> + Copy>(
        &self,
        primary: f64,
        pressure: D,
        downstream: f64,
    ) -> D {
        let mdot = (pressure - downstream) * self.coefficient + primary;
        if mdot.re() > 0.0 {
            mdot
        } else {
            D::zero()
        }
    }
}
