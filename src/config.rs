//! Operating conditions of the reactor that are fixed during an optimization.
//!
//! A [ReactorConfig] is either assembled with the [ReactorConfigBuilder] or
//! read from a json file:
//!
//! ```json
//! {
//!     "mechanism": "methane_pox_on_pt.json",
//!     "inlet_temperature": 800.0,
//!     "pressure": 101325.0,
//!     "composition": "CH4:1, O2:0.6, AR:0.1",
//!     "length": 0.003,
//!     "mass_flow_rate": 1e-6,
//!     "stages": 201
//! }
//! ```
//!
//! The inlet temperature is given in degree Celsius. A relative mechanism path
//! is resolved against the directory of the configuration file.
use crate::errors::{CascadeError, CascadeResult};
use crate::CELSIUS;
use pfr_kinetics::{IdealGas, Interface, Mechanism};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_PRESSURE_COEFFICIENT: f64 = 1e-5;

/// Length units of the design parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Units {
    /// One centimeter in m.
    pub centimeter: f64,
}

impl Default for Units {
    fn default() -> Self {
        Self { centimeter: 0.01 }
    }
}

fn default_gas() -> String {
    "gas".into()
}

fn default_surface() -> String {
    "Pt_surf".into()
}

fn default_composition() -> String {
    "CH4:1, O2:0.6, AR:0.1".into()
}

fn default_tracked_species() -> Vec<String> {
    vec!["CH4".into()]
}

fn default_pressure_coefficient() -> f64 {
    DEFAULT_PRESSURE_COEFFICIENT
}

/// Serializable form of a [ReactorConfig].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReactorConfigRecord {
    /// Path to the mechanism file.
    pub mechanism: PathBuf,
    #[serde(default = "default_gas")]
    pub gas: String,
    #[serde(default = "default_surface")]
    pub surface: String,
    /// Inlet temperature in °C.
    pub inlet_temperature: f64,
    /// Inlet pressure in Pa.
    pub pressure: f64,
    #[serde(default = "default_composition")]
    pub composition: String,
    /// Reactor length in m.
    pub length: f64,
    /// Mass flow rate in kg/s.
    pub mass_flow_rate: f64,
    pub stages: usize,
    #[serde(default)]
    pub energy: bool,
    #[serde(default = "default_tracked_species")]
    pub tracked_species: Vec<String>,
    #[serde(default)]
    pub track_coverages: bool,
    /// Coefficient of the outlet pressure controller in kg/(s Pa).
    #[serde(default = "default_pressure_coefficient")]
    pub pressure_coefficient: f64,
    #[serde(default)]
    pub units: Units,
}

impl ReactorConfigRecord {
    /// Read a record from a json file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> CascadeResult<Self> {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Resolve a relative mechanism path against the directory `dir`.
    pub fn relative_to<P: AsRef<Path>>(mut self, dir: P) -> Self {
        if self.mechanism.is_relative() {
            self.mechanism = dir.as_ref().join(&self.mechanism);
        }
        self
    }
}

/// Validated operating conditions of a CSTR cascade.
///
/// The mechanism is shared between all simulations that use the
/// configuration.
#[derive(Clone, Debug)]
pub struct ReactorConfig {
    mechanism: Arc<Mechanism>,
    gas: String,
    surface: String,
    temperature: f64,
    pressure: f64,
    composition: String,
    length: f64,
    mass_flow_rate: f64,
    stages: usize,
    energy: bool,
    tracked_species: Vec<String>,
    track_coverages: bool,
    pressure_coefficient: f64,
    units: Units,
}

impl ReactorConfig {
    /// Start building a configuration for the given mechanism.
    pub fn builder(mechanism: &Arc<Mechanism>) -> ReactorConfigBuilder {
        ReactorConfigBuilder::new(mechanism)
    }

    /// Read a configuration and its mechanism from json files.
    pub fn from_json<P: AsRef<Path>>(file: P) -> CascadeResult<Self> {
        let file = file.as_ref();
        let record = ReactorConfigRecord::from_json(file)?;
        match file.parent() {
            Some(dir) => Self::from_record(record.relative_to(dir)),
            None => Self::from_record(record),
        }
    }

    /// Load the mechanism referenced by the record and validate the
    /// configuration.
    pub fn from_record(record: ReactorConfigRecord) -> CascadeResult<Self> {
        let mechanism = Arc::new(Mechanism::from_json(&record.mechanism)?);
        let tracked: Vec<&str> = record.tracked_species.iter().map(|s| s.as_str()).collect();
        Self::builder(&mechanism)
            .gas(&record.gas)
            .surface(&record.surface)
            .inlet_temperature_celsius(record.inlet_temperature)
            .pressure(record.pressure)
            .composition(&record.composition)
            .length(record.length)
            .mass_flow_rate(record.mass_flow_rate)
            .stages(record.stages)
            .energy(record.energy)
            .tracked_species(&tracked)
            .track_coverages(record.track_coverages)
            .pressure_coefficient(record.pressure_coefficient)
            .units(record.units)
            .build()
    }

    pub fn mechanism(&self) -> &Arc<Mechanism> {
        &self.mechanism
    }

    pub fn gas(&self) -> &str {
        &self.gas
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Inlet temperature in K.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Inlet pressure in Pa.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    /// Reactor length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Mass flow rate in kg/s.
    pub fn mass_flow_rate(&self) -> f64 {
        self.mass_flow_rate
    }

    /// Number of stages of the cascade.
    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn energy(&self) -> bool {
        self.energy
    }

    pub fn tracked_species(&self) -> &[String] {
        &self.tracked_species
    }

    pub fn track_coverages(&self) -> bool {
        self.track_coverages
    }

    pub fn pressure_coefficient(&self) -> f64 {
        self.pressure_coefficient
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Copy of the configuration with a different number of stages.
    pub fn with_stages(&self, stages: usize) -> CascadeResult<Self> {
        if stages < 1 {
            return Err(CascadeError::InvalidConfig(
                "the cascade needs at least one stage".into(),
            ));
        }
        Ok(Self {
            stages,
            ..self.clone()
        })
    }

    /// Copy of the configuration with the energy equation switched on or off.
    pub fn with_energy(&self, energy: bool) -> Self {
        Self {
            energy,
            ..self.clone()
        }
    }

    /// Gas phase at inlet conditions.
    pub fn inlet_gas(&self) -> CascadeResult<IdealGas> {
        let mut gas = IdealGas::new(&self.mechanism, &self.gas)?;
        gas.set_tpx(self.temperature, self.pressure, &self.composition)?;
        Ok(gas)
    }

    /// Record that reproduces this configuration given the mechanism path.
    pub fn to_record<P: Into<PathBuf>>(&self, mechanism: P) -> ReactorConfigRecord {
        ReactorConfigRecord {
            mechanism: mechanism.into(),
            gas: self.gas.clone(),
            surface: self.surface.clone(),
            inlet_temperature: self.temperature - CELSIUS,
            pressure: self.pressure,
            composition: self.composition.clone(),
            length: self.length,
            mass_flow_rate: self.mass_flow_rate,
            stages: self.stages,
            energy: self.energy,
            tracked_species: self.tracked_species.clone(),
            track_coverages: self.track_coverages,
            pressure_coefficient: self.pressure_coefficient,
            units: self.units,
        }
    }
}

/// A simple tool to construct a [ReactorConfig].
///
/// # Examples
/// ```no_run
/// # use pfr_cascade::{CascadeResult, ReactorConfig};
/// # use pfr_kinetics::{Mechanism, ONE_ATM};
/// # use std::sync::Arc;
/// # fn main() -> CascadeResult<()> {
/// let mechanism = Arc::new(Mechanism::from_json("data/methane_pox_on_pt.json")?);
/// let config = ReactorConfig::builder(&mechanism)
///     .inlet_temperature_celsius(800.0)
///     .pressure(ONE_ATM)
///     .length(0.003)
///     .mass_flow_rate(1e-6)
///     .stages(201)
///     .build()?;
/// assert_eq!(config.tracked_species(), &["CH4".to_string()]);
/// # Ok(())
/// # }
/// ```
pub struct ReactorConfigBuilder {
    mechanism: Arc<Mechanism>,
    gas: String,
    surface: String,
    temperature: Option<f64>,
    pressure: Option<f64>,
    composition: String,
    length: Option<f64>,
    mass_flow_rate: Option<f64>,
    stages: Option<usize>,
    energy: bool,
    tracked_species: Vec<String>,
    track_coverages: bool,
    pressure_coefficient: f64,
    units: Units,
}

impl ReactorConfigBuilder {
    pub fn new(mechanism: &Arc<Mechanism>) -> Self {
        Self {
            mechanism: mechanism.clone(),
            gas: default_gas(),
            surface: default_surface(),
            temperature: None,
            pressure: None,
            composition: default_composition(),
            length: None,
            mass_flow_rate: None,
            stages: None,
            energy: false,
            tracked_species: default_tracked_species(),
            track_coverages: false,
            pressure_coefficient: DEFAULT_PRESSURE_COEFFICIENT,
            units: Units::default(),
        }
    }

    /// Name of the gas phase.
    pub fn gas(mut self, gas: &str) -> Self {
        self.gas = gas.into();
        self
    }

    /// Name of the catalytic surface phase.
    pub fn surface(mut self, surface: &str) -> Self {
        self.surface = surface.into();
        self
    }

    /// Inlet temperature in K.
    pub fn inlet_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Inlet temperature in °C.
    pub fn inlet_temperature_celsius(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature + CELSIUS);
        self
    }

    /// Inlet pressure in Pa.
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Inlet composition in mole basis, e.g. `"CH4:1, O2:0.6, AR:0.1"`.
    pub fn composition(mut self, composition: &str) -> Self {
        self.composition = composition.into();
        self
    }

    /// Reactor length in m.
    pub fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Mass flow rate in kg/s.
    pub fn mass_flow_rate(mut self, mass_flow_rate: f64) -> Self {
        self.mass_flow_rate = Some(mass_flow_rate);
        self
    }

    pub fn stages(mut self, stages: usize) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn energy(mut self, energy: bool) -> Self {
        self.energy = energy;
        self
    }

    /// Gas species whose mole fractions are recorded in stage profiles.
    pub fn tracked_species(mut self, species: &[&str]) -> Self {
        self.tracked_species = species.iter().map(|&s| s.into()).collect();
        self
    }

    pub fn track_coverages(mut self, track_coverages: bool) -> Self {
        self.track_coverages = track_coverages;
        self
    }

    pub fn pressure_coefficient(mut self, coefficient: f64) -> Self {
        self.pressure_coefficient = coefficient;
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Validate the input and create the [ReactorConfig].
    pub fn build(self) -> CascadeResult<ReactorConfig> {
        let missing = |name: &str| CascadeError::InvalidConfig(format!("{name} is not specified"));
        let temperature = self.temperature.ok_or_else(|| missing("inlet temperature"))?;
        let pressure = self.pressure.ok_or_else(|| missing("pressure"))?;
        let length = self.length.ok_or_else(|| missing("reactor length"))?;
        let mass_flow_rate = self.mass_flow_rate.ok_or_else(|| missing("mass flow rate"))?;
        let stages = self.stages.ok_or_else(|| missing("number of stages"))?;

        if stages < 1 {
            return Err(CascadeError::InvalidConfig(
                "the cascade needs at least one stage".into(),
            ));
        }
        for (name, value) in [
            ("inlet temperature", temperature),
            ("pressure", pressure),
            ("reactor length", length),
            ("mass flow rate", mass_flow_rate),
            ("centimeter", self.units.centimeter),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CascadeError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.pressure_coefficient.is_finite() && self.pressure_coefficient >= 0.0) {
            return Err(CascadeError::InvalidConfig(format!(
                "pressure coefficient must not be negative, got {}",
                self.pressure_coefficient
            )));
        }

        // phases, composition and tracked species have to be known to the mechanism
        let mut gas = IdealGas::new(&self.mechanism, &self.gas)?;
        gas.set_tpx(temperature, pressure, &self.composition)?;
        Interface::new(&self.mechanism, &self.surface, &gas)?;
        if gas.species_index("CH4").is_err() {
            return Err(CascadeError::InvalidConfig(format!(
                "gas phase '{}' does not contain CH4",
                self.gas
            )));
        }
        for species in &self.tracked_species {
            gas.species_index(species)?;
        }

        Ok(ReactorConfig {
            mechanism: self.mechanism,
            gas: self.gas,
            surface: self.surface,
            temperature,
            pressure,
            composition: self.composition,
            length,
            mass_flow_rate,
            stages,
            energy: self.energy,
            tracked_species: self.tracked_species,
            track_coverages: self.track_coverages,
            pressure_coefficient: self.pressure_coefficient,
            units: self.units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pfr_kinetics::{KineticsError, ONE_ATM};
    use std::io::Write;

    const MECHANISM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/methane_pox_on_pt.json");

    fn mechanism() -> Arc<Mechanism> {
        Arc::new(Mechanism::from_json(MECHANISM).unwrap())
    }

    fn builder() -> ReactorConfigBuilder {
        ReactorConfig::builder(&mechanism())
            .inlet_temperature_celsius(800.0)
            .pressure(ONE_ATM)
            .length(0.003)
            .mass_flow_rate(1e-6)
            .stages(10)
    }

    #[test]
    fn build_config() -> CascadeResult<()> {
        let config = builder().build()?;
        assert_relative_eq!(config.temperature(), 1073.15);
        assert_eq!(config.gas(), "gas");
        assert_eq!(config.surface(), "Pt_surf");
        assert_eq!(config.tracked_species(), &["CH4".to_string()]);
        assert_relative_eq!(config.pressure_coefficient(), 1e-5);
        assert_relative_eq!(config.units().centimeter, 0.01);
        assert!(!config.energy());
        let gas = config.inlet_gas()?;
        assert_relative_eq!(gas.pressure(), ONE_ATM, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            builder().stages(0).build(),
            Err(CascadeError::InvalidConfig(_))
        ));
        assert!(matches!(
            builder().length(-1.0).build(),
            Err(CascadeError::InvalidConfig(_))
        ));
        assert!(matches!(
            builder().mass_flow_rate(0.0).build(),
            Err(CascadeError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReactorConfig::builder(&mechanism()).pressure(ONE_ATM).build(),
            Err(CascadeError::InvalidConfig(_))
        ));
        assert!(matches!(
            builder().surface("Rh_surf").build(),
            Err(CascadeError::Kinetics(KineticsError::UnknownPhase(_)))
        ));
        assert!(matches!(
            builder().tracked_species(&["C2H6"]).build(),
            Err(CascadeError::Kinetics(KineticsError::UnknownSpecies(..)))
        ));
        assert!(builder().composition("CH4 1, O2").build().is_err());
    }

    #[test]
    fn gas_without_methane() {
        let mechanism: Mechanism = r#"{
            "name": "h2_on_pt",
            "phases": [
                {"name": "gas", "kind": "ideal-gas", "species": ["H2", "AR"]},
                {"name": "surf", "kind": "interface", "species": ["PT(S)", "H(S)"],
                 "site_density": 2.7e-5, "adjacent": ["gas"]}
            ],
            "species": [
                {"name": "H2", "composition": {"H": 2},
                 "thermo": {"temperature_ranges": [200.0, 6000.0],
                            "data": [[3.3372792, 0, 0, 0, 0, -950.158922, -3.20502331]]}},
                {"name": "AR", "composition": {"Ar": 1},
                 "thermo": {"temperature_ranges": [200.0, 6000.0],
                            "data": [[2.5, 0, 0, 0, 0, -745.375, 4.366]]}},
                {"name": "PT(S)", "composition": {"Pt": 1}},
                {"name": "H(S)", "composition": {"H": 1, "Pt": 1}}
            ],
            "reactions": [
                {"reactants": {"H2": 1, "PT(S)": 2}, "products": {"H(S)": 2},
                 "rate": {"sticking": {"A": 0.046, "b": 0.0, "Ea": 0.0}}}
            ]
        }"#
        .parse()
        .unwrap();
        let result = ReactorConfig::builder(&Arc::new(mechanism))
            .surface("surf")
            .composition("H2:0.1, AR:0.9")
            .tracked_species(&["H2"])
            .inlet_temperature_celsius(800.0)
            .pressure(ONE_ATM)
            .length(0.003)
            .mass_flow_rate(1e-6)
            .stages(10)
            .build();
        assert!(matches!(result, Err(CascadeError::InvalidConfig(_))));
    }

    #[test]
    fn config_from_json() -> CascadeResult<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{
                "mechanism": "{MECHANISM}",
                "inlet_temperature": 900.0,
                "pressure": 5e5,
                "length": 0.2,
                "mass_flow_rate": 0.01,
                "stages": 50,
                "energy": true,
                "tracked_species": ["CH4", "O2", "H2", "CO"]
            }}"#
        )?;
        let config = ReactorConfig::from_json(file.path())?;
        assert_relative_eq!(config.temperature(), 1173.15);
        assert_eq!(config.stages(), 50);
        assert!(config.energy());
        assert_eq!(config.tracked_species().len(), 4);
        assert_eq!(config.composition(), "CH4:1, O2:0.6, AR:0.1");

        let record = config.to_record(MECHANISM);
        assert_relative_eq!(record.inlet_temperature, 900.0, max_relative = 1e-12);
        assert_eq!(config.with_stages(3)?.stages(), 3);
        assert!(config.with_stages(0).is_err());
        Ok(())
    }
}
