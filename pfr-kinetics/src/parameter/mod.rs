//! Records that make up a reaction mechanism file.
//!
//! A mechanism file is a json document holding the phases, the species and
//! the reactions of a mechanism. All values are in SI units with amounts in
//! mol, i.e., pre-exponential factors of surface reactions are given in
//! m, mol and s and activation energies in J/mol.
//!
//! ```json
//! {
//!     "name": "h2_on_pt",
//!     "phases": [
//!         {"name": "gas", "kind": "ideal-gas", "species": ["H2", "AR"]},
//!         {"name": "surf", "kind": "interface", "species": ["PT(S)", "H(S)"], "site_density": 2.7e-5}
//!     ],
//!     "species": [...],
//!     "reactions": [
//!         {
//!             "reactants": {"H2": 1, "PT(S)": 2},
//!             "products": {"H(S)": 2},
//!             "rate": {"sticking": {"A": 0.046, "b": 0.0, "Ea": 0.0}}
//!         }
//!     ]
//! }
//! ```
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

mod reaction;
mod species;

pub use reaction::{ArrheniusRecord, CoverageDependencyRecord, RateRecord, ReactionRecord};
pub use species::{atomic_weight, Nasa7Record, SpeciesRecord};

/// Type of a phase in a mechanism file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    /// Ideal gas mixture.
    IdealGas,
    /// Two-dimensional surface phase with a fixed number of sites.
    Interface,
}

/// A phase as it is stored in a mechanism file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PhaseRecord {
    pub name: String,
    pub kind: PhaseKind,
    pub species: Vec<String>,
    /// Site density in mol/m² (interfaces only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_density: Option<f64>,
    /// Names of adjacent bulk phases (interfaces only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjacent: Vec<String>,
}

/// Content of a mechanism file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MechanismRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub phases: Vec<PhaseRecord>,
    pub species: Vec<SpeciesRecord>,
    #[serde(default)]
    pub reactions: Vec<ReactionRecord>,
}

impl MechanismRecord {
    /// Read a mechanism from a json file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Self, ParameterError> {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }

    /// Read a mechanism from a json string.
    pub fn from_json_str(json: &str) -> Result<Self, ParameterError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Error type for incomplete or inconsistent mechanism records.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("The following species were not found: {0}")]
    SpeciesNotFound(String),
    #[error("The phase '{0}' is not defined in the mechanism.")]
    PhaseNotFound(String),
    #[error("The species '{0}' was defined more than once.")]
    DuplicateSpecies(String),
    #[error("The element '{0}' has no tabulated atomic weight.")]
    UnknownElement(String),
    #[error("Information missing: {0}")]
    InsufficientInformation(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),
}
