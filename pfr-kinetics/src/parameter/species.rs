use super::ParameterError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// NASA 7-coefficient polynomials for two temperature ranges.
///
/// `temperature_ranges` holds `[T_min, T_mid, T_max]`, `data[0]` the
/// coefficients of the lower and `data[1]` those of the upper range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Nasa7Record {
    pub temperature_ranges: Vec<f64>,
    pub data: Vec<[f64; 7]>,
}

impl Nasa7Record {
    pub fn new(t_min: f64, t_mid: f64, t_max: f64, low: [f64; 7], high: [f64; 7]) -> Self {
        Self {
            temperature_ranges: vec![t_min, t_mid, t_max],
            data: vec![low, high],
        }
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), ParameterError> {
        match (self.temperature_ranges.len(), self.data.len()) {
            (2, 1) | (3, 2) => Ok(()),
            (t, d) => Err(ParameterError::IncompatibleParameters(format!(
                "NASA7 data of species '{name}' has {t} temperature bounds and {d} coefficient sets."
            ))),
        }
    }
}

/// A species as it is stored in a mechanism file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpeciesRecord {
    pub name: String,
    /// Number of atoms per element.
    pub composition: IndexMap<String, f64>,
    /// Number of sites occupied by a surface species.
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub sites: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermo: Option<Nasa7Record>,
}

fn one() -> f64 {
    1.0
}

fn is_one(x: &f64) -> bool {
    *x == 1.0
}

impl SpeciesRecord {
    pub fn new(name: &str, composition: &[(&str, f64)], thermo: Option<Nasa7Record>) -> Self {
        Self {
            name: name.into(),
            composition: composition
                .iter()
                .map(|&(e, n)| (e.to_string(), n))
                .collect(),
            sites: 1.0,
            thermo,
        }
    }

    /// Molar mass in kg/mol calculated from the elemental composition.
    pub fn molar_mass(&self) -> Result<f64, ParameterError> {
        self.composition
            .iter()
            .map(|(element, n)| {
                atomic_weight(element)
                    .map(|w| n * w * 1e-3)
                    .ok_or_else(|| ParameterError::UnknownElement(element.clone()))
            })
            .sum()
    }
}

impl fmt::Display for SpeciesRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpeciesRecord(name={}", self.name)?;
        write!(f, ", composition={{")?;
        for (i, (e, n)) in self.composition.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}: {n}")?;
        }
        write!(f, "}}")?;
        if self.sites != 1.0 {
            write!(f, ", sites={}", self.sites)?;
        }
        if self.thermo.is_some() {
            write!(f, ", thermo=NASA7")?;
        }
        write!(f, ")")
    }
}

/// Standard atomic weight in g/mol.
pub fn atomic_weight(element: &str) -> Option<f64> {
    let w = match element {
        "H" => 1.008,
        "He" | "HE" => 4.002602,
        "C" => 12.011,
        "N" => 14.007,
        "O" => 15.999,
        "Ar" | "AR" => 39.95,
        "Ne" | "NE" => 20.1797,
        "S" => 32.06,
        "Cl" | "CL" => 35.45,
        "Rh" | "RH" => 102.9055,
        "Pd" | "PD" => 106.42,
        "Ni" | "NI" => 58.6934,
        "Pt" | "PT" => 195.084,
        "E" => 5.48579909e-4,
        _ => return None,
    };
    Some(w)
}
