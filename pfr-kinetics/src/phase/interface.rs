use super::{parse_composition, IdealGas};
use crate::errors::{KineticsError, KineticsResult};
use crate::mechanism::{Mechanism, PhaseKind};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

/// Surface phase with a fixed site density, adjacent to an ideal gas.
///
/// The state of an interface is given by the fractional coverages of its
/// species, which always sum up to one.
#[derive(Clone, Debug)]
pub struct Interface {
    mechanism: Arc<Mechanism>,
    name: String,
    gas: String,
    species: Vec<usize>,
    sites: Array1<f64>,
    site_density: f64,
    coverages: Array1<f64>,
}

impl Interface {
    /// Create the interface `name` of the mechanism that is in contact with `gas`.
    ///
    /// Initially, the first species covers the complete surface.
    pub fn new(mechanism: &Arc<Mechanism>, name: &str, gas: &IdealGas) -> KineticsResult<Self> {
        let (_, phase) = mechanism.phase(name)?;
        let site_density = match (phase.kind, phase.site_density) {
            (PhaseKind::Interface, Some(g)) => g,
            _ => {
                return Err(KineticsError::Error(format!(
                    "The phase `{name}` is not an interface."
                )))
            }
        };
        if !Arc::ptr_eq(mechanism, gas.mechanism()) {
            return Err(KineticsError::Error(format!(
                "The interface `{name}` and the gas `{}` are defined by different mechanisms.",
                gas.name()
            )));
        }
        if !phase.adjacent.is_empty() && !phase.adjacent.iter().any(|a| a == gas.name()) {
            return Err(KineticsError::Error(format!(
                "The phase `{}` is not adjacent to the interface `{name}`.",
                gas.name()
            )));
        }
        let species = phase.species.clone();
        let sites = species.iter().map(|&i| mechanism.species()[i].sites).collect();
        let mut coverages = Array1::zeros(species.len());
        coverages[0] = 1.0;
        Ok(Self {
            mechanism: mechanism.clone(),
            name: name.into(),
            gas: gas.name().into(),
            species,
            sites,
            site_density,
            coverages,
        })
    }

    pub fn mechanism(&self) -> &Arc<Mechanism> {
        &self.mechanism
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the adjacent gas phase.
    pub fn gas(&self) -> &str {
        &self.gas
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// Indices of the species of the phase in the mechanism.
    pub fn species(&self) -> &[usize] {
        &self.species
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.species
            .iter()
            .map(|&i| self.mechanism.species()[i].name.as_str())
            .collect()
    }

    pub fn species_index(&self, name: &str) -> KineticsResult<usize> {
        self.mechanism
            .species_index(name)
            .and_then(|i| self.species.iter().position(|&s| s == i))
            .ok_or_else(|| KineticsError::UnknownSpecies(name.into(), self.name.clone()))
    }

    /// Site density in mol/m².
    pub fn site_density(&self) -> f64 {
        self.site_density
    }

    /// Number of sites occupied by each species.
    pub fn sites(&self) -> &Array1<f64> {
        &self.sites
    }

    pub fn coverages(&self) -> &Array1<f64> {
        &self.coverages
    }

    /// Surface concentrations in mol/m².
    pub fn concentrations(&self) -> Array1<f64> {
        &self.coverages / &self.sites * self.site_density
    }

    /// Set the coverages. The values are normalized, small negative values
    /// are set to zero.
    pub fn set_coverages(&mut self, coverages: &Array1<f64>) -> KineticsResult<()> {
        if coverages.len() != self.n_species() {
            return Err(KineticsError::IncompatibleComponents(
                self.n_species(),
                coverages.len(),
            ));
        }
        if let Some(v) = coverages.iter().find(|v| !v.is_finite()) {
            return Err(KineticsError::InvalidState(
                "Interface::set_coverages".into(),
                "coverage".into(),
                *v,
            ));
        }
        let theta = coverages.mapv(|v| v.max(0.0));
        let total = theta.sum();
        if total <= 0.0 {
            return Err(KineticsError::InvalidState(
                "Interface::set_coverages".into(),
                "sum of coverages".into(),
                total,
            ));
        }
        self.coverages = theta / total;
        Ok(())
    }

    /// Set the coverages from a string like `"PT(S):0.9, O(S):0.1"`.
    pub fn set_coverages_by_name(&mut self, coverages: &str) -> KineticsResult<()> {
        let mut theta = Array1::zeros(self.n_species());
        for (name, value) in parse_composition(coverages)? {
            theta[self.species_index(&name)?] = value;
        }
        self.set_coverages(&theta)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interface({})", self.name)?;
        for (name, theta) in self.species_names().iter().zip(self.coverages.iter()) {
            if *theta > 0.0 {
                write!(f, ", θ({name}) = {theta:.5}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coverages() -> KineticsResult<()> {
        let mechanism = Arc::new(Mechanism::from_json(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../data/methane_pox_on_pt.json"
        ))?);
        let gas = IdealGas::new(&mechanism, "gas")?;
        let mut surf = Interface::new(&mechanism, "Pt_surf", &gas)?;
        assert_eq!(surf.n_species(), 11);
        assert_eq!(surf.coverages()[0], 1.0);
        assert_relative_eq!(surf.site_density(), 2.7063e-5);

        surf.set_coverages_by_name("PT(S):2, O(S):2")?;
        assert_relative_eq!(surf.coverages()[surf.species_index("O(S)")?], 0.5);
        assert_relative_eq!(surf.concentrations().sum(), 2.7063e-5, max_relative = 1e-12);
        assert!(surf.set_coverages_by_name("CH4:1").is_err());
        assert!(Interface::new(&mechanism, "gas", &gas).is_err());
        Ok(())
    }
}
