use super::parse_composition;
use crate::errors::{KineticsError, KineticsResult};
use crate::mechanism::{Mechanism, PhaseKind};
use crate::thermo::Nasa7;
use crate::{ONE_ATM, RGAS};
use ndarray::Array1;
use num_dual::DualNum;
use std::fmt;
use std::sync::Arc;

/// Ideal gas mixture of the species of one phase of a [Mechanism].
///
/// The state is stored as temperature, mass density and mass fractions.
#[derive(Clone, Debug)]
pub struct IdealGas {
    mechanism: Arc<Mechanism>,
    name: String,
    species: Vec<usize>,
    molar_masses: Array1<f64>,
    thermo: Vec<Nasa7>,
    temperature: f64,
    density: f64,
    mass_fractions: Array1<f64>,
}

impl IdealGas {
    /// Create the gas phase `name` of the mechanism.
    ///
    /// The phase is initialized with the first species at 298.15 K and 1 atm.
    pub fn new(mechanism: &Arc<Mechanism>, name: &str) -> KineticsResult<Self> {
        let (_, phase) = mechanism.phase(name)?;
        if phase.kind != PhaseKind::IdealGas {
            return Err(KineticsError::Error(format!(
                "The phase `{name}` is not an ideal gas."
            )));
        }
        let species = phase.species.clone();
        let molar_masses = species
            .iter()
            .map(|&i| mechanism.species()[i].molar_mass)
            .collect();
        let thermo = species
            .iter()
            .map(|&i| {
                let s = &mechanism.species()[i];
                s.thermo.clone().ok_or_else(|| {
                    KineticsError::Error(format!("No thermodynamic data for `{}`.", s.name))
                })
            })
            .collect::<KineticsResult<Vec<_>>>()?;
        let mut mass_fractions = Array1::zeros(species.len());
        mass_fractions[0] = 1.0;
        let mut gas = Self {
            mechanism: mechanism.clone(),
            name: name.into(),
            species,
            molar_masses,
            thermo,
            temperature: 298.15,
            density: 1.0,
            mass_fractions,
        };
        gas.density = ONE_ATM * gas.mean_molar_mass() / (RGAS * gas.temperature);
        Ok(gas)
    }

    pub fn mechanism(&self) -> &Arc<Mechanism> {
        &self.mechanism
    }

    pub fn name(&self) -> &str {
        &self.name
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

    /// Index of a species within the phase.
    pub fn species_index(&self, name: &str) -> KineticsResult<usize> {
        self.mechanism
            .species_index(name)
            .and_then(|i| self.species.iter().position(|&s| s == i))
            .ok_or_else(|| KineticsError::UnknownSpecies(name.into(), self.name.clone()))
    }

    /// Molar masses in kg/mol.
    pub fn molar_masses(&self) -> &Array1<f64> {
        &self.molar_masses
    }

    pub fn species_thermo(&self) -> &[Nasa7] {
        &self.thermo
    }

    /// Temperature in K.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Mass density in kg/m³.
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn mass_fractions(&self) -> &Array1<f64> {
        &self.mass_fractions
    }

    pub fn mole_fractions(&self) -> Array1<f64> {
        let n = &self.mass_fractions / &self.molar_masses;
        let total = n.sum();
        n / total
    }

    /// Mean molar mass in kg/mol.
    pub fn mean_molar_mass(&self) -> f64 {
        1.0 / (&self.mass_fractions / &self.molar_masses).sum()
    }

    /// Pressure in Pa.
    pub fn pressure(&self) -> f64 {
        self.density * RGAS * self.temperature / self.mean_molar_mass()
    }

    /// Molar concentrations in mol/m³.
    pub fn concentrations(&self) -> Array1<f64> {
        &self.mass_fractions / &self.molar_masses * self.density
    }

    /// Temperature, density and mass fractions.
    pub fn tdy(&self) -> (f64, f64, Array1<f64>) {
        (self.temperature, self.density, self.mass_fractions.clone())
    }

    /// Set temperature, pressure and the mole fractions given as composition
    /// string, e.g. `"CH4:1, O2:0.6, AR:0.1"`. The mole fractions are
    /// normalized and species that are not listed are set to zero.
    pub fn set_tpx(
        &mut self,
        temperature: f64,
        pressure: f64,
        composition: &str,
    ) -> KineticsResult<()> {
        let mut x = Array1::zeros(self.n_species());
        for (name, value) in parse_composition(composition)? {
            x[self.species_index(&name)?] = value;
        }
        self.set_tpx_array(temperature, pressure, &x)
    }

    /// Set temperature, pressure and (not necessarily normalized) mole fractions.
    pub fn set_tpx_array(
        &mut self,
        temperature: f64,
        pressure: f64,
        moles: &Array1<f64>,
    ) -> KineticsResult<()> {
        let y = moles * &self.molar_masses;
        let mass_fractions = self.normalized("set_tpx", &y)?;
        check_positive("set_tpx", "temperature", temperature)?;
        check_positive("set_tpx", "pressure", pressure)?;
        self.mass_fractions = mass_fractions;
        self.temperature = temperature;
        self.density = pressure * self.mean_molar_mass() / (RGAS * temperature);
        Ok(())
    }

    /// Set temperature and pressure at constant composition.
    pub fn set_tp(&mut self, temperature: f64, pressure: f64) -> KineticsResult<()> {
        check_positive("set_tp", "temperature", temperature)?;
        check_positive("set_tp", "pressure", pressure)?;
        self.temperature = temperature;
        self.density = pressure * self.mean_molar_mass() / (RGAS * temperature);
        Ok(())
    }

    /// Set temperature, density and mass fractions. The mass fractions
    /// are normalized, small negative values are set to zero.
    pub fn set_tdy(
        &mut self,
        temperature: f64,
        density: f64,
        mass_fractions: &Array1<f64>,
    ) -> KineticsResult<()> {
        let mass_fractions = self.normalized("set_tdy", mass_fractions)?;
        check_positive("set_tdy", "temperature", temperature)?;
        check_positive("set_tdy", "density", density)?;
        self.temperature = temperature;
        self.density = density;
        self.mass_fractions = mass_fractions;
        Ok(())
    }

    fn normalized(&self, method: &str, y: &Array1<f64>) -> KineticsResult<Array1<f64>> {
        if y.len() != self.n_species() {
            return Err(KineticsError::IncompatibleComponents(self.n_species(), y.len()));
        }
        if let Some(v) = y.iter().find(|v| !v.is_finite()) {
            return Err(KineticsError::InvalidState(
                format!("IdealGas::{method}"),
                "composition".into(),
                *v,
            ));
        }
        let y = y.mapv(|v| v.max(0.0));
        let total = y.sum();
        if total <= 0.0 {
            return Err(KineticsError::InvalidState(
                format!("IdealGas::{method}"),
                "sum of fractions".into(),
                total,
            ));
        }
        Ok(y / total)
    }

    /// Specific enthalpy in J/kg.
    pub fn enthalpy_mass(&self) -> f64 {
        let t = self.temperature;
        self.mass_fractions
            .iter()
            .zip(self.molar_masses.iter())
            .zip(&self.thermo)
            .map(|((&y, &w), nasa)| y / w * nasa.h_rt(t) * RGAS * t)
            .sum()
    }

    /// Specific isobaric heat capacity in J/(kg K).
    pub fn cp_mass(&self) -> f64 {
        self.cv_mass() + RGAS / self.mean_molar_mass()
    }

    /// Specific isochoric heat capacity in J/(kg K).
    pub fn cv_mass(&self) -> f64 {
        self.cv_mass_dual(self.temperature, &self.mass_fractions.to_vec())
    }

    /// Partial molar internal energies in J/mol.
    pub fn partial_molar_int_energies(&self) -> Array1<f64> {
        Array1::from(self.int_energies_dual(self.temperature))
    }

    /// Specific isochoric heat capacity for arbitrary temperature and mass
    /// fractions.
    pub fn cv_mass_dual<D: DualNum<f64> + Copy>(&self, temperature: D, mass_fractions: &[D]) -> D {
        mass_fractions
            .iter()
            .zip(self.molar_masses.iter())
            .zip(&self.thermo)
            .fold(D::zero(), |acc, ((&y, &w), nasa)| {
                acc + y * (nasa.cp_r(temperature) - 1.0) * (RGAS / w)
            })
    }

    /// Partial molar internal energies of the ideal gas species.
    pub fn int_energies_dual<D: DualNum<f64> + Copy>(&self, temperature: D) -> Vec<D> {
        self.thermo
            .iter()
            .map(|nasa| nasa.u_rt(temperature) * temperature * RGAS)
            .collect()
    }
}

fn check_positive(method: &str, property: &str, value: f64) -> KineticsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KineticsError::InvalidState(
            format!("IdealGas::{method}"),
            property.into(),
            value,
        ))
    }
}

impl fmt::Display for IdealGas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IdealGas({}): T = {:.5} K, p = {:.5} Pa, ρ = {:.5} kg/m³",
            self.name,
            self.temperature,
            self.pressure(),
            self.density
        )?;
        for (name, x) in self.species_names().iter().zip(self.mole_fractions().iter()) {
            if *x > 0.0 {
                write!(f, ", x({name}) = {x:.5}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_dual::Dual64;

    fn mechanism() -> Arc<Mechanism> {
        Arc::new(
            Mechanism::from_json(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../data/methane_pox_on_pt.json"
            ))
            .unwrap(),
        )
    }

    #[test]
    fn set_tpx() -> KineticsResult<()> {
        let mut gas = IdealGas::new(&mechanism(), "gas")?;
        gas.set_tpx(1173.15, 5e5, "CH4:1, O2:0.6, AR:0.1")?;
        let x = gas.mole_fractions();
        assert_relative_eq!(x[gas.species_index("CH4")?], 1.0 / 1.7, max_relative = 1e-12);
        assert_relative_eq!(x[gas.species_index("AR")?], 0.1 / 1.7, max_relative = 1e-12);
        assert_relative_eq!(x.sum(), 1.0, max_relative = 1e-12);
        assert_relative_eq!(gas.pressure(), 5e5, max_relative = 1e-12);
        assert_relative_eq!(
            gas.density(),
            5e5 * gas.mean_molar_mass() / (RGAS * 1173.15),
            max_relative = 1e-12
        );
        Ok(())
    }

    #[test]
    fn set_tdy_keeps_pressure_consistent() -> KineticsResult<()> {
        let mut gas = IdealGas::new(&mechanism(), "gas")?;
        gas.set_tpx(1000.0, 1e5, "H2:2, O2:1")?;
        let (t, rho, y) = gas.tdy();
        let mut other = IdealGas::new(gas.mechanism(), "gas")?;
        other.set_tdy(t, rho, &y)?;
        assert_relative_eq!(other.pressure(), 1e5, max_relative = 1e-12);
        assert_relative_eq!(other.enthalpy_mass(), gas.enthalpy_mass(), max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn unknown_species() {
        let mut gas = IdealGas::new(&mechanism(), "gas").unwrap();
        assert!(matches!(
            gas.set_tpx(1000.0, 1e5, "NH3:1"),
            Err(KineticsError::UnknownSpecies(s, p)) if s == "NH3" && p == "gas"
        ));
        // surface species are not part of the gas phase
        assert!(gas.species_index("O(S)").is_err());
        assert!(IdealGas::new(&mechanism(), "Pt_surf").is_err());
    }

    #[test]
    fn invalid_state() {
        let mut gas = IdealGas::new(&mechanism(), "gas").unwrap();
        assert!(gas.set_tpx(-1.0, 1e5, "CH4:1").is_err());
        assert!(gas.set_tdy(1000.0, 1.0, &Array1::zeros(7)).is_err());
        assert!(matches!(
            gas.set_tdy(1000.0, 1.0, &Array1::ones(3)),
            Err(KineticsError::IncompatibleComponents(7, 3))
        ));
    }

    #[test]
    fn heat_capacities() -> KineticsResult<()> {
        let mut gas = IdealGas::new(&mechanism(), "gas")?;
        gas.set_tpx(300.0, 1e5, "AR:1")?;
        // monatomic ideal gas
        assert_relative_eq!(
            gas.cv_mass() * gas.mean_molar_mass(),
            1.5 * RGAS,
            max_relative = 1e-10
        );
        gas.set_tpx(900.0, 1e5, "CH4:1, O2:0.6, AR:0.1")?;
        let t = Dual64::from(900.0).derivative();
        let y: Vec<_> = gas.mass_fractions().iter().map(|&y| Dual64::from(y)).collect();
        let u: Dual64 = gas
            .int_energies_dual(t)
            .into_iter()
            .zip(&y)
            .zip(gas.molar_masses())
            .map(|((u, &y), &w)| u * y / w)
            .sum();
        assert_relative_eq!(u.eps, gas.cv_mass(), max_relative = 1e-10);
        Ok(())
    }
}
