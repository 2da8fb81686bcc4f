use crate::errors::{CascadeError, CascadeResult};
use ndarray::Array1;

/// State at the outlet of a single stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageRecord {
    /// Index of the stage, starting at 1.
    pub stage: usize,
    /// Axial position of the stage outlet in m.
    pub position: f64,
    /// Temperature in K.
    pub temperature: f64,
    /// Pressure in Pa.
    pub pressure: f64,
    /// Mole fractions of the tracked species.
    pub mole_fractions: Vec<f64>,
    /// Coverages of all surface species, if tracked.
    pub coverages: Option<Vec<f64>>,
}

/// Axial profile of a cascade, one record per stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageProfile {
    species: Vec<String>,
    surface_species: Option<Vec<String>>,
    records: Vec<StageRecord>,
}

impl StageProfile {
    pub(crate) fn new(species: Vec<String>, surface_species: Option<Vec<String>>) -> Self {
        Self {
            species,
            surface_species,
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: StageRecord) {
        self.records.push(record);
    }

    /// Names of the tracked gas species.
    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Names of the surface species if coverages are tracked.
    pub fn surface_species(&self) -> Option<&[String]> {
        self.surface_species.as_deref()
    }

    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stages(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.stage).collect()
    }

    /// Axial positions in m.
    pub fn position(&self) -> Array1<f64> {
        self.records.iter().map(|r| r.position).collect()
    }

    /// Temperatures in K.
    pub fn temperature(&self) -> Array1<f64> {
        self.records.iter().map(|r| r.temperature).collect()
    }

    /// Pressures in Pa.
    pub fn pressure(&self) -> Array1<f64> {
        self.records.iter().map(|r| r.pressure).collect()
    }

    /// Highest stage temperature in K.
    pub fn max_temperature(&self) -> Option<f64> {
        self.records.iter().map(|r| r.temperature).reduce(f64::max)
    }

    /// Mole fractions of a tracked species.
    pub fn mole_fraction(&self, species: &str) -> CascadeResult<Array1<f64>> {
        let i = self
            .species
            .iter()
            .position(|s| s == species)
            .ok_or_else(|| {
                CascadeError::InvalidConfig(format!("species `{species}` is not tracked"))
            })?;
        Ok(self.records.iter().map(|r| r.mole_fractions[i]).collect())
    }

    /// Coverages of a surface species.
    pub fn coverage(&self, species: &str) -> CascadeResult<Array1<f64>> {
        let i = self
            .surface_species
            .as_ref()
            .and_then(|names| names.iter().position(|s| s == species))
            .ok_or_else(|| {
                CascadeError::InvalidConfig(format!("coverage of `{species}` is not tracked"))
            })?;
        Ok(self
            .records
            .iter()
            .map(|r| r.coverages.as_ref().map_or(f64::NAN, |c| c[i]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn record(stage: usize, temperature: f64, ch4: f64) -> StageRecord {
        StageRecord {
            stage,
            position: 0.1 * stage as f64,
            temperature,
            pressure: 1e5,
            mole_fractions: vec![ch4, 0.1],
            coverages: Some(vec![0.9, 0.1]),
        }
    }

    #[test]
    fn profile_columns() -> CascadeResult<()> {
        let mut profile = StageProfile::new(
            vec!["CH4".into(), "O2".into()],
            Some(vec!["PT(S)".into(), "O(S)".into()]),
        );
        assert!(profile.is_empty());
        assert_eq!(profile.max_temperature(), None);
        profile.push(record(1, 1200.0, 0.3));
        profile.push(record(2, 1500.0, 0.2));
        profile.push(record(3, 1400.0, 0.1));
        assert_eq!(profile.stages(), vec![1, 2, 3]);
        assert_eq!(profile.temperature(), arr1(&[1200.0, 1500.0, 1400.0]));
        assert_eq!(profile.max_temperature(), Some(1500.0));
        assert_eq!(profile.mole_fraction("CH4")?, arr1(&[0.3, 0.2, 0.1]));
        assert_eq!(profile.coverage("O(S)")?, arr1(&[0.1, 0.1, 0.1]));
        assert!(profile.mole_fraction("H2").is_err());
        assert!(profile.coverage("H(S)").is_err());
        Ok(())
    }
}
