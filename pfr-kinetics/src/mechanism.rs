use crate::errors::{KineticsError, KineticsResult};
use crate::parameter::{
    CoverageDependencyRecord, MechanismRecord, ParameterError, RateRecord, ReactionRecord,
};
pub use crate::parameter::PhaseKind;
use crate::thermo::Nasa7;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A species of the mechanism with its derived properties.
#[derive(Clone, Debug)]
pub struct Species {
    pub name: String,
    /// Number of atoms per element.
    pub composition: IndexMap<String, f64>,
    /// Molar mass in kg/mol.
    pub molar_mass: f64,
    /// Number of surface sites occupied.
    pub sites: f64,
    pub thermo: Option<Nasa7>,
    /// Index of the phase the species belongs to.
    pub phase: usize,
}

impl Species {
    /// Number of atoms of `element` in the species.
    pub fn atoms(&self, element: &str) -> Option<f64> {
        self.composition.get(element).copied()
    }
}

/// A phase of the mechanism.
#[derive(Clone, Debug)]
pub struct PhaseDefinition {
    pub name: String,
    pub kind: PhaseKind,
    /// Indices of the species of the phase in the mechanism.
    pub species: Vec<usize>,
    /// Site density in mol/m².
    pub site_density: Option<f64>,
    pub adjacent: Vec<String>,
}

/// Rate law of an irreversible reaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateLaw {
    /// `k = A T^b exp(-Ea / RT)`.
    Arrhenius { a: f64, b: f64, ea: f64 },
    /// Sticking coefficient `γ = A T^b exp(-Ea / RT)` of the gas species
    /// `species`, converted to a rate constant with the kinetic collision
    /// frequency. `surface_order` is the sum of the orders of all surface
    /// reactants.
    Sticking {
        a: f64,
        b: f64,
        ea: f64,
        species: usize,
        surface_order: f64,
    },
}

/// Compiled irreversible reaction. Species are referenced by their index
/// in the mechanism.
#[derive(Clone, Debug)]
pub struct Reaction {
    pub equation: String,
    pub reactants: Vec<(usize, f64)>,
    pub products: Vec<(usize, f64)>,
    /// Reaction order of every reactant.
    pub orders: Vec<(usize, f64)>,
    pub rate: RateLaw,
    pub coverage_dependencies: Vec<(usize, CoverageDependencyRecord)>,
    /// Index of the phase the reaction takes place in (the interface for
    /// surface reactions).
    pub phase: usize,
}

impl Reaction {
    /// Indices of all species taking part in the reaction.
    pub fn species(&self) -> impl Iterator<Item = usize> + '_ {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .map(|&(i, _)| i)
    }
}

/// An immutable reaction mechanism consisting of phases, species and
/// reactions.
///
/// Mechanisms are typically shared between many phase objects using an
/// [Arc](std::sync::Arc).
#[derive(Clone, Debug)]
pub struct Mechanism {
    name: String,
    species: Vec<Species>,
    phases: Vec<PhaseDefinition>,
    reactions: Vec<Reaction>,
    species_index: IndexMap<String, usize>,
}

impl Mechanism {
    /// Read a mechanism from a json file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> KineticsResult<Self> {
        Ok(Self::from_record(MechanismRecord::from_json(file)?)?)
    }

    /// Compile and validate a mechanism record.
    pub fn from_record(record: MechanismRecord) -> Result<Self, ParameterError> {
        let mut species_index = IndexMap::with_capacity(record.species.len());
        for (i, s) in record.species.iter().enumerate() {
            if species_index.insert(s.name.clone(), i).is_some() {
                return Err(ParameterError::DuplicateSpecies(s.name.clone()));
            }
        }

        // assign species to phases
        let mut phase_of = vec![None; record.species.len()];
        let mut phases = Vec::with_capacity(record.phases.len());
        let mut phase_names = HashSet::new();
        for (p, phase) in record.phases.iter().enumerate() {
            if !phase_names.insert(phase.name.as_str()) {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "The phase '{}' was defined more than once.",
                    phase.name
                )));
            }
            if phase.species.is_empty() {
                return Err(ParameterError::InsufficientInformation(format!(
                    "The phase '{}' does not contain any species.",
                    phase.name
                )));
            }
            let missing: Vec<_> = phase
                .species
                .iter()
                .filter(|s| !species_index.contains_key(*s))
                .map(|s| s.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(ParameterError::SpeciesNotFound(missing.join(", ")));
            }
            let indices: Vec<usize> = phase.species.iter().map(|s| species_index[s]).collect();
            for &i in &indices {
                if phase_of[i].replace(p).is_some() {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "The species '{}' is part of more than one phase.",
                        record.species[i].name
                    )));
                }
            }
            let site_density = match (phase.kind, phase.site_density) {
                (PhaseKind::Interface, Some(g)) if g > 0.0 => Some(g),
                (PhaseKind::Interface, _) => {
                    return Err(ParameterError::InsufficientInformation(format!(
                        "The interface '{}' requires a positive site density.",
                        phase.name
                    )))
                }
                (PhaseKind::IdealGas, _) => None,
            };
            phases.push(PhaseDefinition {
                name: phase.name.clone(),
                kind: phase.kind,
                species: indices,
                site_density,
                adjacent: phase.adjacent.clone(),
            });
        }
        for phase in &phases {
            if let Some(a) = phase.adjacent.iter().find(|a| !phase_names.contains(a.as_str())) {
                return Err(ParameterError::PhaseNotFound(a.clone()));
            }
        }

        let species = record
            .species
            .iter()
            .zip(&phase_of)
            .map(|(s, p)| {
                let phase = p.ok_or_else(|| {
                    ParameterError::InsufficientInformation(format!(
                        "The species '{}' is not part of any phase.",
                        s.name
                    ))
                })?;
                let thermo = s
                    .thermo
                    .as_ref()
                    .map(|t| Nasa7::from_record(t, &s.name))
                    .transpose()?;
                if phases[phase].kind == PhaseKind::IdealGas && thermo.is_none() {
                    return Err(ParameterError::InsufficientInformation(format!(
                        "The gas species '{}' requires thermodynamic data.",
                        s.name
                    )));
                }
                Ok(Species {
                    name: s.name.clone(),
                    composition: s.composition.clone(),
                    molar_mass: s.molar_mass()?,
                    sites: s.sites,
                    thermo,
                    phase,
                })
            })
            .collect::<Result<Vec<_>, ParameterError>>()?;

        let reactions = record
            .reactions
            .iter()
            .map(|r| compile_reaction(r, &species_index, &species, &phases))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: record.name,
            species,
            phases,
            reactions,
            species_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    /// Index of a species in the mechanism.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species_index.get(name).copied()
    }

    /// Index and definition of the phase with the given name.
    pub fn phase(&self, name: &str) -> KineticsResult<(usize, &PhaseDefinition)> {
        self.phases
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
            .ok_or_else(|| KineticsError::UnknownPhase(name.into()))
    }
}

impl FromStr for Mechanism {
    type Err = KineticsError;

    fn from_str(json: &str) -> KineticsResult<Self> {
        Ok(Self::from_record(MechanismRecord::from_json_str(json)?)?)
    }
}

fn compile_reaction(
    record: &ReactionRecord,
    species_index: &IndexMap<String, usize>,
    species: &[Species],
    phases: &[PhaseDefinition],
) -> Result<Reaction, ParameterError> {
    let lookup = |map: &IndexMap<String, f64>| {
        map.iter()
            .map(|(name, &nu)| {
                species_index
                    .get(name)
                    .map(|&i| (i, nu))
                    .ok_or_else(|| ParameterError::SpeciesNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()
    };
    let equation = record.equation();
    let reactants = lookup(&record.reactants)?;
    let products = lookup(&record.products)?;
    if reactants.is_empty() {
        return Err(ParameterError::IncompatibleParameters(format!(
            "The reaction '{equation}' has no reactants."
        )));
    }
    for name in record.orders.keys() {
        if !record.reactants.contains_key(name) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "The order of '{name}' in reaction '{equation}' refers to a species that is not a reactant."
            )));
        }
    }
    let orders: Vec<_> = record
        .reactants
        .iter()
        .zip(&reactants)
        .map(|((name, &nu), &(i, _))| (i, record.orders.get(name).copied().unwrap_or(nu)))
        .collect();

    let is_surface = |i: usize| phases[species[i].phase].kind == PhaseKind::Interface;
    let involved: Vec<usize> = reactants.iter().chain(&products).map(|&(i, _)| i).collect();
    let phase = match involved.iter().find(|&&i| is_surface(i)) {
        Some(&i) => species[i].phase,
        None => species[involved[0]].phase,
    };
    if let Some(&i) = involved
        .iter()
        .find(|&&i| species[i].phase != phase && is_surface(i))
    {
        return Err(ParameterError::IncompatibleParameters(format!(
            "The reaction '{equation}' connects the interfaces '{}' and '{}'.",
            phases[phase].name, phases[species[i].phase].name
        )));
    }
    if phases[phase].kind == PhaseKind::IdealGas
        && involved.iter().any(|&i| species[i].phase != phase)
    {
        return Err(ParameterError::IncompatibleParameters(format!(
            "The gas phase reaction '{equation}' involves species of another phase."
        )));
    }

    let coverage_dependencies = record
        .coverage_dependencies
        .iter()
        .map(|(name, dep)| match species_index.get(name) {
            Some(&i) if species[i].phase == phase && is_surface(i) => Ok((i, *dep)),
            _ => Err(ParameterError::IncompatibleParameters(format!(
                "The coverage dependency of reaction '{equation}' on '{name}' does not refer to a species of the interface."
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rate = match record.rate {
        RateRecord::Arrhenius(r) => RateLaw::Arrhenius {
            a: r.a,
            b: r.b,
            ea: r.ea,
        },
        RateRecord::Sticking(r) => {
            let gas: Vec<_> = reactants.iter().filter(|&&(i, _)| !is_surface(i)).collect();
            if gas.len() != 1 || phases[phase].kind != PhaseKind::Interface {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "The sticking reaction '{equation}' requires exactly one gas phase reactant."
                )));
            }
            let surface_order = orders
                .iter()
                .filter(|&&(i, _)| is_surface(i))
                .map(|&(_, o)| o)
                .sum();
            RateLaw::Sticking {
                a: r.a,
                b: r.b,
                ea: r.ea,
                species: gas[0].0,
                surface_order,
            }
        }
    };

    Ok(Reaction {
        equation,
        reactants,
        products,
        orders,
        rate,
        coverage_dependencies,
        phase,
    })
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mechanism '{}'", self.name)?;
        for phase in &self.phases {
            let names: Vec<_> = phase
                .species
                .iter()
                .map(|&i| self.species[i].name.as_str())
                .collect();
            writeln!(f, "  {} ({:?}): {}", phase.name, phase.kind, names.join(", "))?;
        }
        write!(f, "  {} reactions", self.reactions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H2_ON_PT: &str = r#"{
        "name": "h2_on_pt",
        "phases": [
            {"name": "gas", "kind": "ideal-gas", "species": ["H2", "AR"]},
            {"name": "surf", "kind": "interface", "species": ["PT(S)", "H(S)"], "site_density": 2.7e-5, "adjacent": ["gas"]}
        ],
        "species": [
            {"name": "H2", "composition": {"H": 2},
             "thermo": {"temperature_ranges": [200.0, 1000.0, 3500.0],
                        "data": [[2.34433112, 7.98052075e-3, -1.9478151e-5, 2.01572094e-8, -7.37611761e-12, -917.935173, 0.683010238],
                                 [3.3372792, -4.94024731e-5, 4.99456778e-7, -1.79566394e-10, 2.00255376e-14, -950.158922, -3.20502331]]}},
            {"name": "AR", "composition": {"Ar": 1},
             "thermo": {"temperature_ranges": [200.0, 6000.0], "data": [[2.5, 0, 0, 0, 0, -745.375, 4.366]]}},
            {"name": "PT(S)", "composition": {"Pt": 1}},
            {"name": "H(S)", "composition": {"H": 1, "Pt": 1}}
        ],
        "reactions": [
            {"reactants": {"H2": 1, "PT(S)": 2}, "products": {"H(S)": 2},
             "rate": {"sticking": {"A": 0.046, "b": 0.0, "Ea": 0.0}}, "orders": {"PT(S)": 1.0}},
            {"reactants": {"H(S)": 2}, "products": {"H2": 1, "PT(S)": 2},
             "rate": {"arrhenius": {"A": 3.7e17, "b": 0.0, "Ea": 67400.0}},
             "coverage_dependencies": {"H(S)": {"E": -6000.0}}}
        ]
    }"#;

    #[test]
    fn compile_mechanism() {
        let mechanism: Mechanism = H2_ON_PT.parse().unwrap();
        assert_eq!(mechanism.species().len(), 4);
        assert_eq!(mechanism.reactions().len(), 2);
        let (p, surf) = mechanism.phase("surf").unwrap();
        assert_eq!(p, 1);
        assert_eq!(surf.site_density, Some(2.7e-5));
        assert_eq!(
            mechanism.reactions()[0].rate,
            RateLaw::Sticking {
                a: 0.046,
                b: 0.0,
                ea: 0.0,
                species: 0,
                surface_order: 1.0
            }
        );
        assert_eq!(mechanism.reactions()[0].phase, 1);
        assert_eq!(mechanism.reactions()[1].orders, vec![(3, 2.0)]);
        assert_eq!(mechanism.reactions()[1].coverage_dependencies[0].0, 3);
    }

    #[test]
    fn unknown_phase() {
        let mechanism: Mechanism = H2_ON_PT.parse().unwrap();
        assert!(matches!(
            mechanism.phase("bulk"),
            Err(KineticsError::UnknownPhase(p)) if p == "bulk"
        ));
    }

    #[test]
    fn unknown_species_in_reaction() {
        let json = H2_ON_PT.replace(r#""products": {"H(S)": 2}"#, r#""products": {"X(S)": 2}"#);
        assert!(matches!(
            json.parse::<Mechanism>(),
            Err(KineticsError::ParameterError(ParameterError::SpeciesNotFound(s))) if s == "X(S)"
        ));
    }

    #[test]
    fn duplicate_species() {
        let json = H2_ON_PT.replace(r#"{"name": "H(S)""#, r#"{"name": "PT(S)""#);
        assert!(matches!(
            json.parse::<Mechanism>(),
            Err(KineticsError::ParameterError(ParameterError::DuplicateSpecies(s))) if s == "PT(S)"
        ));
    }

    #[test]
    fn sticking_without_gas_reactant() {
        let json = H2_ON_PT.replace(
            r#""rate": {"arrhenius": {"A": 3.7e17, "b": 0.0, "Ea": 67400.0}}"#,
            r#""rate": {"sticking": {"A": 0.1}}"#,
        );
        assert!(matches!(
            json.parse::<Mechanism>(),
            Err(KineticsError::ParameterError(ParameterError::IncompatibleParameters(_)))
        ));
    }

    #[test]
    fn interface_without_site_density() {
        let json = H2_ON_PT.replace(r#", "site_density": 2.7e-5"#, "");
        assert!(matches!(
            json.parse::<Mechanism>(),
            Err(KineticsError::ParameterError(ParameterError::InsufficientInformation(_)))
        ));
    }
}
