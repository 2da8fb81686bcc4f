use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modified Arrhenius parameters `k = A T^b exp(-Ea / RT)`.
///
/// For sticking reactions `A` is the (dimensionless) sticking coefficient.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ArrheniusRecord {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(default)]
    pub b: f64,
    /// Activation energy in J/mol.
    #[serde(rename = "Ea", default)]
    pub ea: f64,
}

impl ArrheniusRecord {
    pub fn new(a: f64, b: f64, ea: f64) -> Self {
        Self { a, b, ea }
    }
}

/// Rate expression of a reaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RateRecord {
    Arrhenius(ArrheniusRecord),
    Sticking(ArrheniusRecord),
}

/// Coverage dependence of a surface rate constant:
/// `k' = k 10^(a θ) θ^m exp(-E θ / RT)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CoverageDependencyRecord {
    #[serde(default)]
    pub a: f64,
    #[serde(default)]
    pub m: f64,
    /// Energy in J/mol.
    #[serde(rename = "E", default)]
    pub e: f64,
}

/// An irreversible reaction as it is stored in a mechanism file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReactionRecord {
    pub reactants: IndexMap<String, f64>,
    pub products: IndexMap<String, f64>,
    pub rate: RateRecord,
    /// Reaction orders that differ from the stoichiometric coefficients.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub orders: IndexMap<String, f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub coverage_dependencies: IndexMap<String, CoverageDependencyRecord>,
}

impl ReactionRecord {
    pub fn new(reactants: &[(&str, f64)], products: &[(&str, f64)], rate: RateRecord) -> Self {
        let collect = |s: &[(&str, f64)]| s.iter().map(|&(n, c)| (n.to_string(), c)).collect();
        Self {
            reactants: collect(reactants),
            products: collect(products),
            rate,
            orders: IndexMap::new(),
            coverage_dependencies: IndexMap::new(),
        }
    }

    /// The reaction equation, e.g. `H2 + 2 PT(S) => 2 H(S)`.
    pub fn equation(&self) -> String {
        let side = |s: &IndexMap<String, f64>| {
            s.iter()
                .map(|(name, &nu)| {
                    if nu == 1.0 {
                        name.clone()
                    } else {
                        format!("{nu} {name}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        format!("{} => {}", side(&self.reactants), side(&self.products))
    }
}

impl fmt::Display for ReactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReactionRecord({}", self.equation())?;
        match self.rate {
            RateRecord::Arrhenius(r) => {
                write!(f, ", arrhenius(A={}, b={}, Ea={})", r.a, r.b, r.ea)?
            }
            RateRecord::Sticking(r) => write!(f, ", sticking(A={}, b={}, Ea={})", r.a, r.b, r.ea)?,
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_reaction() {
        let json = r#"{
            "reactants": {"CH4": 1, "PT(S)": 2},
            "products": {"CH3(S)": 1, "H(S)": 1},
            "rate": {"sticking": {"A": 0.01, "b": 0.0, "Ea": 0.0}},
            "orders": {"PT(S)": 2.3}
        }"#;
        let record: ReactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rate, RateRecord::Sticking(ArrheniusRecord::new(0.01, 0.0, 0.0)));
        assert_eq!(record.orders["PT(S)"], 2.3);
        assert!(record.coverage_dependencies.is_empty());
        assert_eq!(record.equation(), "CH4 + 2 PT(S) => CH3(S) + H(S)");
    }

    #[test]
    fn coverage_dependency_defaults() {
        let json = r#"{"E": -6000.0}"#;
        let record: CoverageDependencyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.a, 0.0);
        assert_eq!(record.m, 0.0);
        assert_eq!(record.e, -6000.0);
    }
}
