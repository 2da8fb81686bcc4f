//! Phases that hold the thermodynamic state of a part of a mechanism.
use crate::errors::{KineticsError, KineticsResult};
use indexmap::IndexMap;

mod ideal_gas;
mod interface;
pub use ideal_gas::IdealGas;
pub use interface::Interface;

/// Parse a composition string of the form `"CH4:1, O2:0.6, AR:0.1"`.
///
/// The values are returned in the order of appearance and are not
/// normalized. Species may appear at most once and all values must be
/// non-negative.
pub fn parse_composition(composition: &str) -> KineticsResult<IndexMap<String, f64>> {
    let mut parsed = IndexMap::new();
    for item in composition.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = item
            .rsplit_once(':')
            .ok_or_else(|| {
                KineticsError::Error(format!("Cannot parse composition entry '{item}'."))
            })?;
        let name = name.trim();
        let value: f64 = value.trim().parse().map_err(|_| {
            KineticsError::Error(format!("Cannot parse the amount of '{name}' in '{item}'."))
        })?;
        if name.is_empty() || !value.is_finite() || value < 0.0 {
            return Err(KineticsError::Error(format!(
                "Invalid composition entry '{item}'."
            )));
        }
        if parsed.insert(name.to_string(), value).is_some() {
            return Err(KineticsError::Error(format!(
                "The species '{name}' appears more than once in '{composition}'."
            )));
        }
    }
    if parsed.is_empty() {
        return Err(KineticsError::Error("Empty composition.".into()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let x = parse_composition("CH4:1, O2:0.6, AR:0.1").unwrap();
        assert_eq!(x.keys().collect::<Vec<_>>(), vec!["CH4", "O2", "AR"]);
        assert_eq!(x["O2"], 0.6);
        // whitespace and trailing separators are ignored
        let x = parse_composition("PT(S): 0.5 ,O(S):0.5,").unwrap();
        assert_eq!(x["PT(S)"], 0.5);
    }

    #[test]
    fn parse_errors() {
        assert!(parse_composition("CH4=1").is_err());
        assert!(parse_composition("CH4:one").is_err());
        assert!(parse_composition("CH4:-1").is_err());
        assert!(parse_composition("CH4:1, CH4:2").is_err());
        assert!(parse_composition(" , ").is_err());
    }
}
