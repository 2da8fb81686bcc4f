//! Export of optimization histories, Pareto fronts and stage profiles as
//! comma-separated values.
//!
//! ```no_run
//! # use pfr_cascade::*;
//! # use pfr_cascade::export::write_profile_csv;
//! # fn main() -> CascadeResult<()> {
//! let cascade = CstrCascade::new(ReactorConfig::from_json("data/stage_profile.json")?);
//! let options = SimulationOptions::new().profile(true);
//! let result = cascade.simulate(DesignParameters::new(200.0, 2.0, 0.4), &options)?;
//! if let Some(profile) = &result.profile {
//!     write_profile_csv(profile, "profile.csv")?;
//! }
//! # Ok(())
//! # }
//! ```
use crate::cascade::StageProfile;
use crate::errors::CascadeResult;
use crate::optimize::{OptimizationHistory, ParetoResult};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const PARAMETER_COLUMNS: [&str; 3] = ["cat_area_per_vol_1_per_cm", "diameter_cm", "porosity"];
const PARETO_PARAMETER_COLUMNS: [&str; 3] = ["A_over_V_1_per_cm", "diameter_cm", "porosity"];

fn create<P: AsRef<Path>>(path: P) -> CascadeResult<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Write one row per generation: iteration, objectives and design parameters.
pub fn write_history<W: Write>(history: &OptimizationHistory, writer: &mut W) -> CascadeResult<()> {
    let header = ["iteration"]
        .into_iter()
        .chain(history.names().iter().map(|s| s.as_str()))
        .chain(PARAMETER_COLUMNS)
        .join(",");
    writeln!(writer, "{header}")?;
    for entry in history.entries() {
        writeln!(
            writer,
            "{},{},{}",
            entry.iteration,
            entry.objectives.iter().join(","),
            entry.x.iter().join(",")
        )?;
    }
    Ok(())
}

pub fn write_history_csv<P: AsRef<Path>>(
    history: &OptimizationHistory,
    path: P,
) -> CascadeResult<()> {
    let mut writer = create(path)?;
    write_history(history, &mut writer)?;
    Ok(writer.flush()?)
}

/// Write the unscaled objectives and the design parameters of every member.
pub fn write_pareto<W: Write>(result: &ParetoResult, writer: &mut W) -> CascadeResult<()> {
    let header = result
        .names
        .iter()
        .map(|s| s.as_str())
        .chain(PARETO_PARAMETER_COLUMNS)
        .join(",");
    writeln!(writer, "{header}")?;
    for (f, x) in result.true_objectives.iter().zip(&result.x) {
        writeln!(writer, "{},{}", f.iter().join(","), x.iter().join(","))?;
    }
    Ok(())
}

pub fn write_pareto_csv<P: AsRef<Path>>(result: &ParetoResult, path: P) -> CascadeResult<()> {
    let mut writer = create(path)?;
    write_pareto(result, &mut writer)?;
    Ok(writer.flush()?)
}

/// Write stage, position, temperature, pressure, the tracked mole fractions
/// and, if recorded, the coverages of every stage.
pub fn write_profile<W: Write>(profile: &StageProfile, writer: &mut W) -> CascadeResult<()> {
    let coverages = profile
        .surface_species()
        .unwrap_or_default()
        .iter()
        .map(|s| format!("theta_{s}"));
    let header = ["stage", "z_m", "T_K", "P_Pa"]
        .into_iter()
        .map(String::from)
        .chain(profile.species().iter().cloned())
        .chain(coverages)
        .join(",");
    writeln!(writer, "{header}")?;
    for r in profile.records() {
        write!(
            writer,
            "{},{},{},{}",
            r.stage, r.position, r.temperature, r.pressure
        )?;
        for x in r.mole_fractions.iter().chain(r.coverages.iter().flatten()) {
            write!(writer, ",{x}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_profile_csv<P: AsRef<Path>>(profile: &StageProfile, path: P) -> CascadeResult<()> {
    let mut writer = create(path)?;
    write_profile(profile, &mut writer)?;
    Ok(writer.flush()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::StageRecord;

    #[test]
    fn history_csv() -> CascadeResult<()> {
        let mut history = OptimizationHistory::new(vec!["CH4".into()]);
        history.record(vec![0.25], [1500.0, 2.0, 0.35]);
        history.record(vec![0.125], [1600.0, 2.5, 0.3]);
        let mut buffer = Vec::new();
        write_history(&history, &mut buffer)?;
        let csv = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "iteration,CH4,cat_area_per_vol_1_per_cm,diameter_cm,porosity"
        );
        assert_eq!(lines[1], "1,0.25,1500,2,0.35");
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn profile_csv() -> CascadeResult<()> {
        let mut profile = StageProfile::new(vec!["CH4".into()], Some(vec!["PT(S)".into()]));
        profile.push(StageRecord {
            stage: 1,
            position: 0.5,
            temperature: 1000.0,
            pressure: 1e5,
            mole_fractions: vec![0.5],
            coverages: Some(vec![1.0]),
        });
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("profile.csv");
        write_profile_csv(&profile, &path)?;
        let csv = std::fs::read_to_string(path)?;
        assert_eq!(
            csv,
            "stage,z_m,T_K,P_Pa,CH4,theta_PT(S)\n1,0.5,1000,100000,0.5,1\n"
        );
        Ok(())
    }
}
