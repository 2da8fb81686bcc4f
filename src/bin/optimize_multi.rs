//! Pareto front of the outlet mole fraction of CH4 and the catalyst volume
//! with NSGA-II.
//!
//! Usage: `optimize_multi [run.json]`
use pfr_cascade::export::{write_history_csv, write_pareto_csv};
use pfr_cascade::objective::{CatalystTradeoff, PenaltyOptions};
use pfr_cascade::optimize::{Bounds, Nsga2};
use pfr_cascade::{CascadeResult, CstrCascade, ReactorConfig, ReactorConfigRecord, Units};
use pfr_kinetics::{Verbosity, ONE_ATM};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(default)]
struct RunConfig {
    reactor: ReactorConfigRecord,
    bounds: Bounds,
    optimizer: Nsga2,
    ch4_scale: f64,
    vcat_scale: f64,
    /// Maximum catalyst volume in m³.
    v_cat_max: Option<f64>,
    penalty: PenaltyOptions,
    pareto: PathBuf,
    history: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reactor: ReactorConfigRecord {
                mechanism: concat!(env!("CARGO_MANIFEST_DIR"), "/data/methane_pox_on_pt.json").into(),
                gas: "gas".into(),
                surface: "Pt_surf".into(),
                inlet_temperature: 800.0,
                pressure: ONE_ATM,
                composition: "CH4:1, O2:0.6, AR:0.1".into(),
                length: 0.3 * Units::default().centimeter,
                mass_flow_rate: 1e-6,
                stages: 200,
                energy: false,
                tracked_species: vec!["CH4".into()],
                track_coverages: false,
                pressure_coefficient: 1e-5,
                units: Units::default(),
            },
            bounds: Bounds::reactor_design(),
            optimizer: Nsga2::default(),
            ch4_scale: 1.0,
            vcat_scale: 1e-9,
            v_cat_max: None,
            penalty: PenaltyOptions::default(),
            pareto: "pareto_nsga2.csv".into(),
            history: "optimization_history_multi.csv".into(),
        }
    }
}

fn read_run_config(path: Option<String>) -> CascadeResult<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let path = Path::new(&path);
    let mut run: RunConfig = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    if let Some(dir) = path.parent() {
        run.reactor = run.reactor.relative_to(dir);
    }
    Ok(run)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)))
}

fn main() -> CascadeResult<()> {
    let run = read_run_config(std::env::args().nth(1))?;
    let cascade = CstrCascade::new(ReactorConfig::from_record(run.reactor)?);
    let problem = CatalystTradeoff::new(cascade)
        .penalty(run.penalty)
        .scales(run.ch4_scale, run.vcat_scale)
        .v_cat_max(run.v_cat_max);
    let result = run
        .optimizer
        .verbosity(Verbosity::Result)
        .minimize(&problem, &run.bounds)?;

    let (ch4_min, ch4_max) = min_max(result.true_objectives.iter().map(|f| f[0]));
    let (vcat_min, vcat_max) = min_max(result.true_objectives.iter().map(|f| f[1]));
    println!("Diagnostics (true objectives):");
    println!("  failures: {} / {}", result.failures, result.len());
    println!("  CH4 min/max: {ch4_min} {ch4_max}");
    println!("  V_cat min/max: {vcat_min} {vcat_max}");

    write_pareto_csv(&result, &run.pareto)?;
    write_history_csv(&result.history, &run.history)?;
    println!("Pareto front written to {}", run.pareto.display());
    Ok(())
}
