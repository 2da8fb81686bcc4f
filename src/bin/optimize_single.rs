//! Minimize the outlet mole fraction of CH4 with differential evolution.
//!
//! Usage: `optimize_single [run.json]`
use pfr_cascade::export::write_history_csv;
use pfr_cascade::objective::{Ch4Objective, ConstrainedCh4Objective, PenaltyOptions};
use pfr_cascade::optimize::{Bounds, DifferentialEvolution};
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
    optimizer: DifferentialEvolution,
    /// Maximum catalyst volume in m³ of the constrained problem.
    v_cat_max: Option<f64>,
    penalty: PenaltyOptions,
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
                stages: 201,
                energy: false,
                tracked_species: vec!["CH4".into()],
                track_coverages: false,
                pressure_coefficient: 1e-5,
                units: Units::default(),
            },
            bounds: Bounds::reactor_design(),
            optimizer: DifferentialEvolution::default(),
            v_cat_max: None,
            penalty: PenaltyOptions::default(),
            history: "optimization_history_single.csv".into(),
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

fn main() -> CascadeResult<()> {
    let run = read_run_config(std::env::args().nth(1))?;
    let cascade = CstrCascade::new(ReactorConfig::from_record(run.reactor)?);
    let stages = cascade.config().stages();
    let optimizer = run.optimizer.verbosity(Verbosity::Result);

    let result = match run.v_cat_max {
        Some(v_cat_max) => {
            let objective = ConstrainedCh4Objective::new(cascade, v_cat_max).penalty(run.penalty);
            optimizer.minimize(&objective, &run.bounds)?
        }
        None => {
            let objective = Ch4Objective::new(cascade).penalty(run.penalty);
            optimizer.minimize(&objective, &run.bounds)?
        }
    };
    write_history_csv(&result.history, &run.history)?;

    println!("Optimum solution:");
    println!("CH4 = {:.6}", result.fun);
    println!("A/V = {:.1} 1/cm", result.x[0]);
    println!("d = {:.3} cm", result.x[1]);
    println!("Porosity = {:.4}", result.x[2]);
    println!("n_CSTR = {stages}");
    println!("History written to {}", run.history.display());
    Ok(())
}
