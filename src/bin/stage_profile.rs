//! Simulate a single design with the energy equation and write the axial
//! profile of the cascade.
//!
//! Usage: `stage_profile [run.json]`
use pfr_cascade::export::write_profile_csv;
use pfr_cascade::{
    CascadeResult, CstrCascade, DesignParameters, HeatLoss, ReactorConfig, ReactorConfigRecord,
    SimulationOptions, Units,
};
use pfr_kinetics::Verbosity;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(default)]
struct RunConfig {
    reactor: ReactorConfigRecord,
    design: DesignParameters,
    heat_loss: Option<HeatLoss>,
    profile: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reactor: ReactorConfigRecord {
                mechanism: concat!(env!("CARGO_MANIFEST_DIR"), "/data/methane_pox_on_pt.json").into(),
                gas: "gas".into(),
                surface: "Pt_surf".into(),
                inlet_temperature: 900.0,
                pressure: 5e5,
                composition: "CH4:1, O2:0.6, AR:0.1".into(),
                length: 0.2,
                mass_flow_rate: 0.01,
                stages: 50,
                energy: true,
                tracked_species: vec!["CH4".into(), "O2".into(), "H2".into(), "CO".into()],
                track_coverages: false,
                pressure_coefficient: 1e-5,
                units: Units::default(),
            },
            design: DesignParameters::new(200.0, 2.0, 0.4),
            heat_loss: Some(HeatLoss {
                ambient_temperature: 300.0,
                heat_transfer_coefficient: 100.0,
            }),
            profile: "stage_profile.csv".into(),
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
    let options = SimulationOptions {
        profile: true,
        heat_loss: run.heat_loss,
        verbosity: Verbosity::Result,
        ..Default::default()
    };
    let result = cascade.simulate(run.design, &options)?;

    println!("T_out = {:.2} K", result.t_out);
    println!("T_max = {:.2} K", result.t_max);
    println!("P_out = {:.1} Pa", result.p_out);
    println!("x(CH4) = {:.6}", result.ch4);
    if let Some(profile) = &result.profile {
        write_profile_csv(profile, &run.profile)?;
        println!("Profile of {} stage(s) written to {}", profile.len(), run.profile.display());
    }
    Ok(())
}
