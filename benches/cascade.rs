use criterion::{criterion_group, criterion_main, Criterion};
use pfr_cascade::objective::{multi_objective_vector, objective_ch4};
use pfr_cascade::{CstrCascade, DesignParameters, ReactorConfig, SimulationOptions};
use pfr_kinetics::{Mechanism, ONE_ATM};
use std::sync::Arc;

fn cascade(mechanism: &Arc<Mechanism>, stages: usize, energy: bool) -> CstrCascade {
    let config = ReactorConfig::builder(mechanism)
        .inlet_temperature_celsius(800.0)
        .pressure(ONE_ATM)
        .length(0.003)
        .mass_flow_rate(1e-6)
        .stages(stages)
        .energy(energy)
        .build()
        .unwrap();
    CstrCascade::new(config)
}

fn simulate(c: &mut Criterion) {
    let mechanism = Arc::new(Mechanism::from_json("./data/methane_pox_on_pt.json").unwrap());
    let params = DesignParameters::new(1500.0, 2.0, 0.35);
    let options = SimulationOptions::default();

    let mut group = c.benchmark_group("cascade");
    for stages in [1, 10, 50] {
        let isothermal = cascade(&mechanism, stages, false);
        group.bench_function(format!("isothermal_{stages}"), |b| {
            b.iter(|| isothermal.simulate(params, &options).unwrap())
        });
        let adiabatic = cascade(&mechanism, stages, true);
        group.bench_function(format!("adiabatic_{stages}"), |b| {
            b.iter(|| adiabatic.simulate(params, &options).unwrap())
        });
    }
    group.finish();
}

fn objectives(c: &mut Criterion) {
    let mechanism = Arc::new(Mechanism::from_json("./data/methane_pox_on_pt.json").unwrap());
    let model = cascade(&mechanism, 20, false);
    let x = [1500.0, 2.0, 0.35];

    let mut group = c.benchmark_group("objectives");
    group.bench_function("ch4", |b| b.iter(|| objective_ch4(&model, &x)));
    group.bench_function("ch4_and_catalyst_volume", |b| {
        b.iter(|| multi_objective_vector(&model, &x))
    });
    group.finish();
}

criterion_group!(bench, simulate, objectives);
criterion_main!(bench);
