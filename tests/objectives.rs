use approx::assert_relative_eq;
use pfr_cascade::objective::*;
use pfr_cascade::*;
use pfr_kinetics::{Mechanism, ONE_ATM};
use std::sync::Arc;

const MECHANISM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/methane_pox_on_pt.json");
const DESIGN: [f64; 3] = [1500.0, 2.0, 0.35];

fn cascade() -> CascadeResult<CstrCascade> {
    let mechanism = Arc::new(Mechanism::from_json(MECHANISM)?);
    let config = ReactorConfig::builder(&mechanism)
        .inlet_temperature_celsius(800.0)
        .pressure(ONE_ATM)
        .length(0.003)
        .mass_flow_rate(1e-6)
        .stages(3)
        .build()?;
    Ok(CstrCascade::new(config))
}

#[test]
fn ch4_objective() -> CascadeResult<()> {
    let cascade = cascade()?;
    let ch4 = cascade.simulate(DESIGN.into(), &SimulationOptions::default())?.ch4;
    assert_relative_eq!(objective_ch4(&cascade, &DESIGN)?, ch4);
    assert_relative_eq!(Ch4Objective::new(cascade).evaluate(&DESIGN)?, ch4);
    Ok(())
}

#[test]
fn failures_are_finite() -> CascadeResult<()> {
    let cascade = cascade()?;
    let invalid = [1500.0, 2.0, 1.5];
    assert_eq!(objective_ch4(&cascade, &invalid)?, 1e3);
    assert_eq!(
        objective_ch4_with_volume_constraint(&cascade, &invalid, 1.0, &PenaltyOptions::default())?,
        100.0
    );

    let [ch4, v_cat] = multi_objective_vector(&cascade, &invalid)?;
    assert_eq!(ch4, 1e3);
    assert_relative_eq!(v_cat, 1e3 + 1e-6 * 1503.5, max_relative = 1e-14);

    let tradeoff = CatalystTradeoff::new(cascade);
    let evaluation = MultiObjective::evaluate(&tradeoff, &invalid)?;
    assert!(evaluation.objectives.iter().all(|f| f.is_finite()));
    let unscaled = tradeoff.unscaled(&invalid)?;
    assert!(unscaled[0].is_nan());
    Ok(())
}

#[test]
fn zero_porosity_is_a_failure() -> CascadeResult<()> {
    // no gas volume
    let x = [1500.0, 2.0, 0.0];
    let model = cascade()?;
    assert_eq!(objective_ch4(&model, &x)?, 1e3);
    assert_eq!(multi_objective_vector(&model, &x)?[0], 1e3);
    Ok(())
}

#[test]
fn volume_constraint() -> CascadeResult<()> {
    let cascade = cascade()?;
    let penalty = PenaltyOptions::default();
    let v_cat = cascade.catalyst_volume(DESIGN.into());
    let ch4 = objective_ch4(&cascade, &DESIGN)?;

    let relaxed = objective_ch4_with_volume_constraint(&cascade, &DESIGN, 2.0 * v_cat, &penalty)?;
    assert_relative_eq!(relaxed, ch4);

    let v_cat_max = 0.5 * v_cat;
    let violated = objective_ch4_with_volume_constraint(&cascade, &DESIGN, v_cat_max, &penalty)?;
    assert_relative_eq!(violated, ch4 + 50.0, max_relative = 1e-9);

    let objective = ConstrainedCh4Objective::new(cascade, v_cat_max);
    assert_relative_eq!(objective.evaluate(&DESIGN)?, violated);
    Ok(())
}

#[test]
fn catalyst_tradeoff() -> CascadeResult<()> {
    let cascade = cascade()?;
    let [ch4, v_cat] = multi_objective_vector(&cascade, &DESIGN)?;
    assert_relative_eq!(v_cat, cascade.catalyst_volume(DESIGN.into()));

    let tradeoff = CatalystTradeoff::new(cascade).v_cat_max(Some(0.5 * v_cat));
    let evaluation = MultiObjective::evaluate(&tradeoff, &DESIGN)?;
    assert_relative_eq!(evaluation.objectives[0], ch4, max_relative = 1e-12);
    assert_relative_eq!(evaluation.objectives[1], v_cat / 1e-9, max_relative = 1e-12);
    assert!(!evaluation.is_feasible());
    assert_relative_eq!(evaluation.violation(), 0.5 * v_cat, max_relative = 1e-12);

    let physical = tradeoff.unscale(&evaluation.objectives);
    assert_relative_eq!(physical[0], ch4, max_relative = 1e-12);
    assert_relative_eq!(physical[1], v_cat, max_relative = 1e-12);

    assert_eq!(tradeoff.names(), vec!["CH4_out", "V_cat_m3"]);
    let unscaled = tradeoff.unscaled(&DESIGN)?;
    assert_relative_eq!(unscaled[0], ch4);
    assert_relative_eq!(unscaled[1], v_cat);
    Ok(())
}
