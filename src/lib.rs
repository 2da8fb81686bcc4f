#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Catalytic plug-flow reactors approximated by cascades of continuously
//! stirred tank reactors, and the optimization of their geometry.
//!
//! A [CstrCascade] marches the gas through `N` identical stages. Every stage
//! is relaxed to steady state with a single [pfr_kinetics::ReactorNet] whose
//! inlet is replaced by the outlet of the previous stage. On top of the
//! simulation, the [objective] module maps design parameters to scalar or
//! vector objectives and the [optimize] module provides differential
//! evolution and NSGA-II drivers.
//!
//! # Example
//! ```no_run
//! # use pfr_cascade::*;
//! # fn main() -> CascadeResult<()> {
//! let config = ReactorConfig::from_json("data/reactor.json")?;
//! let cascade = CstrCascade::new(config);
//! let result = cascade.simulate(
//!     DesignParameters::new(1500.0, 2.0, 0.35),
//!     &SimulationOptions::default(),
//! )?;
//! println!("CH4 at the outlet: {:.5}", result.ch4);
//! # Ok(())
//! # }
//! ```

mod cascade;
mod config;
mod errors;
pub mod export;
mod geometry;
pub mod objective;
pub mod optimize;

pub use cascade::{
    CascadeSession, CstrCascade, HeatLoss, SimulationOptions, SimulationResult, StageProfile,
    StageRecord,
};
pub use config::{ReactorConfig, ReactorConfigBuilder, ReactorConfigRecord, Units};
pub use errors::{CascadeError, CascadeResult};
pub use geometry::{DesignParameters, StageGeometry};

/// Conversion from degree Celsius to Kelvin.
pub const CELSIUS: f64 = 273.15;
