#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::many_single_char_names)]
//! Ideal gas and surface phases, mean-field surface kinetics and well-mixed
//! reactor networks.
//!
//! The crate provides the pieces needed to model a continuously stirred tank
//! reactor with an attached catalytic surface:
//!
//! + a [Mechanism] read from a json file ([parameter]),
//! + the [IdealGas] and [Interface] phases holding thermodynamic states,
//! + [Reservoir]s, an [IdealGasReactor] with a [ReactorSurface], flow devices
//!   and heat loss [Wall]s, tied together by a [ReactorNet] that can be advanced
//!   in time or relaxed to steady state.

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Result {
            println!($($arg)*);
        }
    }
}

mod errors;
mod kinetics;
mod mechanism;
pub mod parameter;
mod phase;
mod reactor;
mod solver;
pub mod thermo;

pub use errors::{KineticsError, KineticsResult};
pub use kinetics::{Kinetics, ProductionRates};
pub use mechanism::{Mechanism, PhaseDefinition, PhaseKind, RateLaw, Reaction, Species};
pub use phase::{parse_composition, IdealGas, Interface};
pub use reactor::{
    IdealGasReactor, MassFlowController, PressureController, ReactorNet, ReactorSurface,
    Reservoir, Wall,
};
pub use solver::{SolverOptions, Verbosity};

/// Universal gas constant in J/(mol K).
pub const RGAS: f64 = 8.314462618;

/// One standard atmosphere in Pa.
pub const ONE_ATM: f64 = 101325.0;
