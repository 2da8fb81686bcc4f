use crate::parameter::ParameterError;
use num_dual::linalg::LinAlgError;
use thiserror::Error;

/// Error type for improperly defined states and convergence problems.
#[derive(Error, Debug)]
pub enum KineticsError {
    #[error("{0}")]
    Error(String),
    #[error("`{0}` did not converge within the maximum number of iterations.")]
    NotConverged(String),
    #[error("`{0}` encountered illegal values during the iteration.")]
    IterationFailed(String),
    #[error("Invalid state in {0}: {1} = {2}.")]
    InvalidState(String, String, f64),
    #[error("Phase `{0}` is not defined in the mechanism.")]
    UnknownPhase(String),
    #[error("Species `{0}` is not part of phase `{1}`.")]
    UnknownSpecies(String, String),
    #[error("Phase is initialized for {0} species while the input specifies {1} values.")]
    IncompatibleComponents(usize, usize),
    #[error(transparent)]
    ParameterError(#[from] ParameterError),
    #[error(transparent)]
    LinAlgError(#[from] LinAlgError),
}

/// Convenience type for `Result<T, KineticsError>`.
pub type KineticsResult<T> = Result<T, KineticsError>;
