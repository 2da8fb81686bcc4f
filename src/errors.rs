use pfr_kinetics::KineticsError;
use thiserror::Error;

/// Error type of the cascade model and the optimization drivers.
#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("Invalid reactor configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid design parameters: {0}")]
    InvalidDesign(String),
    #[error("Simulation failed in stage {stage}: {source}")]
    SimulationFailed {
        stage: usize,
        #[source]
        source: KineticsError,
    },
    #[error(transparent)]
    Kinetics(#[from] KineticsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience type for `Result<T, CascadeError>`.
pub type CascadeResult<T> = Result<T, CascadeError>;
