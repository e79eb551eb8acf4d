//! Error types for the column driver.

use bx_box::BoxError;
use bx_core::error::BxError;
use bx_material::MaterialError;
use thiserror::Error;

/// Errors encountered while stepping or setting up a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Time step {dt} s fell below the minimum")]
    TimeStepTooSmall { dt: f64 },

    #[error("Scenario error: {message}")]
    Scenario { message: String },

    #[error("Box assembly error: {0}")]
    Box(#[from] BoxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// True if retrying the time step with a smaller size may succeed.
    ///
    /// Corrupted phase state and ambiguous switches are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SimError::ConvergenceFailed { .. } => true,
            SimError::Box(BoxError::Material(_)) => true,
            SimError::Box(BoxError::Core(BxError::NonFinite { .. })) => true,
            _ => false,
        }
    }
}

impl From<MaterialError> for SimError {
    fn from(e: MaterialError) -> Self {
        SimError::Box(BoxError::Material(e))
    }
}

impl From<serde_yaml::Error> for SimError {
    fn from(e: serde_yaml::Error) -> Self {
        SimError::Scenario {
            message: e.to_string(),
        }
    }
}

impl From<SimError> for BxError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::InvalidArg { what } => BxError::InvalidArg { what },
            SimError::ConvergenceFailed { .. } => BxError::Invariant {
                what: "convergence",
            },
            SimError::TimeStepTooSmall { dt } => BxError::NonFinite {
                what: "time step",
                value: dt,
            },
            SimError::Scenario { .. } => BxError::InvalidArg { what: "scenario" },
            SimError::Box(b) => b.into(),
            SimError::Io(_) => BxError::InvalidArg { what: "io" },
        }
    }
}
