//! Error types for box assembly and phase switching.

use crate::indices::PhaseState;
use bx_core::VertexId;
use bx_core::error::BxError;
use bx_material::MaterialError;
use thiserror::Error;

/// Errors raised by the local assembler, the deflection engine and the
/// switch controller.
#[derive(Error, Debug)]
pub enum BoxError {
    #[error("Phase state {tag} is invalid")]
    InvalidPhaseState { tag: i32 },

    #[error("More than one phase switch triggered at vertex {vertex} (state {state:?})")]
    AmbiguousSwitch { vertex: VertexId, state: PhaseState },

    #[error("Deflection error at local node {node}: {what}")]
    Deflection { what: &'static str, node: usize },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("No cell selected; call set_params first")]
    NoCell,

    #[error("Material law error: {0}")]
    Material(#[from] MaterialError),

    #[error("Core error: {0}")]
    Core(#[from] BxError),
}

pub type BoxResult<T> = Result<T, BoxError>;

pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> BoxResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(BoxError::IndexOob { what, index, len })
    }
}

impl From<BoxError> for BxError {
    fn from(e: BoxError) -> Self {
        match e {
            BoxError::InvalidPhaseState { .. } => BxError::Invariant {
                what: "phase state",
            },
            BoxError::AmbiguousSwitch { .. } => BxError::Invariant {
                what: "phase switch",
            },
            BoxError::Deflection { what, .. } => BxError::Invariant { what },
            BoxError::IndexOob { what, index, len } => BxError::IndexOob { what, index, len },
            BoxError::InvalidArg { what } => BxError::InvalidArg { what },
            BoxError::NoCell => BxError::InvalidArg { what: "cell" },
            BoxError::Material(m) => m.into(),
            BoxError::Core(c) => c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BoxError::InvalidPhaseState { tag: 7 };
        assert_eq!(err.to_string(), "Phase state 7 is invalid");

        let err = BoxError::AmbiguousSwitch {
            vertex: VertexId::from_index(3),
            state: PhaseState::BothPhases,
        };
        assert!(err.to_string().contains("vertex 3"));
    }

    #[test]
    fn error_to_bx_error() {
        let err = BoxError::InvalidPhaseState { tag: -1 };
        let bx: BxError = err.into();
        assert!(matches!(bx, BxError::Invariant { .. }));

        let err: BoxError = MaterialError::InvalidParam { what: "lambda" }.into();
        assert!(matches!(BxError::from(err), BxError::InvalidArg { .. }));
    }
}
