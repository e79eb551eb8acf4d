//! Error shared by every boxflow crate.
//!
//! Lower crates convert their own errors into [`BxError`] when a caller
//! only needs a coarse classification.

use thiserror::Error;

pub type BxResult<T> = Result<T, BxError>;

#[derive(Error, Debug)]
pub enum BxError {
    /// A primary variable or law output became NaN or infinite.
    #[error("{what} is not finite ({value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A local node, vertex or face index past the end of its table.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Broken phase-state or deflection bookkeeping.
    #[error("broken invariant: {what}")]
    Invariant { what: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_quantity() {
        let err = BxError::IndexOob {
            what: "vertex",
            index: 3,
            len: 3,
        };
        assert_eq!(err.to_string(), "vertex index 3 out of range (len 3)");
        let err = BxError::NonFinite {
            what: "wetting pressure",
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "wetting pressure is not finite (NaN)");
    }
}
