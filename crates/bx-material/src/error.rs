//! Constitutive-law errors.

use bx_core::BxError;
use thiserror::Error;

/// Result type for constitutive-law evaluations.
pub type MaterialResult<T> = Result<T, MaterialError>;

/// Errors that can occur while evaluating a constitutive law.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    /// Non-physical input or output (negative pressure, zero temperature, ...).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Input outside the validity range of the correlation.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    /// Invalid law parameter.
    #[error("Invalid parameter: {what}")]
    InvalidParam { what: &'static str },
}

impl From<MaterialError> for BxError {
    fn from(err: MaterialError) -> Self {
        match err {
            MaterialError::NonPhysical { what, value } => BxError::NonFinite { what, value },
            MaterialError::OutOfRange { what, .. } => BxError::InvalidArg { what },
            MaterialError::InvalidParam { what } => BxError::InvalidArg { what },
        }
    }
}

/// Reject non-finite or non-positive values.
pub(crate) fn positive(v: f64, what: &'static str) -> MaterialResult<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(MaterialError::NonPhysical { what, value: v })
    }
}

/// Reject non-finite values.
pub(crate) fn finite(v: f64, what: &'static str) -> MaterialResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MaterialError::NonPhysical { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MaterialError::NonPhysical {
            what: "temperature",
            value: -1.0,
        };
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn error_to_bx_error() {
        let err = MaterialError::InvalidParam { what: "lambda" };
        let bx: BxError = err.into();
        assert!(matches!(bx, BxError::InvalidArg { what: "lambda" }));
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(positive(1.0, "x").is_ok());
        assert!(positive(0.0, "x").is_err());
        assert!(positive(f64::NAN, "x").is_err());
        assert!(finite(-3.0, "x").is_ok());
        assert!(finite(f64::INFINITY, "x").is_err());
    }
}
