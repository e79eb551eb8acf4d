//! Float helpers for the Newton iterates and the test comparisons.

use crate::BxError;

/// Absolute/relative tolerance pair for [`nearly_equal`].
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    /// Tight enough for pressures around 1e5 Pa and mass fractions
    /// around 1e-5.
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

/// `a` and `b` agree within the absolute or the relative tolerance.
pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Pass `v` through, or fail with [`BxError::NonFinite`] naming `what`.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, BxError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BxError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_scale_comparisons() {
        let tol = Tolerances::default();
        assert!(nearly_equal(1e5 + 700.0, 100_700.0, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.5e-5, 1.5e-5 * (1.0 + 2e-5), tol));
    }

    #[test]
    fn infinite_pressure_is_rejected() {
        assert_eq!(ensure_finite(1e5, "pw").unwrap(), 1e5);
        let err = ensure_finite(f64::INFINITY, "pw").unwrap_err();
        assert!(matches!(err, BxError::NonFinite { what: "pw", .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }
    }
}
