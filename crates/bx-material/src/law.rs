//! Capillary pressure and relative permeability laws.

use crate::error::{MaterialError, MaterialResult, finite, positive};
use bx_core::units::Pressure;

/// Saturation-dependent soil law.
///
/// Implementations must be thread-safe (Send + Sync) so that cells can be
/// assembled in parallel. `pos` is the global position of the evaluation
/// point; homogeneous laws ignore it.
pub trait MaterialLaw: Send + Sync {
    /// Get the law name (for debugging/logging).
    fn name(&self) -> &str;

    /// Capillary pressure pc = pn - pw [Pa] at wetting saturation `sw`.
    fn pc(&self, sw: f64, pos: &[f64]) -> MaterialResult<f64>;

    /// Relative permeability of the wetting phase.
    fn krw(&self, sw: f64, pos: &[f64]) -> MaterialResult<f64>;

    /// Relative permeability of the nonwetting phase at nonwetting saturation `sn`.
    fn krn(&self, sn: f64, pos: &[f64]) -> MaterialResult<f64>;
}

/// Linear capillary pressure pc = entry·(1 - Sw) with linear relative
/// permeabilities.
#[derive(Debug, Clone)]
pub struct LinearLaw {
    entry_pa: f64,
}

impl LinearLaw {
    pub fn new(entry: Pressure) -> Self {
        Self {
            entry_pa: entry.value,
        }
    }
}

impl MaterialLaw for LinearLaw {
    fn name(&self) -> &str {
        "linear"
    }

    fn pc(&self, sw: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sw, "wetting saturation")?;
        Ok(self.entry_pa * (1.0 - sw))
    }

    fn krw(&self, sw: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sw, "wetting saturation")?;
        Ok(sw.clamp(0.0, 1.0))
    }

    fn krn(&self, sn: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sn, "nonwetting saturation")?;
        Ok(sn.clamp(0.0, 1.0))
    }
}

/// Brooks-Corey law with residual saturations.
///
/// Below `SE_REG` the capillary pressure is extended linearly so that the
/// law stays finite when the wetting phase vanishes.
#[derive(Debug, Clone)]
pub struct BrooksCorey {
    entry_pa: f64,
    lambda: f64,
    swr: f64,
    snr: f64,
}

impl BrooksCorey {
    const SE_REG: f64 = 0.01;

    pub fn new(entry: Pressure, lambda: f64, swr: f64, snr: f64) -> MaterialResult<Self> {
        positive(entry.value, "entry pressure")?;
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(MaterialError::InvalidParam {
                what: "Brooks-Corey lambda must be positive",
            });
        }
        if !(0.0..1.0).contains(&swr) || !(0.0..1.0).contains(&snr) || swr + snr >= 1.0 {
            return Err(MaterialError::InvalidParam {
                what: "residual saturations must satisfy 0 <= swr + snr < 1",
            });
        }
        Ok(Self {
            entry_pa: entry.value,
            lambda,
            swr,
            snr,
        })
    }

    /// Effective wetting saturation in [0, 1].
    pub fn effective_saturation(&self, sw: f64) -> f64 {
        ((sw - self.swr) / (1.0 - self.swr - self.snr)).clamp(0.0, 1.0)
    }

    fn pc_effective(&self, se: f64) -> f64 {
        self.entry_pa * se.powf(-1.0 / self.lambda)
    }
}

impl MaterialLaw for BrooksCorey {
    fn name(&self) -> &str {
        "brooks-corey"
    }

    fn pc(&self, sw: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sw, "wetting saturation")?;
        let se = (sw - self.swr) / (1.0 - self.swr - self.snr);
        if se >= 1.0 {
            return Ok(self.entry_pa);
        }
        if se > Self::SE_REG {
            return Ok(self.pc_effective(se));
        }
        // linear continuation with the slope at SE_REG
        let pc_reg = self.pc_effective(Self::SE_REG);
        let slope = -pc_reg / (self.lambda * Self::SE_REG);
        Ok(pc_reg + slope * (se - Self::SE_REG))
    }

    fn krw(&self, sw: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sw, "wetting saturation")?;
        let se = self.effective_saturation(sw);
        Ok(se.powf((2.0 + 3.0 * self.lambda) / self.lambda))
    }

    fn krn(&self, sn: f64, _pos: &[f64]) -> MaterialResult<f64> {
        finite(sn, "nonwetting saturation")?;
        let se = self.effective_saturation(1.0 - sn);
        let exponent = (2.0 + self.lambda) / self.lambda;
        Ok((1.0 - se).powi(2) * (1.0 - se.powf(exponent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_core::units::pa;
    use bx_core::{Tolerances, nearly_equal};

    #[test]
    fn linear_pc_matches_entry_scaling() {
        let law = LinearLaw::new(pa(1000.0));
        let tol = Tolerances::default();
        assert!(nearly_equal(law.pc(0.7, &[]).unwrap(), 300.0, tol));
        assert!(nearly_equal(law.pc(1.0, &[]).unwrap(), 0.0, tol));
        assert!(nearly_equal(law.pc(0.0, &[]).unwrap(), 1000.0, tol));
    }

    #[test]
    fn linear_kr_clamped() {
        let law = LinearLaw::new(pa(1000.0));
        assert_eq!(law.krw(1.2, &[]).unwrap(), 1.0);
        assert_eq!(law.krn(-0.1, &[]).unwrap(), 0.0);
        assert!(law.pc(f64::NAN, &[]).is_err());
    }

    #[test]
    fn brooks_corey_entry_pressure_at_full_saturation() {
        let law = BrooksCorey::new(pa(5000.0), 2.0, 0.1, 0.0).unwrap();
        assert_eq!(law.pc(1.0, &[]).unwrap(), 5000.0);
        assert_eq!(law.krw(1.0, &[]).unwrap(), 1.0);
        assert_eq!(law.krn(0.0, &[]).unwrap(), 0.0);
    }

    #[test]
    fn brooks_corey_regularized_is_finite_and_monotone() {
        let law = BrooksCorey::new(pa(5000.0), 2.0, 0.1, 0.0).unwrap();
        let mut last = 0.0;
        for i in (0..=100).rev() {
            let sw = i as f64 / 100.0;
            let pc = law.pc(sw, &[]).unwrap();
            assert!(pc.is_finite());
            assert!(pc >= last);
            last = pc;
        }
    }

    #[test]
    fn brooks_corey_rejects_bad_params() {
        assert!(BrooksCorey::new(pa(5000.0), 0.0, 0.1, 0.0).is_err());
        assert!(BrooksCorey::new(pa(5000.0), 2.0, 0.6, 0.5).is_err());
        assert!(BrooksCorey::new(pa(-1.0), 2.0, 0.1, 0.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use bx_core::units::pa;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn relative_permeabilities_stay_in_unit_interval(sw in -0.5_f64..1.5_f64, lambda in 0.3_f64..5.0_f64) {
            let law = BrooksCorey::new(pa(2000.0), lambda, 0.05, 0.02).unwrap();
            let krw = law.krw(sw, &[]).unwrap();
            let krn = law.krn(1.0 - sw, &[]).unwrap();
            prop_assert!((0.0..=1.0).contains(&krw));
            prop_assert!((0.0..=1.0).contains(&krn));
            prop_assert!(law.pc(sw, &[]).unwrap().is_finite());
        }
    }
}
