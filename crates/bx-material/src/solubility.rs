//! Equilibrium solubility of the two components in the foreign phase.

use crate::error::{MaterialResult, positive};
use bx_core::units::constants::ZERO_CELSIUS_K;

/// Solubility limits used by the variable update and the phase switch.
pub trait Solubility: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Mass fraction of the nonwetting component dissolved in the wetting
    /// phase at equilibrium, given the nonwetting pressure [Pa] and
    /// temperature [K].
    fn x_aw(&self, pn: f64, t: f64) -> MaterialResult<f64>;

    /// Mass fraction of the wetting component in the nonwetting phase at
    /// equilibrium.
    fn x_wn(&self, pn: f64, t: f64) -> MaterialResult<f64>;
}

/// Pressure and temperature independent solubility limits.
#[derive(Debug, Clone)]
pub struct ConstantSolubility {
    x_aw: f64,
    x_wn: f64,
}

impl ConstantSolubility {
    pub fn new(x_aw: f64, x_wn: f64) -> Self {
        Self { x_aw, x_wn }
    }
}

impl Solubility for ConstantSolubility {
    fn name(&self) -> &str {
        "constant"
    }

    fn x_aw(&self, _pn: f64, _t: f64) -> MaterialResult<f64> {
        Ok(self.x_aw)
    }

    fn x_wn(&self, _pn: f64, _t: f64) -> MaterialResult<f64> {
        Ok(self.x_wn)
    }
}

/// Water/air solubility from Henry's law and the Antoine vapour pressure.
#[derive(Debug, Clone, Default)]
pub struct HenrySolubility;

impl HenrySolubility {
    /// Henry coefficient [1/Pa] of air in water.
    pub fn henry(t: f64) -> f64 {
        let celsius = t - ZERO_CELSIUS_K;
        (0.8942 + 1.47 * (-0.04394 * celsius).exp()) * 1e-10
    }

    /// Saturation vapour pressure of water [Pa].
    pub fn antoine(t: f64) -> f64 {
        const A: f64 = 8.19621;
        const B: f64 = 1730.63;
        const C: f64 = 233.436;
        let celsius = t - ZERO_CELSIUS_K;
        // mbar -> Pa
        10f64.powf(A - B / (celsius + C)) * 100.0
    }
}

impl Solubility for HenrySolubility {
    fn name(&self) -> &str {
        "henry"
    }

    fn x_aw(&self, pn: f64, t: f64) -> MaterialResult<f64> {
        let x_wn = self.x_wn(pn, t)?;
        let p_air = pn * (1.0 - x_wn);
        Ok((p_air * Self::henry(t)).clamp(0.0, 1.0))
    }

    fn x_wn(&self, pn: f64, t: f64) -> MaterialResult<f64> {
        positive(t, "temperature")?;
        positive(pn, "nonwetting pressure")?;
        Ok((Self::antoine(t) / pn).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antoine_at_ten_celsius() {
        // tabulated ~1228 Pa
        let p = HenrySolubility::antoine(283.15);
        assert!((p - 1228.0).abs() < 30.0, "p = {p}");
    }

    #[test]
    fn henry_fractions_are_small_and_bounded() {
        let sol = HenrySolubility;
        let x_wn = sol.x_wn(1e5, 283.15).unwrap();
        let x_aw = sol.x_aw(1e5, 283.15).unwrap();
        assert!(x_wn > 0.0 && x_wn < 0.05);
        assert!(x_aw > 0.0 && x_aw < 1e-3);
    }

    #[test]
    fn henry_rejects_nonpositive_pressure() {
        let sol = HenrySolubility;
        assert!(sol.x_wn(0.0, 283.15).is_err());
        assert!(sol.x_aw(1e5, -5.0).is_err());
    }

    #[test]
    fn constant_returns_parameters() {
        let sol = ConstantSolubility::new(1e-5, 2e-3);
        assert_eq!(sol.x_aw(1e5, 283.15).unwrap(), 1e-5);
        assert_eq!(sol.x_wn(3e5, 350.0).unwrap(), 2e-3);
    }
}
