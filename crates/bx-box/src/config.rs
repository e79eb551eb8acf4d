//! Discretization and switching parameters.

use crate::error::{BoxError, BoxResult};
use serde::{Deserialize, Serialize};

/// Tolerances of the primary variable switch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchTolerances {
    /// Relative excess over the solubility limit before a phase appears.
    /// Also the offset used when resetting the switch variable.
    pub appearance: f64,
    /// Saturation undershoot below zero before a phase disappears.
    pub disappearance: f64,
}

impl Default for SwitchTolerances {
    fn default() -> Self {
        Self {
            appearance: 2e-5,
            disappearance: 1e-5,
        }
    }
}

/// Molecular diffusion coefficients in the porous medium [m²/s].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionParams {
    pub wetting: f64,
    pub nonwetting: f64,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            wetting: 2e-9,
            nonwetting: 2.25e-5,
        }
    }
}

/// Box assembly configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Upwind weight α: 1 uses only the upstream node.
    pub upwind_weight: f64,
    /// Regularizer of the harmonic permeability mean.
    pub harmonic_eps: f64,
    pub switch: SwitchTolerances,
    /// Cross-phase molecular diffusion; `None` disables the term.
    pub diffusion: Option<DiffusionParams>,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            upwind_weight: 1.0,
            harmonic_eps: 1e-20,
            switch: SwitchTolerances::default(),
            diffusion: None,
        }
    }
}

impl BoxConfig {
    pub fn validate(&self) -> BoxResult<()> {
        if !(0.0..=1.0).contains(&self.upwind_weight) {
            return Err(BoxError::InvalidArg {
                what: "upwind_weight must be in [0, 1]",
            });
        }
        if !(self.harmonic_eps.is_finite() && self.harmonic_eps >= 0.0) {
            return Err(BoxError::InvalidArg {
                what: "harmonic_eps must be finite and non-negative",
            });
        }
        let tol = self.switch;
        if !(tol.appearance > 0.0 && tol.appearance < 0.5) {
            return Err(BoxError::InvalidArg {
                what: "switch.appearance must be in (0, 0.5)",
            });
        }
        if !(tol.disappearance > 0.0 && tol.disappearance < 0.5) {
            return Err(BoxError::InvalidArg {
                what: "switch.disappearance must be in (0, 0.5)",
            });
        }
        if let Some(d) = self.diffusion
            && (d.wetting < 0.0 || d.nonwetting < 0.0)
        {
            return Err(BoxError::InvalidArg {
                what: "diffusion coefficients must be non-negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BoxConfig::default();
        assert_eq!(cfg.upwind_weight, 1.0);
        assert_eq!(cfg.switch.appearance, 2e-5);
        assert_eq!(cfg.switch.disappearance, 1e-5);
        assert!(cfg.diffusion.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_upwind_weight() {
        let cfg = BoxConfig {
            upwind_weight: 1.5,
            ..BoxConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_diffusion_rejected() {
        let cfg = BoxConfig {
            diffusion: Some(DiffusionParams {
                wetting: -1.0,
                nonwetting: 0.0,
            }),
            ..BoxConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
