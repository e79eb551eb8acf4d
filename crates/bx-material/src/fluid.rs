//! Phase density and viscosity.

use crate::error::{MaterialResult, finite, positive};
use bx_core::units::constants::R_J_PER_MOL_K;
use bx_core::units::{Density, DynVisc};

/// Fluid phase property model.
pub trait PhaseFluid: Send + Sync {
    /// Get the fluid name (for debugging/logging).
    fn name(&self) -> &str;

    /// Phase density [kg/m³] at temperature `t` [K], phase pressure `p` [Pa]
    /// and mass fraction `x_dissolved` of the foreign component.
    fn density(&self, t: f64, p: f64, x_dissolved: f64) -> MaterialResult<f64>;

    /// Dynamic viscosity [Pa·s].
    fn viscosity(&self, t: f64, p: f64) -> MaterialResult<f64>;
}

/// Constant density and viscosity.
#[derive(Debug, Clone)]
pub struct IncompressibleFluid {
    rho: f64,
    mu: f64,
}

impl IncompressibleFluid {
    pub fn new(rho: Density, mu: DynVisc) -> Self {
        Self {
            rho: rho.value,
            mu: mu.value,
        }
    }
}

impl PhaseFluid for IncompressibleFluid {
    fn name(&self) -> &str {
        "incompressible"
    }

    fn density(&self, t: f64, p: f64, x_dissolved: f64) -> MaterialResult<f64> {
        positive(t, "temperature")?;
        finite(p, "pressure")?;
        finite(x_dissolved, "dissolved mass fraction")?;
        Ok(self.rho)
    }

    fn viscosity(&self, t: f64, _p: f64) -> MaterialResult<f64> {
        positive(t, "temperature")?;
        Ok(self.mu)
    }
}

/// Ideal gas with constant viscosity.
#[derive(Debug, Clone)]
pub struct IdealGas {
    /// Molar mass [kg/mol]
    molar_mass: f64,
    mu: f64,
}

impl IdealGas {
    pub fn new(molar_mass_kg_per_mol: f64, mu: DynVisc) -> MaterialResult<Self> {
        positive(molar_mass_kg_per_mol, "molar mass")?;
        positive(mu.value, "viscosity")?;
        Ok(Self {
            molar_mass: molar_mass_kg_per_mol,
            mu: mu.value,
        })
    }

    /// Dry air (M = 28.96 g/mol, μ = 1.8e-5 Pa·s).
    pub fn air() -> Self {
        Self {
            molar_mass: 0.028_96,
            mu: 1.8e-5,
        }
    }
}

impl PhaseFluid for IdealGas {
    fn name(&self) -> &str {
        "ideal-gas"
    }

    fn density(&self, t: f64, p: f64, _x_dissolved: f64) -> MaterialResult<f64> {
        positive(t, "temperature")?;
        positive(p, "gas pressure")?;
        Ok(p * self.molar_mass / (R_J_PER_MOL_K * t))
    }

    fn viscosity(&self, t: f64, _p: f64) -> MaterialResult<f64> {
        positive(t, "temperature")?;
        Ok(self.mu)
    }
}
