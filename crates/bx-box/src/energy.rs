//! Energy extension point of the box assembly.
//!
//! The isothermal model keeps the temperature fixed and contributes nothing
//! to the balance equations. The non-isothermal model carries the
//! temperature as an additional primary variable and adds an energy
//! balance. Both run through the same assembly code; the assembler always
//! calls every hook.

use crate::geometry::ScvFace;
use crate::indices::{N_PHASE, NUM_PHASES, PW_IDX, SWITCH_IDX, W_PHASE};
use crate::node_vars::NodeVars;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// Primary variable / equation index of the temperature and the energy
/// balance in the non-isothermal model.
pub const TEMPERATURE_IDX: usize = 2;
pub const ENERGY_EQ: usize = 2;

/// Hooks through which a model adds heat transport to the box assembly.
///
/// `N` is the number of primary variables (and equations) per vertex.
pub trait EnergyModel<const D: usize, const N: usize>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Temperature of a node given its primary variables [K].
    fn temperature(&self, sol: &[f64; N]) -> f64;

    /// Add the stored heat of a sub-control volume to `result`.
    fn heat_storage(&self, result: &mut [f64; N], porosity: f64, vars: &NodeVars);

    /// Accumulate the contribution of one node to the temperature gradient
    /// at a face.
    fn update_temp_grad(
        &self,
        temp_grad: &mut SVector<f64, D>,
        fe_grad: &SVector<f64, D>,
        vars: &NodeVars,
    );

    /// Add the heat transported with the phases. `darcy` holds the signed
    /// volumetric flux of each phase; `up`/`dn` the upstream and downstream
    /// node state per phase.
    fn advective_heat_flux(
        &self,
        flux: &mut [f64; N],
        darcy: &[f64; NUM_PHASES],
        alpha: f64,
        up: [&NodeVars; NUM_PHASES],
        dn: [&NodeVars; NUM_PHASES],
    );

    /// Add the conductive heat flux across a face.
    fn diffusive_heat_flux(&self, flux: &mut [f64; N], face: &ScvFace<D>, temp_grad: &SVector<f64, D>);

    fn primary_var_name(&self, idx: usize) -> &'static str {
        match idx {
            PW_IDX => "pW",
            SWITCH_IDX => "Sn/X",
            TEMPERATURE_IDX => "T",
            _ => "?",
        }
    }

    fn eq_name(&self, idx: usize) -> &'static str {
        match idx {
            0 => "water",
            1 => "air",
            ENERGY_EQ => "energy",
            _ => "?",
        }
    }

    /// Scaling of a primary variable in convergence checks.
    fn primary_var_weight(&self, idx: usize) -> f64 {
        match idx {
            PW_IDX => 1e-5,
            TEMPERATURE_IDX => 1.0 / 300.0,
            _ => 1.0,
        }
    }

    /// Scaling of an equation in convergence checks.
    fn eq_weight(&self, idx: usize) -> f64 {
        match idx {
            ENERGY_EQ => 1.0 / 1.0035e3,
            _ => 1.0,
        }
    }
}

/// Fixed-temperature model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Isothermal {
    pub temperature_k: f64,
}

impl Default for Isothermal {
    fn default() -> Self {
        // 10 °C
        Self {
            temperature_k: 283.15,
        }
    }
}

impl<const D: usize> EnergyModel<D, 2> for Isothermal {
    fn name(&self) -> &'static str {
        "2p2c"
    }

    fn temperature(&self, _sol: &[f64; 2]) -> f64 {
        self.temperature_k
    }

    fn heat_storage(&self, _result: &mut [f64; 2], _porosity: f64, _vars: &NodeVars) {}

    fn update_temp_grad(
        &self,
        _temp_grad: &mut SVector<f64, D>,
        _fe_grad: &SVector<f64, D>,
        _vars: &NodeVars,
    ) {
    }

    fn advective_heat_flux(
        &self,
        _flux: &mut [f64; 2],
        _darcy: &[f64; NUM_PHASES],
        _alpha: f64,
        _up: [&NodeVars; NUM_PHASES],
        _dn: [&NodeVars; NUM_PHASES],
    ) {
    }

    fn diffusive_heat_flux(
        &self,
        _flux: &mut [f64; 2],
        _face: &ScvFace<D>,
        _temp_grad: &SVector<f64, D>,
    ) {
    }
}

/// Model with temperature as third primary variable and an energy balance.
///
/// Fluid enthalpy is taken as `c_p T` per phase; the porous medium has a
/// single effective heat conductivity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonIsothermal {
    /// Density of the solid matrix [kg/m³].
    pub solid_density: f64,
    /// Specific heat capacity of the solid matrix [J/(kg K)].
    pub solid_heat_capacity: f64,
    /// Effective heat conductivity of the porous medium [W/(m K)].
    pub conductivity: f64,
    /// Specific heat capacity of the wetting and nonwetting phase [J/(kg K)].
    pub heat_capacity: [f64; NUM_PHASES],
}

impl Default for NonIsothermal {
    fn default() -> Self {
        Self {
            solid_density: 2650.0,
            solid_heat_capacity: 800.0,
            conductivity: 2.0,
            heat_capacity: [4186.0, 1005.0],
        }
    }
}

impl NonIsothermal {
    fn phase_enthalpy(&self, vars: &NodeVars, phase: usize) -> f64 {
        self.heat_capacity[phase] * vars.temperature
    }
}

impl<const D: usize> EnergyModel<D, 3> for NonIsothermal {
    fn name(&self) -> &'static str {
        "2p2cni"
    }

    fn temperature(&self, sol: &[f64; 3]) -> f64 {
        sol[TEMPERATURE_IDX]
    }

    fn heat_storage(&self, result: &mut [f64; 3], porosity: f64, vars: &NodeVars) {
        let fluid: f64 = [(W_PHASE, vars.sat_w), (N_PHASE, vars.sat_n)]
            .iter()
            .map(|&(phase, sat)| vars.density[phase] * sat * self.phase_enthalpy(vars, phase))
            .sum();
        let solid = self.solid_density * self.solid_heat_capacity * vars.temperature;
        result[ENERGY_EQ] = porosity * fluid + (1.0 - porosity) * solid;
    }

    fn update_temp_grad(
        &self,
        temp_grad: &mut SVector<f64, D>,
        fe_grad: &SVector<f64, D>,
        vars: &NodeVars,
    ) {
        *temp_grad += fe_grad * vars.temperature;
    }

    fn advective_heat_flux(
        &self,
        flux: &mut [f64; 3],
        darcy: &[f64; NUM_PHASES],
        alpha: f64,
        up: [&NodeVars; NUM_PHASES],
        dn: [&NodeVars; NUM_PHASES],
    ) {
        let carried = |vars: &NodeVars, phase: usize| {
            vars.density[phase] * vars.mobility[phase] * self.phase_enthalpy(vars, phase)
        };
        flux[ENERGY_EQ] = (0..NUM_PHASES)
            .map(|phase| {
                darcy[phase]
                    * (alpha * carried(up[phase], phase)
                        + (1.0 - alpha) * carried(dn[phase], phase))
            })
            .sum();
    }

    fn diffusive_heat_flux(&self, flux: &mut [f64; 3], face: &ScvFace<D>, temp_grad: &SVector<f64, D>) {
        flux[ENERGY_EQ] -= self.conductivity * temp_grad.dot(&face.normal);
    }
}
