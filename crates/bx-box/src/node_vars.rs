//! Secondary variables cached per cell node.

use crate::error::BoxResult;
use crate::indices::{
    N_COMP, N_PHASE, NUM_COMPONENTS, NUM_PHASES, PW_IDX, PhaseState, SWITCH_IDX, W_COMP, W_PHASE,
};
use bx_core::ensure_finite;
use bx_material::MaterialSet;

/// Derived state of one node, evaluated from its primary variables and
/// phase state.
///
/// `mass_frac[comp][phase]` is the mass fraction of component `comp` in
/// phase `phase`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeVars {
    pub sat_w: f64,
    pub sat_n: f64,
    pub p_w: f64,
    pub p_c: f64,
    pub p_n: f64,
    pub mobility: [f64; NUM_PHASES],
    pub density: [f64; NUM_PHASES],
    pub mass_frac: [[f64; NUM_PHASES]; NUM_COMPONENTS],
    pub temperature: f64,
    pub phase_state: PhaseState,
}

/// Evaluate the secondary variables of a node.
///
/// `sol` holds the node's primary variables (`pw`, switch variable, and
/// possibly more that are ignored here). Non-finite primary variables are
/// rejected; constitutive-law errors are returned unchanged.
pub fn update_node_vars(
    sol: &[f64],
    phase_state: PhaseState,
    pos: &[f64],
    laws: &MaterialSet<'_>,
    temperature: f64,
) -> BoxResult<NodeVars> {
    let switch = ensure_finite(sol[SWITCH_IDX], "switch variable")?;
    let mut d = NodeVars {
        p_w: ensure_finite(sol[PW_IDX], "wetting pressure")?,
        temperature,
        phase_state,
        ..NodeVars::default()
    };

    d.sat_n = match phase_state {
        PhaseState::BothPhases => switch,
        PhaseState::WettingOnly => 0.0,
        PhaseState::NonwettingOnly => 1.0,
    };
    d.sat_w = 1.0 - d.sat_n;
    d.p_c = laws.law.pc(d.sat_w, pos)?;
    d.p_n = d.p_w + d.p_c;

    // solubilities of the components in the foreign phase
    match phase_state {
        PhaseState::BothPhases => {
            d.mass_frac[N_COMP][W_PHASE] = laws.solubility.x_aw(d.p_n, temperature)?;
            d.mass_frac[W_COMP][N_PHASE] = laws.solubility.x_wn(d.p_n, temperature)?;
        }
        PhaseState::WettingOnly => {
            d.mass_frac[W_COMP][N_PHASE] = 0.0;
            d.mass_frac[N_COMP][W_PHASE] = switch;
        }
        PhaseState::NonwettingOnly => {
            d.mass_frac[W_COMP][N_PHASE] = switch;
            d.mass_frac[N_COMP][W_PHASE] = 0.0;
        }
    }
    d.mass_frac[W_COMP][W_PHASE] = 1.0 - d.mass_frac[N_COMP][W_PHASE];
    d.mass_frac[N_COMP][N_PHASE] = 1.0 - d.mass_frac[W_COMP][N_PHASE];

    d.density[W_PHASE] =
        laws.wetting
            .density(temperature, d.p_w, d.mass_frac[N_COMP][W_PHASE])?;
    d.density[N_PHASE] =
        laws.nonwetting
            .density(temperature, d.p_n, d.mass_frac[W_COMP][N_PHASE])?;

    d.mobility[W_PHASE] = laws.mob_w(d.sat_w, pos, temperature, d.p_w)?;
    d.mobility[N_PHASE] = laws.mob_n(d.sat_n, pos, temperature, d.p_n)?;

    Ok(d)
}
