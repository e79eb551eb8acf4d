//! Storage and flux terms of one cell.
//!
//! [`LocalJacobian`] holds the local solution of the current cell at the
//! current and the previous time level together with the cached
//! [`NodeVars`] of every node. Storage and flux are evaluated from these
//! caches only.

use crate::config::{BoxConfig, DiffusionParams};
use crate::deflection::Snapshot;
use crate::energy::EnergyModel;
use crate::error::{BoxError, BoxResult, check_index};
use crate::geometry::{CellGeometry, ScvFace};
use crate::indices::{
    CONTI_N_EQ, CONTI_W_EQ, N_COMP, N_PHASE, NUM_PHASES, PhaseState, W_COMP, W_PHASE,
};
use crate::node_vars::{NodeVars, update_node_vars};
use crate::phase_store::PhaseStateStore;
use crate::problem::BoxProblem;
use nalgebra::{SMatrix, SVector};

/// Local assembler for one cell at a time.
pub struct LocalJacobian<'a, P, E, const D: usize, const N: usize> {
    pub(crate) problem: &'a P,
    pub(crate) energy: &'a E,
    pub(crate) store: &'a PhaseStateStore,
    pub(crate) config: &'a BoxConfig,
    pub(crate) cell: Option<&'a CellGeometry<D>>,
    pub(crate) cur_sol: Vec<[f64; N]>,
    pub(crate) prev_sol: Vec<[f64; N]>,
    pub(crate) cur_cache: Vec<NodeVars>,
    pub(crate) prev_cache: Vec<NodeVars>,
    pub(crate) deflection: Option<Snapshot<N>>,
}

impl<'a, P, E, const D: usize, const N: usize> LocalJacobian<'a, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    pub fn new(
        problem: &'a P,
        energy: &'a E,
        store: &'a PhaseStateStore,
        config: &'a BoxConfig,
    ) -> BoxResult<Self> {
        if N < 2 {
            return Err(BoxError::InvalidArg {
                what: "at least two primary variables per vertex required",
            });
        }
        if store.len() != problem.num_vertices() {
            return Err(BoxError::InvalidArg {
                what: "phase state store does not match the problem",
            });
        }
        config.validate()?;
        Ok(Self {
            problem,
            energy,
            store,
            config,
            cell: None,
            cur_sol: Vec::new(),
            prev_sol: Vec::new(),
            cur_cache: Vec::new(),
            prev_cache: Vec::new(),
            deflection: None,
        })
    }

    /// Select a cell and load its local solutions from the global vectors.
    /// Both caches are rebuilt.
    pub fn set_params(
        &mut self,
        cell: &'a CellGeometry<D>,
        cur_global: &[[f64; N]],
        prev_global: &[[f64; N]],
    ) -> BoxResult<()> {
        cell.validate()?;
        let n_vertices = self.store.len();
        if cur_global.len() != n_vertices || prev_global.len() != n_vertices {
            return Err(BoxError::InvalidArg {
                what: "global solution length does not match the vertex count",
            });
        }
        for &v in &cell.vertices {
            check_index("vertex", v, n_vertices)?;
        }

        self.cell = Some(cell);
        self.deflection = None;
        self.cur_sol = cell.vertices.iter().map(|&v| cur_global[v]).collect();
        self.prev_sol = cell.vertices.iter().map(|&v| prev_global[v]).collect();
        self.rebuild_cache(false)?;
        self.rebuild_cache(true)
    }

    /// Re-evaluate one of the two caches.
    ///
    /// With `use_old_phase_state` the previous time level is evaluated with
    /// the previously accepted phase state, otherwise the current solution
    /// with the current phase state.
    pub fn rebuild_cache(&mut self, use_old_phase_state: bool) -> BoxResult<()> {
        let cell = self.cell()?;
        let nodes = 0..cell.num_nodes();
        if use_old_phase_state {
            self.prev_cache = nodes
                .map(|node| self.eval_node(node, &self.prev_sol[node], true))
                .collect::<BoxResult<_>>()?;
        } else {
            if let Some(snap) = &self.deflection {
                return Err(BoxError::Deflection {
                    what: "cannot rebuild the cache while deflected",
                    node: snap.node,
                });
            }
            self.cur_cache = nodes
                .map(|node| self.eval_node(node, &self.cur_sol[node], false))
                .collect::<BoxResult<_>>()?;
        }
        Ok(())
    }

    pub(crate) fn eval_node(
        &self,
        node: usize,
        sol: &[f64; N],
        use_old_phase_state: bool,
    ) -> BoxResult<NodeVars> {
        let cell = self.cell()?;
        let vertex = cell.vertices[node];
        let state = if use_old_phase_state {
            self.store.previous(vertex)
        } else {
            self.store.current(vertex)
        };
        update_node_vars(
            sol,
            state,
            cell.scv[node].global.as_slice(),
            &self.problem.materials(),
            self.energy.temperature(sol),
        )
    }

    pub(crate) fn cell(&self) -> BoxResult<&'a CellGeometry<D>> {
        self.cell.ok_or(BoxError::NoCell)
    }

    /// Amount of every conserved quantity per unit volume in sub-control
    /// volume `scv`.
    pub fn compute_storage(&self, scv: usize, use_prev: bool) -> BoxResult<[f64; N]> {
        let cell = self.cell()?;
        check_index("sub-control volume", scv, cell.num_nodes())?;
        let vars = if use_prev {
            &self.prev_cache[scv]
        } else {
            &self.cur_cache[scv]
        };
        let porosity = self.problem.porosity(&cell.scv[scv].global);

        let mut result = [0.0; N];
        result[CONTI_W_EQ] = porosity
            * (vars.density[W_PHASE] * vars.sat_w * vars.mass_frac[W_COMP][W_PHASE]
                + vars.density[N_PHASE] * vars.sat_n * vars.mass_frac[W_COMP][N_PHASE]);
        result[CONTI_N_EQ] = porosity
            * (vars.density[N_PHASE] * vars.sat_n * vars.mass_frac[N_COMP][N_PHASE]
                + vars.density[W_PHASE] * vars.sat_w * vars.mass_frac[N_COMP][W_PHASE]);

        self.energy.heat_storage(&mut result, porosity, vars);
        Ok(result)
    }

    /// Flux of every conserved quantity across face `face_id`, counted
    /// positive out of the control volume of node `i` into that of `j`.
    pub fn compute_flux(&self, face_id: usize) -> BoxResult<[f64; N]> {
        let cell = self.cell()?;
        check_index("face", face_id, cell.faces.len())?;
        let face = &cell.faces[face_id];
        let (i, j) = (face.i, face.j);
        let cache = &self.cur_cache;

        let mut p_grad = [SVector::<f64, D>::zeros(); NUM_PHASES];
        let mut x_grad = [SVector::<f64, D>::zeros(); NUM_PHASES];
        let mut temp_grad = SVector::<f64, D>::zeros();
        for (vars, fe_grad) in cache.iter().zip(&face.grad) {
            p_grad[W_PHASE] += fe_grad * vars.p_w;
            p_grad[N_PHASE] += fe_grad * vars.p_n;
            // dissolved air in water, vapour in the gas phase
            x_grad[W_PHASE] += fe_grad * vars.mass_frac[N_COMP][W_PHASE];
            x_grad[N_PHASE] += fe_grad * vars.mass_frac[W_COMP][N_PHASE];
            self.energy.update_temp_grad(&mut temp_grad, fe_grad, vars);
        }

        let gravity = self.problem.gravity();
        for (phase, grad) in p_grad.iter_mut().enumerate() {
            *grad -= gravity * cache[i].density[phase];
        }

        let k = harmonic_mean_k(
            &self.problem.permeability(&cell.scv[i].global),
            &self.problem.permeability(&cell.scv[j].global),
            self.config.harmonic_eps,
        );

        let darcy: [f64; NUM_PHASES] =
            std::array::from_fn(|phase| -(k * p_grad[phase]).dot(&face.normal));

        let (up_w, dn_w) = upstream(darcy[W_PHASE], i, j);
        let (up_n, dn_n) = upstream(darcy[N_PHASE], i, j);
        let up = [&cache[up_w], &cache[up_n]];
        let dn = [&cache[dn_w], &cache[dn_n]];
        let alpha = self.config.upwind_weight;

        let advect = |phase: usize, comp: usize| {
            let carried =
                |v: &NodeVars| v.density[phase] * v.mobility[phase] * v.mass_frac[comp][phase];
            darcy[phase] * (alpha * carried(up[phase]) + (1.0 - alpha) * carried(dn[phase]))
        };

        let mut flux = [0.0; N];
        flux[CONTI_W_EQ] = advect(W_PHASE, W_COMP) + advect(N_PHASE, W_COMP);
        flux[CONTI_N_EQ] = advect(N_PHASE, N_COMP) + advect(W_PHASE, N_COMP);

        self.energy
            .advective_heat_flux(&mut flux, &darcy, alpha, up, dn);
        self.energy.diffusive_heat_flux(&mut flux, face, &temp_grad);

        if let Some(params) = self.config.diffusion {
            add_molecular_diffusion(&mut flux, face, &x_grad, [&cache[i], &cache[j]], params);
        }
        Ok(flux)
    }

    pub fn num_nodes(&self) -> usize {
        self.cur_sol.len()
    }
}

/// Upstream and downstream node of a face for a signed outflow `v`.
fn upstream(v: f64, i: usize, j: usize) -> (usize, usize) {
    if v >= 0.0 { (i, j) } else { (j, i) }
}

/// Diffusion of the dissolved component in each phase, balanced by an
/// opposite flux of the phase's main component.
fn add_molecular_diffusion<const D: usize, const N: usize>(
    flux: &mut [f64; N],
    face: &ScvFace<D>,
    x_grad: &[SVector<f64, D>; NUM_PHASES],
    nodes: [&NodeVars; 2],
    params: DiffusionParams,
) {
    let present = |phase: usize| {
        let lacking = if phase == W_PHASE {
            PhaseState::NonwettingOnly
        } else {
            PhaseState::WettingOnly
        };
        nodes.iter().all(|n| n.phase_state != lacking)
    };
    let coeff = |phase: usize, d: f64| if present(phase) { d } else { 0.0 };
    let avg_density = |phase: usize| 0.5 * (nodes[0].density[phase] + nodes[1].density[phase]);

    let air_in_water = -coeff(W_PHASE, params.wetting)
        * avg_density(W_PHASE)
        * x_grad[W_PHASE].dot(&face.normal);
    let water_in_gas = -coeff(N_PHASE, params.nonwetting)
        * avg_density(N_PHASE)
        * x_grad[N_PHASE].dot(&face.normal);

    flux[CONTI_W_EQ] += water_in_gas - air_in_water;
    flux[CONTI_N_EQ] += air_in_water - water_in_gas;
}

/// Entry-wise harmonic mean of two permeability tensors.
///
/// Equal entries are taken as they are.
pub fn harmonic_mean_k<const D: usize>(
    ki: &SMatrix<f64, D, D>,
    kj: &SMatrix<f64, D, D>,
    eps: f64,
) -> SMatrix<f64, D, D> {
    SMatrix::from_fn(|r, c| {
        let (a, b) = (ki[(r, c)], kj[(r, c)]);
        if a == b {
            a
        } else {
            2.0 / (1.0 / (a + eps) + 1.0 / (b + eps))
        }
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn harmonic_mean_is_bounded(a in 1e-15_f64..1e-9_f64, b in 1e-15_f64..1e-9_f64) {
            let k = harmonic_mean_k(
                &SMatrix::<f64, 1, 1>::new(a),
                &SMatrix::<f64, 1, 1>::new(b),
                1e-20,
            );
            let k = k[(0, 0)];
            prop_assert!(k <= a.max(b) * (1.0 + 1e-12));
            prop_assert!(k >= a.min(b) * (1.0 - 1e-12));
        }
    }
}
