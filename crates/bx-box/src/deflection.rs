//! Perturbation of single unknowns for numerical differentiation.
//!
//! Deflecting overwrites one primary variable of one node and re-evaluates
//! only that node's cached state. The first deflection of a node records a
//! snapshot of its primary variables and cached state; restoring puts both
//! back bit for bit.

use crate::assembler::LocalJacobian;
use crate::energy::EnergyModel;
use crate::error::{BoxError, BoxResult, check_index};
use crate::node_vars::NodeVars;
use crate::problem::BoxProblem;
use std::ops::{Deref, DerefMut};

/// Saved state of the deflected node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Snapshot<const N: usize> {
    pub node: usize,
    pub sol: [f64; N],
    pub vars: NodeVars,
}

impl<'a, P, E, const D: usize, const N: usize> LocalJacobian<'a, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    /// Set primary variable `component` of local node `node` to `value`.
    ///
    /// Repeated deflections of the same node keep the first snapshot.
    /// Deflecting another node before restoring is an error. If the node
    /// state cannot be evaluated the node is restored before the error is
    /// returned.
    pub fn deflect(&mut self, node: usize, component: usize, value: f64) -> BoxResult<()> {
        check_index("node", node, self.cur_sol.len())?;
        check_index("component", component, N)?;
        match &self.deflection {
            Some(snap) if snap.node != node => {
                return Err(BoxError::Deflection {
                    what: "another node is already deflected",
                    node: snap.node,
                });
            }
            Some(_) => {}
            None => {
                self.deflection = Some(Snapshot {
                    node,
                    sol: self.cur_sol[node],
                    vars: self.cur_cache[node],
                });
            }
        }

        self.cur_sol[node][component] = value;
        let sol = self.cur_sol[node];
        match self.eval_node(node, &sol, false) {
            Ok(vars) => {
                self.cur_cache[node] = vars;
                Ok(())
            }
            Err(e) => {
                self.restore(node, component)?;
                Err(e)
            }
        }
    }

    /// Undo every deflection of `node`.
    pub fn restore(&mut self, node: usize, component: usize) -> BoxResult<()> {
        check_index("component", component, N)?;
        match self.deflection.take() {
            Some(snap) if snap.node == node => {
                self.cur_sol[node] = snap.sol;
                self.cur_cache[node] = snap.vars;
                Ok(())
            }
            Some(snap) => {
                let deflected = snap.node;
                self.deflection = Some(snap);
                Err(BoxError::Deflection {
                    what: "restoring a node that is not deflected",
                    node: deflected,
                })
            }
            None => Err(BoxError::Deflection {
                what: "nothing to restore",
                node,
            }),
        }
    }

    pub fn is_deflected(&self) -> bool {
        self.deflection.is_some()
    }

    /// Deflect and return a guard that restores the node when dropped.
    pub fn deflected(
        &mut self,
        node: usize,
        component: usize,
        value: f64,
    ) -> BoxResult<DeflectionGuard<'_, 'a, P, E, D, N>> {
        self.deflect(node, component, value)?;
        Ok(DeflectionGuard {
            local: self,
            node,
            component,
        })
    }
}

/// Scoped deflection. Derefs to the assembler so residuals can be
/// evaluated with the perturbed node.
pub struct DeflectionGuard<'g, 'a, P, E, const D: usize, const N: usize>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    local: &'g mut LocalJacobian<'a, P, E, D, N>,
    node: usize,
    component: usize,
}

impl<'a, P, E, const D: usize, const N: usize> Deref for DeflectionGuard<'_, 'a, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    type Target = LocalJacobian<'a, P, E, D, N>;

    fn deref(&self) -> &Self::Target {
        self.local
    }
}

impl<P, E, const D: usize, const N: usize> DerefMut for DeflectionGuard<'_, '_, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.local
    }
}

impl<P, E, const D: usize, const N: usize> Drop for DeflectionGuard<'_, '_, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    fn drop(&mut self) {
        // a failed restore means the snapshot is already gone
        let _ = self.local.restore(self.node, self.component);
    }
}
