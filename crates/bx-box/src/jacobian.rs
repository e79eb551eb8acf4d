//! Local residual and its finite-difference Jacobian.

use crate::assembler::LocalJacobian;
use crate::energy::EnergyModel;
use crate::error::{BoxError, BoxResult};
use crate::problem::BoxProblem;
use nalgebra::DMatrix;

impl<'a, P, E, const D: usize, const N: usize> LocalJacobian<'a, P, E, D, N>
where
    P: BoxProblem<D>,
    E: EnergyModel<D, N>,
{
    /// Residual of every local node: storage change over `dt` plus the
    /// outflow across all faces of the cell.
    pub fn local_residual(&self, dt: f64) -> BoxResult<Vec<[f64; N]>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(BoxError::InvalidArg {
                what: "dt must be positive",
            });
        }
        let cell = self.cell()?;
        let mut residual = vec![[0.0; N]; cell.num_nodes()];

        for (scv, res) in residual.iter_mut().enumerate() {
            let cur = self.compute_storage(scv, false)?;
            let prev = self.compute_storage(scv, true)?;
            let scale = cell.scv[scv].volume / dt;
            for eq in 0..N {
                res[eq] = (cur[eq] - prev[eq]) * scale;
            }
        }

        for (face_id, face) in cell.faces.iter().enumerate() {
            let flux = self.compute_flux(face_id)?;
            for eq in 0..N {
                residual[face.i][eq] += flux[eq];
                residual[face.j][eq] -= flux[eq];
            }
        }
        Ok(residual)
    }

    /// Local residual and its Jacobian with respect to the local primary
    /// variables, ordered node-major (`node * N + component`).
    ///
    /// Columns are forward differences with step `epsilon * max(|x|, 1)`.
    pub fn assemble_jacobian(
        &mut self,
        dt: f64,
        epsilon: f64,
    ) -> BoxResult<(Vec<[f64; N]>, DMatrix<f64>)> {
        let base = self.local_residual(dt)?;
        let n = self.num_nodes() * N;
        let mut jac = DMatrix::zeros(n, n);

        for node in 0..self.num_nodes() {
            for comp in 0..N {
                let x = self.cur_sol[node][comp];
                let dx = epsilon * x.abs().max(1.0);
                let perturbed = {
                    let guard = self.deflected(node, comp, x + dx)?;
                    guard.local_residual(dt)?
                };

                let col = node * N + comp;
                for (row_node, (p, b)) in perturbed.iter().zip(&base).enumerate() {
                    for eq in 0..N {
                        jac[(row_node * N + eq, col)] = (p[eq] - b[eq]) / dx;
                    }
                }
            }
        }
        Ok((base, jac))
    }
}
