//! Problem-side collaborators of the box assembly.

use crate::indices::PhaseState;
use bx_material::MaterialSet;
use nalgebra::{SMatrix, SVector};

/// Everything the local assembly needs to know about the problem being
/// solved: constitutive laws, spatial parameters, gravity and the initial
/// phase distribution.
///
/// Implementations must be thread-safe (Send + Sync) so that cells can be
/// assembled in parallel.
pub trait BoxProblem<const D: usize>: Send + Sync {
    /// Constitutive laws.
    fn materials(&self) -> MaterialSet<'_>;

    /// Gravitational acceleration [m/s²].
    fn gravity(&self) -> SVector<f64, D>;

    fn num_vertices(&self) -> usize;

    /// Global position of a mesh vertex.
    fn vertex_position(&self, vertex: usize) -> SVector<f64, D>;

    /// Porosity at a sub-control volume position.
    fn porosity(&self, pos: &SVector<f64, D>) -> f64;

    /// Intrinsic permeability tensor [m²].
    fn permeability(&self, pos: &SVector<f64, D>) -> SMatrix<f64, D, D>;

    /// Phase state at the start of the simulation.
    fn initial_phase_state(&self, vertex: usize, pos: &SVector<f64, D>) -> PhaseState;
}
