//! Shared fixtures for the unit tests of this crate.

use crate::indices::PhaseState;
use crate::problem::BoxProblem;
use bx_core::units::{kgpm3, pa, pas};
use bx_material::{ConstantSolubility, IncompressibleFluid, LinearLaw, MaterialSet};
use nalgebra::{SMatrix, SVector};

pub(crate) const X_AW: f64 = 1.5e-5;
pub(crate) const X_WN: f64 = 8e-3;

/// Problem with constant fluid properties and a linear capillary pressure
/// law pc = 1000 (1 - Sw).
pub(crate) struct TestProblem<const D: usize> {
    pub law: LinearLaw,
    pub solubility: ConstantSolubility,
    pub water: IncompressibleFluid,
    pub gas: IncompressibleFluid,
    pub gravity: SVector<f64, D>,
    pub positions: Vec<SVector<f64, D>>,
    pub states: Vec<PhaseState>,
    pub porosity: f64,
    pub perm: fn(&SVector<f64, D>) -> f64,
}

impl<const D: usize> TestProblem<D> {
    pub fn new(positions: Vec<SVector<f64, D>>) -> Self {
        let n = positions.len();
        Self {
            law: LinearLaw::new(pa(1000.0)),
            solubility: ConstantSolubility::new(X_AW, X_WN),
            water: IncompressibleFluid::new(kgpm3(1000.0), pas(1e-3)),
            gas: IncompressibleFluid::new(kgpm3(1.2), pas(1.8e-5)),
            gravity: SVector::zeros(),
            positions,
            states: vec![PhaseState::BothPhases; n],
            porosity: 0.3,
            perm: |_| 1e-12,
        }
    }
}

impl TestProblem<1> {
    /// Vertices at x = 0, 1, ..., n-1.
    pub fn line(n: usize) -> Self {
        Self::new((0..n).map(|i| SVector::from([i as f64])).collect())
    }
}

impl<const D: usize> BoxProblem<D> for TestProblem<D> {
    fn materials(&self) -> MaterialSet<'_> {
        MaterialSet::new(&self.law, &self.solubility, &self.water, &self.gas)
    }

    fn gravity(&self) -> SVector<f64, D> {
        self.gravity
    }

    fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    fn vertex_position(&self, vertex: usize) -> SVector<f64, D> {
        self.positions[vertex]
    }

    fn porosity(&self, _pos: &SVector<f64, D>) -> f64 {
        self.porosity
    }

    fn permeability(&self, pos: &SVector<f64, D>) -> SMatrix<f64, D, D> {
        SMatrix::identity() * (self.perm)(pos)
    }

    fn initial_phase_state(&self, vertex: usize, _pos: &SVector<f64, D>) -> PhaseState {
        self.states[vertex]
    }
}
