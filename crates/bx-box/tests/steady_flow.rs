//! One-dimensional flow through a chain of line cells.

use bx_box::{
    BoxConfig, BoxProblem, CellGeometry, Isothermal, LocalJacobian, PhaseState, PhaseStateStore,
};
use bx_core::units::{kgpm3, pa, pas};
use bx_material::{ConstantSolubility, IncompressibleFluid, LinearLaw, MaterialSet};
use nalgebra::{SMatrix, SVector};

struct Chain {
    law: LinearLaw,
    solubility: ConstantSolubility,
    water: IncompressibleFluid,
    gas: IncompressibleFluid,
    n: usize,
    state: PhaseState,
}

impl Chain {
    fn new(n: usize, state: PhaseState) -> Self {
        Self {
            law: LinearLaw::new(pa(1000.0)),
            solubility: ConstantSolubility::new(1.5e-5, 8e-3),
            water: IncompressibleFluid::new(kgpm3(1000.0), pas(1e-3)),
            gas: IncompressibleFluid::new(kgpm3(1.2), pas(1.8e-5)),
            n,
            state,
        }
    }

    fn cells(&self) -> Vec<CellGeometry<1>> {
        (0..self.n - 1)
            .map(|c| CellGeometry::line([c, c + 1], c as f64, (c + 1) as f64, 1.0).unwrap())
            .collect()
    }
}

impl BoxProblem<1> for Chain {
    fn materials(&self) -> MaterialSet<'_> {
        MaterialSet::new(&self.law, &self.solubility, &self.water, &self.gas)
    }

    fn gravity(&self) -> SVector<f64, 1> {
        SVector::zeros()
    }

    fn num_vertices(&self) -> usize {
        self.n
    }

    fn vertex_position(&self, vertex: usize) -> SVector<f64, 1> {
        SVector::from([vertex as f64])
    }

    fn porosity(&self, _pos: &SVector<f64, 1>) -> f64 {
        0.4
    }

    fn permeability(&self, _pos: &SVector<f64, 1>) -> SMatrix<f64, 1, 1> {
        SMatrix::<f64, 1, 1>::new(1e-11)
    }

    fn initial_phase_state(&self, _vertex: usize, _pos: &SVector<f64, 1>) -> PhaseState {
        self.state
    }
}

fn global_residual(chain: &Chain, store: &PhaseStateStore, sol: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let config = BoxConfig::default();
    let energy = Isothermal::default();
    let cells = chain.cells();
    let mut lj = LocalJacobian::new(chain, &energy, store, &config).unwrap();
    let mut global = vec![[0.0; 2]; chain.n];
    for cell in &cells {
        lj.set_params(cell, sol, sol).unwrap();
        let local = lj.local_residual(1.0).unwrap();
        for (node, res) in local.iter().enumerate() {
            let v = cell.vertices[node];
            global[v][0] += res[0];
            global[v][1] += res[1];
        }
    }
    global
}

#[test]
fn linear_pressure_is_steady_inside() {
    let chain = Chain::new(5, PhaseState::WettingOnly);
    let store = PhaseStateStore::from_problem(&chain);
    let sol: Vec<[f64; 2]> = (0..5).map(|v| [3e5 - 5e4 * v as f64, 1e-6]).collect();

    let res = global_residual(&chain, &store, &sol);
    let q = 1e-11 * 5e4 * 1000.0 / 1e-3;
    for r in &res[1..4] {
        assert!(r[0].abs() < 1e-12 * q);
        assert!(r[1].abs() < 1e-12 * q);
    }
    // water leaves the high-pressure end and enters the low-pressure end
    assert!((res[0][0] - q * (1.0 - 1e-6)).abs() < 1e-9 * q);
    assert!((res[4][0] + q * (1.0 - 1e-6)).abs() < 1e-9 * q);
    let total: f64 = res.iter().map(|r| r[0]).sum();
    assert!(total.abs() < 1e-12 * q);
}

#[test]
fn reversed_gradient_reverses_flow() {
    let chain = Chain::new(3, PhaseState::WettingOnly);
    let store = PhaseStateStore::from_problem(&chain);
    let rising: Vec<[f64; 2]> = (0..3).map(|v| [1e5 + 5e4 * v as f64, 2e-6]).collect();
    let res = global_residual(&chain, &store, &rising);
    assert!(res[0][0] < 0.0);
    assert!(res[2][0] > 0.0);
}

#[test]
fn gas_rises_through_upstream_mobility() {
    let chain = Chain::new(2, PhaseState::BothPhases);
    let store = PhaseStateStore::from_problem(&chain);
    // equal water pressure, more gas on the left: nonwetting pressure
    // drives gas to the right
    let sol = [[1e5, 0.6], [1e5, 0.2]];
    let res = global_residual(&chain, &store, &sol);

    let dpn = 1000.0 * (0.6 - 0.2);
    let mob_n_up = 0.6 / 1.8e-5;
    let expected_air = 1e-11 * dpn * 1.2 * mob_n_up * (1.0 - 8e-3);
    assert!((res[0][1] - expected_air).abs() < 1e-9 * expected_air);
}
