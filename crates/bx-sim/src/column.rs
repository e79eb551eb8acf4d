//! Homogeneous one-dimensional column.
//!
//! The column axis is `x`, from 0 at the bottom to `length` at the top.
//! Gravity acts along the axis; a negative value points downwards.

use crate::error::{SimError, SimResult};
use bx_box::{BoxProblem, CellGeometry, PhaseState};
use bx_material::{MaterialLaw, MaterialSet, PhaseFluid, Solubility};
use nalgebra::{SMatrix, SVector};

/// Owned constitutive laws of a column.
pub struct ColumnMaterials {
    pub law: Box<dyn MaterialLaw>,
    pub solubility: Box<dyn Solubility>,
    pub wetting: Box<dyn PhaseFluid>,
    pub nonwetting: Box<dyn PhaseFluid>,
}

pub struct Column {
    materials: ColumnMaterials,
    length: f64,
    cells: usize,
    /// Cross-section [m²].
    pub area: f64,
    pub porosity: f64,
    /// Isotropic intrinsic permeability [m²].
    pub permeability: f64,
    /// Gravitational acceleration along the axis [m/s²].
    pub gravity: f64,
    initial_states: Vec<PhaseState>,
}

impl Column {
    /// Column of `cells` equal line cells, initially two-phase everywhere.
    pub fn new(length: f64, cells: usize, materials: ColumnMaterials) -> SimResult<Self> {
        if !(length.is_finite() && length > 0.0) {
            return Err(SimError::InvalidArg {
                what: "column length must be positive",
            });
        }
        if cells == 0 {
            return Err(SimError::InvalidArg {
                what: "column needs at least one cell",
            });
        }
        Ok(Self {
            materials,
            length,
            cells,
            area: 1.0,
            porosity: 0.3,
            permeability: 1e-12,
            gravity: 0.0,
            initial_states: vec![PhaseState::BothPhases; cells + 1],
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn num_cells(&self) -> usize {
        self.cells
    }

    pub fn dx(&self) -> f64 {
        self.length / self.cells as f64
    }

    pub fn set_initial_state(&mut self, vertex: usize, state: PhaseState) -> SimResult<()> {
        let slot = self
            .initial_states
            .get_mut(vertex)
            .ok_or(SimError::InvalidArg {
                what: "vertex out of range",
            })?;
        *slot = state;
        Ok(())
    }

    /// Line cells from bottom to top.
    pub fn cells(&self) -> SimResult<Vec<CellGeometry<1>>> {
        (0..self.cells)
            .map(|c| -> SimResult<CellGeometry<1>> {
                let x0 = self.position(c);
                let x1 = self.position(c + 1);
                Ok(CellGeometry::line([c, c + 1], x0, x1, self.area)?)
            })
            .collect()
    }

    fn position(&self, vertex: usize) -> f64 {
        vertex as f64 * self.dx()
    }
}

impl BoxProblem<1> for Column {
    fn materials(&self) -> MaterialSet<'_> {
        MaterialSet::new(
            self.materials.law.as_ref(),
            self.materials.solubility.as_ref(),
            self.materials.wetting.as_ref(),
            self.materials.nonwetting.as_ref(),
        )
    }

    fn gravity(&self) -> SVector<f64, 1> {
        SVector::from([self.gravity])
    }

    fn num_vertices(&self) -> usize {
        self.cells + 1
    }

    fn vertex_position(&self, vertex: usize) -> SVector<f64, 1> {
        SVector::from([self.position(vertex)])
    }

    fn porosity(&self, _pos: &SVector<f64, 1>) -> f64 {
        self.porosity
    }

    fn permeability(&self, _pos: &SVector<f64, 1>) -> SMatrix<f64, 1, 1> {
        SMatrix::<f64, 1, 1>::new(self.permeability)
    }

    fn initial_phase_state(&self, vertex: usize, _pos: &SVector<f64, 1>) -> PhaseState {
        self.initial_states
            .get(vertex)
            .copied()
            .unwrap_or_default()
    }
}
