//! Precomputed finite-volume geometry of one mesh cell.
//!
//! The box scheme builds one sub-control volume per cell node and one face
//! per cell edge. Faces carry the area-weighted normal (oriented from node
//! `i` to node `j`) and the gradient of every nodal shape function at the
//! face integration point.

use crate::error::{BoxError, BoxResult};
use nalgebra::SVector;

#[derive(Clone, Debug, PartialEq)]
pub struct SubControlVolume<const D: usize> {
    /// Global position of the associated vertex.
    pub global: SVector<f64, D>,
    /// Volume of the part of the control volume inside this cell.
    pub volume: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScvFace<const D: usize> {
    pub i: usize,
    pub j: usize,
    /// Outer normal of the sub-control volume of `i`, scaled by the face area.
    pub normal: SVector<f64, D>,
    /// Shape-function gradient of each cell node at the integration point.
    pub grad: Vec<SVector<f64, D>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellGeometry<const D: usize> {
    /// Global vertex index of every local node.
    pub vertices: Vec<usize>,
    pub scv: Vec<SubControlVolume<D>>,
    pub faces: Vec<ScvFace<D>>,
}

impl<const D: usize> CellGeometry<D> {
    pub fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    /// Check the local connectivity for consistency.
    pub fn validate(&self) -> BoxResult<()> {
        let n = self.vertices.len();
        if n < 2 {
            return Err(BoxError::InvalidArg {
                what: "a cell needs at least two nodes",
            });
        }
        if self.scv.len() != n {
            return Err(BoxError::InvalidArg {
                what: "one sub-control volume per node required",
            });
        }
        for face in &self.faces {
            if face.i >= n || face.j >= n || face.i == face.j {
                return Err(BoxError::InvalidArg {
                    what: "face connects invalid nodes",
                });
            }
            if face.grad.len() != n {
                return Err(BoxError::InvalidArg {
                    what: "face needs one gradient per node",
                });
            }
        }
        Ok(())
    }
}

impl CellGeometry<1> {
    /// Two-node line cell between `x0` and `x1` with cross-section `area`.
    pub fn line(vertices: [usize; 2], x0: f64, x1: f64, area: f64) -> BoxResult<Self> {
        let h = x1 - x0;
        if !(h > 0.0 && area > 0.0) {
            return Err(BoxError::InvalidArg {
                what: "line cell needs x1 > x0 and a positive area",
            });
        }
        let half = 0.5 * h * area;
        Ok(Self {
            vertices: vertices.to_vec(),
            scv: vec![
                SubControlVolume {
                    global: SVector::from([x0]),
                    volume: half,
                },
                SubControlVolume {
                    global: SVector::from([x1]),
                    volume: half,
                },
            ],
            faces: vec![ScvFace {
                i: 0,
                j: 1,
                normal: SVector::from([area]),
                grad: vec![SVector::from([-1.0 / h]), SVector::from([1.0 / h])],
            }],
        })
    }
}
