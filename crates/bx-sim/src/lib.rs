//! Transient two-phase, two-component simulation of a 1-D column.
//!
//! Provides:
//! - `Column`: homogeneous column problem for the box assembly
//! - `Simulator`: implicit Euler stepping with Newton iterations, the
//!   primary variable switch after every update and time step cutback
//! - `Scenario`: YAML scenario files, built into a `ColumnSim` for the
//!   isothermal or the non-isothermal model

pub mod column;
pub mod error;
pub mod options;
pub mod scenario;
pub mod simulator;

pub use column::{Column, ColumnMaterials};
pub use error::{SimError, SimResult};
pub use options::{NewtonOptions, SimOptions};
pub use scenario::{
    BoundarySpec, ColumnEnd, ColumnRecord, ColumnSim, ColumnSpec, EnergySpec, RegionSpec, Scenario,
};
pub use simulator::{SimRecord, Simulator, StepReport};
