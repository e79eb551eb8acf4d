//! Box-scheme local assembly for two-phase, two-component porous media flow.
//!
//! This crate evaluates the per-control-volume storage and per-face flux
//! terms of the vertex-centered finite-volume (box) discretization, keeps
//! the per-vertex phase state that decides the meaning of the second
//! primary variable, and performs the primary variable switch when a phase
//! appears or disappears.
//!
//! The unknowns per vertex are the wetting pressure `pw` and a switch
//! variable whose meaning depends on the [`PhaseState`]:
//!
//! | state | second primary variable |
//! |---|---|
//! | `BothPhases` | nonwetting saturation |
//! | `WettingOnly` | mass fraction of the nonwetting component in the wetting phase |
//! | `NonwettingOnly` | mass fraction of the wetting component in the nonwetting phase |
//!
//! Mesh traversal, geometry construction, the global Newton loop and the
//! constitutive laws live outside; see [`BoxProblem`], [`CellGeometry`] and
//! [`bx_material::MaterialSet`].

pub mod assembler;
pub mod config;
pub mod deflection;
pub mod energy;
pub mod error;
pub mod geometry;
pub mod indices;
pub mod jacobian;
pub mod node_vars;
pub mod output;
pub mod phase_store;
pub mod problem;
pub mod switch;

#[cfg(test)]
mod testing;

pub use assembler::{LocalJacobian, harmonic_mean_k};
pub use config::{BoxConfig, DiffusionParams, SwitchTolerances};
pub use deflection::DeflectionGuard;
pub use energy::{ENERGY_EQ, EnergyModel, Isothermal, NonIsothermal, TEMPERATURE_IDX};
pub use error::{BoxError, BoxResult};
pub use geometry::{CellGeometry, ScvFace, SubControlVolume};
pub use indices::PhaseState;
pub use node_vars::{NodeVars, update_node_vars};
pub use output::VertexFields;
pub use phase_store::PhaseStateStore;
pub use problem::BoxProblem;
pub use switch::{PhaseEvent, Switch, SwitchController};
