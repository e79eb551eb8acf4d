//! bx-material: constitutive laws for two-phase, two-component porous media.
//!
//! Provides:
//! - `MaterialLaw`: capillary pressure and relative permeability
//! - `Solubility`: equilibrium mass fractions of the dissolved components
//! - `PhaseFluid`: phase density and viscosity
//! - `MaterialSet`: the bundle handed to the box discretization
//!
//! The discretization only ever calls these as black boxes. The reference
//! implementations here cover the laws the
//! tests and the column driver need.
//!
//! # Example
//!
//! ```
//! use bx_core::units::{k, kgpm3, pa, pas};
//! use bx_material::{ConstantSolubility, IdealGas, IncompressibleFluid, LinearLaw, MaterialSet};
//!
//! let law = LinearLaw::new(pa(1000.0));
//! let solubility = ConstantSolubility::new(1e-5, 1e-3);
//! let water = IncompressibleFluid::new(kgpm3(1000.0), pas(1e-3));
//! let air = IdealGas::air();
//!
//! let set = MaterialSet::new(&law, &solubility, &water, &air);
//! let pc = set.law.pc(0.7, &[0.0]).unwrap();
//! assert!((pc - 300.0).abs() < 1e-12);
//! let mob_w = set.mob_w(0.7, &[0.0], k(283.15).value, 1e5).unwrap();
//! assert!(mob_w > 0.0);
//! ```

pub mod error;
pub mod fluid;
pub mod law;
pub mod set;
pub mod solubility;

// Re-exports for ergonomics
pub use error::{MaterialError, MaterialResult};
pub use fluid::{IdealGas, IncompressibleFluid, PhaseFluid};
pub use law::{BrooksCorey, LinearLaw, MaterialLaw};
pub use set::MaterialSet;
pub use solubility::{ConstantSolubility, HenrySolubility, Solubility};
