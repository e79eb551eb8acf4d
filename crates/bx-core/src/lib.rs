//! bx-core: shared foundation for boxflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (tolerances, float comparison, finiteness check)
//! - ids (vertex identifiers for errors and logs)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BxError, BxResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
