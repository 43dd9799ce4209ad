//! topkit: streaming top-N frequency tracking primitives.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;
pub mod error;
pub mod rank;
pub mod rate;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
