//! Vescalc Common Types
//!
//! Shared types for the vescalc conversion calculator: the fiat reference
//! rate and marketplace aggregate snapshots, and the two-decimal helpers
//! used wherever amounts cross a display or API boundary.

pub mod monetary;
pub mod rates;

pub use monetary::*;
pub use rates::*;
