//! Load curve optimizers
//!
//! - Shift: LP over a feasible band around the baseline (symmetric, penalized, forward-only)
//! - Shed: scan for the dirtiest window and curtail it

pub mod shed;
pub mod shift;

pub use shed::*;
pub use shift::*;
