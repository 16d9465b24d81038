pub mod constraints;
pub mod differential;
pub mod error;
pub mod strategies;

pub use constraints::*;
pub use differential::differential;
pub use error::{OptimizerError, OptimizerResult};
pub use strategies::*;
