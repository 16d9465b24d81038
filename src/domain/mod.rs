pub mod category;
pub mod flexibility;
pub mod types;

pub use category::*;
pub use flexibility::*;
pub use types::*;
