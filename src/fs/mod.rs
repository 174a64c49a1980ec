pub mod local;
pub mod types;

pub use local::LocalFs;
pub use types::*;
