// HTTP middleware
pub mod actor;

pub use actor::*;
