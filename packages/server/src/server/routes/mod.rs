// HTTP routes
pub mod health;
pub mod results;
pub mod search;

pub use health::*;
pub use results::*;
pub use search::*;
