pub mod hotel;
pub mod search_query;
pub mod source;

pub use hotel::*;
pub use search_query::*;
pub use source::*;
