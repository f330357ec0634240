// Common types shared across the application

pub mod actor;
pub mod entity_ids;
pub mod id;

pub use actor::ActorId;
pub use entity_ids::*;
pub use id::Id;
