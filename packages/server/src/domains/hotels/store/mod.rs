//! Result store for scraped hotels.
//!
//! Writers (crawl runners) only upsert; readers (poller, listing routes) only
//! query. The identity key `(name, location, source)` is enforced by each
//! backend, so concurrent runners never create duplicates.

mod memory;
mod postgres;

pub use memory::MemoryHotelStore;
pub use postgres::PostgresHotelStore;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::common::{ActorId, GroupId, HotelId};
use crate::domains::hotels::error::PersistenceError;
use crate::domains::hotels::models::{Hotel, NewHotel, UpsertOutcome};

#[async_trait]
pub trait HotelStore: Send + Sync {
    /// Insert, or overwrite the mutable fields of the row with the same
    /// identity key. The tag and `scraped_at` always move to this write.
    async fn upsert(&self, hotel: &NewHotel) -> Result<UpsertOutcome, PersistenceError>;

    /// Hotels last tagged with `group_id`, newest first.
    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Hotel>, PersistenceError>;

    /// All hotels, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Hotel>, PersistenceError>;

    async fn health_check(&self) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait BookmarkReader: Send + Sync {
    async fn bookmarked_hotel_ids(&self, actor: &ActorId) -> Result<HashSet<HotelId>, PersistenceError>;
}
