//! Hotels domain - fan-out hotel searches and their scraped results

pub mod activities;
pub mod error;
pub mod models;
pub mod store;

pub use activities::{CrawlRunner, PollResponse, SearchDispatcher, SearchPoller};
pub use error::{DispatchError, PersistenceError};
pub use models::{
    Hotel, HotelView, NewHotel, ScrapedHotel, SearchQuery, SourceConfig, UpsertOutcome,
    ValidatedSearch,
};
pub use store::{BookmarkReader, HotelStore, MemoryHotelStore, PostgresHotelStore};
