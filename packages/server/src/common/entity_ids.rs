//! Typed ID definitions for the search entities.

pub use super::id::Id;

/// Marker type for one fan-out of crawl jobs created from a single query.
pub struct SearchGroup;

/// Marker type for one source-specific crawl execution within a group.
pub struct CrawlJob;

/// Typed ID for search groups (the `search_task_id` tag on hotels).
pub type GroupId = Id<SearchGroup>;

/// Typed ID for crawl jobs.
pub type JobId = Id<CrawlJob>;

/// Database id of a stored hotel row.
pub type HotelId = i64;
