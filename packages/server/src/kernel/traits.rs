// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Persisting what a crawl yields is the runner's job, not the crawler's.
//
// Naming convention: Base* for trait names (e.g., BaseCrawler)

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::RunnerError;
use super::jobs::JobDescriptor;
use crate::domains::hotels::models::ScrapedHotel;

// =============================================================================
// Crawler Trait (Infrastructure - runs one source's crawl)
// =============================================================================

#[async_trait]
pub trait BaseCrawler: Send + Sync {
    /// Run the crawl described by `descriptor`, sending each scraped item to
    /// `items` as soon as it is produced.
    ///
    /// Items already sent stay sent even if the crawl later fails.
    async fn crawl(
        &self,
        descriptor: &JobDescriptor,
        items: mpsc::Sender<ScrapedHotel>,
    ) -> Result<(), RunnerError>;
}

// =============================================================================
// Location Resolver Trait (Infrastructure - source-local location codes)
// =============================================================================

#[async_trait]
pub trait BaseLocationResolver: Send + Sync {
    /// Look up the source-specific code for a free-text location.
    /// Returns `None` if the source does not know the location.
    async fn resolve(&self, source_name: &str, location: &str) -> Result<Option<String>>;
}
