//! Crawl job runner.
//!
//! Runs one source's crawl for one group and reports the result as a
//! [`JobOutcome`]. Nothing here is allowed to escape as an error: a missing
//! tool, a bad exit, a malformed line or a dead database all end up as text
//! in a `Failure` outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domains::hotels::models::ScrapedHotel;
use crate::domains::hotels::store::HotelStore;
use crate::kernel::jobs::{JobDescriptor, JobExecutor, JobOutcome};
use crate::kernel::{BaseCrawler, BaseLocationResolver, RunnerError};

/// Items buffered between the crawler and the persistence loop.
const ITEM_BUFFER: usize = 64;

/// Counters for one job's persistence loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistStats {
    pub yielded: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub last_error: Option<String>,
}

impl PersistStats {
    pub fn persisted(&self) -> usize {
        self.created + self.updated
    }

    /// Every yielded record that was a persistence candidate failed.
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.persisted() == 0
    }
}

pub struct CrawlRunner {
    crawler: Arc<dyn BaseCrawler>,
    store: Arc<dyn HotelStore>,
    resolver: Arc<dyn BaseLocationResolver>,
    /// Sources that need a location code before they can run.
    coded_sources: Vec<String>,
}

impl CrawlRunner {
    pub fn new(
        crawler: Arc<dyn BaseCrawler>,
        store: Arc<dyn HotelStore>,
        resolver: Arc<dyn BaseLocationResolver>,
        coded_sources: Vec<String>,
    ) -> Self {
        Self {
            crawler,
            store,
            resolver,
            coded_sources,
        }
    }

    /// Run one job to completion. Always returns an outcome.
    pub async fn run(&self, mut descriptor: JobDescriptor) -> JobOutcome {
        let job_id = descriptor.job_id;
        let source = descriptor.source_name.clone();

        if let Err(e) = self.ensure_location_code(&mut descriptor).await {
            warn!(job_id = %job_id, source = %source, error = %e, "location code unavailable");
            return JobOutcome::failure(job_id, source, e.to_string());
        }

        let (tx, rx) = mpsc::channel(ITEM_BUFFER);
        let (crawl_result, stats) = tokio::join!(
            self.crawler.crawl(&descriptor, tx),
            self.persist_items(&descriptor, rx)
        );

        info!(
            group_id = %descriptor.group_id,
            job_id = %job_id,
            source = %source,
            yielded = stats.yielded,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            failed = stats.failed,
            "crawl job finished"
        );

        if let Err(e) = crawl_result {
            warn!(job_id = %job_id, source = %source, error = %e, "crawl failed");
            return JobOutcome::failure(job_id, source, e.to_string());
        }

        if stats.all_failed() {
            let last_error = stats.last_error.unwrap_or_default();
            return JobOutcome::failure(
                job_id,
                source,
                format!(
                    "could not persist any of {} scraped records: {}",
                    stats.failed, last_error
                ),
            );
        }

        JobOutcome::success(job_id, source)
    }

    async fn ensure_location_code(&self, descriptor: &mut JobDescriptor) -> Result<(), RunnerError> {
        if descriptor.query.location_code.is_some()
            || !self.coded_sources.contains(&descriptor.source_name)
        {
            return Ok(());
        }

        let code = self
            .resolver
            .resolve(&descriptor.source_name, &descriptor.query.location)
            .await
            .map_err(|e| RunnerError::Resolver {
                source_name: descriptor.source_name.clone(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| RunnerError::LocationUnresolved {
                source_name: descriptor.source_name.clone(),
                location: descriptor.query.location.clone(),
            })?;

        debug!(job_id = %descriptor.job_id, code = %code, "resolved location code");
        descriptor.query.location_code = Some(code);
        Ok(())
    }

    async fn persist_items(
        &self,
        descriptor: &JobDescriptor,
        mut items: mpsc::Receiver<ScrapedHotel>,
    ) -> PersistStats {
        let mut stats = PersistStats::default();

        while let Some(item) = items.recv().await {
            stats.yielded += 1;

            let Some(hotel) = item.into_new_hotel(descriptor.group_id, &descriptor.source_name) else {
                warn!(
                    job_id = %descriptor.job_id,
                    source = %descriptor.source_name,
                    "skipping scraped item without name or location"
                );
                stats.skipped += 1;
                continue;
            };

            match self.store.upsert(&hotel).await {
                Ok(outcome) if outcome.created => {
                    debug!(hotel_id = outcome.hotel.id, name = %outcome.hotel.name, "created hotel");
                    stats.created += 1;
                }
                Ok(outcome) => {
                    debug!(hotel_id = outcome.hotel.id, name = %outcome.hotel.name, "updated hotel");
                    stats.updated += 1;
                }
                Err(e) => {
                    warn!(
                        job_id = %descriptor.job_id,
                        source = %descriptor.source_name,
                        name = %hotel.name,
                        error = %e,
                        "failed to persist hotel"
                    );
                    stats.failed += 1;
                    stats.last_error = Some(e.to_string());
                }
            }
        }

        stats
    }
}

#[async_trait]
impl JobExecutor for CrawlRunner {
    async fn execute(&self, descriptor: JobDescriptor) -> JobOutcome {
        self.run(descriptor).await
    }
}
