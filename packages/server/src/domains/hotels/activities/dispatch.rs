//! Search dispatch: one query in, one group of crawl jobs out.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::common::{GroupId, JobId};
use crate::domains::hotels::error::DispatchError;
use crate::domains::hotels::models::{SearchQuery, SourceConfig, ValidatedSearch};
use crate::kernel::jobs::{CrawlQuery, JobBackend, JobDescriptor};

pub struct SearchDispatcher {
    backend: Arc<dyn JobBackend>,
    sources: Vec<SourceConfig>,
}

impl SearchDispatcher {
    pub fn new(backend: Arc<dyn JobBackend>, sources: Vec<SourceConfig>) -> Self {
        Self { backend, sources }
    }

    /// Validate the query, submit one job per source and return the group id.
    ///
    /// Returns once the group is registered; no job has necessarily started.
    pub async fn dispatch(&self, query: SearchQuery) -> Result<GroupId, DispatchError> {
        self.dispatch_on(query, Utc::now().date_naive()).await
    }

    /// [`dispatch`](Self::dispatch) with an explicit "today" for the
    /// default check-in date.
    pub async fn dispatch_on(&self, query: SearchQuery, today: NaiveDate) -> Result<GroupId, DispatchError> {
        let search = query.validate(today)?;
        if self.sources.is_empty() {
            return Err(DispatchError::NoSources);
        }

        let group_id = GroupId::new();
        let descriptors = self.descriptors(group_id, &search);

        self.backend.submit_group(group_id, descriptors).await?;

        info!(
            group_id = %group_id,
            location = %search.location,
            sources = self.sources.len(),
            "search dispatched"
        );
        Ok(group_id)
    }

    fn descriptors(&self, group_id: GroupId, search: &ValidatedSearch) -> Vec<JobDescriptor> {
        self.sources
            .iter()
            .map(|source| JobDescriptor {
                source_name: source.name.clone(),
                group_id,
                job_id: JobId::new(),
                query: CrawlQuery {
                    location: search.location.clone(),
                    price_ceiling: search.price_ceiling.clone(),
                    min_rating: search.min_rating,
                    check_in: search.check_in,
                    location_code: search.location_codes.get(&source.name).cloned(),
                },
            })
            .collect()
    }
}
