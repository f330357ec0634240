//! Search polling: rebuild a group's progress from the backend and the store.
//!
//! ```text
//! poll(group_id, actor)
//!     ├─► backend.group_state(group_id)        fault / unknown ─► FAILURE
//!     ├─► PENDING | STARTED                    ─► partial records, no outcomes
//!     └─► SUCCESS | FAILURE
//!             ├─► fetch every child outcome concurrently (bounded wait each)
//!             ├─► store.find_by_group(group_id)
//!             └─► annotate bookmarks for the actor
//! ```
//!
//! Polling never writes and never fails; every problem becomes text in the
//! response's `error` field.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::{ActorId, GroupId, HotelId};
use crate::domains::hotels::models::{Hotel, HotelView};
use crate::domains::hotels::store::{BookmarkReader, HotelStore};
use crate::kernel::jobs::{AggregationError, ChildJob, GroupStatus, JobBackend, JobOutcome};

/// Body of a poll response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub status: GroupStatus,
    pub hotels: Vec<HotelView>,
    pub error: Option<String>,
}

impl PollResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            status: GroupStatus::Failure,
            hotels: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub struct SearchPoller {
    backend: Arc<dyn JobBackend>,
    store: Arc<dyn HotelStore>,
    bookmarks: Arc<dyn BookmarkReader>,
    outcome_timeout: Duration,
}

impl SearchPoller {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        store: Arc<dyn HotelStore>,
        bookmarks: Arc<dyn BookmarkReader>,
        outcome_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            bookmarks,
            outcome_timeout,
        }
    }

    pub async fn poll(&self, group_id: GroupId, actor: Option<&ActorId>) -> PollResponse {
        let state = match self.backend.group_state(group_id).await {
            Ok(Some(state)) if state.child_count > 0 => state,
            Ok(_) => return PollResponse::failure(AggregationError::NoChildren(group_id).to_string()),
            Err(source) => {
                let err = AggregationError::Backend { group_id, source };
                warn!(group_id = %group_id, error = %err, "search group status unavailable");
                return PollResponse::failure(err.to_string());
            }
        };

        let mut errors = Vec::new();

        match state.status {
            GroupStatus::Pending | GroupStatus::Started => {}
            GroupStatus::Success | GroupStatus::Failure => {
                if let Some(reason) = &state.failure_reason {
                    errors.push(reason.clone());
                }
                match self.backend.children(group_id).await {
                    Ok(children) => errors.extend(self.child_errors(group_id, children).await),
                    Err(source) => errors.push(AggregationError::Backend { group_id, source }.to_string()),
                }
            }
        }

        let hotels = match self.store.find_by_group(group_id).await {
            Ok(hotels) => hotels,
            Err(e) => {
                warn!(group_id = %group_id, error = %e, "failed to load search results");
                errors.push(format!("could not load results: {}", e));
                Vec::new()
            }
        };

        let hotels = self.annotate(hotels, actor).await;

        PollResponse {
            status: state.status,
            hotels,
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }

    /// Failure details of every child, in child order. Children are waited
    /// on concurrently.
    async fn child_errors(&self, group_id: GroupId, children: Vec<ChildJob>) -> Vec<String> {
        let fetches = children
            .iter()
            .map(|child| child.handle.fetch_outcome(self.outcome_timeout));
        let results = join_all(fetches).await;

        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(JobOutcome::Success {
                    job_id,
                    source_name,
                }) => {
                    debug!(group_id = %group_id, job_id = %job_id, source = %source_name, "source succeeded");
                }
                Ok(JobOutcome::Failure {
                    job_id,
                    source_name,
                    error,
                }) => {
                    debug!(group_id = %group_id, job_id = %job_id, source = %source_name, error = %error, "source failed");
                    errors.push(error);
                }
                Err(e) => {
                    warn!(group_id = %group_id, error = %e, "could not read job outcome");
                    errors.push(e.to_string());
                }
            }
        }
        errors
    }

    async fn annotate(&self, hotels: Vec<Hotel>, actor: Option<&ActorId>) -> Vec<HotelView> {
        let bookmarked: HashSet<HotelId> = match actor {
            Some(actor) if !hotels.is_empty() => match self.bookmarks.bookmarked_hotel_ids(actor).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(actor = %actor, error = %e, "bookmark lookup failed");
                    HashSet::new()
                }
            },
            _ => HashSet::new(),
        };

        hotels
            .into_iter()
            .map(|hotel| {
                let is_bookmarked = bookmarked.contains(&hotel.id);
                HotelView::from_hotel(hotel, is_bookmarked)
            })
            .collect()
    }
}
