//! Job model: descriptors submitted to the backend and the states they move through.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{GroupId, JobId};

/// Query parameters shared by every job in a group, plus the per-source
/// location code when one applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlQuery {
    pub location: String,
    pub price_ceiling: Option<String>,
    pub min_rating: Option<u8>,
    pub check_in: NaiveDate,
    /// Source-local location code (e.g. an Agoda city id).
    pub location_code: Option<String>,
}

/// One source's crawl within a group. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub source_name: String,
    pub group_id: GroupId,
    pub job_id: JobId,
    pub query: CrawlQuery,
}

/// Execution status of a whole group.
///
/// `Success` and `Failure` are terminal. Child failures are carried inside
/// `Success`; `Failure` means the backend itself could not run the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Pending,
    Started,
    Success,
    Failure,
}

impl GroupStatus {
    pub fn is_complete(self) -> bool {
        matches!(self, GroupStatus::Success | GroupStatus::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupStatus::Pending => "PENDING",
            GroupStatus::Started => "STARTED",
            GroupStatus::Success => "SUCCESS",
            GroupStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time state of one child job as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildState {
    Queued,
    Running,
    /// The serialized outcome the job produced.
    Finished(serde_json::Value),
    /// The job task died without producing an outcome.
    Crashed(String),
    /// The pool shut down before the job could run.
    Abandoned,
}

impl ChildState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChildState::Finished(_) | ChildState::Crashed(_) | ChildState::Abandoned
        )
    }
}

/// Snapshot of a group's execution status.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupState {
    pub status: GroupStatus,
    pub child_count: usize,
    /// Set only when `status` is `Failure`.
    pub failure_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl GroupState {
    /// Derive the group status from its children.
    pub fn from_children<'a>(
        children: impl IntoIterator<Item = &'a ChildState>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let mut child_count = 0;
        let mut queued = 0;
        let mut terminal = 0;
        let mut abandoned = 0;

        for child in children {
            child_count += 1;
            match child {
                ChildState::Queued => queued += 1,
                ChildState::Abandoned => {
                    abandoned += 1;
                    terminal += 1;
                }
                state if state.is_terminal() => terminal += 1,
                _ => {}
            }
        }

        let (status, failure_reason) = if child_count == 0 {
            (GroupStatus::Failure, Some("group has no jobs".to_string()))
        } else if abandoned > 0 && terminal == child_count {
            (
                GroupStatus::Failure,
                Some(format!(
                    "worker pool shut down before {} of {} jobs could run",
                    abandoned, child_count
                )),
            )
        } else if terminal == child_count {
            (GroupStatus::Success, None)
        } else if queued == child_count {
            (GroupStatus::Pending, None)
        } else {
            (GroupStatus::Started, None)
        };

        Self {
            status,
            child_count,
            failure_reason,
            submitted_at,
        }
    }
}
