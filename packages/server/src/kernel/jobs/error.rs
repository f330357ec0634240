use std::time::Duration;

use thiserror::Error;

use crate::common::{GroupId, JobId};

/// Faults inside the execution backend itself.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("search group {0} was already submitted")]
    DuplicateGroup(GroupId),

    #[error("worker pool is shut down")]
    PoolClosed,

    #[error("backend error: {0}")]
    Internal(String),
}

/// Problems met while combining child outcomes into a poll response.
///
/// These never escape the poller: each one becomes text in the response's
/// `error` field.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("job {job_id} ({source_name}) returned an unrecognized outcome: {reason}")]
    MalformedOutcome {
        job_id: JobId,
        source_name: String,
        reason: String,
    },

    #[error("job {job_id} ({source_name}) did not report an outcome within {}ms", timeout.as_millis())]
    FetchTimeout {
        job_id: JobId,
        source_name: String,
        timeout: Duration,
    },

    #[error("job {job_id} ({source_name}) crashed: {reason}")]
    ChildCrashed {
        job_id: JobId,
        source_name: String,
        reason: String,
    },

    #[error("job {job_id} ({source_name}) never ran: worker pool shut down")]
    ChildAbandoned { job_id: JobId, source_name: String },

    #[error("job {job_id} ({source_name}) outcome channel closed")]
    ChannelClosed { job_id: JobId, source_name: String },

    #[error("search group {0} has no crawl jobs")]
    NoChildren(GroupId),

    #[error("could not read search group {group_id}: {source}")]
    Backend {
        group_id: GroupId,
        #[source]
        source: BackendError,
    },
}
