//! Per-job handles used by the poller to read child outcomes.

use std::time::Duration;

use tokio::sync::watch;

use super::error::AggregationError;
use super::job::ChildState;
use super::outcome::JobOutcome;
use crate::common::JobId;

/// Read side of one child job's state.
///
/// Cloning is cheap; every clone observes the same job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: JobId,
    source_name: String,
    state: watch::Receiver<ChildState>,
}

impl JobHandle {
    pub fn new(job_id: JobId, source_name: impl Into<String>, state: watch::Receiver<ChildState>) -> Self {
        Self {
            job_id,
            source_name: source_name.into(),
            state,
        }
    }

    /// Create a handle together with the sender that drives it.
    pub fn channel(job_id: JobId, source_name: impl Into<String>) -> (watch::Sender<ChildState>, Self) {
        let (tx, rx) = watch::channel(ChildState::Queued);
        (tx, Self::new(job_id, source_name, rx))
    }

    /// A handle whose job already finished with the given raw payload.
    pub fn finished(job_id: JobId, source_name: impl Into<String>, payload: serde_json::Value) -> Self {
        let (_tx, rx) = watch::channel(ChildState::Finished(payload));
        Self::new(job_id, source_name, rx)
    }

    /// Current state without waiting.
    pub fn state(&self) -> ChildState {
        self.state.borrow().clone()
    }

    /// Wait up to `timeout` for the job to reach a terminal state and decode
    /// its outcome.
    pub async fn fetch_outcome(&self, timeout: Duration) -> Result<JobOutcome, AggregationError> {
        let mut rx = self.state.clone();

        let state = match tokio::time::timeout(timeout, rx.wait_for(ChildState::is_terminal)).await {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => {
                return Err(AggregationError::ChannelClosed {
                    job_id: self.job_id,
                    source_name: self.source_name.clone(),
                })
            }
            Err(_) => {
                return Err(AggregationError::FetchTimeout {
                    job_id: self.job_id,
                    source_name: self.source_name.clone(),
                    timeout,
                })
            }
        };

        match state {
            ChildState::Finished(payload) => {
                serde_json::from_value(payload).map_err(|e| AggregationError::MalformedOutcome {
                    job_id: self.job_id,
                    source_name: self.source_name.clone(),
                    reason: e.to_string(),
                })
            }
            ChildState::Crashed(reason) => Err(AggregationError::ChildCrashed {
                job_id: self.job_id,
                source_name: self.source_name.clone(),
                reason,
            }),
            ChildState::Abandoned => Err(AggregationError::ChildAbandoned {
                job_id: self.job_id,
                source_name: self.source_name.clone(),
            }),
            // wait_for only returns terminal states
            ChildState::Queued | ChildState::Running => Err(AggregationError::ChannelClosed {
                job_id: self.job_id,
                source_name: self.source_name.clone(),
            }),
        }
    }
}
