//! The structured result every crawl job produces exactly once.

use serde::{Deserialize, Serialize};

use crate::common::JobId;

/// Outcome of one crawl job.
///
/// Serialized with a `status` tag so the stored payload reads
/// `{"status": "SUCCESS", "job_id": …, "source_name": …}` or
/// `{"status": "FAILURE", …, "error": …}`. Any other shape fails to
/// deserialize and is treated as a failed child by the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOutcome {
    Success {
        job_id: JobId,
        source_name: String,
    },
    Failure {
        job_id: JobId,
        source_name: String,
        error: String,
    },
}

impl JobOutcome {
    pub fn success(job_id: JobId, source_name: impl Into<String>) -> Self {
        JobOutcome::Success {
            job_id,
            source_name: source_name.into(),
        }
    }

    pub fn failure(job_id: JobId, source_name: impl Into<String>, error: impl Into<String>) -> Self {
        JobOutcome::Failure {
            job_id,
            source_name: source_name.into(),
            error: error.into(),
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            JobOutcome::Success { source_name, .. } | JobOutcome::Failure { source_name, .. } => {
                source_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_payload_shape() {
        let job_id = JobId::new();
        let value = serde_json::to_value(JobOutcome::failure(job_id, "booking_spider", "boom")).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "FAILURE",
                "job_id": job_id.to_string(),
                "source_name": "booking_spider",
                "error": "boom",
            })
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let payload = json!({
            "status": "RETRY",
            "job_id": JobId::new().to_string(),
            "source_name": "booking_spider",
        });
        assert!(serde_json::from_value::<JobOutcome>(payload).is_err());
    }

    #[test]
    fn test_failure_without_error_is_rejected() {
        let payload = json!({
            "status": "FAILURE",
            "job_id": JobId::new().to_string(),
            "source_name": "booking_spider",
        });
        assert!(serde_json::from_value::<JobOutcome>(payload).is_err());
    }

    #[test]
    fn test_bare_string_is_rejected() {
        assert!(serde_json::from_value::<JobOutcome>(json!("done")).is_err());
    }
}
