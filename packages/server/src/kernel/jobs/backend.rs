//! Execution backend for crawl job groups.
//!
//! [`LocalJobBackend`] is an in-process worker pool:
//!
//! ```text
//! submit_group(group, descriptors)
//!     │
//!     ├─► JobGroupRegistry.register()     (all children queued at once)
//!     └─► tokio::spawn per child
//!             ├─► wait for a pool permit  (Semaphore, `concurrency` slots)
//!             ├─► publish Running
//!             ├─► JobExecutor.execute(descriptor) in its own task
//!             └─► publish Finished(outcome json) | Crashed(panic)
//! ```
//!
//! Submission returns as soon as the children are registered; nothing waits
//! for a job to start.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::BackendError;
use super::job::{ChildState, GroupState, JobDescriptor};
use super::outcome::JobOutcome;
use super::registry::{ChildJob, ChildTicket, JobGroupRegistry};
use crate::common::GroupId;

/// Runs a single job to completion. Implementations must always return an
/// outcome; faults are reported as [`JobOutcome::Failure`].
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, descriptor: JobDescriptor) -> JobOutcome;
}

/// Where groups are submitted and where their progress is read back.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit all descriptors as one group. Returns without waiting for any job.
    async fn submit_group(
        &self,
        group_id: GroupId,
        descriptors: Vec<JobDescriptor>,
    ) -> Result<(), BackendError>;

    /// Execution status of the group; `None` if the backend does not know it.
    async fn group_state(&self, group_id: GroupId) -> Result<Option<GroupState>, BackendError>;

    /// Child jobs of the group. Empty if the group is unknown.
    async fn children(&self, group_id: GroupId) -> Result<Vec<ChildJob>, BackendError>;
}

/// Configuration for the local worker pool.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// Maximum number of jobs running at once
    pub concurrency: usize,
    /// Worker ID for log correlation
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobWorkerConfig {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            ..Default::default()
        }
    }
}

/// In-process backend: a registry plus a bounded pool of tokio tasks.
pub struct LocalJobBackend {
    registry: Arc<JobGroupRegistry>,
    executor: Arc<dyn JobExecutor>,
    permits: Arc<Semaphore>,
    config: JobWorkerConfig,
}

impl LocalJobBackend {
    pub fn new(executor: Arc<dyn JobExecutor>) -> Self {
        Self::with_config(executor, JobWorkerConfig::default())
    }

    pub fn with_config(executor: Arc<dyn JobExecutor>, config: JobWorkerConfig) -> Self {
        Self {
            registry: Arc::new(JobGroupRegistry::new()),
            executor,
            permits: Arc::new(Semaphore::new(config.concurrency.max(1))),
            config,
        }
    }

    /// Stop accepting work. Jobs already holding a permit run to completion;
    /// queued jobs are marked abandoned and their groups fail.
    pub fn shutdown(&self) {
        info!(worker_id = %self.config.worker_id, "job worker pool shutting down");
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Periodically evict groups older than `retention`.
    pub fn spawn_retention_sweep(&self, retention: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // Skip first immediate tick

            loop {
                interval.tick().await;
                let evicted = registry.evict_older_than(retention).await;
                if evicted > 0 {
                    debug!(evicted, "evicted expired search groups");
                }
            }
        })
    }
}

/// Run one child: wait for a permit, execute, publish the result.
async fn run_child(ticket: ChildTicket, executor: Arc<dyn JobExecutor>, permits: Arc<Semaphore>) {
    let job_id = ticket.descriptor.job_id;
    let source = ticket.descriptor.source_name.clone();

    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            warn!(job_id = %job_id, source = %source, "worker pool closed before job could run");
            ticket.publish(ChildState::Abandoned);
            return;
        }
    };

    ticket.publish(ChildState::Running);
    debug!(job_id = %job_id, source = %source, "job started");

    let descriptor = ticket.descriptor.clone();
    let result = tokio::spawn(async move { executor.execute(descriptor).await }).await;

    match result {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(payload) => {
                debug!(job_id = %job_id, source = %source, success = outcome.is_success(), "job finished");
                ticket.publish(ChildState::Finished(payload));
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to serialize job outcome");
                ticket.publish(ChildState::Crashed(format!("could not serialize outcome: {}", e)));
            }
        },
        Err(e) => {
            let reason = if e.is_panic() {
                "job task panicked".to_string()
            } else {
                format!("job task aborted: {}", e)
            };
            error!(job_id = %job_id, source = %source, reason = %reason, "job crashed");
            ticket.publish(ChildState::Crashed(reason));
        }
    }
}

#[async_trait]
impl JobBackend for LocalJobBackend {
    async fn submit_group(
        &self,
        group_id: GroupId,
        descriptors: Vec<JobDescriptor>,
    ) -> Result<(), BackendError> {
        if self.is_shut_down() {
            return Err(BackendError::PoolClosed);
        }

        let tickets = self.registry.register(group_id, descriptors).await?;
        info!(
            group_id = %group_id,
            jobs = tickets.len(),
            worker_id = %self.config.worker_id,
            "search group submitted"
        );

        for ticket in tickets {
            tokio::spawn(run_child(ticket, self.executor.clone(), self.permits.clone()));
        }

        Ok(())
    }

    async fn group_state(&self, group_id: GroupId) -> Result<Option<GroupState>, BackendError> {
        Ok(self.registry.group_state(group_id).await)
    }

    async fn children(&self, group_id: GroupId) -> Result<Vec<ChildJob>, BackendError> {
        Ok(self.registry.children(group_id).await.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::jobs::{CrawlQuery, GroupStatus};
    use chrono::NaiveDate;

    /// Executor that blocks until the gate hands out a permit, then succeeds.
    struct GatedExecutor {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl JobExecutor for GatedExecutor {
        async fn execute(&self, descriptor: JobDescriptor) -> JobOutcome {
            let _ = self.gate.acquire().await;
            JobOutcome::success(descriptor.job_id, descriptor.source_name)
        }
    }

    struct PanickingExecutor;

    #[async_trait]
    impl JobExecutor for PanickingExecutor {
        async fn execute(&self, descriptor: JobDescriptor) -> JobOutcome {
            if descriptor.source_name == "bad" {
                panic!("spider exploded");
            }
            JobOutcome::success(descriptor.job_id, descriptor.source_name)
        }
    }

    fn descriptors(group_id: GroupId, sources: &[&str]) -> Vec<JobDescriptor> {
        sources
            .iter()
            .map(|source| JobDescriptor {
                source_name: source.to_string(),
                group_id,
                job_id: JobId::new(),
                query: CrawlQuery {
                    location: "London".to_string(),
                    price_ceiling: None,
                    min_rating: None,
                    check_in: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    location_code: None,
                },
            })
            .collect()
    }

    async fn wait_for_status(backend: &LocalJobBackend, group_id: GroupId, want: GroupStatus) {
        for _ in 0..200 {
            if let Some(state) = backend.group_state(group_id).await.unwrap() {
                if state.status == want {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("group never reached {}", want);
    }

    #[test]
    fn test_config_defaults() {
        let config = JobWorkerConfig::default();
        assert_eq!(config.concurrency, 4);
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[test]
    fn test_config_clamps_zero_concurrency() {
        assert_eq!(JobWorkerConfig::with_concurrency(0).concurrency, 1);
    }

    #[tokio::test]
    async fn test_submit_returns_before_jobs_finish() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = LocalJobBackend::new(Arc::new(GatedExecutor { gate: gate.clone() }));
        let group_id = GroupId::new();

        backend
            .submit_group(group_id, descriptors(group_id, &["a", "b"]))
            .await
            .unwrap();

        let state = backend.group_state(group_id).await.unwrap().unwrap();
        assert!(!state.status.is_complete());

        gate.add_permits(2);
        wait_for_status(&backend, group_id, GroupStatus::Success).await;
    }

    #[tokio::test]
    async fn test_panicking_job_only_fails_its_own_child() {
        let backend = LocalJobBackend::new(Arc::new(PanickingExecutor));
        let group_id = GroupId::new();

        backend
            .submit_group(group_id, descriptors(group_id, &["good", "bad"]))
            .await
            .unwrap();
        wait_for_status(&backend, group_id, GroupStatus::Success).await;

        let children = backend.children(group_id).await.unwrap();
        let timeout = Duration::from_millis(100);
        let mut crashed = 0;
        for child in &children {
            match child.handle.fetch_outcome(timeout).await {
                Ok(outcome) => assert_eq!(outcome.source_name(), "good"),
                Err(e) => {
                    assert!(e.to_string().contains("panicked"));
                    crashed += 1;
                }
            }
        }
        assert_eq!(crashed, 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let backend = LocalJobBackend::new(Arc::new(PanickingExecutor));
        backend.shutdown();

        let group_id = GroupId::new();
        let err = backend
            .submit_group(group_id, descriptors(group_id, &["good"]))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::PoolClosed));
    }

    #[tokio::test]
    async fn test_shutdown_abandons_queued_jobs() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = LocalJobBackend::with_config(
            Arc::new(GatedExecutor { gate: gate.clone() }),
            JobWorkerConfig::with_concurrency(1),
        );
        let group_id = GroupId::new();

        backend
            .submit_group(group_id, descriptors(group_id, &["a", "b"]))
            .await
            .unwrap();
        wait_for_status(&backend, group_id, GroupStatus::Started).await;

        backend.shutdown();
        gate.add_permits(2);

        wait_for_status(&backend, group_id, GroupStatus::Failure).await;
        let state = backend.group_state(group_id).await.unwrap().unwrap();
        assert!(state.failure_reason.unwrap().contains("shut down"));
    }

    #[tokio::test]
    async fn test_unknown_group_has_no_children() {
        let backend = LocalJobBackend::new(Arc::new(PanickingExecutor));
        let group_id = GroupId::new();
        assert!(backend.group_state(group_id).await.unwrap().is_none());
        assert!(backend.children(group_id).await.unwrap().is_empty());
    }
}
