//! Job group registry.
//!
//! Maps each group id to its child jobs. Every child is a descriptor paired
//! with a `watch` channel carrying its [`ChildState`]; workers write to the
//! channel and pollers read it through a [`JobHandle`].
//!
//! ```text
//! register(group, descriptors)
//!     └─► GroupEntry { children: [ChildSlot { descriptor, state tx }] }
//!
//! worker   ──► ticket.state.send(Running / Finished(json) / Crashed)
//! poller   ──► children(group) ─► [ChildJob { descriptor, handle }]
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};

use super::error::BackendError;
use super::handle::JobHandle;
use super::job::{ChildState, GroupState, JobDescriptor};
use crate::common::GroupId;

/// A descriptor paired with the handle used to read its outcome.
#[derive(Debug, Clone)]
pub struct ChildJob {
    pub descriptor: JobDescriptor,
    pub handle: JobHandle,
}

/// Write side of a registered child, handed to the worker that runs it.
#[derive(Debug, Clone)]
pub struct ChildTicket {
    pub descriptor: JobDescriptor,
    pub state: Arc<watch::Sender<ChildState>>,
}

impl ChildTicket {
    /// Publish a new state. Ignored once the child is terminal.
    pub fn publish(&self, next: ChildState) {
        self.state.send_if_modified(|current| {
            if current.is_terminal() {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

struct ChildSlot {
    descriptor: JobDescriptor,
    state: Arc<watch::Sender<ChildState>>,
}

struct GroupEntry {
    submitted_at: DateTime<Utc>,
    children: Vec<ChildSlot>,
}

/// In-process registry of submitted groups.
#[derive(Default)]
pub struct JobGroupRegistry {
    groups: RwLock<HashMap<GroupId, GroupEntry>>,
}

impl JobGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group and all of its children in one step.
    ///
    /// The group becomes visible to readers with every child already queued.
    pub async fn register(
        &self,
        group_id: GroupId,
        descriptors: Vec<JobDescriptor>,
    ) -> Result<Vec<ChildTicket>, BackendError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group_id) {
            return Err(BackendError::DuplicateGroup(group_id));
        }

        let children: Vec<ChildSlot> = descriptors
            .into_iter()
            .map(|descriptor| {
                let (tx, _rx) = watch::channel(ChildState::Queued);
                ChildSlot {
                    descriptor,
                    state: Arc::new(tx),
                }
            })
            .collect();

        let tickets = children
            .iter()
            .map(|slot| ChildTicket {
                descriptor: slot.descriptor.clone(),
                state: slot.state.clone(),
            })
            .collect();

        groups.insert(
            group_id,
            GroupEntry {
                submitted_at: Utc::now(),
                children,
            },
        );

        Ok(tickets)
    }

    /// Derived status of a group, or `None` if it was never registered
    /// (or has been evicted).
    pub async fn group_state(&self, group_id: GroupId) -> Option<GroupState> {
        let groups = self.groups.read().await;
        let entry = groups.get(&group_id)?;
        let states: Vec<ChildState> = entry
            .children
            .iter()
            .map(|slot| slot.state.borrow().clone())
            .collect();
        Some(GroupState::from_children(&states, entry.submitted_at))
    }

    /// Descriptor/handle pairs for every child of a group.
    pub async fn children(&self, group_id: GroupId) -> Option<Vec<ChildJob>> {
        let groups = self.groups.read().await;
        let entry = groups.get(&group_id)?;
        Some(
            entry
                .children
                .iter()
                .map(|slot| ChildJob {
                    descriptor: slot.descriptor.clone(),
                    handle: JobHandle::new(
                        slot.descriptor.job_id,
                        slot.descriptor.source_name.clone(),
                        slot.state.subscribe(),
                    ),
                })
                .collect(),
        )
    }

    /// Drop groups submitted more than `age` ago. Returns how many were removed.
    pub async fn evict_older_than(&self, age: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(age) {
            Ok(age) => Utc::now() - age,
            Err(_) => return 0,
        };
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|_, entry| entry.submitted_at >= cutoff);
        before - groups.len()
    }

    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::jobs::{CrawlQuery, GroupStatus, JobOutcome};
    use chrono::NaiveDate;

    fn descriptor(group_id: GroupId, source: &str) -> JobDescriptor {
        JobDescriptor {
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
        }
    }

    #[tokio::test]
    async fn test_register_makes_group_pending() {
        let registry = JobGroupRegistry::new();
        let group_id = GroupId::new();
        registry
            .register(group_id, vec![descriptor(group_id, "a"), descriptor(group_id, "b")])
            .await
            .unwrap();

        let state = registry.group_state(group_id).await.unwrap();
        assert_eq!(state.status, GroupStatus::Pending);
        assert_eq!(state.child_count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_group_is_rejected() {
        let registry = JobGroupRegistry::new();
        let group_id = GroupId::new();
        registry.register(group_id, vec![descriptor(group_id, "a")]).await.unwrap();
        let err = registry
            .register(group_id, vec![descriptor(group_id, "a")])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::DuplicateGroup(_)));
    }

    #[tokio::test]
    async fn test_ticket_updates_are_visible_through_handles() {
        let registry = JobGroupRegistry::new();
        let group_id = GroupId::new();
        let tickets = registry
            .register(group_id, vec![descriptor(group_id, "a")])
            .await
            .unwrap();

        let ticket = &tickets[0];
        ticket.publish(ChildState::Running);
        assert_eq!(
            registry.group_state(group_id).await.unwrap().status,
            GroupStatus::Started
        );

        let outcome = JobOutcome::success(ticket.descriptor.job_id, "a");
        ticket.publish(ChildState::Finished(serde_json::to_value(&outcome).unwrap()));

        let children = registry.children(group_id).await.unwrap();
        let fetched = children[0]
            .handle
            .fetch_outcome(Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(fetched, outcome);
        assert_eq!(
            registry.group_state(group_id).await.unwrap().status,
            GroupStatus::Success
        );
    }

    #[tokio::test]
    async fn test_terminal_state_is_not_overwritten() {
        let registry = JobGroupRegistry::new();
        let group_id = GroupId::new();
        let tickets = registry
            .register(group_id, vec![descriptor(group_id, "a")])
            .await
            .unwrap();

        tickets[0].publish(ChildState::Crashed("first".into()));
        tickets[0].publish(ChildState::Running);

        let children = registry.children(group_id).await.unwrap();
        assert_eq!(children[0].handle.state(), ChildState::Crashed("first".into()));
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let registry = JobGroupRegistry::new();
        assert!(registry.group_state(GroupId::new()).await.is_none());
        assert!(registry.children(GroupId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_evict_older_than() {
        let registry = JobGroupRegistry::new();
        let group_id = GroupId::new();
        registry.register(group_id, vec![descriptor(group_id, "a")]).await.unwrap();

        assert_eq!(registry.evict_older_than(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(registry.evict_older_than(Duration::from_millis(1)).await, 1);
        assert!(registry.is_empty().await);
    }
}
