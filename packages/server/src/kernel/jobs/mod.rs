//! Job infrastructure for fan-out crawl groups.
//!
//! This module provides the kernel-level pieces for running a search group:
//! - [`JobBackend`] - Where groups are submitted and read back
//! - [`LocalJobBackend`] - In-process worker pool implementing it
//! - [`JobGroupRegistry`] - Group id → child descriptors and state channels
//! - [`JobHandle`] - Read side of one child, used to fetch its outcome
//! - [`JobOutcome`] - The structured result every child returns
//!
//! # Architecture
//!
//! ```text
//! SearchDispatcher
//!     │
//!     └─► JobBackend.submit_group(group_id, descriptors)
//!             └─► one task per child, bounded by the worker pool
//!                     └─► JobExecutor.execute(descriptor) -> JobOutcome
//!
//! SearchPoller
//!     │
//!     ├─► JobBackend.group_state(group_id)
//!     └─► JobBackend.children(group_id)
//!             └─► JobHandle.fetch_outcome(timeout)
//! ```
//!
//! Business logic stays in domains; this module only moves descriptors and
//! outcomes around.

mod backend;
mod error;
mod handle;
mod job;
mod outcome;
mod registry;

pub use backend::{JobBackend, JobExecutor, JobWorkerConfig, LocalJobBackend};
pub use error::{AggregationError, BackendError};
pub use handle::JobHandle;
pub use job::{ChildState, CrawlQuery, GroupState, GroupStatus, JobDescriptor};
pub use outcome::JobOutcome;
pub use registry::{ChildJob, ChildTicket, JobGroupRegistry};
