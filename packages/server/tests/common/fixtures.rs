//! In-memory wiring of the search services for tests.

use std::sync::Arc;
use std::time::Duration;

use hotel_search::common::GroupId;
use hotel_search::domains::hotels::models::SourceConfig;
use hotel_search::domains::hotels::store::{HotelStore, MemoryHotelStore};
use hotel_search::kernel::jobs::{GroupStatus, JobBackend};
use hotel_search::kernel::{BaseCrawler, BaseLocationResolver, MockLocationResolver};
use hotel_search::server::{AppDeps, AppState};

/// Short enough to keep hung-child tests fast, long enough for a loaded CI box.
pub const TEST_OUTCOME_TIMEOUT: Duration = Duration::from_millis(300);

/// A fully wired app over a memory store.
pub struct TestApp {
    pub state: AppState,
    pub memory: Arc<MemoryHotelStore>,
}

pub struct TestAppBuilder {
    crawler: Arc<dyn BaseCrawler>,
    resolver: Arc<dyn BaseLocationResolver>,
    store: Option<Arc<dyn HotelStore>>,
    memory: Arc<MemoryHotelStore>,
    sources: Vec<SourceConfig>,
    concurrency: usize,
}

impl TestAppBuilder {
    pub fn new(crawler: Arc<dyn BaseCrawler>) -> Self {
        Self {
            crawler,
            resolver: Arc::new(MockLocationResolver::new()),
            store: None,
            memory: Arc::new(MemoryHotelStore::new()),
            sources: vec![
                SourceConfig::new("booking_spider"),
                SourceConfig::new("expedia_spider"),
            ],
            concurrency: 4,
        }
    }

    pub fn sources(mut self, sources: Vec<SourceConfig>) -> Self {
        self.sources = sources;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn BaseLocationResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use `store` for writes and reads while keeping the memory store for
    /// bookmarks and direct inspection.
    pub fn store(mut self, memory: Arc<MemoryHotelStore>, store: Arc<dyn HotelStore>) -> Self {
        self.memory = memory;
        self.store = Some(store);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn build(self) -> TestApp {
        let store = self.store.unwrap_or_else(|| self.memory.clone());
        let state = AppState::build(AppDeps {
            store,
            bookmarks: self.memory.clone(),
            crawler: self.crawler,
            resolver: self.resolver,
            sources: self.sources,
            worker_concurrency: self.concurrency,
            outcome_fetch_timeout: TEST_OUTCOME_TIMEOUT,
        });
        TestApp {
            state,
            memory: self.memory,
        }
    }
}

/// Wait until the group reaches `want`, panicking after a few seconds.
pub async fn wait_for_status(backend: &dyn JobBackend, group_id: GroupId, want: GroupStatus) {
    for _ in 0..400 {
        if let Ok(Some(state)) = backend.group_state(group_id).await {
            if state.status == want {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("group {} never reached {}", group_id, want);
}

/// Wait until the group is SUCCESS or FAILURE.
pub async fn wait_for_completion(backend: &dyn JobBackend, group_id: GroupId) -> GroupStatus {
    for _ in 0..400 {
        if let Ok(Some(state)) = backend.group_state(group_id).await {
            if state.status.is_complete() {
                return state.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("group {} never completed", group_id);
}
