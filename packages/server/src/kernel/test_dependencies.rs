// TestDependencies - mock implementations for testing
//
// Provides mock crawlers, resolvers, backends and stores that can be wired
// into the dispatcher, runner and poller in place of the real ones.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

use super::error::RunnerError;
use super::jobs::{BackendError, ChildJob, GroupState, JobBackend, JobDescriptor};
use super::traits::{BaseCrawler, BaseLocationResolver};
use crate::common::GroupId;
use crate::domains::hotels::error::PersistenceError;
use crate::domains::hotels::models::{Hotel, NewHotel, ScrapedHotel, UpsertOutcome};
use crate::domains::hotels::store::{HotelStore, MemoryHotelStore};

/// Build a scraped item with just the identity fields and a price.
pub fn scraped(name: &str, location: &str, price: &str) -> ScrapedHotel {
    ScrapedHotel {
        name: Some(name.to_string()),
        location: Some(location.to_string()),
        price: Some(price.to_string()),
        ..Default::default()
    }
}

// =============================================================================
// Mock Crawler
// =============================================================================

/// What a mock crawl does for one source.
#[derive(Debug, Clone)]
pub enum MockCrawl {
    /// Yield the items, then succeed.
    Yield(Vec<ScrapedHotel>),
    /// Yield the items, then fail with the message.
    YieldThenFail(Vec<ScrapedHotel>, String),
    /// Panic inside the crawl.
    Panic(String),
}

/// Crawler with scripted per-source behavior. Unscripted sources yield
/// nothing and succeed.
pub struct MockCrawler {
    behaviors: Mutex<HashMap<String, MockCrawl>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Arc<Mutex<Vec<JobDescriptor>>>,
}

impl Default for MockCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCrawler {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_items(self, source: &str, items: Vec<ScrapedHotel>) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(source.to_string(), MockCrawl::Yield(items));
        self
    }

    pub fn with_failure(self, source: &str, items: Vec<ScrapedHotel>, error: &str) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(source.to_string(), MockCrawl::YieldThenFail(items, error.to_string()));
        self
    }

    pub fn with_panic(self, source: &str, message: &str) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(source.to_string(), MockCrawl::Panic(message.to_string()));
        self
    }

    /// Hold the crawl for `source` open after its items are yielded until
    /// the returned semaphore is given a permit.
    pub fn gate(&self, source: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(source.to_string(), gate.clone());
        gate
    }

    /// Descriptors of every crawl started so far.
    pub fn calls(&self) -> Vec<JobDescriptor> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCrawler for MockCrawler {
    async fn crawl(
        &self,
        descriptor: &JobDescriptor,
        items: mpsc::Sender<ScrapedHotel>,
    ) -> Result<(), RunnerError> {
        self.calls.lock().unwrap().push(descriptor.clone());

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&descriptor.source_name)
            .cloned()
            .unwrap_or(MockCrawl::Yield(Vec::new()));
        let gate = self.gates.lock().unwrap().get(&descriptor.source_name).cloned();

        let (to_yield, failure) = match behavior {
            MockCrawl::Yield(to_yield) => (to_yield, None),
            MockCrawl::YieldThenFail(to_yield, error) => (to_yield, Some(error)),
            MockCrawl::Panic(message) => panic!("{}", message),
        };

        for item in to_yield {
            if items.send(item).await.is_err() {
                break;
            }
        }

        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }

        match failure {
            Some(error) => Err(RunnerError::Other(error)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Mock Location Resolver
// =============================================================================

pub struct MockLocationResolver {
    codes: HashMap<(String, String), String>,
    error: Option<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for MockLocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocationResolver {
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
            error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_code(mut self, source: &str, location: &str, code: &str) -> Self {
        self.codes
            .insert((source.to_string(), location.to_string()), code.to_string());
        self
    }

    /// Make every lookup fail with `error`.
    pub fn failing(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseLocationResolver for MockLocationResolver {
    async fn resolve(&self, source_name: &str, location: &str) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((source_name.to_string(), location.to_string()));
        if let Some(error) = &self.error {
            anyhow::bail!("{}", error);
        }
        Ok(self
            .codes
            .get(&(source_name.to_string(), location.to_string()))
            .cloned())
    }
}

// =============================================================================
// Recording Job Backend
// =============================================================================

/// Backend that records submissions instead of running them.
#[derive(Default)]
pub struct RecordingJobBackend {
    submitted: Mutex<Vec<(GroupId, Vec<JobDescriptor>)>>,
    error: Option<String>,
}

impl RecordingJobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with an internal backend error.
    pub fn failing(error: &str) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            error: Some(error.to_string()),
        }
    }

    pub fn submitted(&self) -> Vec<(GroupId, Vec<JobDescriptor>)> {
        self.submitted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), BackendError> {
        match &self.error {
            Some(error) => Err(BackendError::Internal(error.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobBackend for RecordingJobBackend {
    async fn submit_group(
        &self,
        group_id: GroupId,
        descriptors: Vec<JobDescriptor>,
    ) -> Result<(), BackendError> {
        self.check()?;
        self.submitted.lock().unwrap().push((group_id, descriptors));
        Ok(())
    }

    async fn group_state(&self, _group_id: GroupId) -> Result<Option<GroupState>, BackendError> {
        self.check()?;
        Ok(None)
    }

    async fn children(&self, _group_id: GroupId) -> Result<Vec<ChildJob>, BackendError> {
        self.check()?;
        Ok(Vec::new())
    }
}

// =============================================================================
// Flaky Hotel Store
// =============================================================================

/// Memory store that refuses to persist the named hotels, or everything.
pub struct FlakyHotelStore {
    inner: Arc<MemoryHotelStore>,
    rejected_names: HashSet<String>,
    reject_all: bool,
}

impl FlakyHotelStore {
    pub fn rejecting(inner: Arc<MemoryHotelStore>, names: &[&str]) -> Self {
        Self {
            inner,
            rejected_names: names.iter().map(|n| n.to_string()).collect(),
            reject_all: false,
        }
    }

    pub fn rejecting_all(inner: Arc<MemoryHotelStore>) -> Self {
        Self {
            inner,
            rejected_names: HashSet::new(),
            reject_all: true,
        }
    }
}

#[async_trait]
impl HotelStore for FlakyHotelStore {
    async fn upsert(&self, hotel: &NewHotel) -> Result<UpsertOutcome, PersistenceError> {
        if self.reject_all || self.rejected_names.contains(&hotel.name) {
            return Err(PersistenceError::InvalidRecord(format!(
                "store rejected {}",
                hotel.name
            )));
        }
        self.inner.upsert(hotel).await
    }

    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Hotel>, PersistenceError> {
        self.inner.find_by_group(group_id).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Hotel>, PersistenceError> {
        self.inner.list_recent(limit).await
    }

    async fn health_check(&self) -> Result<(), PersistenceError> {
        if self.reject_all {
            return Err(PersistenceError::InvalidRecord("store is down".to_string()));
        }
        Ok(())
    }
}
