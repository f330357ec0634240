//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::hotels::activities::{CrawlRunner, SearchDispatcher, SearchPoller};
use crate::domains::hotels::models::SourceConfig;
use crate::domains::hotels::store::{BookmarkReader, HotelStore};
use crate::kernel::jobs::{JobWorkerConfig, LocalJobBackend};
use crate::kernel::{BaseCrawler, BaseLocationResolver};
use crate::server::middleware::{extract_actor, ACTOR_HEADER};
use crate::server::routes::{
    group_results_handler, health_handler, recent_results_handler, search_status_handler,
    submit_search_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<SearchDispatcher>,
    pub poller: Arc<SearchPoller>,
    pub store: Arc<dyn HotelStore>,
    pub workers: Arc<LocalJobBackend>,
}

/// Everything needed to assemble the search services.
pub struct AppDeps {
    pub store: Arc<dyn HotelStore>,
    pub bookmarks: Arc<dyn BookmarkReader>,
    pub crawler: Arc<dyn BaseCrawler>,
    pub resolver: Arc<dyn BaseLocationResolver>,
    pub sources: Vec<SourceConfig>,
    pub worker_concurrency: usize,
    pub outcome_fetch_timeout: Duration,
}

impl AppState {
    /// Wire runner, worker pool, dispatcher and poller together.
    pub fn build(deps: AppDeps) -> Self {
        let coded_sources = deps
            .sources
            .iter()
            .filter(|source| source.needs_location_code())
            .map(|source| source.name.clone())
            .collect();

        let runner = Arc::new(CrawlRunner::new(
            deps.crawler,
            deps.store.clone(),
            deps.resolver,
            coded_sources,
        ));

        let workers = Arc::new(LocalJobBackend::with_config(
            runner,
            JobWorkerConfig::with_concurrency(deps.worker_concurrency),
        ));

        let dispatcher = Arc::new(SearchDispatcher::new(workers.clone(), deps.sources));
        let poller = Arc::new(SearchPoller::new(
            workers.clone(),
            deps.store.clone(),
            deps.bookmarks,
            deps.outcome_fetch_timeout,
        ));

        Self {
            dispatcher,
            poller,
            store: deps.store,
            workers,
        }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]);

    Router::new()
        .route("/search", post(submit_search_handler))
        .route("/search/:group_id/status", get(search_status_handler))
        .route("/results", get(recent_results_handler))
        .route("/results/:group_id", get(group_results_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(extract_actor))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
