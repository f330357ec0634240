// Main entry point for the hotel search server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hotel_search::domains::hotels::store::PostgresHotelStore;
use hotel_search::kernel::{ProcessCrawler, StaticLocationResolver};
use hotel_search::server::{build_app, AppDeps, AppState};
use hotel_search::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired search groups are swept from the registry.
const RETENTION_SWEEP_EVERY: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hotel_search=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hotel search server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        sources = config.sources.len(),
        workers = config.worker_concurrency,
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let store = Arc::new(PostgresHotelStore::new(pool));
    let state = AppState::build(AppDeps {
        store: store.clone(),
        bookmarks: store,
        crawler: Arc::new(ProcessCrawler::new(config.crawl.clone(), &config.sources)),
        resolver: Arc::new(StaticLocationResolver::new(config.location_codes.clone())),
        sources: config.sources.clone(),
        worker_concurrency: config.worker_concurrency,
        outcome_fetch_timeout: config.outcome_fetch_timeout,
    });

    let sweep = state
        .workers
        .spawn_retention_sweep(config.group_retention, RETENTION_SWEEP_EVERY);
    let workers = state.workers.clone();
    let app = build_app(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    workers.shutdown();
    sweep.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
