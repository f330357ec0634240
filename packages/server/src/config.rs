use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domains::hotels::models::SourceConfig;
use crate::kernel::{CrawlConfig, LocationCode};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub crawl: CrawlConfig,
    pub sources: Vec<SourceConfig>,
    pub worker_concurrency: usize,
    pub outcome_fetch_timeout: Duration,
    pub group_retention: Duration,
    pub location_codes: Vec<LocationCode>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let crawl_timeout_secs: u64 = env::var("CRAWL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("CRAWL_TIMEOUT_SECS must be a valid number")?;

        let outcome_fetch_timeout_ms: u64 = env::var("OUTCOME_FETCH_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .context("OUTCOME_FETCH_TIMEOUT_MS must be a valid number")?;

        let group_retention_secs: u64 = env::var("GROUP_RETENTION_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .context("GROUP_RETENTION_SECS must be a valid number")?;

        let worker_concurrency: usize = env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .context("WORKER_CONCURRENCY must be a valid number")?;
        anyhow::ensure!(worker_concurrency > 0, "WORKER_CONCURRENCY must be at least 1");

        let sources = parse_sources(
            &env::var("CRAWL_SOURCES").unwrap_or_else(|_| "booking_spider".to_string()),
        );
        anyhow::ensure!(!sources.is_empty(), "CRAWL_SOURCES must name at least one source");

        let location_codes = parse_location_codes(
            &env::var("CRAWL_LOCATION_CODES").unwrap_or_default(),
        )
        .context("CRAWL_LOCATION_CODES must be comma-separated source/location=code entries")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            crawl: CrawlConfig {
                program: env::var("CRAWL_PROGRAM").unwrap_or_else(|_| "scrapy".to_string()),
                working_dir: PathBuf::from(
                    env::var("CRAWL_WORKING_DIR").unwrap_or_else(|_| "../scraper".to_string()),
                ),
                extra_args: env::var("CRAWL_EXTRA_ARGS")
                    .map(|raw| parse_extra_args(&raw))
                    .unwrap_or_default(),
                timeout: Duration::from_secs(crawl_timeout_secs),
            },
            sources,
            worker_concurrency,
            outcome_fetch_timeout: Duration::from_millis(outcome_fetch_timeout_ms),
            group_retention: Duration::from_secs(group_retention_secs),
            location_codes,
        })
    }
}

/// Parse `CRAWL_SOURCES`: comma-separated `name` or `name:location_code_arg`.
pub fn parse_sources(raw: &str) -> Vec<SourceConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, arg)) if !arg.trim().is_empty() => {
                SourceConfig::with_location_code(name.trim(), arg.trim())
            }
            Some((name, _)) => SourceConfig::new(name.trim()),
            None => SourceConfig::new(entry),
        })
        .collect()
}

/// Parse `CRAWL_LOCATION_CODES`: comma-separated `source/location=code`.
pub fn parse_location_codes(raw: &str) -> Result<Vec<LocationCode>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<LocationCode> {
            let (key, code) = entry
                .split_once('=')
                .with_context(|| format!("missing '=' in location code entry '{}'", entry))?;
            let (source, location) = key
                .split_once('/')
                .with_context(|| format!("missing '/' in location code entry '{}'", entry))?;
            anyhow::ensure!(
                !source.trim().is_empty() && !location.trim().is_empty() && !code.trim().is_empty(),
                "incomplete location code entry '{}'",
                entry
            );
            Ok(LocationCode::new(source.trim(), location.trim(), code.trim()))
        })
        .collect()
}

fn parse_extra_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
