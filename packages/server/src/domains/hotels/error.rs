use thiserror::Error;

use crate::kernel::jobs::BackendError;

/// Reasons a search cannot be dispatched. Shown to the caller as-is.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("location is required")]
    MissingLocation,

    #[error("min_rating must be between 1 and 5, got {0}")]
    InvalidRating(String),

    #[error("price_ceiling must be a positive number, got {0}")]
    InvalidPriceCeiling(String),

    #[error("no crawl sources are configured")]
    NoSources,

    #[error("could not submit search: {0}")]
    Backend(#[from] BackendError),
}

/// Result store failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
