use std::time::Duration;

use thiserror::Error;

/// Why a single source's crawl did not complete.
///
/// The runner turns each of these into the `error` text of a failed
/// [`JobOutcome`](crate::kernel::jobs::JobOutcome).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("crawl tool '{program}' not found. Is it installed and on PATH?")]
    ToolNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("crawl project directory {path} does not exist")]
    MissingWorkingDir { path: String },

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("crawl for {source_name} timed out after {}s", timeout.as_secs())]
    Timeout {
        source_name: String,
        timeout: Duration,
    },

    #[error("crawl for {source_name} exited with {status}\nSTDERR:\n{stderr}")]
    NonZeroExit {
        source_name: String,
        status: String,
        stderr: String,
    },

    #[error("malformed crawl output on line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("no location code for '{location}' on {source_name}")]
    LocationUnresolved {
        source_name: String,
        location: String,
    },

    #[error("location lookup failed for {source_name}: {reason}")]
    Resolver { source_name: String, reason: String },

    #[error("{0}")]
    Other(String),
}
