// Hotel Search - API Core
//
// This crate fans a hotel search out to independent crawl sources and lets
// clients poll the group for progressively filled results.
//
// Domain logic lives in domains/hotels; job plumbing lives in kernel/jobs.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
