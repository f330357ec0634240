//! Kernel module - server infrastructure and dependencies.

pub mod error;
pub mod jobs;
pub mod location_resolver;
pub mod process_crawler;
pub mod test_dependencies;
pub mod traits;

pub use error::RunnerError;
pub use location_resolver::{LocationCode, StaticLocationResolver};
pub use process_crawler::{CrawlConfig, ProcessCrawler};
pub use test_dependencies::{MockCrawler, MockLocationResolver};
pub use traits::*;
