//! Hotel search activities - dispatch, crawl, and poll
//!
//! Each activity owns one side of the fan-out: the dispatcher submits a
//! group, runners fill the store, and the poller reads both back.

pub mod crawl;
pub mod dispatch;
pub mod poll;

pub use crawl::{CrawlRunner, PersistStats};
pub use dispatch::SearchDispatcher;
pub use poll::{PollResponse, SearchPoller};
