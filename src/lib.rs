//! Panel Cache - cache-aside layer for the kiosk admin panel
//!
//! Read routes go through a key-value store first and fall back to their
//! handler on a miss; write routes clear the affected keys once they
//! commit. The store is an optimization only: when it is slow or down,
//! every request still completes against the authoritative path.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, CachePolicy, KeyRule, Principal, Resource};
pub use config::Config;
pub use error::{CacheError, Result};
pub use middleware::{invalidate_after, read_through, InvalidateOnSuccess, Invalidator, ReadThrough};
pub use tasks::spawn_cleanup_task;
