//! Cache Module
//!
//! The cache-aside core: a fault-tolerant manager over the key-value store,
//! the canonical key builder, session helpers and the caching policy table.

mod keys;
mod manager;
mod policy;
mod session;
mod stats;


// Re-export public types
pub use keys::{canonical_query, CacheKey};
pub use manager::CacheManager;
pub(crate) use manager::is_json_text;
pub use policy::{
    CachePolicy, KeyFn, KeyRule, Principal, Resource, TtlCategory, TtlPolicy,
    DASHBOARD_NAMESPACE,
};
pub use session::{session_key, SessionProfile, SESSION_PREFIX};
pub use stats::{CacheMetrics, CacheStats};
