//! Invalidation
//!
//! Removes cached keys made stale by a committed mutation. Runs only after
//! success, and the write response waits for it so a follow-up read from the
//! same client cannot see pre-mutation data.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheManager, Resource};
use crate::error::{CacheError, Result};

/// Outcome of one invalidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Keys deleted across all patterns
    pub removed: usize,
    /// Patterns whose listing or delete failed
    pub failed: Vec<String>,
}

impl InvalidationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// == Invalidator ==
/// Direct-call form, for handlers that commit and invalidate themselves.
#[derive(Clone)]
pub struct Invalidator {
    cache: CacheManager,
}

impl Invalidator {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    /// Deletes every key matching each pattern, in order.
    ///
    /// Call only once the mutation is durable. A failing pattern is recorded
    /// and the remaining ones still run.
    pub async fn after_commit<P: AsRef<str>>(&self, patterns: &[P]) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match self.cache.delete_by_pattern(pattern).await {
                Ok(removed) => {
                    debug!(pattern, removed, "Cache invalidated");
                    report.removed += removed;
                }
                Err(_) => report.failed.push(pattern.to_string()),
            }
        }

        if !report.is_complete() {
            warn!(
                removed = report.removed,
                failed = ?report.failed,
                "Invalidation incomplete; stale entries live until TTL"
            );
        }
        report
    }

    /// Applies the table entry for `resource`.
    pub async fn after_commit_for(&self, resource: Resource) -> InvalidationReport {
        self.after_commit(resource.invalidation_patterns()).await
    }
}

// == Middleware ==
/// Middleware state: the patterns a route's mutations invalidate.
#[derive(Clone)]
pub struct InvalidateOnSuccess {
    invalidator: Invalidator,
    patterns: Arc<[String]>,
}

impl InvalidateOnSuccess {
    /// Fails at registration if no pattern, or an empty one, is given.
    pub fn new<I, P>(cache: CacheManager, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(CacheError::Policy(
                "invalidation needs at least one pattern".to_string(),
            ));
        }
        if patterns.iter().any(|p| p.is_empty()) {
            return Err(CacheError::Policy(
                "invalidation pattern must not be empty".to_string(),
            ));
        }

        Ok(Self {
            invalidator: Invalidator::new(cache),
            patterns: patterns.into(),
        })
    }

    pub fn for_resource(cache: CacheManager, resource: Resource) -> Self {
        Self {
            invalidator: Invalidator::new(cache),
            patterns: resource
                .invalidation_patterns()
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Runs the handler, then invalidates if it was a successful mutation.
///
/// Safe methods (`GET`, `HEAD`, `OPTIONS`, `TRACE`) never invalidate.
pub async fn invalidate_after(
    State(state): State<InvalidateOnSuccess>,
    request: Request,
    next: Next,
) -> Response {
    let mutating = !request.method().is_safe();
    let response = next.run(request).await;

    if !mutating {
        return response;
    }
    if response.status().is_success() {
        state.invalidator.after_commit(&state.patterns[..]).await;
    } else {
        debug!(status = %response.status(), "Mutation failed; cache left intact");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn cache() -> (Arc<MemoryStore>, CacheManager) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheManager::new(store.clone(), Duration::from_millis(500));
        (store, cache)
    }

    #[tokio::test]
    async fn test_after_commit_aggregates_counts() {
        let (_, cache) = cache();
        for key in ["pagamentos_list:a", "agendamentos_list:a", "agendamentos_list:b"] {
            cache.set(key, &1, 300).await;
        }

        let report = Invalidator::new(cache.clone())
            .after_commit_for(Resource::Payments)
            .await;

        assert_eq!(report.removed, 3);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_after_commit_store_down() {
        let (store, cache) = cache();
        store.set_available(false);

        let report = Invalidator::new(cache)
            .after_commit(&["clientes_*", "dashboard_*"])
            .await;

        assert_eq!(report.removed, 0);
        assert_eq!(report.failed, vec!["clientes_*", "dashboard_*"]);
    }

    #[test]
    fn test_new_rejects_empty_patterns() {
        let (_, cache) = cache();
        assert!(InvalidateOnSuccess::new(cache.clone(), Vec::<String>::new()).is_err());
        assert!(InvalidateOnSuccess::new(cache.clone(), [""]).is_err());
        assert!(InvalidateOnSuccess::new(cache, ["midias_*"]).is_ok());
    }

    #[test]
    fn test_for_resource_uses_table() {
        let (_, cache) = cache();
        let state = InvalidateOnSuccess::for_resource(cache, Resource::Bookings);
        assert_eq!(state.patterns(), &["agendamentos_*", "dashboard_*"]);
    }
}
