//! Session Cache
//!
//! Authenticated user snapshots keyed by session id, with sliding expiry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CacheManager;

/// Key prefix for session entries.
pub const SESSION_PREFIX: &str = "session:";

/// What the auth layer needs about a logged-in user between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub id: i64,
    pub active: bool,
    pub permissions: Vec<String>,
}

/// Store key for a session id.
pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

impl CacheManager {
    pub async fn get_session(&self, session_id: &str) -> Option<SessionProfile> {
        self.get(&session_key(session_id)).await
    }

    pub async fn set_session(
        &self,
        session_id: &str,
        profile: &SessionProfile,
        ttl_secs: u64,
    ) -> bool {
        self.set(&session_key(session_id), profile, ttl_secs).await
    }

    /// Logout. Idempotent.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.delete(&session_key(session_id)).await
    }

    /// Extends the session's TTL in place; the profile is not re-sent.
    pub async fn renew_session(&self, session_id: &str, ttl_secs: u64) -> bool {
        self.expire(&session_key(session_id), ttl_secs).await
    }

    /// Reads a session and, on a hit, slides its expiry forward.
    ///
    /// This is the lookup the authentication step performs per request.
    pub async fn touch_session(&self, session_id: &str, ttl_secs: u64) -> Option<SessionProfile> {
        let profile = self.get_session(session_id).await?;
        if !self.renew_session(session_id, ttl_secs).await {
            debug!(session_id, "Session expired between read and renew");
        }
        Some(profile)
    }
}
