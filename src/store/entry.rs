//! Cache Entry Module
//!
//! A stored payload with its expiry, as kept by the in-process store.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A serialized payload and the instant it stops being readable.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized JSON payload
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` from now.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        Self {
            value,
            expires_at: deadline(ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// read at exactly the deadline already sees it as absent.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Renew ==
    /// Pushes the deadline to `ttl_seconds` from now without touching the value.
    pub fn renew(&mut self, ttl_seconds: u64) {
        self.expires_at = deadline(ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

fn deadline(ttl_seconds: u64) -> u64 {
    current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
