//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum number of patterns accepted in one manual invalidation
pub const MAX_PATTERNS: usize = 32;

/// Request body for manual invalidation (POST /cache/invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Glob patterns, processed in order
    pub patterns: Vec<String>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.patterns.is_empty() {
            return Some("At least one pattern is required".to_string());
        }
        if self.patterns.len() > MAX_PATTERNS {
            return Some(format!("At most {} patterns per request", MAX_PATTERNS));
        }
        if self.patterns.iter().any(|p| p.trim().is_empty()) {
            return Some("Patterns cannot be empty".to_string());
        }
        None
    }
}
