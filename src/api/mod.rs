//! API Module
//!
//! HTTP handlers and routing for the cache service's own endpoints.
//!
//! # Endpoints
//! - `GET /health` - Store connectivity check
//! - `GET /stats` - Hit/miss and invalidation counters
//! - `DELETE /cache/keys/*key` - Remove a single key
//! - `POST /cache/invalidate` - Invalidate by explicit patterns
//! - `POST /cache/invalidate/:resource` - Invalidate a resource's table entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
