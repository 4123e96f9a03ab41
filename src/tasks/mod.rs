//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: Drops expired entries from the in-process store

mod cleanup;

pub use cleanup::spawn_cleanup_task;
