//! Middleware Module
//!
//! axum middleware that puts the cache in front of read routes and clears
//! it behind write routes, without the handlers knowing about either.
//!
//! ```ignore
//! let list = ReadThrough::new(cache.clone(), CachePolicy::resource_list(Resource::Bookings, &ttl)?);
//! let writes = InvalidateOnSuccess::for_resource(cache.clone(), Resource::Bookings);
//!
//! Router::new()
//!     .route("/admin/agendamentos", get(list_bookings)
//!         .route_layer(middleware::from_fn_with_state(list, read_through)))
//!     .route("/admin/agendamentos", post(create_booking)
//!         .route_layer(middleware::from_fn_with_state(writes, invalidate_after)))
//! ```

mod invalidate;
mod read_through;

pub use invalidate::{invalidate_after, InvalidateOnSuccess, InvalidationReport, Invalidator};
pub use read_through::{read_through, ReadThrough, DEFAULT_MAX_BODY_BYTES, X_CACHE};
