//! # sc-api
//!
//! REST API handlers for Service Center RS.
//!
//! Handlers decode the request, hand the verified principal to a service and
//! render the result as JSON. All authorization decisions live in the
//! services.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::AppState;
pub use routes::router;
