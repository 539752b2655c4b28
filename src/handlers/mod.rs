//! HTTP boundary for the ingestion service.
//!
//! Maps requests onto [`ImpressionService`](crate::service::ImpressionService)
//! calls and service results onto status codes.

mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::{router, serve};
