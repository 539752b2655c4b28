//! Impressions - ad impression ingestion
//!
//! Accepts ad impression events over HTTP, archives each one as a JSON
//! object and indexes it in a key-value table for later retrieval.
//!
//! ```text
//! [HTTP] -> [handlers] -> [ImpressionService] -> [ObjectArchive]
//!                                             -> [MetadataIndex]
//! ```

pub mod archive;
pub mod config;
pub mod handlers;
pub mod index;
pub mod model;
pub mod service;
pub mod utils;
pub mod validation;

pub use model::{Impression, ImpressionRequest};
pub use service::{ImpressionService, IngestError};
