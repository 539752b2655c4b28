//! Metadata index for impression retrieval.
//!
//! The index holds one fixed-shape record per impression, keyed by
//! impression id, and supports upsert plus an exhaustive paginated scan.
//!
//! ## Backends
//!
//! - `InMemoryMetadataIndex` - Ordered process-local map with paging
//! - `DynamoMetadataIndex` (feature: dynamo) - Amazon DynamoDB table
//!
//! ## Record layout
//!
//! | attribute      | type | notes                          |
//! |----------------|------|--------------------------------|
//! | `ImpressionId` | S    | partition key                  |
//! | `CampaignId`   | S    |                                |
//! | `Timestamp`    | S    | RFC 3339                       |
//! | `Location`     | S    | omitted when no location given |

mod config;
#[cfg(feature = "dynamo")]
mod dynamo;
mod memory;
mod scan;

#[cfg(feature = "dynamo")]
pub use config::DynamoIndexConfig;
pub use config::{IndexConfig, IndexType, MemoryIndexConfig};
#[cfg(feature = "dynamo")]
pub use dynamo::DynamoMetadataIndex;
pub use memory::InMemoryMetadataIndex;
pub use scan::{count, scan, scan_all, scan_pages};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{format_timestamp, parse_timestamp, Impression};

/// Attribute names used by the index store.
pub mod attributes {
    pub const IMPRESSION_ID: &str = "ImpressionId";
    pub const CAMPAIGN_ID: &str = "CampaignId";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const LOCATION: &str = "Location";
}

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to write record: {0}")]
    WriteFailed(String),

    #[error("Failed to scan index: {0}")]
    ScanFailed(String),

    #[error("Malformed record {key}: {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("Scan returned cursor {0} twice")]
    ScanStalled(String),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// A stored index record.
///
/// The timestamp is kept in its stored string form; conversion back to an
/// [`Impression`] parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub impression_id: String,
    pub campaign_id: String,
    pub timestamp: String,
    pub location: Option<String>,
}

impl IndexRecord {
    /// Key the record is stored under.
    pub fn key(&self) -> &str {
        &self.impression_id
    }

    /// Convert back into an impression, failing on an unparseable timestamp.
    pub fn into_impression(self) -> Result<Impression> {
        let timestamp =
            parse_timestamp(&self.timestamp).map_err(|e| IndexError::MalformedRecord {
                key: self.impression_id.clone(),
                reason: format!("{}: {}", attributes::TIMESTAMP, e),
            })?;
        Ok(Impression {
            impression_id: self.impression_id,
            campaign_id: self.campaign_id,
            timestamp,
            location: self.location,
        })
    }
}

impl From<&Impression> for IndexRecord {
    /// An empty location is stored as absent.
    fn from(impression: &Impression) -> Self {
        Self {
            impression_id: impression.impression_id.clone(),
            campaign_id: impression.campaign_id.clone(),
            timestamp: format_timestamp(&impression.timestamp),
            location: impression.location().map(String::from),
        }
    }
}

/// Opaque position to resume a scan from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor(pub String);

/// One page of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<IndexRecord>,
    /// Where the next page starts, or `None` once the store is exhausted.
    pub next: Option<ScanCursor>,
}

/// Structured record store with upsert-by-key and full scan.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Insert or replace the record stored under `key`.
    async fn put(&self, key: &str, record: &IndexRecord) -> Result<()>;

    /// Fetch one page of records starting after `start`.
    ///
    /// A page may be empty while `next` is still set; callers keep going
    /// until `next` is `None`.
    async fn scan_page(&self, start: Option<ScanCursor>) -> Result<ScanPage>;

    /// Backend type, for logging.
    fn index_type(&self) -> IndexType;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize a metadata index based on configuration.
pub async fn init_index(
    config: &IndexConfig,
) -> std::result::Result<Arc<dyn MetadataIndex>, Box<dyn std::error::Error>> {
    use tracing::info;

    match config.index_type {
        IndexType::Memory => {
            info!(page_size = config.memory.page_size, "MetadataIndex: memory");
            Ok(Arc::new(InMemoryMetadataIndex::with_page_size(
                config.memory.page_size,
            )))
        }
        #[cfg(feature = "dynamo")]
        IndexType::Dynamo => {
            info!(
                table = %config.dynamo.table,
                region = ?config.dynamo.region,
                endpoint = ?config.dynamo.endpoint,
                page_size = ?config.dynamo.page_size,
                "MetadataIndex: dynamo"
            );
            let index = DynamoMetadataIndex::new(
                &config.dynamo.table,
                config.dynamo.region.as_deref(),
                config.dynamo.endpoint.as_deref(),
            )
            .await
            .with_page_size(config.dynamo.page_size);
            Ok(Arc::new(index))
        }
    }
}
