//! Impression ingestion service.
//!
//! Validates incoming impressions and writes each one to the object
//! archive and then to the metadata index, strictly in that order.
//!
//! ```text
//! record(request)
//!   validate ──fail──> Validation (no writes)
//!   archive.put("{id}.json") ──fail──> Archive (index untouched)
//!   index.put("{id}") ──fail──> Index (archive copy remains)
//! ```
//!
//! There is no rollback of the archive write when the index write fails.
//! The orphaned object is logged and stays invisible to `list_all`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveError, ObjectArchive};
use crate::index::{self, IndexError, IndexRecord, MetadataIndex};
use crate::model::{Impression, ImpressionRequest};
use crate::validation::ValidationErrors;

/// Failure of a single `record` call.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Request rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Archive write failed; nothing was persisted.
    #[error("archive write failed: {0}")]
    Archive(#[from] ArchiveError),

    /// Archive write succeeded but the index write failed.
    #[error("index write failed: {0}")]
    Index(#[from] IndexError),
}

/// Coordinates the archive and index clients. Holds no state of its own.
#[derive(Clone)]
pub struct ImpressionService {
    archive: Arc<dyn ObjectArchive>,
    index: Arc<dyn MetadataIndex>,
}

impl ImpressionService {
    pub fn new(archive: Arc<dyn ObjectArchive>, index: Arc<dyn MetadataIndex>) -> Self {
        Self { archive, index }
    }

    /// Validate and persist one impression.
    ///
    /// Returns the stored impression on success. A repeated id overwrites
    /// the previous archive object and index record.
    pub async fn record(&self, request: ImpressionRequest) -> Result<Impression, IngestError> {
        let impression = request.validate()?;
        let archive_key = impression.archive_key();

        let payload = impression.to_archive_json().map_err(ArchiveError::from)?;
        self.archive.put(&archive_key, payload).await?;
        debug!(
            impression_id = %impression.impression_id,
            key = %archive_key,
            backend = ?self.archive.archive_type(),
            "Archived impression"
        );

        let record = IndexRecord::from(&impression);
        if let Err(e) = self.index.put(record.key(), &record).await {
            warn!(
                impression_id = %impression.impression_id,
                archive_key = %archive_key,
                error = %e,
                "Index write failed after archive write; archived object has no index entry"
            );
            return Err(e.into());
        }

        info!(
            impression_id = %impression.impression_id,
            campaign_id = %impression.campaign_id,
            "Impression recorded"
        );
        Ok(impression)
    }

    /// Read every indexed impression.
    ///
    /// Drains all scan pages before returning. Missing locations are
    /// reported as [`crate::model::DEFAULT_LOCATION`].
    pub async fn list_all(&self) -> Result<Vec<Impression>, IndexError> {
        let records = index::scan_all(self.index.as_ref()).await?;
        let impressions = records
            .into_iter()
            .map(|record| record.into_impression().map(Impression::with_default_location))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            count = impressions.len(),
            backend = ?self.index.index_type(),
            "Listed impressions"
        );
        Ok(impressions)
    }
}
