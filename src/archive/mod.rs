//! Object archive for impression payloads.
//!
//! Every recorded impression is written once as an immutable JSON object
//! keyed by `{impression_id}.json`. The archive is write-only from the
//! service's point of view: nothing here reads objects back.
//!
//! ## Backends
//!
//! - `FilesystemObjectArchive` - Local filesystem storage
//! - `InMemoryObjectArchive` - Process-local map, for tests and local runs
//! - `S3ObjectArchive` (feature: s3) - Amazon S3 or S3-compatible stores

mod config;
mod filesystem;
mod memory;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "s3")]
pub use config::S3ArchiveConfig;
pub use config::{ArchiveConfig, ArchiveType, FilesystemArchiveConfig};
pub use filesystem::FilesystemObjectArchive;
pub use memory::InMemoryObjectArchive;
#[cfg(feature = "s3")]
pub use s3::S3ObjectArchive;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to store object: {0}")]
    StoreFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Write-only blob store holding the canonical copy of each impression.
#[async_trait]
pub trait ObjectArchive: Send + Sync {
    /// Store `payload` under `key`, replacing any existing object.
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()>;

    /// Backend type, for logging.
    fn archive_type(&self) -> ArchiveType;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize an object archive based on configuration.
///
/// # Errors
///
/// Returns error if the backend cannot be constructed (e.g. the filesystem
/// base directory cannot be created).
pub async fn init_archive(
    config: &ArchiveConfig,
) -> std::result::Result<Arc<dyn ObjectArchive>, Box<dyn std::error::Error>> {
    use tracing::info;

    match config.archive_type {
        ArchiveType::Filesystem => {
            info!(
                path = %config.filesystem.base_path.display(),
                "ObjectArchive: filesystem"
            );
            let archive = FilesystemObjectArchive::new(&config.filesystem.base_path).await?;
            Ok(Arc::new(archive))
        }
        ArchiveType::Memory => {
            info!("ObjectArchive: memory");
            Ok(Arc::new(InMemoryObjectArchive::new()))
        }
        #[cfg(feature = "s3")]
        ArchiveType::S3 => {
            info!(
                bucket = %config.s3.bucket,
                prefix = ?config.s3.prefix,
                region = ?config.s3.region,
                endpoint = ?config.s3.endpoint,
                "ObjectArchive: s3"
            );
            let archive = match &config.s3.endpoint {
                Some(endpoint) => {
                    S3ObjectArchive::with_endpoint(
                        &config.s3.bucket,
                        config.s3.prefix.clone(),
                        endpoint,
                        config.s3.region.as_deref(),
                    )
                    .await
                }
                None => {
                    S3ObjectArchive::new(
                        &config.s3.bucket,
                        config.s3.prefix.clone(),
                        config.s3.region.as_deref(),
                    )
                    .await
                }
            };
            Ok(Arc::new(archive))
        }
    }
}
