//! Object archive configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Archive backend discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    /// Filesystem-based storage (local or mounted).
    #[default]
    Filesystem,
    /// Process-local map; contents are lost on restart.
    Memory,
    /// Amazon S3 (requires `s3` feature).
    #[cfg(feature = "s3")]
    S3,
}

/// Configuration for the object archive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive backend type.
    #[serde(rename = "type")]
    pub archive_type: ArchiveType,

    /// Filesystem archive configuration.
    pub filesystem: FilesystemArchiveConfig,

    /// S3 archive configuration (requires `s3` feature).
    #[cfg(feature = "s3")]
    pub s3: S3ArchiveConfig,
}

/// Filesystem archive configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesystemArchiveConfig {
    /// Base directory. Objects are written as `{base_path}/{key}`.
    pub base_path: PathBuf,
}

impl Default for FilesystemArchiveConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data/impressions"),
        }
    }
}

/// S3 archive configuration.
#[cfg(feature = "s3")]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct S3ArchiveConfig {
    /// S3 bucket name.
    pub bucket: String,
    /// Optional key prefix within the bucket.
    pub prefix: Option<String>,
    /// AWS region.
    pub region: Option<String>,
    /// Custom endpoint URL (for S3-compatible services like MinIO).
    pub endpoint: Option<String>,
}

#[cfg(feature = "s3")]
impl Default for S3ArchiveConfig {
    fn default() -> Self {
        Self {
            bucket: "arity-ad-impressions".to_string(),
            prefix: None,
            region: None,
            endpoint: None,
        }
    }
}
