//! Amazon S3 object archive.
//!
//! Stores objects in an S3 bucket:
//! ```text
//! s3://{bucket}/{prefix}/{key}
//! ```

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ArchiveError, ArchiveType, ObjectArchive, Result};

const JSON_CONTENT_TYPE: &str = "application/json";

/// S3-based object archive.
pub struct S3ObjectArchive {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3ObjectArchive {
    /// Create a new S3 archive.
    ///
    /// Uses default credentials from the environment (AWS_ACCESS_KEY_ID,
    /// AWS_SECRET_ACCESS_KEY, or IAM role).
    pub async fn new(
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        Self::with_client(Client::new(&config), bucket, prefix)
    }

    /// Create with custom endpoint (for S3-compatible services like MinIO).
    pub async fn with_endpoint(
        bucket: impl Into<String>,
        prefix: Option<String>,
        endpoint: &str,
        region: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .endpoint_url(endpoint)
            .force_path_style(true) // Required for MinIO and most S3-compatible services
            .build();

        Self::with_client(Client::from_conf(s3_config), bucket, prefix)
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client, bucket: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix,
        }
    }

    /// Full object key, including the configured prefix.
    fn object_key(&self, key: &str) -> String {
        object_key(self.prefix.as_deref(), key)
    }
}

fn object_key(prefix: Option<&str>, key: &str) -> String {
    match prefix.map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, key),
        None => key.to_string(),
    }
}

fn content_type_for(key: &str) -> Option<&'static str> {
    key.ends_with(".json").then_some(JSON_CONTENT_TYPE)
}

#[async_trait]
impl ObjectArchive for S3ObjectArchive {
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        let object_key = self.object_key(key);
        let size = payload.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .set_content_type(content_type_for(key).map(String::from))
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|e| {
                ArchiveError::StoreFailed(format!("S3 upload failed: {}", DisplayErrorContext(&e)))
            })?;

        debug!(
            key = %object_key,
            size,
            bucket = %self.bucket,
            "Stored object in S3"
        );

        Ok(())
    }

    fn archive_type(&self) -> ArchiveType {
        ArchiveType::S3
    }
}
