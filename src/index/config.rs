//! Metadata index configuration.

use serde::Deserialize;

/// Index backend discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Process-local map; contents are lost on restart.
    #[default]
    Memory,
    /// Amazon DynamoDB (requires `dynamo` feature).
    #[cfg(feature = "dynamo")]
    Dynamo,
}

/// Configuration for the metadata index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index backend type.
    #[serde(rename = "type")]
    pub index_type: IndexType,

    /// In-memory index configuration.
    pub memory: MemoryIndexConfig,

    /// DynamoDB index configuration (requires `dynamo` feature).
    #[cfg(feature = "dynamo")]
    pub dynamo: DynamoIndexConfig,
}

/// In-memory index configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryIndexConfig {
    /// Records returned per scan page.
    pub page_size: usize,
}

impl Default for MemoryIndexConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

/// DynamoDB index configuration.
#[cfg(feature = "dynamo")]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamoIndexConfig {
    /// Table name. The partition key must be the string attribute `ImpressionId`.
    pub table: String,
    /// AWS region.
    pub region: Option<String>,
    /// Custom endpoint URL (for DynamoDB Local or LocalStack).
    pub endpoint: Option<String>,
    /// Scan `Limit` per page. When unset DynamoDB pages by its 1 MB cap.
    pub page_size: Option<i32>,
}

#[cfg(feature = "dynamo")]
impl Default for DynamoIndexConfig {
    fn default() -> Self {
        Self {
            table: "AdImpressionMetadata".to_string(),
            region: None,
            endpoint: None,
            page_size: None,
        }
    }
}
