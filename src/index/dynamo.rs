//! DynamoDB metadata index.
//!
//! Table schema:
//! - PK: `ImpressionId` (String)
//! - `CampaignId`, `Timestamp`, `Location` (String, `Location` optional)
//!
//! Scans page with `ExclusiveStartKey` / `LastEvaluatedKey`. Since the
//! table has only a partition key, the cursor is the last evaluated
//! impression id.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use super::{
    attributes, IndexError, IndexRecord, IndexType, MetadataIndex, Result, ScanCursor, ScanPage,
};

type Item = HashMap<String, AttributeValue>;

/// DynamoDB implementation of MetadataIndex.
pub struct DynamoMetadataIndex {
    client: Client,
    table_name: String,
    page_size: Option<i32>,
}

impl DynamoMetadataIndex {
    /// Create a new DynamoDB index.
    pub async fn new(
        table_name: impl Into<String>,
        region: Option<&str>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for impression metadata");

        Self::with_client(client, table_name)
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            page_size: None,
        }
    }

    /// Cap the number of items evaluated per scan page.
    pub fn with_page_size(mut self, page_size: Option<i32>) -> Self {
        self.page_size = page_size.filter(|n| *n > 0);
        self
    }
}

/// Build the attribute map for a record. `Location` is omitted when absent.
fn to_item(key: &str, record: &IndexRecord) -> Item {
    let mut item = HashMap::new();
    item.insert(
        attributes::IMPRESSION_ID.to_string(),
        AttributeValue::S(key.to_string()),
    );
    item.insert(
        attributes::CAMPAIGN_ID.to_string(),
        AttributeValue::S(record.campaign_id.clone()),
    );
    item.insert(
        attributes::TIMESTAMP.to_string(),
        AttributeValue::S(record.timestamp.clone()),
    );
    if let Some(location) = &record.location {
        item.insert(
            attributes::LOCATION.to_string(),
            AttributeValue::S(location.clone()),
        );
    }
    item
}

fn string_attr(item: &Item, name: &str) -> Option<String> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

/// Decode a scanned item. A non-string `Location` is treated as absent.
fn from_item(item: &Item) -> Result<IndexRecord> {
    let key = string_attr(item, attributes::IMPRESSION_ID).ok_or_else(|| {
        IndexError::MalformedRecord {
            key: "<unknown>".to_string(),
            reason: format!("missing string attribute {}", attributes::IMPRESSION_ID),
        }
    })?;

    let required = |name: &str| {
        string_attr(item, name).ok_or_else(|| IndexError::MalformedRecord {
            key: key.clone(),
            reason: format!("missing string attribute {}", name),
        })
    };

    Ok(IndexRecord {
        campaign_id: required(attributes::CAMPAIGN_ID)?,
        timestamp: required(attributes::TIMESTAMP)?,
        location: string_attr(item, attributes::LOCATION),
        impression_id: key,
    })
}

fn cursor_to_key(cursor: ScanCursor) -> Item {
    HashMap::from([(
        attributes::IMPRESSION_ID.to_string(),
        AttributeValue::S(cursor.0),
    )])
}

fn key_to_cursor(key: &Item) -> Result<ScanCursor> {
    string_attr(key, attributes::IMPRESSION_ID)
        .map(ScanCursor)
        .ok_or_else(|| {
            IndexError::ScanFailed(format!(
                "LastEvaluatedKey has no string {}",
                attributes::IMPRESSION_ID
            ))
        })
}

#[async_trait]
impl MetadataIndex for DynamoMetadataIndex {
    async fn put(&self, key: &str, record: &IndexRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(key, record)))
            .send()
            .await
            .map_err(|e| {
                IndexError::WriteFailed(format!(
                    "DynamoDB put_item failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(
            table = %self.table_name,
            impression_id = %key,
            "Stored impression metadata in DynamoDB"
        );

        Ok(())
    }

    async fn scan_page(&self, start: Option<ScanCursor>) -> Result<ScanPage> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_limit(self.page_size)
            .set_exclusive_start_key(start.map(cursor_to_key))
            .send()
            .await
            .map_err(|e| {
                IndexError::ScanFailed(format!("DynamoDB scan failed: {}", DisplayErrorContext(&e)))
            })?;

        let records = output
            .items
            .unwrap_or_default()
            .iter()
            .map(from_item)
            .collect::<Result<Vec<_>>>()?;

        let next = output
            .last_evaluated_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(key_to_cursor)
            .transpose()?;

        debug!(
            table = %self.table_name,
            count = records.len(),
            more = next.is_some(),
            "Scanned DynamoDB page"
        );

        Ok(ScanPage { records, next })
    }

    fn index_type(&self) -> IndexType {
        IndexType::Dynamo
    }
}
