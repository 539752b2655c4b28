//! In-memory metadata index.
//!
//! Records live in an ordered map so scans page deterministically by key.
//! Exposes call counters and failure injection for tests.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IndexError, IndexRecord, IndexType, MetadataIndex, Result, ScanCursor, ScanPage};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Metadata index that stores records in memory.
pub struct InMemoryMetadataIndex {
    records: RwLock<BTreeMap<String, IndexRecord>>,
    page_size: usize,
    put_calls: AtomicUsize,
    scan_page_calls: AtomicUsize,
    fail_on_put: RwLock<bool>,
    /// Zero-based page number whose fetch fails, counted per scan.
    fail_on_scan_page: RwLock<Option<usize>>,
}

impl Default for InMemoryMetadataIndex {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl InMemoryMetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that returns at most `page_size` records per page.
    ///
    /// A page size of zero is treated as one.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            put_calls: AtomicUsize::new(0),
            scan_page_calls: AtomicUsize::new(0),
            fail_on_put: RwLock::new(false),
            fail_on_scan_page: RwLock::new(None),
        }
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    /// Fail the fetch of page `page` (zero-based) of every scan.
    pub async fn set_fail_on_scan_page(&self, page: Option<usize>) {
        *self.fail_on_scan_page.write().await = page;
    }

    /// Number of `put` calls received, including failed ones.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of `scan_page` calls received, including failed ones.
    pub fn scan_page_calls(&self) -> usize {
        self.scan_page_calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &str) -> Option<IndexRecord> {
        self.records.read().await.get(key).cloned()
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Zero-based number of the page that starts after `start`.
    fn page_number(
        records: &BTreeMap<String, IndexRecord>,
        start: Option<&ScanCursor>,
        page_size: usize,
    ) -> usize {
        match start {
            None => 0,
            Some(cursor) => {
                let seen = records
                    .range::<str, _>((Bound::Unbounded, Bound::Included(cursor.0.as_str())))
                    .count();
                seen.div_ceil(page_size)
            }
        }
    }
}

#[async_trait]
impl MetadataIndex for InMemoryMetadataIndex {
    async fn put(&self, key: &str, record: &IndexRecord) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_put.read().await {
            return Err(IndexError::WriteFailed(format!("injected failure for {}", key)));
        }
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn scan_page(&self, start: Option<ScanCursor>) -> Result<ScanPage> {
        self.scan_page_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;

        if let Some(fail_page) = *self.fail_on_scan_page.read().await {
            if Self::page_number(&records, start.as_ref(), self.page_size) == fail_page {
                return Err(IndexError::ScanFailed(format!(
                    "injected failure on page {}",
                    fail_page
                )));
            }
        }

        let lower = match &start {
            Some(cursor) => Bound::Excluded(cursor.0.as_str()),
            None => Bound::Unbounded,
        };
        let mut remaining = records.range::<str, _>((lower, Bound::Unbounded));

        let mut last_key = None;
        let page: Vec<IndexRecord> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, record)| {
                last_key = Some(key);
                record.clone()
            })
            .collect();

        // Cursor is the map key, which may differ from the record's own id.
        let next = match (last_key, remaining.next()) {
            (Some(last), Some(_)) => Some(ScanCursor(last.clone())),
            _ => None,
        };

        Ok(ScanPage {
            records: page,
            next,
        })
    }

    fn index_type(&self) -> IndexType {
        IndexType::Memory
    }
}
