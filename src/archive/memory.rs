//! In-memory object archive.
//!
//! Keeps objects in a process-local map. Used by tests (call counting and
//! failure injection) and by the `memory` archive type for local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ArchiveError, ArchiveType, ObjectArchive, Result};

/// Object archive that stores objects in memory.
#[derive(Default)]
pub struct InMemoryObjectArchive {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    put_calls: AtomicUsize,
    fail_on_put: RwLock<bool>,
}

impl InMemoryObjectArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail without storing anything.
    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    /// Number of `put` calls received, including failed ones.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectArchive for InMemoryObjectArchive {
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_put.read().await {
            return Err(ArchiveError::StoreFailed(format!(
                "injected failure for {}",
                key
            )));
        }
        self.objects.write().await.insert(key.to_string(), payload);
        Ok(())
    }

    fn archive_type(&self) -> ArchiveType {
        ArchiveType::Memory
    }
}
