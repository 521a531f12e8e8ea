//! In-memory Catalog and ContentStore
//!
//! Both keep their data behind a `parking_lot::RwLock`. The catalog checks
//! checksum uniqueness under the write lock, so it gives the same guarantee
//! as a store-level UNIQUE constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{BlobMetadata, Catalog, ContentStore, StorageError, StorageResult};
use crate::logic::types::{AnomalyEvent, BlobRef, FeaturePoint, FileRecord};

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Default)]
struct CatalogState {
    files: Vec<FileRecord>,
    by_checksum: HashMap<String, usize>,
    anomalies: Vec<AnomalyEvent>,
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first. Among equal timestamps the later insert wins.
fn newest_first<T: Clone>(items: &[T], ts: impl Fn(&T) -> DateTime<Utc>, limit: Option<usize>) -> Vec<T> {
    let mut indexed: Vec<(usize, &T)> = items.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| ts(b).cmp(&ts(a)).then(ib.cmp(ia)));

    let take = limit.unwrap_or(indexed.len());
    indexed.into_iter().take(take).map(|(_, item)| item.clone()).collect()
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert_file(&self, record: &FileRecord) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.by_checksum.contains_key(&record.checksum) {
            return Err(StorageError::DuplicateChecksum(record.checksum.clone()));
        }

        let idx = state.files.len();
        state.by_checksum.insert(record.checksum.clone(), idx);
        state.files.push(record.clone());
        Ok(())
    }

    async fn find_by_checksum(&self, checksum: &str) -> StorageResult<Option<FileRecord>> {
        let state = self.state.read();
        Ok(state
            .by_checksum
            .get(checksum)
            .and_then(|&idx| state.files.get(idx))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<FileRecord>> {
        Ok(self.state.read().files.iter().find(|f| f.id == id).cloned())
    }

    async fn list_files(&self, limit: Option<usize>) -> StorageResult<Vec<FileRecord>> {
        let state = self.state.read();
        Ok(newest_first(&state.files, |f| f.upload_timestamp, limit))
    }

    async fn feature_history(&self) -> StorageResult<Vec<FeaturePoint>> {
        Ok(self.state.read().files.iter().map(FileRecord::features).collect())
    }

    async fn count_files(&self) -> StorageResult<u64> {
        Ok(self.state.read().files.len() as u64)
    }

    async fn count_duplicates(&self) -> StorageResult<u64> {
        Ok(self
            .state
            .read()
            .files
            .iter()
            .filter(|f| f.analysis.is_duplicate)
            .count() as u64)
    }

    async fn total_storage_bytes(&self) -> StorageResult<u64> {
        Ok(self.state.read().files.iter().map(|f| f.size_bytes).sum())
    }

    async fn count_files_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<u64> {
        Ok(self
            .state
            .read()
            .files
            .iter()
            .filter(|f| f.upload_timestamp >= start && f.upload_timestamp <= end)
            .count() as u64)
    }

    async fn append_anomaly(&self, event: &AnomalyEvent) -> StorageResult<()> {
        self.state.write().anomalies.push(event.clone());
        Ok(())
    }

    async fn count_anomalies(&self) -> StorageResult<u64> {
        Ok(self.state.read().anomalies.len() as u64)
    }

    async fn recent_anomalies(&self, limit: usize) -> StorageResult<Vec<AnomalyEvent>> {
        let state = self.state.read();
        Ok(newest_first(&state.anomalies, |a| a.timestamp, Some(limit)))
    }
}

// ============================================================================
// CONTENT STORE
// ============================================================================

#[derive(Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<String, (Vec<u8>, BlobMetadata)>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    pub fn metadata(&self, blob: &BlobRef) -> Option<BlobMetadata> {
        self.blobs.read().get(blob.as_str()).map(|(_, meta)| meta.clone())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: &[u8], metadata: &BlobMetadata) -> StorageResult<BlobRef> {
        let blob = BlobRef::new(Uuid::new_v4().to_string());
        self.blobs
            .write()
            .insert(blob.0.clone(), (bytes.to_vec(), metadata.clone()));
        Ok(blob)
    }

    async fn get(&self, blob: &BlobRef) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(blob.as_str()).map(|(bytes, _)| bytes.clone()))
    }
}
