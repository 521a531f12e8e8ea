//! Catalog trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StorageResult;
use crate::logic::types::{AnomalyEvent, FeaturePoint, FileRecord};

/// Durable record store of accepted files plus the anomaly log.
///
/// Implementations must enforce uniqueness of `FileRecord::checksum` and
/// report a violation as `StorageError::DuplicateChecksum`.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Persist an accepted record
    async fn insert_file(&self, record: &FileRecord) -> StorageResult<()>;

    /// Equality lookup on the checksum index
    async fn find_by_checksum(&self, checksum: &str) -> StorageResult<Option<FileRecord>>;

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<FileRecord>>;

    /// Records ordered by upload time, newest first
    async fn list_files(&self, limit: Option<usize>) -> StorageResult<Vec<FileRecord>>;

    /// Every (size, hour) pair, used to train the outlier model
    async fn feature_history(&self) -> StorageResult<Vec<FeaturePoint>>;

    async fn count_files(&self) -> StorageResult<u64>;

    /// Records flagged as duplicates
    async fn count_duplicates(&self) -> StorageResult<u64>;

    /// Sum of `size_bytes` over all records
    async fn total_storage_bytes(&self) -> StorageResult<u64>;

    /// Records with `start <= upload_timestamp <= end`
    async fn count_files_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<u64>;

    /// Append to the anomaly log
    async fn append_anomaly(&self, event: &AnomalyEvent) -> StorageResult<()>;

    async fn count_anomalies(&self) -> StorageResult<u64>;

    /// Anomaly events, newest first
    async fn recent_anomalies(&self, limit: usize) -> StorageResult<Vec<AnomalyEvent>>;
}
