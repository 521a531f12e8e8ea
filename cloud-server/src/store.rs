//! PostgreSQL-backed Catalog and ContentStore
//!
//! `files.checksum` carries a UNIQUE constraint; a violation surfaces as
//! `StorageError::DuplicateChecksum` so the engine can resolve the race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fileguard_core::logic::storage::{BlobMetadata, StorageResult};
use fileguard_core::logic::types::FeaturePoint;
use fileguard_core::{AnomalyEvent, BlobRef, Catalog, ContentStore, FileRecord, StorageError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{to_u64, AnomalyRow, BlobRow, FileRow};

/// Map a driver error onto the storage taxonomy
fn storage_error(err: sqlx::Error, checksum: Option<&str>) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => match checksum {
            Some(checksum) => StorageError::DuplicateChecksum(checksum.to_string()),
            None => StorageError::Backend(db.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(err.to_string())
        }
        _ => StorageError::Backend(err.to_string()),
    }
}

fn backend(err: sqlx::Error) -> StorageError {
    storage_error(err, None)
}

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn insert_file(&self, record: &FileRecord) -> StorageResult<()> {
        FileRow::insert(&self.pool, record)
            .await
            .map_err(|e| storage_error(e, Some(&record.checksum)))
    }

    async fn find_by_checksum(&self, checksum: &str) -> StorageResult<Option<FileRecord>> {
        let row = FileRow::find_by_checksum(&self.pool, checksum).await.map_err(backend)?;
        Ok(row.map(FileRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<FileRecord>> {
        let row = FileRow::find_by_id(&self.pool, id).await.map_err(backend)?;
        Ok(row.map(FileRecord::from))
    }

    async fn list_files(&self, limit: Option<usize>) -> StorageResult<Vec<FileRecord>> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = FileRow::list(&self.pool, limit).await.map_err(backend)?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn feature_history(&self) -> StorageResult<Vec<FeaturePoint>> {
        FileRow::feature_history(&self.pool).await.map_err(backend)
    }

    async fn count_files(&self) -> StorageResult<u64> {
        FileRow::count(&self.pool).await.map(to_u64).map_err(backend)
    }

    async fn count_duplicates(&self) -> StorageResult<u64> {
        FileRow::count_duplicates(&self.pool).await.map(to_u64).map_err(backend)
    }

    async fn total_storage_bytes(&self) -> StorageResult<u64> {
        FileRow::total_size(&self.pool).await.map(to_u64).map_err(backend)
    }

    async fn count_files_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<u64> {
        FileRow::count_between(&self.pool, start, end)
            .await
            .map(to_u64)
            .map_err(backend)
    }

    async fn append_anomaly(&self, event: &AnomalyEvent) -> StorageResult<()> {
        AnomalyRow::insert(&self.pool, event).await.map_err(backend)
    }

    async fn count_anomalies(&self) -> StorageResult<u64> {
        AnomalyRow::count(&self.pool).await.map(to_u64).map_err(backend)
    }

    async fn recent_anomalies(&self, limit: usize) -> StorageResult<Vec<AnomalyEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = AnomalyRow::recent(&self.pool, limit).await.map_err(backend)?;
        Ok(rows.into_iter().map(AnomalyEvent::from).collect())
    }
}

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn put(&self, bytes: &[u8], metadata: &BlobMetadata) -> StorageResult<BlobRef> {
        let id = Uuid::new_v4();
        BlobRow::insert(
            &self.pool,
            id,
            &metadata.filename,
            &metadata.content_type,
            bytes,
            metadata.uploaded_at,
        )
        .await
        .map_err(backend)?;

        Ok(BlobRef::new(id.to_string()))
    }

    async fn get(&self, blob: &BlobRef) -> StorageResult<Option<Vec<u8>>> {
        // Refs are always UUIDs here; anything else cannot exist
        let Ok(id) = Uuid::parse_str(blob.as_str()) else {
            return Ok(None);
        };
        BlobRow::data(&self.pool, id).await.map_err(backend)
    }
}
