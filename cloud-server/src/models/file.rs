//! File model

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fileguard_core::logic::clock::human_time;
use fileguard_core::logic::types::{Analysis, FeaturePoint};
use fileguard_core::{BlobRef, FileRecord};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::to_u64;

#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub filename: String,
    pub checksum: String,
    pub blob_ref: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub upload_date: DateTime<Utc>,
    pub upload_hour: i32,
    pub timezone: String,
    pub is_duplicate: bool,
    pub is_anomaly: bool,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        FileRecord {
            id: row.id,
            filename: row.filename,
            checksum: row.checksum,
            blob_ref: BlobRef(row.blob_ref),
            content_type: row.content_type,
            size_bytes: to_u64(row.size_bytes),
            upload_timestamp: row.upload_date,
            upload_hour: row.upload_hour.max(0) as u32,
            timezone: row.timezone,
            analysis: Analysis {
                is_duplicate: row.is_duplicate,
                is_anomaly: row.is_anomaly,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct FeatureRow {
    size_bytes: i64,
    upload_hour: i32,
}

impl FileRow {
    pub async fn insert(pool: &PgPool, record: &FileRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO files (id, filename, checksum, blob_ref, content_type, size_bytes,
                               upload_date, upload_hour, timezone, is_duplicate, is_anomaly)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        )
        .bind(record.id)
        .bind(&record.filename)
        .bind(&record.checksum)
        .bind(record.blob_ref.as_str())
        .bind(&record.content_type)
        .bind(record.size_bytes as i64)
        .bind(record.upload_timestamp)
        .bind(record.upload_hour as i32)
        .bind(&record.timezone)
        .bind(record.analysis.is_duplicate)
        .bind(record.analysis.is_anomaly)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_checksum(pool: &PgPool, checksum: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE checksum = $1")
            .bind(checksum)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first; `None` means no limit
    pub async fn list(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FileRow>(
            r#"
            SELECT * FROM files
            ORDER BY upload_date DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn feature_history(pool: &PgPool) -> Result<Vec<FeaturePoint>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FeatureRow>("SELECT size_bytes, upload_hour FROM files")
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| FeaturePoint::new(to_u64(r.size_bytes), r.upload_hour.max(0) as u32))
            .collect())
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(pool)
            .await
    }

    pub async fn count_duplicates(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE is_duplicate")
            .fetch_one(pool)
            .await
    }

    pub async fn total_size(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(SUM(size_bytes), 0)::BIGINT FROM files")
            .fetch_one(pool)
            .await
    }

    /// Both bounds inclusive
    pub async fn count_between(
        pool: &PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE upload_date >= $1 AND upload_date <= $2")
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await
    }
}

/// API view of a record with a display timestamp
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    #[serde(flatten)]
    pub record: FileRecord,
    pub upload_date_formatted: String,
}

impl FileView {
    pub fn new(record: FileRecord, zone: &Tz) -> Self {
        let upload_date_formatted = human_time(record.upload_timestamp, zone);
        Self {
            record,
            upload_date_formatted,
        }
    }
}

/// Pointer to the record that made an upload a duplicate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingFile {
    pub id: Uuid,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
}

impl From<&FileRecord> for ExistingFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename.clone(),
            upload_date: record.upload_timestamp,
        }
    }
}
