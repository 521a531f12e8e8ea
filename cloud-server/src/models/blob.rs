//! Blob model - file contents stored in BYTEA

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct BlobRow;

impl BlobRow {
    pub async fn insert(
        pool: &PgPool,
        id: Uuid,
        filename: &str,
        content_type: &str,
        data: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO blobs (id, filename, content_type, data, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#
        )
        .bind(id)
        .bind(filename)
        .bind(content_type)
        .bind(data)
        .bind(uploaded_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn data(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        sqlx::query_scalar("SELECT data FROM blobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
