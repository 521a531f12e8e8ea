//! Anomaly model

use chrono::{DateTime, Utc};
use fileguard_core::logic::types::AnomalyDetails;
use fileguard_core::AnomalyEvent;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::to_u64;

#[derive(Debug, Clone, FromRow)]
pub struct AnomalyRow {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: i64,
    pub upload_hour: i32,
    pub details: Json<AnomalyDetails>,
    pub timestamp: DateTime<Utc>,
    pub timezone: String,
}

impl From<AnomalyRow> for AnomalyEvent {
    fn from(row: AnomalyRow) -> Self {
        AnomalyEvent {
            id: row.id,
            filename: row.filename,
            size_bytes: to_u64(row.size_bytes),
            upload_hour: row.upload_hour.max(0) as u32,
            details: row.details.0,
            timestamp: row.timestamp,
            timezone: row.timezone,
        }
    }
}

impl AnomalyRow {
    pub async fn insert(pool: &PgPool, event: &AnomalyEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO anomalies (id, filename, size_bytes, upload_hour, details, timestamp, timezone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        )
        .bind(event.id)
        .bind(&event.filename)
        .bind(event.size_bytes as i64)
        .bind(event.upload_hour as i32)
        .bind(Json(&event.details))
        .bind(event.timestamp)
        .bind(&event.timezone)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM anomalies")
            .fetch_one(pool)
            .await
    }

    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AnomalyRow>(
            r#"
            SELECT * FROM anomalies
            ORDER BY timestamp DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
