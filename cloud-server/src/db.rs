//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Multi-statement batch, so no prepared statement
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Accepted uploads
CREATE TABLE IF NOT EXISTS files (
    id UUID PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum VARCHAR(64) NOT NULL UNIQUE,
    blob_ref TEXT NOT NULL,
    content_type VARCHAR(255) NOT NULL,
    size_bytes BIGINT NOT NULL,
    upload_date TIMESTAMPTZ NOT NULL,
    upload_hour INT NOT NULL,
    timezone VARCHAR(64) NOT NULL,
    is_duplicate BOOLEAN NOT NULL DEFAULT false,
    is_anomaly BOOLEAN NOT NULL DEFAULT false
);

-- Rejected-as-anomalous uploads (append only)
CREATE TABLE IF NOT EXISTS anomalies (
    id UUID PRIMARY KEY,
    filename TEXT NOT NULL,
    size_bytes BIGINT NOT NULL,
    upload_hour INT NOT NULL,
    details JSONB NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL,
    timezone VARCHAR(64) NOT NULL
);

-- File contents
CREATE TABLE IF NOT EXISTS blobs (
    id UUID PRIMARY KEY,
    filename TEXT NOT NULL,
    content_type VARCHAR(255) NOT NULL,
    data BYTEA NOT NULL,
    uploaded_at TIMESTAMPTZ NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_files_upload_date ON files(upload_date);
CREATE INDEX IF NOT EXISTS idx_anomalies_timestamp ON anomalies(timestamp);
"#;
