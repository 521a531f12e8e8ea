//! Content store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StorageResult;
use crate::logic::types::BlobRef;

/// Metadata written alongside a blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub filename: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Write-once blob storage. Blobs are never updated or deleted by the engine.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, bytes: &[u8], metadata: &BlobMetadata) -> StorageResult<BlobRef>;

    async fn get(&self, blob: &BlobRef) -> StorageResult<Option<Vec<u8>>>;
}
