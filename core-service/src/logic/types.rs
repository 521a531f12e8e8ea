//! Catalog data model
//!
//! Records persisted by the catalog plus the feature pair the anomaly
//! model is trained on.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason code -> human readable explanation
pub type AnomalyDetails = BTreeMap<String, String>;

/// Opaque handle into the content store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub String);

impl BlobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Analysis flags. Both are always false on an accepted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub is_duplicate: bool,
    pub is_anomaly: bool,
}

/// One accepted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub checksum: String,
    pub blob_ref: BlobRef,
    pub content_type: String,
    pub size_bytes: u64,
    pub upload_timestamp: DateTime<Utc>,
    /// Local hour at upload time, frozen so a timezone change never shifts it
    pub upload_hour: u32,
    pub timezone: String,
    pub analysis: Analysis,
}

impl FileRecord {
    pub fn features(&self) -> FeaturePoint {
        FeaturePoint::new(self.size_bytes, self.upload_hour)
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// One rejected-anomaly upload. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
    pub upload_hour: u32,
    pub details: AnomalyDetails,
    pub timestamp: DateTime<Utc>,
    pub timezone: String,
}

/// Model feature pair (byte size, local hour)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    pub size_bytes: u64,
    pub hour: u32,
}

impl FeaturePoint {
    pub fn new(size_bytes: u64, hour: u32) -> Self {
        Self { size_bytes, hour }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.size_bytes as f64, self.hour as f64]
    }
}
