//! Ingestion types

use chrono_tz::Tz;
use thiserror::Error;
use uuid::Uuid;

use crate::logic::model::ModelError;
use crate::logic::storage::StorageError;
use crate::logic::types::{AnomalyDetails, BlobRef, FileRecord};

/// Similarity reported for a checksum match: byte-for-byte identical
pub const EXACT_MATCH_SIMILARITY: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Zone used for `upload_hour` and day buckets
    pub timezone: Tz,
}

impl IngestConfig {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// IANA name stored with each record, e.g. "Asia/Kolkata"
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// Classified result of one ingestion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted {
        id: Uuid,
        blob_ref: BlobRef,
    },
    RejectedAnomaly {
        details: AnomalyDetails,
    },
    RejectedDuplicate {
        existing: Box<FileRecord>,
        similarity: f64,
    },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Accepted { .. } => "accepted",
            Outcome::RejectedAnomaly { .. } => "rejected-anomaly",
            Outcome::RejectedDuplicate { .. } => "rejected-duplicate",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
