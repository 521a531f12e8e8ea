//! Ingestion Engine - upload classification pipeline
//!
//! Steps, each short-circuiting the rest:
//! 1. size + local hour
//! 2. anomaly gate (no hashing or storage work on this path)
//! 3. checksum
//! 4. duplicate lookup (similarity is exactly 1.0 on a hit)
//! 5. sniff, blob write, then catalog write
//!
//! The blob is written strictly before the catalog record, so a failed blob
//! write never leaves a dangling record. A failed catalog write can leave an
//! orphaned blob, which is harmless.

pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logic::checksum::{fingerprint, ChecksumIndex};
use crate::logic::clock::local_hour;
use crate::logic::events::{emit, LogSink, Notification, NotificationSink};
use crate::logic::model::{AnomalyScorer, ModelError, ModelInfo};
use crate::logic::sniff::{MagicSniffer, MimeSniffer};
use crate::logic::storage::{BlobMetadata, Catalog, ContentStore, StorageError};
use crate::logic::types::{Analysis, AnomalyEvent, FileRecord};

pub use types::{IngestConfig, IngestError, Outcome, EXACT_MATCH_SIMILARITY};

pub struct IngestionEngine {
    catalog: Arc<dyn Catalog>,
    content: Arc<dyn ContentStore>,
    scorer: Arc<AnomalyScorer>,
    index: ChecksumIndex,
    sniffer: Arc<dyn MimeSniffer>,
    sink: Arc<dyn NotificationSink>,
    config: IngestConfig,
}

impl IngestionEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        content: Arc<dyn ContentStore>,
        scorer: Arc<AnomalyScorer>,
        config: IngestConfig,
    ) -> Self {
        Self {
            index: ChecksumIndex::new(catalog.clone()),
            catalog,
            content,
            scorer,
            sniffer: Arc::new(MagicSniffer),
            sink: Arc::new(LogSink),
            config,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn scorer(&self) -> &AnomalyScorer {
        &self.scorer
    }

    /// Train the anomaly model now instead of on the first upload
    pub async fn warm_up(&self) -> Result<ModelInfo, ModelError> {
        self.scorer.initialize(self.catalog.as_ref()).await
    }

    /// Retrain the anomaly model from current catalog history
    pub async fn reinitialize_model(&self) -> Result<ModelInfo, ModelError> {
        self.scorer.reinitialize(self.catalog.as_ref()).await
    }

    /// Classify one upload and persist it if accepted
    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<Outcome, IngestError> {
        let size_bytes = bytes.len() as u64;
        let upload_hour = local_hour(observed_at, &self.config.timezone);

        // Anomaly gate
        let verdict = self
            .scorer
            .score(self.catalog.as_ref(), size_bytes, upload_hour)
            .await?;

        if verdict.is_anomaly {
            let event = AnomalyEvent {
                id: Uuid::new_v4(),
                filename: filename.to_string(),
                size_bytes,
                upload_hour,
                details: verdict.details.clone(),
                timestamp: observed_at,
                timezone: self.config.timezone_name().to_string(),
            };
            self.catalog.append_anomaly(&event).await?;

            log::warn!(
                "Upload '{}' rejected as anomalous ({} bytes at hour {}): {:?}",
                filename,
                size_bytes,
                upload_hour,
                verdict.details.keys().collect::<Vec<_>>()
            );

            emit(
                self.sink.as_ref(),
                Notification::AnomalyDetected {
                    filename: filename.to_string(),
                    details: verdict.details.clone(),
                },
            );

            return Ok(Outcome::RejectedAnomaly {
                details: verdict.details,
            });
        }

        // Duplicate gate
        let checksum = fingerprint(bytes);
        if let Some(existing) = self.index.lookup(&checksum).await? {
            return Ok(self.reject_duplicate(filename, existing));
        }

        // Persist: blob first, then record
        let content_type = self.sniffer.sniff(bytes, Some(filename));
        let metadata = BlobMetadata {
            filename: filename.to_string(),
            content_type: content_type.clone(),
            uploaded_at: observed_at,
        };
        let blob_ref = self.content.put(bytes, &metadata).await?;

        let record = FileRecord {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            checksum: checksum.clone(),
            blob_ref: blob_ref.clone(),
            content_type,
            size_bytes,
            upload_timestamp: observed_at,
            upload_hour,
            timezone: self.config.timezone_name().to_string(),
            analysis: Analysis::default(),
        };

        match self.catalog.insert_file(&record).await {
            Ok(()) => {}
            Err(StorageError::DuplicateChecksum(_)) => {
                // Lost the race against a concurrent identical upload
                log::warn!(
                    "Checksum {} cataloged concurrently; blob {} left orphaned",
                    checksum,
                    blob_ref
                );
                return match self.index.lookup(&checksum).await? {
                    Some(existing) => Ok(self.reject_duplicate(filename, existing)),
                    None => Err(StorageError::DuplicateChecksum(checksum).into()),
                };
            }
            Err(e) => return Err(e.into()),
        }

        log::info!(
            "Upload '{}' accepted as {} ({} bytes, {})",
            filename,
            record.id,
            size_bytes,
            record.content_type
        );

        emit(
            self.sink.as_ref(),
            Notification::FileUploaded {
                filename: filename.to_string(),
                id: record.id,
            },
        );

        Ok(Outcome::Accepted {
            id: record.id,
            blob_ref,
        })
    }

    fn reject_duplicate(&self, filename: &str, existing: FileRecord) -> Outcome {
        log::info!(
            "Upload '{}' is a duplicate of '{}' ({})",
            filename,
            existing.filename,
            existing.id
        );

        emit(
            self.sink.as_ref(),
            Notification::DuplicateDetected {
                filename: filename.to_string(),
                existing_filename: existing.filename.clone(),
            },
        );

        Outcome::RejectedDuplicate {
            existing: Box::new(existing),
            similarity: EXACT_MATCH_SIMILARITY,
        }
    }
}
