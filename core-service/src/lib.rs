//! FileGuard Core - upload ingestion decision engine
//!
//! Classifies each upload as accepted, rejected as a duplicate, or rejected
//! as an anomaly, and computes dashboard statistics over what was kept.

pub mod constants;
pub mod logic;

pub use logic::aggregator::{Aggregator, DashboardStats};
pub use logic::events::{LogSink, Notification, NotificationSink};
pub use logic::ingest::{IngestConfig, IngestError, IngestionEngine, Outcome};
pub use logic::model::{AnomalyScorer, ModelError, ModelInfo};
pub use logic::storage::{Catalog, ContentStore, MemoryCatalog, MemoryContentStore, StorageError};
pub use logic::types::{AnomalyEvent, BlobRef, FileRecord};
