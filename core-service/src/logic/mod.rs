//! Logic Module - Ingestion engines & read models
//!
//! ## Layout
//! - `ingest/` - upload classification pipeline (anomaly, duplicate, persist)
//! - `model/` - outlier model and anomaly scorer
//! - `storage/` - catalog and content store seams, in-memory backends
//! - `similarity/` - TF-IDF + LSA text similarity
//! - `aggregator` - dashboard statistics

// Pipeline
pub mod checksum;
pub mod ingest;
pub mod model;
pub mod storage;

// Supporting
pub mod clock;
pub mod events;
pub mod sniff;
pub mod types;

// Read side
pub mod aggregator;
pub mod similarity;
