//! Model Module - Upload Anomaly Detection
//!
//! Two-stage gate over the (size, hour) feature pair:
//! 1. deterministic size/time pre-filters (`scorer::evaluate`)
//! 2. an isolation forest, consulted only for very large uploads
//!
//! A statistical verdict only counts when the time rule agrees.

pub mod forest;
pub mod prior;
pub mod scorer;
pub mod threshold;
#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::logic::storage::StorageError;

/// Feature vector width: (size_bytes, upload_hour)
pub const FEATURE_DIM: usize = 2;

// Re-export common types
pub use forest::{ForestConfig, IsolationForest};
pub use scorer::{evaluate, is_time_suspicious, AnomalyScorer, ModelInfo, ModelSource, OutlierModel, Verdict};
pub use threshold::ThresholdConfig;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot train on an empty feature set")]
    EmptyTrainingSet,

    #[error("failed to load training history: {0}")]
    History(#[from] StorageError),
}
