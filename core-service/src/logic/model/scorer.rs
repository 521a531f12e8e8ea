//! Anomaly Scorer
//!
//! Owns the single trained outlier model shared by every request.
//!
//! # Concurrency
//! - The model sits in a `RwLock<Option<Arc<TrainedModel>>>`. Readers clone
//!   the `Arc` and score without holding the lock.
//! - Training happens outside the lock; the finished model is published
//!   with one write, so readers see the old model or the new one.
//! - A `tokio::sync::Mutex` serialises trainers, so lazy initialization
//!   trains once even under concurrent first requests.
//!
//! # Staleness
//! The model is trained once per process (or per explicit `reinitialize`).
//! New uploads never trigger retraining.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::forest::{ForestConfig, IsolationForest};
use super::prior::synthetic_prior;
use super::{ModelError, FEATURE_DIM};
use crate::constants::{
    ANOMALY_LARGE_SIZE_BYTES, ANOMALY_MIN_SIZE_BYTES, MIN_HISTORY_POINTS, REASON_SIZE,
    REASON_SIZE_MESSAGE, REASON_TIME, REASON_TIME_MESSAGE, SUSPICIOUS_HOUR_END,
    SUSPICIOUS_HOUR_START,
};
use crate::logic::storage::Catalog;
use crate::logic::types::{AnomalyDetails, FeaturePoint};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Anything that can call a feature pair statistically outlying
pub trait OutlierModel: Send + Sync {
    fn is_outlier(&self, point: FeaturePoint) -> bool;
}

impl OutlierModel for IsolationForest {
    fn is_outlier(&self, point: FeaturePoint) -> bool {
        let x: [f64; FEATURE_DIM] = point.as_array();
        IsolationForest::is_outlier(self, &x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    History,
    SyntheticPrior,
    /// Installed by the host rather than trained here
    External,
}

/// What the current model was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub source: ModelSource,
    pub samples: usize,
    pub offset: Option<f64>,
    pub trained_at: DateTime<Utc>,
}

/// Scoring outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_anomaly: bool,
    pub details: AnomalyDetails,
}

impl Verdict {
    pub fn normal() -> Self {
        Self::default()
    }
}

struct TrainedModel {
    detector: Arc<dyn OutlierModel>,
    info: ModelInfo,
}

// ============================================================================
// RULES
// ============================================================================

/// 23:00-04:59 local, wrapping midnight
pub fn is_time_suspicious(hour: u32) -> bool {
    hour >= SUSPICIOUS_HOUR_START || hour < SUSPICIOUS_HOUR_END
}

/// Apply the size/time gates, consulting `model` only past the large-size gate
pub fn evaluate(size_bytes: u64, hour: u32, model: &dyn OutlierModel) -> Verdict {
    if size_bytes < ANOMALY_MIN_SIZE_BYTES {
        return Verdict::normal();
    }

    let time_suspicious = is_time_suspicious(hour);

    if size_bytes <= ANOMALY_LARGE_SIZE_BYTES {
        return Verdict::normal();
    }

    let outlying = model.is_outlier(FeaturePoint::new(size_bytes, hour));
    if !(outlying && time_suspicious) {
        return Verdict::normal();
    }

    let mut details = AnomalyDetails::new();
    if size_bytes > ANOMALY_LARGE_SIZE_BYTES {
        details.insert(REASON_SIZE.to_string(), REASON_SIZE_MESSAGE.to_string());
    }
    if time_suspicious {
        details.insert(REASON_TIME.to_string(), REASON_TIME_MESSAGE.to_string());
    }

    Verdict {
        is_anomaly: true,
        details,
    }
}

// ============================================================================
// SCORER
// ============================================================================

pub struct AnomalyScorer {
    model: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
    config: ForestConfig,
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl AnomalyScorer {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            model: RwLock::new(None),
            training: Mutex::new(()),
            config,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model.read().as_ref().map(|m| m.info.clone())
    }

    fn current(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    fn publish(&self, model: TrainedModel) -> ModelInfo {
        let info = model.info.clone();
        *self.model.write() = Some(Arc::new(model));
        info
    }

    /// Train from catalog history unless a model is already present
    pub async fn initialize(&self, catalog: &dyn Catalog) -> Result<ModelInfo, ModelError> {
        if let Some(model) = self.current() {
            return Ok(model.info.clone());
        }

        let _guard = self.training.lock().await;
        // Another request may have finished training while we waited
        if let Some(model) = self.current() {
            return Ok(model.info.clone());
        }

        self.train_from_catalog(catalog).await
    }

    /// Retrain from catalog history, replacing any current model
    pub async fn reinitialize(&self, catalog: &dyn Catalog) -> Result<ModelInfo, ModelError> {
        let _guard = self.training.lock().await;
        self.train_from_catalog(catalog).await
    }

    async fn train_from_catalog(&self, catalog: &dyn Catalog) -> Result<ModelInfo, ModelError> {
        let history = catalog.feature_history().await?;
        self.train_from_history(&history)
    }

    /// Train on `history` when it is large enough, otherwise on the prior
    pub fn train_from_history(&self, history: &[FeaturePoint]) -> Result<ModelInfo, ModelError> {
        let (source, points) = if history.len() > MIN_HISTORY_POINTS {
            (ModelSource::History, history.to_vec())
        } else {
            (ModelSource::SyntheticPrior, synthetic_prior(self.config.seed))
        };

        let features: Vec<[f64; FEATURE_DIM]> = points.iter().map(FeaturePoint::as_array).collect();
        let forest = IsolationForest::fit(&features, &self.config)?;

        log::info!(
            "Anomaly model trained on {:?} ({} points, offset {:.4})",
            source,
            points.len(),
            forest.offset()
        );

        let info = ModelInfo {
            source,
            samples: points.len(),
            offset: Some(forest.offset()),
            trained_at: Utc::now(),
        };

        Ok(self.publish(TrainedModel {
            detector: Arc::new(forest),
            info,
        }))
    }

    /// Replace the model with one built elsewhere
    pub fn install(&self, detector: Arc<dyn OutlierModel>, samples: usize) -> ModelInfo {
        log::info!("Installing external anomaly model ({} samples)", samples);
        self.publish(TrainedModel {
            detector,
            info: ModelInfo {
                source: ModelSource::External,
                samples,
                offset: None,
                trained_at: Utc::now(),
            },
        })
    }

    /// Score an upload, training lazily on first use
    pub async fn score(
        &self,
        catalog: &dyn Catalog,
        size_bytes: u64,
        hour: u32,
    ) -> Result<Verdict, ModelError> {
        let model = match self.current() {
            Some(model) => model,
            None => {
                self.initialize(catalog).await?;
                self.current().ok_or(ModelError::EmptyTrainingSet)?
            }
        };

        Ok(evaluate(size_bytes, hour, model.detector.as_ref()))
    }
}
