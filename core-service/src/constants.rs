//! Central Configuration Constants
//!
//! Single source of truth for every tunable of the decision engine.
//! Thresholds here are part of the accept/reject contract: changing them
//! changes which uploads are rejected.

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

// ============================================
// Anomaly gates
// ============================================

/// Uploads strictly below this size are never anomalous
pub const ANOMALY_MIN_SIZE_BYTES: u64 = 20 * MIB;

/// Uploads at or below this size are never anomalous, whatever the hour
pub const ANOMALY_LARGE_SIZE_BYTES: u64 = 30 * MIB;

/// First suspicious local hour (inclusive), wraps past midnight
pub const SUSPICIOUS_HOUR_START: u32 = 23;

/// First non-suspicious local hour after midnight (exclusive end)
pub const SUSPICIOUS_HOUR_END: u32 = 5;

/// Reason code / message for the size rule
pub const REASON_SIZE: &str = "size";
pub const REASON_SIZE_MESSAGE: &str = "File size is unusually large";

/// Reason code / message for the time rule
pub const REASON_TIME: &str = "time";
pub const REASON_TIME_MESSAGE: &str = "Upload time is outside normal business hours";

// ============================================
// Outlier model
// ============================================

/// History must hold more points than this before it replaces the prior
pub const MIN_HISTORY_POINTS: usize = 10;

/// Expected outlier fraction. Kept low to avoid over-flagging.
pub const CONTAMINATION: f64 = 0.1;

/// Trees per isolation forest
pub const FOREST_TREES: usize = 100;

/// Sub-sample cap per tree
pub const FOREST_MAX_SAMPLES: usize = 256;

/// Fixed training seed, makes retraining on the same data reproducible
pub const FOREST_SEED: u64 = 42;

// ============================================
// Similarity
// ============================================

/// Latent dimension cap for LSA
pub const MAX_LATENT_DIMENSIONS: usize = 100;

// ============================================
// Dashboard
// ============================================

/// Most recent uploads / anomalies pulled into the activity feed (each)
pub const RECENT_PER_KIND: usize = 5;

/// Activity feed length after merge
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Days in the upload histogram
pub const HISTOGRAM_DAYS: u32 = 7;
