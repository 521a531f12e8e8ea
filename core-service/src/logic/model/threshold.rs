//! Contamination Threshold
//!
//! Turns a contamination fraction into a decision offset over training
//! scores: the offset is the contamination-quantile of the scores, so about
//! that fraction of the training set falls below it.

use serde::{Deserialize, Serialize};

use crate::constants::CONTAMINATION;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Expected outlier fraction (0.0 - 0.5)
    pub contamination: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            contamination: CONTAMINATION,
        }
    }
}

impl ThresholdConfig {
    pub fn new(contamination: f64) -> Self {
        Self {
            contamination: contamination.clamp(0.0, 0.5),
        }
    }

    /// Offset for a set of training scores (lower score = more anomalous)
    pub fn offset(&self, scores: &[f64]) -> f64 {
        quantile(scores, self.contamination)
    }
}

/// Linear-interpolated quantile, `q` in [0, 1]. NaN for empty input.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_config() {
        let config = ThresholdConfig::default();
        assert_eq!(config.contamination, 0.1);
        assert_eq!(ThresholdConfig::new(0.9).contamination, 0.5);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 5.0);
        assert_eq!(quantile(&values, 0.5), 3.0);
        assert!((quantile(&values, 0.1) - 1.4).abs() < 1e-12);
        assert!(quantile(&[], 0.1).is_nan());
    }

    #[test]
    fn test_offset_leaves_contamination_below() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let config = ThresholdConfig::default();
        let offset = config.offset(&scores);

        let below = scores.iter().filter(|&&s| s < offset).count();
        assert_eq!(below, 10);
    }
}
