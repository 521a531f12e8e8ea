//! Isolation Forest
//!
//! Unsupervised outlier detector over fixed-width feature vectors.
//! Each tree isolates points with random axis-aligned splits. Points that
//! need few splits to isolate get a short path and a low score.
//!
//! Scores follow the usual convention: `score = -2^(-E[h(x)] / c(psi))`,
//! so values lie in [-1, 0) and lower means more anomalous. The decision
//! offset is taken from the training scores via `ThresholdConfig`.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::threshold::ThresholdConfig;
use super::{ModelError, FEATURE_DIM};
use crate::constants::{FOREST_MAX_SAMPLES, FOREST_SEED, FOREST_TREES};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_samples: usize,
    pub threshold: ThresholdConfig,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: FOREST_TREES,
            max_samples: FOREST_MAX_SAMPLES,
            threshold: ThresholdConfig::default(),
            seed: FOREST_SEED,
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(points: &[[f64; FEATURE_DIM]], height_limit: usize, rng: &mut StdRng) -> Self {
        let refs: Vec<&[f64; FEATURE_DIM]> = points.iter().collect();
        Self {
            root: grow(refs, 0, height_limit, rng),
        }
    }

    fn path_length(&self, x: &[f64; FEATURE_DIM]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;

        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn grow(
    points: Vec<&[f64; FEATURE_DIM]>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || points.len() <= 1 {
        return Node::Leaf { size: points.len() };
    }

    // Only features with spread can split
    let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(FEATURE_DIM);
    for feature in 0..FEATURE_DIM {
        let (min, max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[feature]), hi.max(p[feature]))
        });
        if max > min {
            candidates.push((feature, min, max));
        }
    }

    if candidates.is_empty() {
        return Node::Leaf { size: points.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    // [min, max): left always keeps the min, right always keeps the max
    let threshold = rng.gen_range(min..max);

    let (left, right): (Vec<_>, Vec<_>) = points.into_iter().partition(|p| p[feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(left, depth + 1, height_limit, rng)),
        right: Box::new(grow(right, depth + 1, height_limit, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit on `points`. Deterministic for a given config seed.
    pub fn fit(points: &[[f64; FEATURE_DIM]], config: &ForestConfig) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n = points.len();
        let sample_size = config.max_samples.min(n).max(1);
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.n_trees.max(1))
            .map(|_| {
                let sample: Vec<[f64; FEATURE_DIM]> = index::sample(&mut rng, n, sample_size)
                    .into_iter()
                    .map(|i| points[i])
                    .collect();
                IsolationTree::build(&sample, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };

        let training_scores: Vec<f64> = points.iter().map(|p| forest.score(p)).collect();
        forest.offset = config.threshold.offset(&training_scores);

        log::debug!(
            "Isolation forest fitted: {} trees, psi={}, n={}, offset={:.4}",
            forest.trees.len(),
            sample_size,
            n,
            forest.offset
        );

        Ok(forest)
    }

    /// Anomaly score in [-1, 0). Lower is more anomalous.
    pub fn score(&self, x: &[f64; FEATURE_DIM]) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>()
            / self.trees.len() as f64;

        let norm = average_path_length(self.sample_size);
        if norm <= 0.0 {
            // Single-sample forest cannot tell anything apart
            return -0.5;
        }

        -(2f64.powf(-mean_path / norm))
    }

    /// Score minus offset; negative means outlying
    pub fn decision(&self, x: &[f64; FEATURE_DIM]) -> f64 {
        self.score(x) - self.offset
    }

    pub fn is_outlier(&self, x: &[f64; FEATURE_DIM]) -> bool {
        self.decision(x) < 0.0
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(n: usize) -> Vec<[f64; FEATURE_DIM]> {
        // Small files (40-60 KB) spread across business hours
        (0..n)
            .map(|i| [40_000.0 + (i * 97 % 20_000) as f64, 9.0 + (i % 9) as f64])
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_fit_rejects_empty() {
        let err = IsolationForest::fit(&[], &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTrainingSet));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let points = cluster(120);
        let a = IsolationForest::fit(&points, &ForestConfig::default()).unwrap();
        let b = IsolationForest::fit(&points, &ForestConfig::default()).unwrap();

        let probe = [45_000.0, 12.0];
        assert_eq!(a.score(&probe), b.score(&probe));
        assert_eq!(a.offset(), b.offset());
        assert_eq!(a.n_trees(), FOREST_TREES);
    }

    #[test]
    fn test_far_point_scores_lower_than_center() {
        let points = cluster(200);
        let forest = IsolationForest::fit(&points, &ForestConfig::default()).unwrap();

        let far = [40.0 * 1024.0 * 1024.0, 2.0];
        let center = [50_000.0, 13.0];

        assert!(forest.score(&far) < forest.score(&center));
        assert!(forest.is_outlier(&far));
        assert!(!forest.is_outlier(&center));
    }

    #[test]
    fn test_scores_are_bounded() {
        let forest = IsolationForest::fit(&cluster(50), &ForestConfig::default()).unwrap();
        for p in cluster(50) {
            let s = forest.score(&p);
            assert!(s < 0.0 && s >= -1.0);
        }
    }

    #[test]
    fn test_roughly_contamination_fraction_flagged() {
        let points = cluster(200);
        let forest = IsolationForest::fit(&points, &ForestConfig::default()).unwrap();
        let flagged = points.iter().filter(|p| forest.is_outlier(p)).count();
        assert!(flagged <= 20, "flagged {} of 200", flagged);
    }
}
