//! TF-IDF vectorizer over a small document corpus
//!
//! - tokens: runs of 2+ word characters, lower-cased
//! - stop words removed
//! - smoothed idf: `ln((1 + n) / (1 + df)) + 1`
//! - rows L2-normalised

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use ndarray::Array2;
use regex::Regex;

use super::stopwords::is_stop_word;
use super::SimilarityError;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"))
}

/// Analyzed tokens of one document
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Document-term matrix plus its vocabulary (column order)
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    pub vocabulary: Vec<String>,
    pub weights: Array2<f64>,
}

impl TfidfMatrix {
    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn nnz(&self) -> usize {
        self.weights.iter().filter(|w| **w != 0.0).count()
    }
}

/// Fit and transform `docs` in one pass
pub fn fit_transform(docs: &[&str]) -> Result<TfidfMatrix, SimilarityError> {
    let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();

    let vocabulary: Vec<String> = tokenized
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if vocabulary.is_empty() {
        return Err(SimilarityError::EmptyVocabulary);
    }

    let column: BTreeMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let n_docs = docs.len();
    let mut weights = Array2::<f64>::zeros((n_docs, vocabulary.len()));

    // Raw term counts
    for (row, tokens) in tokenized.iter().enumerate() {
        for token in tokens {
            weights[(row, column[token.as_str()])] += 1.0;
        }
    }

    // Smoothed idf per column
    for mut values in weights.columns_mut() {
        let df = values.iter().filter(|v| **v > 0.0).count() as f64;
        let idf = ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0;
        values.mapv_inplace(|tf| tf * idf);
    }

    for mut row in weights.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|w| w / norm);
        }
    }

    Ok(TfidfMatrix { vocabulary, weights })
}
