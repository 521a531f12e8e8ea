//! Similarity Estimator - lexical near-duplicate scoring
//!
//! TF-IDF over the two-document corpus, LSA reduction, then cosine.
//! Returns a 0-100 percentage rounded to two decimals.
//!
//! Not consulted by ingestion: exact duplicates are caught by checksum and
//! near-duplicates are accepted. Wiring this in would change which uploads
//! get rejected.

pub mod lsa;
pub mod stopwords;
pub mod tfidf;

use thiserror::Error;

use crate::constants::MAX_LATENT_DIMENSIONS;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("no usable terms after stop-word removal")]
    EmptyVocabulary,

    #[error("degenerate matrix: {0}")]
    Degenerate(String),
}

const TEXT_TYPES: &[&str] = &[
    "text/plain",
    "text/html",
    "text/css",
    "text/javascript",
    "application/json",
    "application/xml",
    "text/xml",
    "application/javascript",
    "application/x-javascript",
];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

pub fn is_text_content_type(content_type: &str) -> bool {
    TEXT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Whether similarity means anything for this MIME type
pub fn can_compute_similarity(content_type: &str) -> bool {
    is_text_content_type(content_type) || DOCUMENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Best-effort UTF-8: invalid sequences are dropped
fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Similarity in [0, 100], or why it could not be computed
pub fn try_similarity(a: &[u8], b: &[u8]) -> Result<f64, SimilarityError> {
    let text_a = decode_lossy(a);
    let text_b = decode_lossy(b);

    if text_a.trim().is_empty() || text_b.trim().is_empty() {
        return Ok(0.0);
    }

    // Vector methods are unstable on near-empty input
    if text_a.split_whitespace().count() < 2 || text_b.split_whitespace().count() < 2 {
        return Ok(if text_a == text_b { 100.0 } else { 0.0 });
    }

    let matrix = tfidf::fit_transform(&[text_a.as_str(), text_b.as_str()])?;
    if matrix.nnz() == 0 {
        return Ok(0.0);
    }

    let cosine = if matrix.n_terms() > 1 {
        let components = MAX_LATENT_DIMENSIONS.min(matrix.n_terms() - 1);
        let reduced = lsa::reduce(&matrix.weights, components)?;
        lsa::cosine(reduced.row(0), reduced.row(1))
    } else if matrix.weights[(0, 0)] == matrix.weights[(1, 0)] {
        1.0
    } else {
        0.0
    };

    if !cosine.is_finite() {
        return Err(SimilarityError::Degenerate("non-finite cosine".to_string()));
    }

    Ok(round2((cosine * 100.0).clamp(0.0, 100.0)))
}

/// Similarity in [0, 100]; any failure degrades to 0
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    match try_similarity(a, b) {
        Ok(score) => score,
        Err(e) => {
            log::debug!("Similarity degraded to 0: {}", e);
            0.0
        }
    }
}
