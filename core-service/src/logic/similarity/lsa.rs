//! Latent Semantic Analysis
//!
//! Truncated SVD of an `n_docs x n_terms` matrix via the eigen-decomposition
//! of its Gram matrix `A * A^T`. With few documents the Gram matrix is tiny,
//! so a cyclic Jacobi sweep is exact enough and has no dependencies.
//!
//! The reduced document coordinates are `U_k * Sigma_k`.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use super::SimilarityError;

const MAX_SWEEPS: usize = 64;
const OFF_DIAGONAL_EPS: f64 = 1e-24;

/// Eigenvalues (descending) and matching eigenvector columns
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>), SimilarityError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(SimilarityError::Degenerate(format!(
            "eigen-decomposition needs a square matrix, got {}x{}",
            n,
            matrix.ncols()
        )));
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[(p, q)] * a[(p, q)];
            }
        }
        if off < OFF_DIAGONAL_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[(k, p)], a[(k, q)]);
                    a[(k, p)] = c * akp - s * akq;
                    a[(k, q)] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[(p, k)], a[(q, k)]);
                    a[(p, k)] = c * apk - s * aqk;
                    a[(q, k)] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[(k, p)], v[(k, q)]);
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[(j, j)].total_cmp(&a[(i, i)]));

    let values = Array1::from_iter(order.iter().map(|&i| a[(i, i)]));
    let vectors = v.select(Axis(1), &order);

    if values.iter().any(|x| !x.is_finite()) {
        return Err(SimilarityError::Degenerate("non-finite eigenvalue".to_string()));
    }

    Ok((values, vectors))
}

/// Project documents onto at most `components` latent dimensions
pub fn reduce(matrix: &Array2<f64>, components: usize) -> Result<Array2<f64>, SimilarityError> {
    let gram = matrix.dot(&matrix.t());
    let (values, vectors) = symmetric_eigen(&gram)?;

    // Rank never exceeds the number of documents
    let k = components.min(values.len()).max(1);
    let mut reduced = Array2::<f64>::zeros((matrix.nrows(), k));

    for comp in 0..k {
        let sigma = values[comp].max(0.0).sqrt();
        for doc in 0..matrix.nrows() {
            reduced[(doc, comp)] = vectors[(doc, comp)] * sigma;
        }
    }

    Ok(reduced)
}

/// Cosine of two vectors; zero vectors compare as 0
pub fn cosine(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let na = a.dot(&a).sqrt();
    let nb = b.dot(&b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (na * nb)
}
