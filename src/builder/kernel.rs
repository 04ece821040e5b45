//! Similarity kernels
//!
//! Cosine similarity is computed as the dot product of L2-normalised rows, so
//! both measures reduce to one matrix product per tile.

use crate::graph::SimilarityMeasure;
use ndarray::{Array2, ArrayView2, CowArray, Ix2};

/// Matrix the tiles are scored against: the raw embeddings for dot product,
/// a normalised copy for cosine. A zero row stays zero (similarity 0 to everything).
///
/// Rows are scaled by their largest magnitude before normalising so that the
/// squared norm of large but finite embeddings does not overflow.
pub fn prepare_matrix<'a>(
    matrix: ArrayView2<'a, f32>,
    measure: SimilarityMeasure,
) -> CowArray<'a, f32, Ix2> {
    match measure {
        SimilarityMeasure::DotProduct => CowArray::from(matrix),
        SimilarityMeasure::Cosine => {
            let mut owned = matrix.to_owned();
            for mut row in owned.rows_mut() {
                let scale = row.fold(0.0f32, |m, x| m.max(x.abs()));
                if scale > 0.0 {
                    row.mapv_inplace(|x| x / scale);
                    let norm = row.dot(&row).sqrt();
                    row.mapv_inplace(|x| x / norm);
                }
            }
            CowArray::from(owned)
        }
    }
}

/// Scores of every tile row against every column row: `rows · colsᵀ`.
///
/// Cosine scores are clamped to [-1, 1]; the product of two normalised rows
/// can land a few ULPs outside it.
pub fn score_tile(
    rows: ArrayView2<'_, f32>,
    cols: ArrayView2<'_, f32>,
    measure: SimilarityMeasure,
) -> Array2<f32> {
    let mut scores = rows.dot(&cols.t());
    if measure == SimilarityMeasure::Cosine {
        scores.mapv_inplace(|x| x.clamp(-1.0, 1.0));
    }
    scores
}

/// Matrix rows `(row, col)` of the first non-finite pair score in a tile whose
/// top-left corner is `(row_start, col_start)`. Self-scores are not pairs and
/// are skipped.
pub fn first_non_finite(
    scores: ArrayView2<'_, f32>,
    row_start: usize,
    col_start: usize,
) -> Option<(usize, usize)> {
    scores
        .indexed_iter()
        .map(|((r, c), s)| ((row_start + r, col_start + c), s))
        .find(|((row, col), s)| row != col && !s.is_finite())
        .map(|(pos, _)| pos)
}

/// Cosine similarity of two vectors; 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Plain inner product
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
