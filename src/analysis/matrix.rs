// Symmetric pairwise similarity matrices over an attribute's values.
//
// Only the upper triangle (i < j) is stored; self-similarity is never
// scored. Multi-scorer passes combine their matrices by elementwise max.

use super::scorer::Scorer;
use super::LabelValue;

/// Upper-triangle similarity matrix for `n` values.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMatrix {
    n: usize,
    cells: Vec<f64>,
}

/// One thresholded pair: value indices and the score that survived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub i: usize,
    pub j: usize,
    pub score: f64,
}

impl SimMatrix {
    pub fn new(n: usize) -> Self {
        let cells = vec![0.0; n * n.saturating_sub(1) / 2];
        SimMatrix { n, cells }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Flat index of the (i, j) cell, i < j.
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.n);
        // Cells before row i, plus the offset within row i.
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[self.idx(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, score: f64) {
        let idx = self.idx(i, j);
        self.cells[idx] = score;
    }

    /// Score every pair of values under the given scorer.
    pub fn build(values: &[LabelValue], scorer: &dyn Scorer) -> Self {
        let mut matrix = SimMatrix::new(values.len());
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                matrix.set(i, j, scorer.score(&values[i], &values[j]));
            }
        }
        matrix
    }

    /// Elementwise max of several same-size matrices. `None` if the list is
    /// empty or the sizes disagree.
    pub fn combine_max(matrices: &[SimMatrix]) -> Option<SimMatrix> {
        let first = matrices.first()?;
        if matrices.iter().any(|m| m.n != first.n) {
            return None;
        }
        let mut combined = first.clone();
        for matrix in &matrices[1..] {
            for (cell, other) in combined.cells.iter_mut().zip(&matrix.cells) {
                *cell = cell.max(*other);
            }
        }
        Some(combined)
    }

    /// All pairs at or above the threshold, best first.
    pub fn extract(&self, threshold: f64) -> Vec<ScoredPair> {
        let mut pairs = Vec::new();
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let score = self.get(i, j);
                if score >= threshold {
                    pairs.push(ScoredPair { i, j, score });
                }
            }
        }
        pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
        pairs
    }
}
