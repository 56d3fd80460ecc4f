// Word-embedding model and token-list similarity strategies.
//
// The model file is GloVe/word2vec text format: one `word v1 .. vn` line per
// word, optionally preceded by a `count dims` header line. Malformed lines
// are skipped with a warning so a truncated download still loads.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use super::ModelError;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub struct EmbeddingModel {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingModel {
    /// Load vectors from a text-format embeddings file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let started = std::time::Instant::now();
        let file = std::fs::File::open(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
        let mut dimensions = 0usize;
        let mut skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ModelError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let values: Result<Vec<f32>, _> = parts.map(str::parse).collect();
            let values = match values {
                Ok(v) => v,
                Err(_) => {
                    warn!("embeddings line {}: unparseable vector, skipping", idx + 1);
                    skipped += 1;
                    continue;
                }
            };

            // word2vec text files start with a `count dims` header.
            if idx == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }

            if dimensions == 0 {
                dimensions = values.len();
            } else if values.len() != dimensions {
                warn!(
                    "embeddings line {}: expected {} dims, got {}, skipping",
                    idx + 1,
                    dimensions,
                    values.len()
                );
                skipped += 1;
                continue;
            }
            vectors.insert(word.to_string(), values);
        }

        if vectors.is_empty() {
            return Err(ModelError::Empty {
                path: path.display().to_string(),
            });
        }

        info!(
            "loaded {} embedding vectors ({} dims, {} skipped) in {:?}",
            vectors.len(),
            dimensions,
            skipped,
            started.elapsed()
        );
        Ok(EmbeddingModel {
            dimensions,
            vectors,
        })
    }

    /// Build a model from in-memory pairs (tests and fixtures).
    pub fn from_pairs(pairs: &[(&str, &[f32])]) -> Self {
        let dimensions = pairs.first().map(|(_, v)| v.len()).unwrap_or(0);
        let vectors = pairs
            .iter()
            .map(|(w, v)| ((*w).to_string(), v.to_vec()))
            .collect();
        EmbeddingModel {
            dimensions,
            vectors,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    /// Mean vector over the tokens that are in vocabulary.
    fn mean_vector(&self, tokens: &[String]) -> Option<Vec<f32>> {
        let mut sum = vec![0.0f32; self.dimensions];
        let mut count = 0usize;
        for token in tokens {
            if let Some(v) = self.vectors.get(token) {
                for (s, x) in sum.iter_mut().zip(v) {
                    *s += x;
                }
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        for s in &mut sum {
            *s /= count as f32;
        }
        Some(sum)
    }
}

/// Cosine similarity of two vectors, clamped to [0, 1]. Negative cosine
/// means "unrelated" for label comparison, not "anti-similar".
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Token-list strategies
// ---------------------------------------------------------------------------

/// How two token lists are combined into one similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStrategy {
    /// Cosine of the averaged token vectors.
    MeanCosine,
    /// Drop tokens the labels share, compare mean vectors of the remainders.
    /// Identical or subset token lists score 1.0.
    DifferenceCosine,
    /// Maximum cosine over the token cross-product.
    MaxPair,
    /// Greedy best-match alignment over the differing tokens, averaged.
    AlignedFilter,
}

impl TokenStrategy {
    /// Similarity of two token lists under this strategy. Token lists are
    /// expected to be pre-filtered to in-vocabulary tokens; an empty list
    /// scores 0 against everything.
    pub fn similarity(self, model: &EmbeddingModel, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        match self {
            TokenStrategy::MeanCosine => {
                match (model.mean_vector(a), model.mean_vector(b)) {
                    (Some(va), Some(vb)) => cosine(&va, &vb),
                    _ => 0.0,
                }
            }
            TokenStrategy::DifferenceCosine => {
                let (rest_a, rest_b) = differing_tokens(a, b);
                if rest_a.is_empty() || rest_b.is_empty() {
                    // One label's tokens are contained in the other's.
                    return 1.0;
                }
                match (model.mean_vector(&rest_a), model.mean_vector(&rest_b)) {
                    (Some(va), Some(vb)) => cosine(&va, &vb),
                    _ => 0.0,
                }
            }
            TokenStrategy::MaxPair => {
                let mut best = 0.0f64;
                for ta in a {
                    for tb in b {
                        if let (Some(va), Some(vb)) = (model.vector(ta), model.vector(tb)) {
                            best = best.max(cosine(va, vb));
                        }
                    }
                }
                best
            }
            TokenStrategy::AlignedFilter => {
                let (rest_a, rest_b) = differing_tokens(a, b);
                if rest_a.is_empty() || rest_b.is_empty() {
                    return 1.0;
                }
                aligned_average(model, &rest_a, &rest_b)
            }
        }
    }
}

/// The tokens each list does not share with the other.
fn differing_tokens(a: &[String], b: &[String]) -> (Vec<String>, Vec<String>) {
    let rest_a = a.iter().filter(|t| !b.contains(t)).cloned().collect();
    let rest_b = b.iter().filter(|t| !a.contains(t)).cloned().collect();
    (rest_a, rest_b)
}

/// Greedily pair off the best-matching tokens, then average the pair scores
/// over the longer list so unmatched leftovers count as zeros.
fn aligned_average(model: &EmbeddingModel, a: &[String], b: &[String]) -> f64 {
    let mut remaining_a: Vec<&String> = a.iter().collect();
    let mut remaining_b: Vec<&String> = b.iter().collect();
    let mut total = 0.0f64;

    while !remaining_a.is_empty() && !remaining_b.is_empty() {
        let mut best: Option<(usize, usize, f64)> = None;
        for (i, ta) in remaining_a.iter().enumerate() {
            for (j, tb) in remaining_b.iter().enumerate() {
                if let (Some(va), Some(vb)) = (model.vector(ta), model.vector(tb)) {
                    let score = cosine(va, vb);
                    if best.map_or(true, |(_, _, s)| score > s) {
                        best = Some((i, j, score));
                    }
                }
            }
        }
        let Some((i, j, score)) = best else { break };
        total += score;
        remaining_a.remove(i);
        remaining_b.remove(j);
    }

    total / a.len().max(b.len()) as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
