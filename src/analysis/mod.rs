// The scoring pipeline: distinct attribute values with their preprocessed
// forms, pairwise similarity matrices, and the pass runner that turns
// thresholded pairs into repair suggestions.

pub mod matrix;
pub mod scorer;
pub mod suggest;

use std::collections::BTreeMap;

use tracing::info;

use crate::config::PassConfig;
use crate::nlp::embedding::EmbeddingModel;
use crate::nlp::lexicon::Lexicon;
use crate::nlp::normalize::{content_tokens, preprocess, tokenize};

use matrix::SimMatrix;
use scorer::{scorer_from_option, ScorerError};
use suggest::{build_suggestions, RepairSuggestion};

/// Passes with more than one scorer option combine their matrices by
/// elementwise max and use this threshold instead of the configured one.
pub const MULTI_OPTION_THRESHOLD: f64 = 0.75;

// ---------------------------------------------------------------------------
// Value collections
// ---------------------------------------------------------------------------

/// One distinct value of an attribute, with its occurrence count and the
/// preprocessed views the scorers work on.
#[derive(Debug, Clone)]
pub struct LabelValue {
    /// The value exactly as it appears in the log (trimmed).
    pub raw: String,
    pub count: u64,
    /// Normalized form (lowercased, separators mapped, punctuation stripped).
    pub processed: String,
    /// All tokens of the processed form.
    pub tokens: Vec<String>,
    /// Tokens with stopwords removed.
    pub content: Vec<String>,
    /// Content tokens present in the embedding vocabulary.
    pub vocab: Vec<String>,
}

/// A selected attribute and its distinct values.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<LabelValue>,
}

impl Attribute {
    /// Build the value collection from the per-attribute frequency map. The
    /// vocabulary view is only populated when an embedding model is at hand;
    /// lexical passes don't need it.
    pub fn from_content(
        name: &str,
        counts: &BTreeMap<String, u64>,
        model: Option<&EmbeddingModel>,
    ) -> Self {
        let values = counts
            .iter()
            .map(|(raw, count)| {
                let processed = preprocess(raw);
                let tokens = tokenize(&processed);
                let content = content_tokens(&tokens);
                let vocab = match model {
                    Some(m) => content.iter().filter(|t| m.contains(t)).cloned().collect(),
                    None => Vec::new(),
                };
                LabelValue {
                    raw: raw.clone(),
                    count: *count,
                    processed,
                    tokens,
                    content,
                    vocab,
                }
            })
            .collect();
        Attribute {
            name: name.to_string(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Pass runner
// ---------------------------------------------------------------------------

/// Run one analysis pass over the given attributes: build a matrix per
/// scorer option, combine multi-option passes by elementwise max, threshold,
/// and resolve the surviving pairs into suggestions. Suggestion ids are
/// assigned contiguously across attributes within the pass.
pub fn run_pass(
    attributes: &[Attribute],
    pass: &PassConfig,
    model: Option<&EmbeddingModel>,
    lexicon: Option<&Lexicon>,
) -> Result<Vec<RepairSuggestion>, ScorerError> {
    let started = std::time::Instant::now();
    let threshold = if pass.options.len() > 1 {
        MULTI_OPTION_THRESHOLD
    } else {
        pass.threshold
    };

    let mut suggestions = Vec::new();
    let mut next_id = 0usize;

    for attribute in attributes {
        // Fewer than two distinct values: nothing to compare.
        if attribute.values.len() < 2 {
            continue;
        }

        let mut matrices = Vec::with_capacity(pass.options.len());
        for option in &pass.options {
            let scorer = scorer_from_option(option, model)?;
            matrices.push(SimMatrix::build(&attribute.values, scorer.as_ref()));
        }
        let combined = match SimMatrix::combine_max(&matrices) {
            Some(m) => m,
            None => continue,
        };

        let pairs = combined.extract(threshold);
        suggestions.extend(build_suggestions(
            attribute,
            &pairs,
            lexicon,
            &pass.name,
            threshold,
            &mut next_id,
        ));
    }

    info!(
        "pass `{}`: {} suggestions across {} attributes in {:?}",
        pass.name,
        suggestions.len(),
        attributes.len(),
        started.elapsed()
    );
    Ok(suggestions)
}
