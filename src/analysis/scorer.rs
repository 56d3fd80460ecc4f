// Similarity scorers and their selection from config option strings.

use thiserror::Error;

use crate::nlp::embedding::{EmbeddingModel, TokenStrategy};

use super::LabelValue;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("unknown scorer option `{0}`")]
    Unknown(String),

    #[error("scorer option `{0}` requires an embeddings model")]
    NeedsModel(String),
}

/// A pairwise similarity measure over label values. Scores are in [0, 1],
/// higher means more similar.
pub trait Scorer {
    fn name(&self) -> &'static str;
    fn score(&self, a: &LabelValue, b: &LabelValue) -> f64;
}

/// Normalized Levenshtein similarity over the processed label strings.
pub struct EditDistanceScorer;

impl Scorer for EditDistanceScorer {
    fn name(&self) -> &'static str {
        "leven"
    }

    fn score(&self, a: &LabelValue, b: &LabelValue) -> f64 {
        strsim::normalized_levenshtein(&a.processed, &b.processed).clamp(0.0, 1.0)
    }
}

/// Embedding similarity over the in-vocabulary content tokens, under one of
/// the token-combination strategies.
pub struct EmbeddingScorer<'a> {
    model: &'a EmbeddingModel,
    strategy: TokenStrategy,
}

impl EmbeddingScorer<'_> {
    pub fn new(model: &EmbeddingModel, strategy: TokenStrategy) -> EmbeddingScorer<'_> {
        EmbeddingScorer { model, strategy }
    }
}

impl Scorer for EmbeddingScorer<'_> {
    fn name(&self) -> &'static str {
        match self.strategy {
            TokenStrategy::MeanCosine => "mean",
            TokenStrategy::DifferenceCosine => "difference",
            TokenStrategy::MaxPair => "maxpair",
            TokenStrategy::AlignedFilter => "aligned",
        }
    }

    fn score(&self, a: &LabelValue, b: &LabelValue) -> f64 {
        self.strategy
            .similarity(self.model, &a.vocab, &b.vocab)
            .clamp(0.0, 1.0)
    }
}

/// Resolve a config option string into a scorer. Semantic options fail when
/// no embedding model has been loaded; the caller reports that in the status
/// line and skips the pass.
pub fn scorer_from_option<'a>(
    option: &str,
    model: Option<&'a EmbeddingModel>,
) -> Result<Box<dyn Scorer + 'a>, ScorerError> {
    let strategy = match option {
        "leven" => return Ok(Box::new(EditDistanceScorer)),
        "mean" => TokenStrategy::MeanCosine,
        "difference" => TokenStrategy::DifferenceCosine,
        "maxpair" => TokenStrategy::MaxPair,
        "aligned" => TokenStrategy::AlignedFilter,
        other => return Err(ScorerError::Unknown(other.to_string())),
    };
    let model = model.ok_or_else(|| ScorerError::NeedsModel(option.to_string()))?;
    Ok(Box::new(EmbeddingScorer::new(model, strategy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::normalize::{content_tokens, preprocess, tokenize};

    fn value(raw: &str, vocab_model: Option<&EmbeddingModel>) -> LabelValue {
        let processed = preprocess(raw);
        let tokens = tokenize(&processed);
        let content = content_tokens(&tokens);
        let vocab = match vocab_model {
            Some(m) => content.iter().filter(|t| m.contains(t)).cloned().collect(),
            None => content.clone(),
        };
        LabelValue {
            raw: raw.to_string(),
            count: 1,
            processed,
            tokens,
            content,
            vocab,
        }
    }

    #[test]
    fn edit_distance_scores_typos_high() {
        let scorer = EditDistanceScorer;
        let a = value("Submit Request", None);
        let b = value("Submit Reqest", None);
        assert!(scorer.score(&a, &b) > 0.9);

        let c = value("Archive", None);
        assert!(scorer.score(&a, &c) < 0.4);
    }

    #[test]
    fn edit_distance_is_case_and_separator_insensitive() {
        let scorer = EditDistanceScorer;
        let a = value("Submit Request", None);
        let b = value("submit_request", None);
        assert_eq!(scorer.score(&a, &b), 1.0);
    }

    #[test]
    fn embedding_scorer_uses_vocab_tokens() {
        let model = EmbeddingModel::from_pairs(&[
            ("submit", &[1.0, 0.0]),
            ("send", &[0.95, 0.05]),
        ]);
        let scorer = EmbeddingScorer::new(&model, TokenStrategy::MeanCosine);
        let a = value("Submit", Some(&model));
        let b = value("Send", Some(&model));
        assert!(scorer.score(&a, &b) > 0.9);

        // Out-of-vocabulary label scores zero.
        let c = value("Archive", Some(&model));
        assert_eq!(scorer.score(&a, &c), 0.0);
    }

    #[test]
    fn option_selection() {
        assert_eq!(scorer_from_option("leven", None).unwrap().name(), "leven");
        assert!(matches!(
            scorer_from_option("mean", None),
            Err(ScorerError::NeedsModel(_))
        ));
        assert!(matches!(
            scorer_from_option("soundex", None),
            Err(ScorerError::Unknown(_))
        ));

        let model = EmbeddingModel::from_pairs(&[("submit", &[1.0])]);
        for (option, name) in [
            ("mean", "mean"),
            ("difference", "difference"),
            ("maxpair", "maxpair"),
            ("aligned", "aligned"),
        ] {
            assert_eq!(
                scorer_from_option(option, Some(&model)).unwrap().name(),
                name
            );
        }
    }
}
