// Resolving thresholded pairs into directed repair suggestions.
//
// Direction follows frequency: the rarer value is presumed mislabeled and
// the more frequent one is the suggested replacement. Pairs with equal
// frequency carry no direction and are dropped.

use tracing::debug;

use crate::nlp::lexicon::Lexicon;

use super::matrix::ScoredPair;
use super::Attribute;

/// One proposed repair, reviewed by the user before anything is rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairSuggestion {
    /// Unique within a pass; ids reset per pass.
    pub id: usize,
    pub attribute: String,
    pub pass_name: String,
    /// The value to be replaced (lower frequency).
    pub original: String,
    pub original_count: u64,
    /// The replacement (higher frequency).
    pub suggested: String,
    pub suggested_count: u64,
    pub score: f64,
    pub threshold: f64,
    /// Antonym token pairs between the two labels. Non-empty means the
    /// labels likely name genuinely different activities.
    pub antonyms: Vec<(String, String)>,
}

impl RepairSuggestion {
    pub fn has_antonym_conflict(&self) -> bool {
        !self.antonyms.is_empty()
    }
}

/// Turn the thresholded pairs of one attribute into suggestions, assigning
/// ids from the shared per-pass counter.
pub fn build_suggestions(
    attribute: &Attribute,
    pairs: &[ScoredPair],
    lexicon: Option<&Lexicon>,
    pass_name: &str,
    threshold: f64,
    next_id: &mut usize,
) -> Vec<RepairSuggestion> {
    let mut suggestions = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let a = &attribute.values[pair.i];
        let b = &attribute.values[pair.j];

        // Equal frequency gives no direction to repair in.
        if a.count == b.count {
            debug!(
                "attribute {}: skipping equal-frequency pair `{}` / `{}`",
                attribute.name, a.raw, b.raw
            );
            continue;
        }
        let (original, suggested) = if a.count < b.count { (a, b) } else { (b, a) };

        let antonyms = match lexicon {
            Some(lex) => lex.antonym_pairs(&original.content, &suggested.content),
            None => Vec::new(),
        };

        suggestions.push(RepairSuggestion {
            id: *next_id,
            attribute: attribute.name.clone(),
            pass_name: pass_name.to_string(),
            original: original.raw.clone(),
            original_count: original.count,
            suggested: suggested.raw.clone(),
            suggested_count: suggested.count,
            score: pair.score,
            threshold,
            antonyms,
        });
        *next_id += 1;
    }

    suggestions
}
