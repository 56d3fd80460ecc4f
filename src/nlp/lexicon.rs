// Lexical relations database in VerbOcean text format:
//
//   verb1 [relation] verb2 :: score
//
// Only the relations the repair workflow consults are indexed: `opposite-of`
// marks antonyms; `similar` and `stronger-than` mark synonyms. A suggestion
// whose labels differ by an antonym pair ("open" vs "close") is probably two
// distinct activities, not a typo, so antonym hits are surfaced as warnings.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use super::normalize::stem_candidates;
use super::ModelError;

const ANTONYM_RELATIONS: &[&str] = &["opposite-of"];
const SYNONYM_RELATIONS: &[&str] = &["similar", "stronger-than"];

#[derive(Default)]
pub struct Lexicon {
    antonyms: HashMap<String, HashSet<String>>,
    synonyms: HashMap<String, HashSet<String>>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let mut lexicon = Lexicon::default();
        let mut entries = 0usize;
        let mut skipped = 0usize;

        for line in reader.lines() {
            let line = line.map_err(|e| ModelError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            match lexicon.ingest_line(&line) {
                Some(true) => entries += 1,
                Some(false) => {}
                None => skipped += 1,
            }
        }

        if entries == 0 {
            return Err(ModelError::Empty {
                path: path.display().to_string(),
            });
        }

        if skipped > 0 {
            warn!("lexicon: skipped {skipped} malformed lines");
        }
        info!("loaded {entries} lexical relations from {}", path.display());
        Ok(lexicon)
    }

    /// Build a lexicon from in-memory text (tests and fixtures).
    pub fn from_text(text: &str) -> Self {
        let mut lexicon = Lexicon::default();
        for line in text.lines() {
            lexicon.ingest_line(line);
        }
        lexicon
    }

    /// Parse one line. `Some(true)` = relation indexed, `Some(false)` =
    /// well-formed but an unindexed relation or a blank/comment line,
    /// `None` = malformed.
    fn ingest_line(&mut self, line: &str) -> Option<bool> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Some(false);
        }

        let open = line.find('[')?;
        let close = line.find(']')?;
        if close < open {
            return None;
        }
        let verb1 = line[..open].trim().to_lowercase();
        let relation = line[open + 1..close].trim();
        let rest = line[close + 1..].trim();
        let verb2 = match rest.find("::") {
            Some(sep) => rest[..sep].trim().to_lowercase(),
            None => rest.to_lowercase(),
        };
        if verb1.is_empty() || verb2.is_empty() {
            return None;
        }

        let table = if ANTONYM_RELATIONS.contains(&relation) {
            &mut self.antonyms
        } else if SYNONYM_RELATIONS.contains(&relation) {
            &mut self.synonyms
        } else {
            return Some(false);
        };

        table
            .entry(verb1.clone())
            .or_default()
            .insert(verb2.clone());
        table.entry(verb2).or_default().insert(verb1);
        Some(true)
    }

    /// Relation lookup over all stem candidates of both tokens, so inflected
    /// forms ("opened"/"closing") still hit the base-form entries.
    fn related(table: &HashMap<String, HashSet<String>>, a: &str, b: &str) -> bool {
        let b_candidates = stem_candidates(b);
        stem_candidates(a).iter().any(|ca| {
            table
                .get(ca)
                .is_some_and(|set| b_candidates.iter().any(|cb| set.contains(cb)))
        })
    }

    pub fn are_antonyms(&self, a: &str, b: &str) -> bool {
        Self::related(&self.antonyms, a, b)
    }

    pub fn are_synonyms(&self, a: &str, b: &str) -> bool {
        Self::related(&self.synonyms, a, b)
    }

    /// Antonym pairs across two token lists. Pairs that are also recorded as
    /// synonyms are dropped: VerbOcean carries both relations for some verb
    /// pairs, and the synonym reading wins for repair purposes.
    pub fn antonym_pairs(&self, a: &[String], b: &[String]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for ta in a {
            for tb in b {
                if self.are_antonyms(ta, tb) && !self.are_synonyms(ta, tb) {
                    pairs.push((ta.clone(), tb.clone()));
                }
            }
        }
        pairs
    }
}
