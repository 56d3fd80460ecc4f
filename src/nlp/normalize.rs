// Label normalization and tokenization.
//
// Event-log labels arrive in many shapes ("Submit Request", "submit_request",
// "SubmitRequest"); scoring needs one canonical form. Normalization splits
// camelCase, lowercases, maps separators to spaces, strips punctuation, and
// collapses whitespace.

/// Words that carry no label-identity signal and are dropped from the
/// content-token view.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "is", "of", "on", "or",
    "the", "to", "with",
];

/// Canonical form of a label: camelCase split, lowercased, separators and
/// punctuation replaced with spaces, whitespace collapsed.
pub fn preprocess(label: &str) -> String {
    let mut spaced = String::with_capacity(label.len() + 8);
    let mut prev_lower = false;
    for ch in label.chars() {
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        spaced.push(ch);
    }

    let mut out = String::with_capacity(spaced.len());
    let mut last_was_space = true;
    for ch in spaced.chars() {
        let mapped = if ch.is_alphanumeric() {
            Some(ch.to_lowercase().next().unwrap_or(ch))
        } else if ch.is_whitespace() || matches!(ch, '_' | '-' | '/' | '.' | ':') {
            Some(' ')
        } else {
            None
        };
        match mapped {
            Some(' ') => {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            Some(c) => {
                out.push(c);
                last_was_space = false;
            }
            None => {}
        }
    }
    out.trim_end().to_string()
}

/// Whitespace tokenization of a preprocessed label.
pub fn tokenize(processed: &str) -> Vec<String> {
    processed.split_whitespace().map(str::to_string).collect()
}

/// Tokens with stopwords removed. The full token list is used for lexical
/// comparison; this view feeds the semantic scorers.
pub fn content_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .cloned()
        .collect()
}

/// Light suffix stemming for lexicon lookups ("checked"/"checking" → "check").
/// Deliberately conservative: short tokens and ambiguous suffixes are left
/// alone rather than over-stripped.
pub fn stem(token: &str) -> String {
    let t = token;
    if t.len() > 4 {
        if let Some(base) = t.strip_suffix("ies") {
            return format!("{base}y");
        }
        if let Some(base) = t.strip_suffix("ing") {
            if base.len() >= 3 {
                return base.to_string();
            }
        }
        if let Some(base) = t.strip_suffix("ed") {
            if base.len() >= 3 {
                return base.to_string();
            }
        }
    }
    if t.len() > 3 {
        if let Some(base) = t.strip_suffix("es") {
            return base.to_string();
        }
        if let Some(base) = t.strip_suffix('s') {
            if !base.ends_with('s') {
                return base.to_string();
            }
        }
    }
    t.to_string()
}

/// All plausible base forms of a token, for dictionary lookups. English
/// drops a final "e" before "-ed"/"-ing" ("close" → "closed"), so both the
/// bare stem and the e-restored stem are candidates.
pub fn stem_candidates(token: &str) -> Vec<String> {
    let mut candidates = vec![token.to_string()];
    let stemmed = stem(token);
    if !candidates.contains(&stemmed) {
        candidates.push(stemmed.clone());
    }
    if token.ends_with("ed") || token.ends_with("ing") {
        let restored = format!("{stemmed}e");
        if restored != *token && !candidates.contains(&restored) {
            candidates.push(restored);
        }
    }
    candidates
}
