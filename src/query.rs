//! Query tokenization and stopword filtering.

use std::collections::{HashMap, HashSet};

/// Characters treated as separators in addition to whitespace.
const SIGILS: &[char] = &[
    '"', '`', '\'', '{', '}', '(', ')', '[', ']', '<', '>', '$', '@', '=', ':',
];

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "the", "how", "to", "do", "does", "i", "in", "of", "for", "with", "and", "or", "is",
    "are", "what", "can", "use", "using", "my", "me", "it", "on", "by", "from", "this", "that",
    "be", "should", "which", "when", "where",
];

pub const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("dropdown", "select"),
    ("datagrid", "table"),
    ("popup", "modal"),
];

pub fn default_stopwords() -> HashSet<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

pub fn default_synonyms() -> HashMap<String, String> {
    DEFAULT_SYNONYMS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// The query as received.
    pub raw: String,
    /// Lower-cased raw query; the stage-1 needle.
    pub lower: String,
    /// Tokens that survived stopword filtering; the coverage denominator.
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    /// `kept`, or a plain whitespace split of `lower` when nothing survived.
    pub scoring: Vec<String>,
    /// `(kept token, canonical synonym)` pairs. Only the partial stage
    /// consults them; coverage is always measured against `kept`.
    pub synonyms: Vec<(String, String)>,
}

impl NormalizedQuery {
    pub fn has_kept(&self) -> bool {
        !self.kept.is_empty()
    }

    /// `true` when any kept token is at least three characters and starts
    /// with a letter, digit, or underscore.
    pub fn looks_like_concept(&self) -> bool {
        self.kept.iter().any(|t| {
            t.chars().count() >= 3
                && t.chars()
                    .next()
                    .map(|c| c.is_alphanumeric() || c == '_')
                    .unwrap_or(false)
        })
    }

    /// Canonical synonym of a kept token, if one is configured.
    pub fn synonym_of(&self, token: &str) -> Option<&str> {
        self.synonyms
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, canonical)| canonical.as_str())
    }
}

pub fn normalize(
    raw: &str,
    stopwords: &HashSet<String>,
    synonyms: &HashMap<String, String>,
) -> NormalizedQuery {
    let lower = raw.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| if SIGILS.contains(&c) { ' ' } else { c })
        .collect();

    let mut kept: Vec<String> = Vec::new();
    let mut removed = Vec::new();
    let mut pairs = Vec::new();
    for token in cleaned.split_whitespace() {
        if stopwords.contains(token) {
            removed.push(token.to_string());
            continue;
        }
        if kept.iter().any(|k| k == token) {
            continue;
        }
        if let Some(canonical) = synonyms.get(token) {
            if canonical != token {
                pairs.push((token.to_string(), canonical.clone()));
            }
        }
        kept.push(token.to_string());
    }

    let scoring = if kept.is_empty() {
        lower.split_whitespace().map(|s| s.to_string()).collect()
    } else {
        kept.clone()
    };

    NormalizedQuery {
        raw: raw.to_string(),
        lower,
        kept,
        removed,
        scoring,
        synonyms: pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(q: &str) -> NormalizedQuery {
        normalize(q, &default_stopwords(), &HashMap::new())
    }

    #[test]
    fn test_strips_sigils_and_stopwords() {
        let q = norm("How to use `<Button onClick=\"{x}\">` in a Form?");
        assert_eq!(q.kept, vec!["button", "onclick", "x", "form?"]);
        assert!(q.removed.contains(&"how".to_string()));
        assert_eq!(q.scoring, q.kept);
    }

    #[test]
    fn test_all_stopwords_fall_back_to_plain_split() {
        let q = norm("how to");
        assert!(q.kept.is_empty());
        assert_eq!(q.scoring, vec!["how", "to"]);
        assert!(!q.looks_like_concept());
    }

    #[test]
    fn test_dollar_and_at_become_separators() {
        let q = norm("$props.value @click");
        assert_eq!(q.kept, vec!["props.value", "click"]);
    }

    #[test]
    fn test_synonyms_leave_kept_tokens_intact() {
        let q = normalize("dropdown options", &default_stopwords(), &default_synonyms());
        assert_eq!(q.kept, vec!["dropdown", "options"]);
        assert_eq!(q.scoring, q.kept);
        assert_eq!(q.synonym_of("dropdown"), Some("select"));
        assert_eq!(q.synonym_of("options"), None);
    }

    #[test]
    fn test_concept_detection() {
        assert!(norm("_id").looks_like_concept());
        assert!(!norm("x y").looks_like_concept());
        assert!(norm("table").looks_like_concept());
    }
}
