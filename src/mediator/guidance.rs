//! Agent guidance synthesized from a ranked result set.

use serde::Serialize;
use std::fmt;

use super::rank::RankedFile;
use super::suggest;
use super::Facet;
use crate::classify::Section;
use crate::query::NormalizedQuery;
use crate::urls::UrlRegistry;

const HOWTO_PATTERNS: &[&str] = &[
    "how to",
    "how do",
    "how can",
    "tutorial",
    "guide",
    "step by step",
    "walkthrough",
];

const EXAMPLE_PATTERNS: &[&str] = &["example", "demo", "sample", "show me", "snippet"];

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Guidance {
    pub confidence: Confidence,
    pub preferred_tools: Vec<String>,
    pub suggested_approach: Vec<String>,
    pub rule_reminders: Vec<String>,
    pub doc_links: Vec<DocLink>,
    pub suggestions: Vec<String>,
}

pub(super) struct Inputs<'a> {
    pub query: &'a NormalizedQuery,
    pub total_hits: usize,
    pub ranked: &'a [RankedFile],
    pub facets: &'a [(Section, Facet)],
    pub urls: &'a UrlRegistry,
    pub suggestion_pool: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Howto,
    Example,
    Lookup,
}

pub fn intent(query_lower: &str) -> Intent {
    if HOWTO_PATTERNS.iter().any(|p| query_lower.contains(p)) {
        Intent::Howto
    } else if EXAMPLE_PATTERNS.iter().any(|p| query_lower.contains(p)) {
        Intent::Example
    } else {
        Intent::Lookup
    }
}

pub fn confidence(total_hits: usize, facets: &[(Section, Facet)]) -> Confidence {
    if total_hits == 0 {
        return Confidence::Low;
    }
    let (files, matches) = facets
        .iter()
        .filter(|(s, _)| matches!(s, Section::Components | Section::Howtos))
        .fold((0, 0), |(f, m), (_, facet)| (f + facet.files, m + facet.matches));
    if files >= 2 || matches > 5 {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

pub(super) fn build(inputs: &Inputs) -> Guidance {
    let query = inputs.query;
    let confidence = confidence(inputs.total_hits, inputs.facets);
    let intent = intent(&query.lower);

    let preferred_tools = match intent {
        Intent::Howto => vec!["search_howto".to_string(), "search".to_string(), "component_docs".to_string()],
        Intent::Example => vec!["examples".to_string(), "search".to_string()],
        Intent::Lookup => Vec::new(),
    };

    let mut rule_reminders = Vec::new();
    if inputs.total_hits == 0 {
        rule_reminders.push(format!(
            "No documentation was found for \"{}\". Do not invent XMLUI components, properties, or URLs.",
            query.raw.trim()
        ));
        match intent {
            Intent::Howto => rule_reminders
                .push("This reads like a how-to question: call search_howto for task guides.".to_string()),
            Intent::Example => rule_reminders
                .push("This reads like a request for examples: call examples instead.".to_string()),
            Intent::Lookup => {}
        }
    } else {
        rule_reminders.push("Cite only the Documentation URLs listed below.".to_string());
        if let Some(reminder) = composition_reminder(query, inputs.ranked) {
            rule_reminders.push(reminder);
        }
    }

    let suggested_approach = match confidence {
        Confidence::High => vec![
            "Read the top-ranked reference pages with component_docs before writing markup.".to_string(),
        ],
        Confidence::Medium => vec![
            "Review the top results; refine the query with an exact component name if they miss.".to_string(),
        ],
        Confidence::Low => vec![
            "Rephrase with a component name from list_components, or try a shorter query.".to_string(),
        ],
    };

    let doc_links = doc_links(inputs.ranked, inputs.urls);

    let suggestions = if inputs.ranked.is_empty() || confidence == Confidence::Low {
        suggest::suggest(&query.raw, &query.scoring, inputs.suggestion_pool, MAX_SUGGESTIONS)
    } else {
        Vec::new()
    };

    Guidance {
        confidence,
        preferred_tools,
        suggested_approach,
        rule_reminders,
        doc_links,
        suggestions,
    }
}

/// Technical terms: kept tokens of three or more characters.
fn technical_terms(query: &NormalizedQuery) -> Vec<&str> {
    query
        .kept
        .iter()
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.as_str())
        .collect()
}

/// Warn when a multi-feature query is never satisfied by one snippet.
fn composition_reminder(query: &NormalizedQuery, ranked: &[RankedFile]) -> Option<String> {
    let terms = technical_terms(query);
    if terms.len() < 2 {
        return None;
    }
    let co_occur = ranked
        .iter()
        .flat_map(|f| f.hits.snippets.iter())
        .any(|s| s.term_count >= 2);
    if co_occur {
        return None;
    }
    Some(format!(
        "No single snippet mentions {} together; verify these features compose before combining them.",
        terms.join(" + ")
    ))
}

fn doc_links(ranked: &[RankedFile], urls: &UrlRegistry) -> Vec<DocLink> {
    let mut links: Vec<DocLink> = Vec::new();
    for f in ranked {
        let Some(url) = urls.url_for_file(&f.hits.rel_path) else {
            continue;
        };
        if links.iter().any(|l| l.url == url) {
            continue;
        }
        let stem = f
            .hits
            .abs_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = stem.split('.').next().unwrap_or_default().to_string();
        links.push(DocLink {
            title: kebab_to_title(&stem),
            url,
        });
    }
    links
}

/// `paginate-a-list` → `Paginate A List`.
pub fn kebab_to_title(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facets(components: (usize, usize), howtos: (usize, usize)) -> Vec<(Section, Facet)> {
        vec![
            (Section::Components, Facet { files: components.0, matches: components.1 }),
            (Section::Howtos, Facet { files: howtos.0, matches: howtos.1 }),
            (Section::Source, Facet { files: 9, matches: 90 }),
        ]
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(confidence(0, &facets((5, 50), (0, 0))), Confidence::Low);
        assert_eq!(confidence(3, &facets((1, 1), (1, 1))), Confidence::High);
        assert_eq!(confidence(3, &facets((1, 6), (0, 0))), Confidence::High);
        assert_eq!(confidence(3, &facets((1, 5), (0, 0))), Confidence::Medium);
        assert_eq!(confidence(3, &facets((0, 0), (0, 0))), Confidence::Medium);
    }

    #[test]
    fn test_intent_patterns() {
        assert_eq!(intent("how to paginate a list"), Intent::Howto);
        assert_eq!(intent("table example"), Intent::Example);
        assert_eq!(intent("button"), Intent::Lookup);
    }

    #[test]
    fn test_kebab_to_title() {
        assert_eq!(kebab_to_title("paginate-a-list"), "Paginate A List");
        assert_eq!(kebab_to_title("Button"), "Button");
        assert_eq!(kebab_to_title("modal_dialog"), "Modal Dialog");
    }
}
