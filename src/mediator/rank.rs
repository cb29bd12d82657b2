//! Per-file scoring and ranking.
//!
//! ```text
//! score = coverage * section_weight
//!       + 2.0  if a kept token is in the file name
//!       + 5.0  if the file is a canonical doc of a matched topic
//!       + 0.1 * snippets
//! ```

use std::cmp::Ordering;

use super::scan::{FileHits, Snippet};
use super::OutputRecord;
use crate::query::NormalizedQuery;

pub const FILENAME_BONUS: f64 = 2.0;
pub const TOPIC_BONUS: f64 = 5.0;
pub const DENSITY_BONUS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RankedFile {
    pub hits: FileHits,
    pub score: f64,
}

/// Fraction of kept tokens seen in the file; `0.0` when nothing was kept.
pub fn coverage(hits: &FileHits, query: &NormalizedQuery) -> f64 {
    if query.kept.is_empty() {
        return 0.0;
    }
    hits.terms_found.len() as f64 / query.kept.len() as f64
}

pub fn score(hits: &FileHits, query: &NormalizedQuery, topic_docs: &[&str]) -> f64 {
    let base = hits
        .abs_path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut score = coverage(hits, query) * hits.section.weight();
    if query.kept.iter().any(|t| base.contains(t.as_str())) {
        score += FILENAME_BONUS;
    }
    if topic_docs.iter().any(|doc| hits.rel_path.contains(doc)) {
        score += TOPIC_BONUS;
    }
    score + DENSITY_BONUS * hits.snippets.len() as f64
}

/// Score, sort descending (stable, so ties keep discovery order), truncate.
pub fn rank(
    files: Vec<FileHits>,
    query: &NormalizedQuery,
    topic_docs: &[&str],
    max_file_results: usize,
) -> Vec<RankedFile> {
    let mut ranked: Vec<RankedFile> = files
        .into_iter()
        .map(|hits| {
            let score = score(&hits, query, topic_docs);
            RankedFile { hits, score }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(max_file_results);
    ranked
}

/// Title and heading snippets first, then the rest in encounter order.
pub fn best_snippets(hits: &FileHits, max: usize) -> Vec<&Snippet> {
    let titles = hits.snippets.iter().filter(|s| s.is_heading_like());
    let rest = hits.snippets.iter().filter(|s| !s.is_heading_like());
    titles.chain(rest).take(max).collect()
}

/// Flatten ranked files into output records, capped at `max_results`.
pub fn records(ranked: &[RankedFile], per_file: usize, max_results: usize) -> Vec<OutputRecord> {
    ranked
        .iter()
        .flat_map(|f| {
            best_snippets(&f.hits, per_file)
                .into_iter()
                .map(move |s| OutputRecord {
                    section: f.hits.section,
                    path: f.hits.rel_path.clone(),
                    abs_path: f.hits.abs_path.clone(),
                    line: s.line_number,
                    snippet: s.text.clone(),
                    score: f.score,
                })
        })
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Section;
    use crate::query::{default_stopwords, normalize};
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;

    fn file(rel: &str, section: Section, terms: &[&str], snippets: usize) -> FileHits {
        FileHits {
            rel_path: rel.to_string(),
            abs_path: PathBuf::from("/snap").join(rel),
            section,
            snippets: (1..=snippets)
                .map(|i| Snippet {
                    line_number: i,
                    text: format!("line {}", i),
                    is_title: false,
                    term_count: 0,
                })
                .collect(),
            terms_found: terms.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        }
    }

    fn q(s: &str) -> NormalizedQuery {
        normalize(s, &default_stopwords(), &HashMap::new())
    }

    #[test]
    fn test_score_components() {
        let query = q("button icon");
        let f = file("docs/content/components/Button.md", Section::Components, &["button"], 3);
        // 0.5 * 1.5 + 2.0 + 0.3
        assert!((score(&f, &query, &[]) - 3.05).abs() < 1e-9);
        // + topic bonus
        let with_topic = score(&f, &query, &["docs/content/components/Button.md"]);
        assert!((with_topic - 8.05).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_is_bounded() {
        let query = q("button");
        let f = file("x.md", Section::Unknown, &["button"], 1);
        assert!(coverage(&f, &query) <= 1.0);
        assert_eq!(coverage(&f, &q("how to")), 0.0);
    }

    #[test]
    fn test_equal_scores_keep_discovery_order() {
        let query = q("zeta");
        let files = vec![
            file("a/one.md", Section::Source, &["zeta"], 2),
            file("b/two.md", Section::Source, &["zeta"], 2),
            file("c/three.md", Section::Source, &["zeta"], 2),
        ];
        let ranked = rank(files, &query, &[], 10);
        let order: Vec<&str> = ranked.iter().map(|r| r.hits.rel_path.as_str()).collect();
        assert_eq!(order, vec!["a/one.md", "b/two.md", "c/three.md"]);
    }

    #[test]
    fn test_rank_truncates() {
        let query = q("zeta");
        let files = (0..5)
            .map(|i| file(&format!("f{}.md", i), Section::Source, &["zeta"], i + 1))
            .collect();
        let ranked = rank(files, &query, &[], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].hits.rel_path, "f4.md");
    }

    #[test]
    fn test_best_snippets_prefers_headings() {
        let mut f = file("x.md", Section::Components, &[], 3);
        f.snippets.push(Snippet {
            line_number: 9,
            text: "## Heading".to_string(),
            is_title: false,
            term_count: 0,
        });
        let best = best_snippets(&f, 2);
        assert_eq!(best[0].line_number, 9);
        assert_eq!(best[1].line_number, 1);
    }

    #[test]
    fn test_records_respect_caps() {
        let query = q("zeta");
        let files = vec![
            file("a.md", Section::Source, &["zeta"], 5),
            file("b.md", Section::Source, &["zeta"], 5),
        ];
        let ranked = rank(files, &query, &[], 10);
        assert_eq!(records(&ranked, 3, 100).len(), 6);
        assert_eq!(records(&ranked, 3, 4).len(), 4);
    }
}
