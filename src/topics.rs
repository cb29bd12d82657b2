//! Topic index built from markdown heading structure.
//!
//! Every distinct `#` / `##` heading in the pages tree and the component
//! reference pages becomes a [`TopicEntry`]. Queries whose tokens hit an
//! entry's trigger terms boost the entry's canonical documents.

use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::corpus::Corpus;
use crate::urls::UrlRegistry;

/// Single-token headings too generic to identify a topic.
const GENERIC_HEADINGS: &[&str] = &[
    "properties",
    "props",
    "events",
    "methods",
    "examples",
    "example",
    "overview",
    "introduction",
    "usage",
    "styling",
    "parts",
    "notes",
    "summary",
    "description",
    "api",
    "behaviors",
    "variants",
    "contents",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TopicEntry {
    pub name: String,
    pub trigger_terms: Vec<String>,
    /// Snapshot-relative paths of the documents the heading came from.
    pub canonical_docs: Vec<String>,
    /// Validated documentation URLs (possibly with a fragment).
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TopicIndex {
    entries: Vec<TopicEntry>,
}

/// A heading recognised by [`parse_heading`].
#[derive(Debug, PartialEq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
}

impl TopicIndex {
    pub fn build(corpus: &Corpus, urls: &UrlRegistry) -> Self {
        let mut builder = Builder {
            seen: HashSet::new(),
            entries: Vec::new(),
        };
        for dir in [corpus.pages_dir().to_path_buf(), corpus.component_docs_dir()] {
            for path in markdown_files(&dir) {
                let rel = corpus.relative(&path);
                match std::fs::read_to_string(&path) {
                    Ok(content) => builder.add_document(&rel, &content, urls),
                    Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable page"),
                }
            }
        }
        tracing::info!(count = builder.entries.len(), "topic index built");
        Self {
            entries: builder.entries,
        }
    }

    pub fn from_entries(entries: Vec<TopicEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TopicEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose trigger terms intersect `tokens`, in build order.
    pub fn match_topics(&self, tokens: &[String]) -> Vec<&TopicEntry> {
        let wanted: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
        self.entries
            .iter()
            .filter(|e| e.trigger_terms.iter().any(|t| wanted.contains(t.as_str())))
            .collect()
    }
}

struct Builder {
    seen: HashSet<String>,
    entries: Vec<TopicEntry>,
}

impl Builder {
    fn add_document(&mut self, rel: &str, content: &str, urls: &UrlRegistry) {
        let page_url = urls.url_for_file(rel);
        for heading in headings(content) {
            let key = heading.text.to_lowercase();
            if key.is_empty() || !self.seen.insert(key.clone()) {
                continue;
            }
            let terms = trigger_terms(&key);
            if terms.is_empty() || (terms.len() == 1 && GENERIC_HEADINGS.contains(&terms[0].as_str())) {
                continue;
            }
            let urls = match &page_url {
                Some(url) if heading.level == 2 => vec![format!("{}#{}", url, slugify(&heading.text))],
                Some(url) => vec![url.clone()],
                None => Vec::new(),
            };
            self.entries.push(TopicEntry {
                name: heading.text,
                trigger_terms: terms,
                canonical_docs: vec![rel.to_string()],
                urls,
            });
        }
    }
}

/// Level-1 and level-2 headings outside fenced code blocks.
pub fn headings(content: &str) -> Vec<Heading> {
    let mut in_fence = false;
    let mut out = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(h) = parse_heading(trimmed) {
            if h.level <= 2 {
                out.push(h);
            }
        }
    }
    out
}

/// Parse an ATX heading, stripping the markers and any `[#anchor]`.
pub fn parse_heading(line: &str) -> Option<Heading> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }
    let text = strip_anchor(rest.trim()).trim().trim_end_matches('#').trim().to_string();
    Some(Heading { level, text })
}

fn strip_anchor(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[#") {
        out.push_str(&rest[..start]);
        match rest[start..].find(']') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Lowercase letter/digit runs of length >= 2.
pub fn trigger_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for run in text.split(|c: char| !c.is_alphanumeric()) {
        if run.chars().count() >= 2 {
            let t = run.to_lowercase();
            if !terms.contains(&t) {
                terms.push(t);
            }
        }
    }
    terms
}

/// GitHub-style fragment slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut dash = false;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if (c == ' ' || c == '-' || c == '_') && !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn markdown_files(dir: &Path) -> Vec<std::path::PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("md") | Some("mdx")))
        .collect()
}
