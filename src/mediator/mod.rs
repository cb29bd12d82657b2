//! Mediated search: staged scan, ranking, and guidance synthesis.
//!
//! Every search-like tool builds a [`MediatorConfig`] for its slice of the
//! corpus and calls [`mediate`]. The pipeline is linear:
//!
//! ```text
//! normalize ─▶ exact ─▶ relaxed ─▶ partial ─▶ rank ─▶ guidance ─▶ render
//!              └──────── shared per-file accumulator ───────┘
//! ```
//!
//! Nothing here is cached between requests: each call walks the configured
//! roots on disk, and the accumulator is dropped when the call returns.

mod guidance;
mod rank;
mod render;
mod scan;
pub mod suggest;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::classify::{self, Classifier, Section};
use crate::config::SearchConfig;
use crate::query::{self, NormalizedQuery};
use crate::topics::TopicIndex;
use crate::urls::UrlRegistry;

pub use guidance::{kebab_to_title, Confidence, DocLink, Guidance};
pub use rank::RankedFile;
pub use render::render;
pub use scan::{FileHits, Snippet, StagePlan};

/// Per-tool search configuration.
#[derive(Clone)]
pub struct MediatorConfig {
    pub roots: Vec<PathBuf>,
    /// Sections always listed in the facets, in this order.
    pub section_keys: Vec<Section>,
    /// Sections whose roots move to the front for the partial stage.
    pub prefer_sections: Vec<Section>,
    pub file_extensions: Vec<String>,
    pub max_results: usize,
    pub max_snippet_length: usize,
    pub max_file_results: usize,
    pub max_snippets_per_file: usize,
    pub stopwords: HashSet<String>,
    pub synonyms: HashMap<String, String>,
    pub classifier: Classifier,
    pub enable_filename_matches: bool,
}

impl MediatorConfig {
    /// A config over `roots` using the limits from `[search]`.
    pub fn new(roots: Vec<PathBuf>, search: &SearchConfig) -> Self {
        Self {
            roots,
            section_keys: vec![Section::Components, Section::Howtos, Section::Examples, Section::Source],
            prefer_sections: Vec::new(),
            file_extensions: search.file_extensions.clone(),
            max_results: search.max_results,
            max_snippet_length: search.max_snippet_length,
            max_file_results: search.max_file_results,
            max_snippets_per_file: search.max_snippets_per_file,
            stopwords: query::default_stopwords(),
            synonyms: query::default_synonyms(),
            classifier: classify::classify,
            enable_filename_matches: true,
        }
    }

    pub fn with_sections(mut self, keys: &[Section], prefer: &[Section]) -> Self {
        self.section_keys = keys.to_vec();
        self.prefer_sections = prefer.to_vec();
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Read-only process state the pipeline consults.
pub struct SearchEnv<'a> {
    /// Snapshot root; relative paths are computed against it.
    pub corpus_root: &'a Path,
    pub urls: &'a UrlRegistry,
    pub topics: &'a TopicIndex,
    /// Known names used for "did you mean" suggestions.
    pub suggestion_pool: &'a [String],
}

/// One emitted line of a ranked file.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "type")]
    pub section: Section,
    pub path: String,
    pub abs_path: PathBuf,
    pub line: usize,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub files: usize,
    pub matches: usize,
}

#[derive(Debug, Clone)]
pub struct MediatedResult {
    pub query: NormalizedQuery,
    pub topics: Vec<String>,
    pub query_plan: Vec<StagePlan>,
    /// Sum of matching lines over all stages.
    pub total_hits: usize,
    pub ranked: Vec<RankedFile>,
    pub records: Vec<OutputRecord>,
    pub facets: Vec<(Section, Facet)>,
    pub guidance: Guidance,
}

impl MediatedResult {
    pub fn facet(&self, section: Section) -> Facet {
        self.facets
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, f)| *f)
            .unwrap_or_default()
    }

    /// Validated documentation URLs, in rank order.
    pub fn found_urls(&self) -> Vec<String> {
        self.guidance.doc_links.iter().map(|l| l.url.clone()).collect()
    }
}

/// Run the full pipeline for one query.
pub fn mediate(cfg: &MediatorConfig, raw_query: &str, env: &SearchEnv) -> MediatedResult {
    let query = query::normalize(raw_query, &cfg.stopwords, &cfg.synonyms);

    let matched_topics = env.topics.match_topics(&query.scoring);
    let topic_docs: Vec<&str> = matched_topics
        .iter()
        .flat_map(|t| t.canonical_docs.iter().map(|d| d.as_str()))
        .collect();
    let topics: Vec<String> = matched_topics.iter().map(|t| t.name.clone()).collect();

    let scan = scan::run_stages(cfg, &query, env.corpus_root);
    let total_hits = scan.plan.iter().map(|p| p.hits).sum();

    let ranked = rank::rank(scan.files, &query, &topic_docs, cfg.max_file_results);
    let records = rank::records(&ranked, cfg.max_snippets_per_file, cfg.max_results);

    let facets: Vec<(Section, Facet)> = cfg
        .section_keys
        .iter()
        .map(|s| {
            let mut facet = Facet::default();
            for f in ranked.iter().filter(|f| f.hits.section == *s) {
                facet.files += 1;
                facet.matches += f.hits.snippets.len();
            }
            (*s, facet)
        })
        .collect();

    let guidance = guidance::build(&guidance::Inputs {
        query: &query,
        total_hits,
        ranked: &ranked,
        facets: &facets,
        urls: env.urls,
        suggestion_pool: env.suggestion_pool,
    });

    tracing::debug!(
        query = %raw_query,
        total_hits,
        files = ranked.len(),
        confidence = %guidance.confidence,
        "mediated search complete"
    );

    MediatedResult {
        query,
        topics,
        query_plan: scan.plan,
        total_hits,
        ranked,
        records,
        facets,
        guidance,
    }
}
