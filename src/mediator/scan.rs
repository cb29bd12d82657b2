//! Three-stage line scanner.
//!
//! | Stage | Needle | Line matches when |
//! |-------|--------|-------------------|
//! | `exact` | lower-cased raw query | every whitespace word is a substring |
//! | `relaxed` | space-joined kept tokens | same rule as `exact` |
//! | `partial` | kept tokens | at least `min_words` tokens (or their synonyms) are substrings |
//!
//! All stages append to one accumulator, so the set of files with hits
//! only grows from stage to stage.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::MediatorConfig;
use crate::classify::Section;
use crate::query::NormalizedQuery;

/// Upper bound on snippets kept per file, whatever the query.
pub const MAX_SNIPPETS_PER_FILE_HARD: usize = 20;

const FILENAME_SNIPPET: &str = "[filename match]";
const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    pub line_number: usize,
    pub text: String,
    pub is_title: bool,
    /// How many kept tokens the full line contains.
    #[serde(skip)]
    pub term_count: usize,
}

impl Snippet {
    pub fn is_heading_like(&self) -> bool {
        self.is_title || self.text.trim_start().starts_with('#')
    }
}

#[derive(Debug, Clone)]
pub struct FileHits {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub section: Section,
    pub snippets: Vec<Snippet>,
    pub terms_found: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagePlan {
    pub stage: &'static str,
    pub query: String,
    pub hits: usize,
    /// Distinct files with hits once this stage has run.
    pub files: usize,
}

pub struct ScanOutcome {
    /// Files in discovery order.
    pub files: Vec<FileHits>,
    pub plan: Vec<StagePlan>,
}

/// A file read once per request and reused by every stage.
struct LoadedFile {
    abs: PathBuf,
    rel: String,
    stem: String,
    lines: Vec<String>,
}

struct Accumulator<'a> {
    cfg: &'a MediatorConfig,
    kept: &'a [String],
    order: Vec<FileHits>,
    index: HashMap<PathBuf, usize>,
}

impl<'a> Accumulator<'a> {
    /// Record a hit. Returns `false` when the line was already recorded
    /// or the file is at the hard snippet cap.
    fn add(&mut self, file: &LoadedFile, line_number: usize, line: &str, is_title: bool) -> bool {
        let idx = match self.index.get(&file.abs) {
            Some(i) => *i,
            None => {
                self.order.push(FileHits {
                    rel_path: file.rel.clone(),
                    abs_path: file.abs.clone(),
                    section: (self.cfg.classifier)(&file.rel, &file.abs),
                    snippets: Vec::new(),
                    terms_found: HashSet::new(),
                });
                self.index.insert(file.abs.clone(), self.order.len() - 1);
                self.order.len() - 1
            }
        };
        let entry = &mut self.order[idx];

        if entry.snippets.iter().any(|s| s.line_number == line_number)
            || entry.snippets.len() >= MAX_SNIPPETS_PER_FILE_HARD
        {
            return false;
        }

        // Filename hits are tested against the stem, line hits against the line.
        let haystack = if line_number == 0 {
            file.stem.as_str()
        } else {
            line
        };
        let haystack = haystack.to_lowercase();
        let mut term_count = 0;
        for t in self.kept {
            if haystack.contains(t.as_str()) {
                entry.terms_found.insert(t.clone());
                term_count += 1;
            }
        }

        let text = if line_number == 0 {
            FILENAME_SNIPPET.to_string()
        } else {
            truncate(line.trim(), self.cfg.max_snippet_length)
        };
        entry.snippets.push(Snippet {
            line_number,
            is_title: is_title || text.starts_with('#'),
            text,
            term_count,
        });
        true
    }
}

/// Run exact, relaxed, and partial stages over the configured roots.
pub fn run_stages(cfg: &MediatorConfig, query: &NormalizedQuery, corpus_root: &Path) -> ScanOutcome {
    let mut files: HashMap<PathBuf, Vec<LoadedFile>> = HashMap::new();
    let mut acc = Accumulator {
        cfg,
        kept: &query.kept,
        order: Vec::new(),
        index: HashMap::new(),
    };
    let mut plan = Vec::new();

    let exact_words: Vec<&str> = query.lower.split_whitespace().collect();
    if !exact_words.is_empty() {
        let hits = run_stage(&mut acc, &mut files, &cfg.roots, corpus_root, |l| {
            all_words_match(l, &exact_words)
        });
        plan.push(StagePlan {
            stage: "exact",
            query: query.lower.clone(),
            hits,
            files: acc.order.len(),
        });
    }

    if query.has_kept() {
        let relaxed = query.kept.join(" ");
        let words: Vec<&str> = query.kept.iter().map(|s| s.as_str()).collect();
        let hits = run_stage(&mut acc, &mut files, &cfg.roots, corpus_root, |l| {
            all_words_match(l, &words)
        });
        plan.push(StagePlan {
            stage: "relaxed",
            query: relaxed,
            hits,
            files: acc.order.len(),
        });

        let min_words = min_partial_words(words.len());
        let roots = if query.looks_like_concept() && !cfg.prefer_sections.is_empty() {
            preferred_order(cfg, corpus_root)
        } else {
            cfg.roots.clone()
        };
        let needles: Vec<(&str, Option<&str>)> = words.iter().map(|w| (*w, query.synonym_of(w))).collect();
        let hits = run_stage(&mut acc, &mut files, &roots, corpus_root, |l| {
            needles
                .iter()
                .filter(|(w, alt)| l.contains(*w) || alt.is_some_and(|a| l.contains(a)))
                .count()
                >= min_words
        });
        plan.push(StagePlan {
            stage: "partial",
            query: query.kept.join(" "),
            hits,
            files: acc.order.len(),
        });
    }

    ScanOutcome {
        files: acc.order,
        plan,
    }
}

fn run_stage<F>(
    acc: &mut Accumulator,
    cache: &mut HashMap<PathBuf, Vec<LoadedFile>>,
    roots: &[PathBuf],
    corpus_root: &Path,
    matches: F,
) -> usize
where
    F: Fn(&str) -> bool,
{
    let mut hits = 0;
    for root in roots {
        let loaded = cache
            .entry(root.clone())
            .or_insert_with(|| load_root(root, corpus_root, &acc.cfg.file_extensions));
        for file in loaded.iter() {
            if acc.cfg.enable_filename_matches && matches(&file.stem) {
                hits += 1;
                acc.add(file, 0, "", true);
            }
            for (i, line) in file.lines.iter().enumerate() {
                if matches(&line.to_lowercase()) {
                    hits += 1;
                    acc.add(file, i + 1, line, false);
                }
            }
        }
    }
    hits
}

/// `min_words` for the partial stage given the number of kept tokens.
pub fn min_partial_words(total: usize) -> usize {
    if total <= 2 {
        total
    } else {
        2
    }
}

fn all_words_match(line: &str, words: &[&str]) -> bool {
    match words {
        [] => false,
        [one] => line.contains(one),
        many => many.iter().all(|w| line.contains(w)),
    }
}

/// Roots reordered so preferred sections come first; stable otherwise.
fn preferred_order(cfg: &MediatorConfig, corpus_root: &Path) -> Vec<PathBuf> {
    let mut roots = cfg.roots.clone();
    roots.sort_by_key(|root| {
        let rel = root.strip_prefix(corpus_root).unwrap_or(root);
        let sample = format!("{}/x", rel.to_string_lossy().replace('\\', "/"));
        let section = (cfg.classifier)(&sample, root);
        !cfg.prefer_sections.contains(&section)
    });
    roots
}

fn load_root(root: &Path, corpus_root: &Path, extensions: &[String]) -> Vec<LoadedFile> {
    if !root.is_dir() {
        return Vec::new();
    }
    let include = extension_set(extensions);
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && SKIPPED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
        });

    let mut out = Vec::new();
    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !include.is_match(&name) {
            continue;
        }
        let abs = entry.into_path();
        let content = match std::fs::read_to_string(&abs) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let rel = relative_path(&abs, corpus_root, root);
        let stem = name.split('.').next().unwrap_or(&name).to_lowercase();
        out.push(LoadedFile {
            abs,
            rel,
            stem,
            lines: content.lines().map(|l| l.to_string()).collect(),
        });
    }
    out
}

/// `*<ext>` globs matched against the file name.
fn extension_set(extensions: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        match Glob::new(&format!("*{}", ext)) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(extension = %ext, error = %e, "ignoring invalid file extension"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Relative to the snapshot when inside it, otherwise relative to the
/// parent of the scan root (so the root's own name is kept).
fn relative_path(abs: &Path, corpus_root: &Path, root: &Path) -> String {
    let rel = abs
        .strip_prefix(corpus_root)
        .ok()
        .or_else(|| root.parent().and_then(|p| abs.strip_prefix(p).ok()))
        .unwrap_or(abs);
    rel.to_string_lossy().replace('\\', "/")
}

/// Cut to `max` characters, appending `...` when anything was removed.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}
