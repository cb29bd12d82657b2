//! `list_components` and `component_docs`.

use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::{empty_schema, single_string_schema};
use crate::corpus::Corpus;
use crate::error::ToolError;
use crate::params::{non_empty, parse};
use crate::topics::parse_heading;
use crate::traits::{Tool, ToolContext, ToolOutput};
use crate::urls::{extension_dirs, markdown_stems, UrlRegistry};

/// Reference pages shorter than this get the parent's sections appended.
pub const SUPPLEMENT_THRESHOLD: usize = 1000;

/// Characters of framework source appended to a short page.
pub const SOURCE_PREFIX_CHARS: usize = 2000;

/// Variant components documented mostly through their parent.
const VARIANTS: &[(&str, &str)] = &[
    ("VStack", "Stack"),
    ("HStack", "Stack"),
    ("CVStack", "Stack"),
    ("CHStack", "Stack"),
    ("H1", "Heading"),
    ("H2", "Heading"),
    ("H3", "Heading"),
    ("H4", "Heading"),
    ("H5", "Heading"),
    ("H6", "Heading"),
    ("VSplitter", "Splitter"),
    ("HSplitter", "Splitter"),
];

/// Parent sections copied into a variant's page.
const INHERITED_SECTIONS: &[&str] = &["properties", "events", "props"];

pub fn variant_parent(name: &str) -> Option<&'static str> {
    VARIANTS
        .iter()
        .find(|(variant, _)| variant.eq_ignore_ascii_case(name))
        .map(|(_, parent)| *parent)
}

pub struct ListComponentsTool;

impl Tool for ListComponentsTool {
    fn name(&self) -> &str {
        "list_components"
    }

    fn description(&self) -> &str {
        "List every documented XMLUI component, grouped by package"
    }

    fn parameters_schema(&self) -> Value {
        empty_schema()
    }

    fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let dir = ctx.corpus().component_docs_dir();
        let mut groups: Vec<(String, Vec<String>)> = vec![("core".to_string(), markdown_stems(&dir))];
        for ext in extension_dirs(&dir) {
            let names = markdown_stems(&dir.join(&ext));
            if !names.is_empty() {
                groups.push((ext, names));
            }
        }

        let total: usize = groups.iter().map(|(_, n)| n.len()).sum();
        if total == 0 {
            return Ok(ToolOutput::text(format!(
                "❌ No component documentation found under {}",
                ctx.corpus().relative(&dir)
            )));
        }

        let mut out = format!("# XMLUI components ({})\n", total);
        for (group, names) in groups.iter().filter(|(_, n)| !n.is_empty()) {
            let _ = write!(out, "\n## {} ({})\n", group, names.len());
            for name in names {
                let _ = writeln!(out, "- {}", name);
            }
        }
        Ok(ToolOutput::text(out))
    }
}

#[derive(Deserialize)]
struct ComponentParams {
    component: String,
}

pub struct ComponentDocsTool;

impl Tool for ComponentDocsTool {
    fn name(&self) -> &str {
        "component_docs"
    }

    fn description(&self) -> &str {
        "Get the reference documentation for one XMLUI component, with its canonical URL"
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("component", "Component name, e.g. \"Button\" or \"xmlui-search/Search\"")
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: ComponentParams = parse(params)?;
        let name = non_empty("component", &p.component)?;
        if name.contains("..") || name.starts_with('/') || name.contains('\\') {
            return Err(ToolError::Validation(format!("invalid component name '{}'", name)));
        }

        let corpus = ctx.corpus();
        let located = locate(&corpus.component_docs_dir(), name).ok_or_else(|| {
            ToolError::NotFound(format!(
                "component '{}' has no page under {}",
                name,
                crate::corpus::COMPONENT_DOCS
            ))
        })?;

        let mut doc = std::fs::read_to_string(&located.path)?;
        if doc.len() < SUPPLEMENT_THRESHOLD {
            if let Some(parent) = variant_parent(&located.name) {
                doc.push_str(&inherited_context(corpus, &located.name, parent));
            }
            if let Some(source) = source_prefix(corpus, &located.name) {
                doc.push_str(&source);
            }
        }

        let rel = corpus.relative(&located.path);
        let source_line = canonical_url(ctx.urls(), &located).unwrap_or(rel);
        if !doc.ends_with('\n') {
            doc.push('\n');
        }
        let _ = write!(doc, "\nSource: {}\n", source_line);
        Ok(ToolOutput::text(doc))
    }
}

struct Located {
    /// Exact on-disk stem, e.g. `Button`.
    name: String,
    /// Extension package directory, when the page lives in one.
    package: Option<String>,
    path: PathBuf,
}

/// Find `<name>.md` in the core pages, then in each extension package.
/// Exact case wins over a case-insensitive match. `pkg/Name` restricts the
/// lookup to one package.
fn locate(components: &Path, name: &str) -> Option<Located> {
    if let Some((pkg, base)) = name.split_once('/') {
        let dir = components.join(pkg);
        return find_stem(&dir, base).map(|stem| Located {
            path: dir.join(format!("{}.md", stem)),
            name: stem,
            package: Some(pkg.to_string()),
        });
    }

    let mut dirs: Vec<(Option<String>, PathBuf)> = vec![(None, components.to_path_buf())];
    for ext in extension_dirs(components) {
        dirs.push((Some(ext.clone()), components.join(ext)));
    }
    dirs.into_iter().find_map(|(package, dir)| {
        find_stem(&dir, name).map(|stem| Located {
            path: dir.join(format!("{}.md", stem)),
            name: stem,
            package,
        })
    })
}

fn find_stem(dir: &Path, name: &str) -> Option<String> {
    let stems = markdown_stems(dir);
    stems
        .iter()
        .find(|s| s.as_str() == name)
        .or_else(|| stems.iter().find(|s| s.eq_ignore_ascii_case(name)))
        .cloned()
}

fn canonical_url(urls: &UrlRegistry, located: &Located) -> Option<String> {
    match &located.package {
        Some(pkg) => urls.url_for(&format!("/extensions/{}/{}", pkg, located.name)),
        None => urls.url_for(&format!("/components/{}", located.name)),
    }
}

fn inherited_context(corpus: &Corpus, name: &str, parent: &str) -> String {
    let parent_path = corpus.component_docs_dir().join(format!("{}.md", parent));
    let content = match std::fs::read_to_string(&parent_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(parent, error = %e, "variant parent page unreadable");
            return String::new();
        }
    };
    let sections = extract_sections(&content, INHERITED_SECTIONS);
    if sections.is_empty() {
        return String::new();
    }
    format!(
        "\n\n## Additional Context\n\n{} is a variant of {}. The following sections come from the {} page.\n\n{}",
        name, parent, parent, sections
    )
}

/// Copy every section whose heading's first word is one of `wanted`, up to
/// the next heading of the same or a higher level.
pub fn extract_sections(content: &str, wanted: &[&str]) -> String {
    let mut out = String::new();
    let mut capturing: Option<usize> = None;
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim_start();
        let fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");
        let heading = if in_fence || fence { None } else { parse_heading(trimmed) };
        if fence {
            in_fence = !in_fence;
        }

        if let Some(h) = heading {
            if let Some(level) = capturing {
                if h.level <= level {
                    capturing = None;
                }
            }
            if capturing.is_none() {
                let first = h
                    .text
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                if wanted.contains(&first.as_str()) {
                    capturing = Some(h.level);
                }
            }
        }

        if capturing.is_some() {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Truncated framework source for `name`, if a matching file exists.
fn source_prefix(corpus: &Corpus, name: &str) -> Option<String> {
    let dir = corpus.framework_components_dir().join(name);
    let candidates = [
        dir.join(format!("{}.tsx", name)),
        dir.join(format!("{}Native.tsx", name)),
    ];
    let path = candidates.into_iter().find(|p| p.is_file()).or_else(|| {
        let mut tsx: Vec<PathBuf> = std::fs::read_dir(&dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tsx"))
            .collect();
        tsx.sort();
        tsx.into_iter().next()
    })?;

    let content = std::fs::read_to_string(&path).ok()?;
    let mut prefix: String = content.chars().take(SOURCE_PREFIX_CHARS).collect();
    if prefix.len() < content.len() {
        prefix.push_str("\n// ...");
    }
    Some(format!(
        "\n\n## Source excerpt ({})\n\n```tsx\n{}\n```\n",
        corpus.relative(&path),
        prefix
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_table() {
        assert_eq!(variant_parent("VStack"), Some("Stack"));
        assert_eq!(variant_parent("h3"), Some("Heading"));
        assert_eq!(variant_parent("Button"), None);
    }

    #[test]
    fn test_extract_sections_stops_at_same_level() {
        let doc = "# Stack\n\nIntro.\n\n## Properties\n\n### `gap`\n\nSpacing.\n\n## Events\n\n### `click`\n\n## Styling\n\nTheme vars.\n";
        let out = extract_sections(doc, INHERITED_SECTIONS);
        assert!(out.contains("## Properties"));
        assert!(out.contains("### `gap`"));
        assert!(out.contains("## Events"));
        assert!(!out.contains("Styling"));
        assert!(!out.contains("Intro"));
    }

    #[test]
    fn test_extract_sections_ignores_fenced_headings() {
        let doc = "## Usage\n\n```md\n## Properties\n```\n\n## Other\n";
        assert!(extract_sections(doc, INHERITED_SECTIONS).is_empty());
    }
}
