//! Search-family tools: each one is a mediator config over a slice of the
//! corpus plus the shared render step.

use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::single_string_schema;
use crate::classify::{self, Section};
use crate::error::ToolError;
use crate::mediator::{self, MediatorConfig};
use crate::params::{non_empty, parse};
use crate::topics::headings;
use crate::traits::{SearchTrace, Tool, ToolContext, ToolOutput};

#[derive(Deserialize)]
struct QueryParams {
    query: String,
}

fn query_schema() -> Value {
    single_string_schema("query", "Search terms, e.g. \"table pagination\"")
}

/// Run one mediated search and package the rendered block with its trace.
pub(crate) fn run(ctx: &ToolContext, cfg: &MediatorConfig, query: &str) -> ToolOutput {
    let result = ctx.mediate(cfg, query);
    let trace = SearchTrace::from_result(&result, cfg, ctx.corpus());
    ToolOutput::with_search(mediator::render(&result), trace)
}

/// Whole-corpus search: reference pages, pages tree, examples, source.
pub fn search_config(ctx: &ToolContext) -> MediatorConfig {
    let corpus = ctx.corpus();
    let roots = vec![
        corpus.component_docs_dir(),
        corpus.pages_dir().to_path_buf(),
        corpus.example_sources_dir(),
        corpus.framework_components_dir(),
    ];
    MediatorConfig::new(roots, &ctx.config().search).with_sections(
        &[Section::Components, Section::Howtos, Section::Examples, Section::Source],
        &[Section::Components, Section::Howtos],
    )
}

/// Example markup: the docs examples plus user-supplied example roots.
pub fn examples_config(ctx: &ToolContext) -> MediatorConfig {
    let mut roots = vec![ctx.corpus().example_sources_dir()];
    roots.extend(ctx.example_roots().iter().cloned());
    let mut cfg = MediatorConfig::new(roots, &ctx.config().search)
        .with_sections(&[Section::Examples], &[])
        .with_classifier(classify::classify_examples);
    if !cfg.file_extensions.iter().any(|e| e == ".xmlui") {
        cfg.file_extensions.push(".xmlui".to_string());
    }
    cfg
}

pub fn howto_config(ctx: &ToolContext) -> MediatorConfig {
    MediatorConfig::new(vec![ctx.corpus().howto_dir()], &ctx.config().search)
        .with_sections(&[Section::Howtos], &[])
}

pub struct SearchTool;

impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search XMLUI documentation, examples, and framework source. Returns ranked snippets, \
         section facets, and validated documentation URLs."
    }

    fn parameters_schema(&self) -> Value {
        query_schema()
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: QueryParams = parse(params)?;
        let query = non_empty("query", &p.query)?;
        Ok(run(ctx, &search_config(ctx), query))
    }
}

pub struct ExamplesTool;

impl Tool for ExamplesTool {
    fn name(&self) -> &str {
        "examples"
    }

    fn description(&self) -> &str {
        "Search example XMLUI markup from the documentation and any configured example directories"
    }

    fn parameters_schema(&self) -> Value {
        query_schema()
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: QueryParams = parse(params)?;
        let query = non_empty("query", &p.query)?;
        Ok(run(ctx, &examples_config(ctx), query))
    }
}

pub struct SearchHowtoTool;

impl Tool for SearchHowtoTool {
    fn name(&self) -> &str {
        "search_howto"
    }

    fn description(&self) -> &str {
        "Search the XMLUI how-to guides for task-oriented answers"
    }

    fn parameters_schema(&self) -> Value {
        query_schema()
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: QueryParams = parse(params)?;
        let query = non_empty("query", &p.query)?;
        Ok(run(ctx, &howto_config(ctx), query))
    }
}

pub struct ListHowtoTool;

impl Tool for ListHowtoTool {
    fn name(&self) -> &str {
        "list_howto"
    }

    fn description(&self) -> &str {
        "List the titles of all XMLUI how-to guides"
    }

    fn parameters_schema(&self) -> Value {
        super::empty_schema()
    }

    fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let dir = ctx.corpus().howto_dir();
        let files = howto_files(&dir);
        if files.is_empty() {
            return Ok(ToolOutput::text(format!(
                "❌ No how-to guides found under {}",
                ctx.corpus().relative(&dir)
            )));
        }

        let urls = ctx.urls();
        let mut out = format!("# How-to guides ({})\n\n", files.len());
        for path in &files {
            let title = howto_title(path);
            match urls.url_for_file(&ctx.corpus().relative(path)) {
                Some(url) => {
                    let _ = writeln!(out, "- {} ({})", title, url);
                }
                None => {
                    let _ = writeln!(out, "- {}", title);
                }
            }
        }
        Ok(ToolOutput::text(out))
    }
}

/// Markdown files under the how-to tree, sorted by path.
pub fn howto_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("md" | "mdx")))
        .collect();
    files.sort();
    files
}

/// First `#` heading, falling back to the title-cased file stem.
pub fn howto_title(path: &Path) -> String {
    let from_heading = std::fs::read_to_string(path).ok().and_then(|content| {
        headings(&content)
            .into_iter()
            .find(|h| h.level == 1)
            .map(|h| h.text)
    });
    from_heading.unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        mediator::kebab_to_title(&stem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_howto_title_prefers_heading() {
        let tmp = TempDir::new().unwrap();
        let with = tmp.path().join("paginate-a-list.md");
        fs::write(&with, "---\ntitle: x\n---\n# Paginate a List\n\nbody\n").unwrap();
        let without = tmp.path().join("use-the-tabs.md");
        fs::write(&without, "no heading here\n").unwrap();

        assert_eq!(howto_title(&with), "Paginate a List");
        assert_eq!(howto_title(&without), "Use The Tabs");
        assert_eq!(howto_files(tmp.path()).len(), 2);
    }
}
