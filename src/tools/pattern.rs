//! `pattern`: curated markup recipes, falling back to how-to search.

use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;

use super::search::{howto_config, run};
use super::single_string_schema;
use crate::error::ToolError;
use crate::params::{non_empty, parse};
use crate::query;
use crate::traits::{Tool, ToolContext, ToolOutput};
use crate::urls::UrlRegistry;

const MAX_PATTERNS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct PatternEntry {
    pub name: &'static str,
    pub trigger_terms: &'static [&'static str],
    pub snippet: &'static str,
    /// Documentation path; the entry is dropped if the site lacks it.
    pub url_path: &'static str,
}

const CURATED: &[PatternEntry] = &[
    PatternEntry {
        name: "Fetch and display data",
        trigger_terms: &["fetch", "data", "datasource", "api", "load", "list"],
        snippet: r#"<DataSource id="users" url="/api/users" />
<List data="{users}">
  <Text>{$item.name}</Text>
</List>"#,
        url_path: "/components/DataSource",
    },
    PatternEntry {
        name: "Submit a form",
        trigger_terms: &["form", "submit", "formitem", "validation", "input", "field"],
        snippet: r#"<Form onSubmit="(data) => console.log(data)">
  <FormItem bindTo="name" label="Name" required="true" />
  <FormItem bindTo="email" label="Email" type="email" />
</Form>"#,
        url_path: "/components/Form",
    },
    PatternEntry {
        name: "Open a modal dialog",
        trigger_terms: &["modal", "dialog", "open", "confirm"],
        snippet: r#"<Fragment>
  <Button label="Open" onClick="dialog.open()" />
  <ModalDialog id="dialog" title="Details">
    <Text>Dialog content</Text>
  </ModalDialog>
</Fragment>"#,
        url_path: "/components/ModalDialog",
    },
    PatternEntry {
        name: "Show data in a table",
        trigger_terms: &["table", "column", "columns", "rows", "grid"],
        snippet: r#"<Table data="{users}">
  <Column bindTo="name" header="Name" />
  <Column bindTo="email" header="Email" />
</Table>"#,
        url_path: "/components/Table",
    },
    PatternEntry {
        name: "Render conditionally",
        trigger_terms: &["conditional", "conditionally", "hide", "visible", "condition"],
        snippet: r#"<Fragment when="{isLoggedIn}">
  <Text>Welcome back!</Text>
</Fragment>"#,
        url_path: "/components/Fragment",
    },
    PatternEntry {
        name: "Keep state in a variable",
        trigger_terms: &["variable", "variables", "var", "state", "counter", "reactive"],
        snippet: r#"<App var.count="{0}">
  <Button label="Clicked {count} times" onClick="count++" />
</App>"#,
        url_path: "/components/App",
    },
    PatternEntry {
        name: "Call an API from an event",
        trigger_terms: &["apicall", "post", "delete", "mutation", "save", "event"],
        snippet: r#"<Button label="Delete">
  <event name="click">
    <APICall method="delete" url="/api/items/{$item.id}" confirmMessage="Are you sure?" />
  </event>
</Button>"#,
        url_path: "/components/APICall",
    },
    PatternEntry {
        name: "Navigate between pages",
        trigger_terms: &["navigation", "navigate", "navlink", "routing", "route", "page", "pages", "menu"],
        snippet: r#"<App layout="vertical">
  <NavPanel>
    <NavLink label="Home" to="/" />
    <NavLink label="About" to="/about" />
  </NavPanel>
  <Pages>
    <Page url="/"><Text>Home</Text></Page>
    <Page url="/about"><Text>About</Text></Page>
  </Pages>
</App>"#,
        url_path: "/components/NavLink",
    },
    PatternEntry {
        name: "Lay out with stacks",
        trigger_terms: &["layout", "stack", "vstack", "hstack", "horizontal", "vertical", "align"],
        snippet: r#"<VStack gap="$space-4">
  <HStack verticalAlignment="center">
    <Text>Left</Text>
    <SpaceFiller />
    <Button label="Right" />
  </HStack>
</VStack>"#,
        url_path: "/components/Stack",
    },
];

/// The curated entries whose documentation URL exists in this snapshot.
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<(PatternEntry, String)>,
}

impl PatternTable {
    pub fn build(urls: &UrlRegistry) -> Self {
        Self::from_entries(CURATED, urls)
    }

    pub fn from_entries(candidates: &[PatternEntry], urls: &UrlRegistry) -> Self {
        let mut entries = Vec::new();
        for entry in candidates {
            match urls.url_for(entry.url_path) {
                Some(url) => entries.push((*entry, url)),
                None => tracing::warn!(
                    pattern = entry.name,
                    path = entry.url_path,
                    "dropping pattern with unknown documentation URL"
                ),
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries scoring above zero, best first, ties in table order.
    pub fn best_matches(&self, tokens: &[String], limit: usize) -> Vec<(&PatternEntry, &str)> {
        let mut scored: Vec<(usize, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (entry, _))| (score(entry, tokens), i))
            .filter(|(s, _)| *s > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, i)| (&self.entries[i].0, self.entries[i].1.as_str()))
            .collect()
    }
}

/// Tokens hitting a trigger term, plus one per token contained in the name.
fn score(entry: &PatternEntry, tokens: &[String]) -> usize {
    let name = entry.name.to_lowercase();
    tokens
        .iter()
        .map(|t| {
            let trigger = usize::from(entry.trigger_terms.contains(&t.as_str()));
            let in_name = usize::from(t.chars().count() >= 3 && name.contains(t.as_str()));
            trigger + in_name
        })
        .sum()
}

#[derive(Deserialize)]
struct PatternParams {
    query: String,
}

pub struct PatternTool;

impl Tool for PatternTool {
    fn name(&self) -> &str {
        "pattern"
    }

    fn description(&self) -> &str {
        "Get a curated XMLUI markup pattern for a common task; falls back to the how-to guides"
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("query", "Task to solve, e.g. \"submit a form\"")
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: PatternParams = parse(params)?;
        let raw = non_empty("query", &p.query)?;
        let q = query::normalize(raw, &query::default_stopwords(), &query::default_synonyms());

        let mut tokens = q.scoring.clone();
        tokens.extend(q.synonyms.iter().map(|(_, canonical)| canonical.clone()));
        let matches = ctx.patterns().best_matches(&tokens, MAX_PATTERNS);
        if matches.is_empty() {
            let fallback = run(ctx, &howto_config(ctx), raw);
            let text = format!(
                "No curated pattern matches \"{}\"; searching the how-to guides instead.\n\n{}",
                raw, fallback.text
            );
            return Ok(ToolOutput { text, search: fallback.search });
        }

        let mut out = String::new();
        for (entry, url) in matches {
            let _ = write!(
                out,
                "## {}\n\n```xml\n{}\n```\n\nDocumentation: {}\n\n",
                entry.name, entry.snippet, url
            );
        }
        Ok(ToolOutput::text(out.trim_end().to_string() + "\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use std::fs;
    use tempfile::TempDir;

    fn registry_with(components: &[&str]) -> (TempDir, UrlRegistry) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs/content/components");
        fs::create_dir_all(&dir).unwrap();
        for c in components {
            fs::write(dir.join(format!("{}.md", c)), "# x\n").unwrap();
        }
        let urls = UrlRegistry::build(&Corpus::new(tmp.path()), "https://docs.xmlui.org");
        (tmp, urls)
    }

    #[test]
    fn test_entries_with_unknown_urls_are_dropped() {
        let (_tmp, urls) = registry_with(&["Form", "Table"]);
        let table = PatternTable::build(&urls);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_best_match_by_trigger_terms() {
        let (_tmp, urls) = registry_with(&["Form", "Table", "DataSource"]);
        let table = PatternTable::build(&urls);
        let tokens = vec!["submit".to_string(), "form".to_string()];
        let best = table.best_matches(&tokens, 3);
        assert_eq!(best[0].0.name, "Submit a form");
        assert_eq!(best[0].1, "https://docs.xmlui.org/components/Form");
        assert!(table.best_matches(&["zzz".to_string()], 3).is_empty());
    }
}
