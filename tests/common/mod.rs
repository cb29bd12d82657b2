#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use xmlui_mcp::analytics::Analytics;
use xmlui_mcp::config::Config;
use xmlui_mcp::corpus::Corpus;
use xmlui_mcp::traits::{ToolContext, ToolRegistry};

pub const BASE: &str = "https://docs.xmlui.org";
pub const ANALYTICS: &str = "analytics.jsonl";

pub const MAIN_LAYOUT: &str = r#"<App>
  <Pages>
    <Page url="/"><Home /></Page>
    <Page url="/howto/paginate-a-list"><Markdown src="/pages/howto/paginate-a-list.md" /></Page>
    <Page url="/old-home"><Redirect to="/" /></Page>
    <Page url="/blog/*"><Blog /></Page>
    <Page url="/404"><NotFound /></Page>
  </Pages>
</App>
"#;

pub const STACK_MD: &str = "# Stack

Stack lays out its children in a single direction.

## Properties

### `gap`

Space between adjacent children.

### `orientation`

Either horizontal or vertical.

## Events

### `click`

Fired when the stack area is clicked.

## Styling

Theme variables for the stack.
";

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a small but complete snapshot into `root`.
pub fn write_snapshot(root: &Path) {
    write(root, ".xmlui-version", "xmlui@0.9.0\n");
    write(root, "docs/src/Main.xmlui", MAIN_LAYOUT);
    write(
        root,
        "docs/content/components/Button.md",
        "# Button\n\nThe `Button` component triggers an action when clicked.\n\n## Properties\n\n### `label`\n\nThe text shown on the button.\n",
    );
    write(
        root,
        "docs/content/components/ModalDialog.md",
        "# ModalDialog\n\nA ModalDialog shows content in a dialog overlay.\n\n## Properties\n\n### `title`\n\nThe dialog title.\n",
    );
    write(root, "docs/content/components/Stack.md", STACK_MD);
    write(root, "docs/content/components/VStack.md", "# VStack\n\nA vertical Stack.\n");
    write(root, "docs/content/components/_meta.md", "internal\n");
    write(
        root,
        "docs/content/components/xmlui-search/Search.md",
        "# Search\n\nA search box from the search extension.\n",
    );
    write(
        root,
        "docs/content/pages/howto/paginate-a-list.md",
        "# Paginate a List\n\nCombine a List with the Pagination component.\n\n## Set the page size\n\nUse pageSize on Pagination.\n",
    );
    write(
        root,
        "docs/content/pages/howto/use-tabs.md",
        "Tabs group related content.\n",
    );
    write(
        root,
        "docs/src/components/TableDemo.tsx",
        "export const demo = `<Table data=\"{rows}\" />`;\n",
    );
    write(
        root,
        "xmlui/src/components/Button/Button.tsx",
        "export function Button() {\n  return null;\n}\n",
    );
}

pub struct Env {
    pub tmp: TempDir,
    pub root: PathBuf,
    pub ctx: ToolContext,
    pub tools: ToolRegistry,
}

pub fn setup_with(config: Config, example_roots: Vec<PathBuf>) -> Env {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("repo");
    write_snapshot(&root);
    let analytics = Analytics::open(&tmp.path().join(ANALYTICS));
    let ctx = ToolContext::new(config, Corpus::new(root.clone()), example_roots, analytics);
    Env {
        tmp,
        root,
        ctx,
        tools: ToolRegistry::with_builtins(),
    }
}

pub fn setup() -> Env {
    setup_with(Config::minimal(), Vec::new())
}

/// Every `https://` URL appearing in `text`, trimmed of wrapping punctuation.
pub fn urls_in(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|w| {
            let start = w.find("https://")?;
            Some(w[start..].trim_end_matches([')', ',', '.', '?']).to_string())
        })
        .collect()
}

pub fn analytics_records(env: &Env) -> Vec<serde_json::Value> {
    fs::read_to_string(env.tmp.path().join(ANALYTICS))
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
