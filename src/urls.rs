//! Registry of documentation URLs that exist on the public site.
//!
//! The registry is the only gate through which links leave the server.
//! Anything that cannot be proven to exist here is dropped, never guessed.
//!
//! # Sources
//!
//! | Source | URL |
//! |--------|-----|
//! | `<Page url="…">` in the main layout (no wildcard, no `/404`, no `<Redirect>` body) | as declared |
//! | `docs/content/components/<Name>.md` (not `_`-prefixed) | `/components/<Name>` |
//! | `docs/content/components/xmlui-<ext>/<Name>.md` | `/extensions/xmlui-<ext>/<Name>` |

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeSet;
use std::path::Path;

use crate::corpus::{self, Corpus};

const EXTENSION_DIR_PREFIX: &str = "xmlui-";

#[derive(Debug, Clone)]
pub struct UrlRegistry {
    base_url: String,
    pages_rel: String,
    paths: BTreeSet<String>,
}

impl UrlRegistry {
    /// Build the registry from a snapshot. Never fails: unreadable sources
    /// simply contribute no paths.
    pub fn build(corpus: &Corpus, base_url: &str) -> Self {
        let mut paths = BTreeSet::new();

        if let Some(layout) = corpus.main_layout() {
            match std::fs::read_to_string(&layout) {
                Ok(content) => paths.extend(page_urls(&content)),
                Err(e) => tracing::warn!(path = %layout.display(), error = %e, "cannot read main layout"),
            }
        }

        let components = corpus.component_docs_dir();
        for name in markdown_stems(&components) {
            paths.insert(format!("/components/{}", name));
        }
        for ext in extension_dirs(&components) {
            for name in markdown_stems(&components.join(&ext)) {
                paths.insert(format!("/extensions/{}/{}", ext, name));
            }
        }

        tracing::info!(count = paths.len(), "URL registry built");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pages_rel: corpus.relative(corpus.pages_dir()),
            paths,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|s| s.as_str())
    }

    /// Membership test for a URL path such as `/components/Button`.
    /// A `#fragment` is ignored.
    pub fn is_valid(&self, path: &str) -> bool {
        let path = path.split('#').next().unwrap_or(path);
        self.paths.contains(path)
    }

    /// Returns the URL unchanged if its path (after the base URL) is known.
    pub fn validate(&self, full_url: &str) -> Option<String> {
        let rest = full_url.strip_prefix(&self.base_url)?;
        if self.is_valid(rest) {
            Some(full_url.to_string())
        } else {
            None
        }
    }

    /// Full URL for a known path, or `None` for an unknown one.
    pub fn url_for(&self, path: &str) -> Option<String> {
        self.validate(&format!("{}{}", self.base_url, path))
    }

    /// Canonical documentation URL for a snapshot-relative file, if the
    /// file corresponds to a page that exists.
    pub fn url_for_file(&self, rel: &str) -> Option<String> {
        candidate_paths(rel, &self.pages_rel)
            .into_iter()
            .find_map(|p| self.url_for(&p))
    }
}

/// Candidate URL paths for a snapshot-relative file, most specific first.
fn candidate_paths(rel: &str, pages_rel: &str) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(rest) = strip_dir(rel, corpus::COMPONENT_DOCS) {
        let parts: Vec<&str> = rest.split('/').collect();
        match parts.as_slice() {
            [file] => out.push(format!("/components/{}", file_stem(file))),
            [ext, file] if ext.starts_with(EXTENSION_DIR_PREFIX) => {
                out.push(format!("/extensions/{}/{}", ext, file_stem(file)))
            }
            _ => {}
        }
    } else if let Some(rest) = strip_dir(rel, pages_rel) {
        let without_ext = match rest.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => rest,
        };
        out.push(format!("/{}", without_ext));
        if let Some(name) = rest.strip_prefix("howto/") {
            out.push(format!("/howto/{}", file_stem(name)));
        }
    } else if let Some(rest) = strip_dir(rel, corpus::FRAMEWORK_COMPONENTS)
        .or_else(|| strip_dir(rel, corpus::EXAMPLE_SOURCES))
    {
        if let Some(first) = rest.split('/').next() {
            out.push(format!("/components/{}", file_stem(first)));
        }
    }

    out
}

fn strip_dir<'a>(rel: &'a str, dir: &str) -> Option<&'a str> {
    rel.strip_prefix(dir)?.strip_prefix('/')
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.split_once('.') {
        Some((stem, _)) => stem,
        None => base,
    }
}

/// Stems of `*.md` files directly inside `dir`, skipping `_`-prefixed ones.
pub(crate) fn markdown_stems(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(read) => read
            .flatten()
            .filter(|e| e.path().is_file())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                let stem = name.strip_suffix(".md")?;
                if stem.starts_with('_') || stem.is_empty() {
                    None
                } else {
                    Some(stem.to_string())
                }
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Extension package directories (`xmlui-*`) inside the component docs.
pub(crate) fn extension_dirs(components: &Path) -> Vec<String> {
    let mut dirs: Vec<String> = match std::fs::read_dir(components) {
        Ok(read) => read
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with(EXTENSION_DIR_PREFIX))
            .collect(),
        Err(_) => Vec::new(),
    };
    dirs.sort();
    dirs
}

struct OpenPage {
    url: Option<String>,
    redirect: bool,
}

/// Extract routable page URLs from the main layout markup.
fn page_urls(content: &str) -> Vec<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;

    let mut open: Vec<OpenPage> = Vec::new();
    let mut urls = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"Page" => open.push(OpenPage {
                    url: url_attr(&e),
                    redirect: false,
                }),
                b"Redirect" => mark_redirect(&mut open),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"Page" => {
                    if let Some(url) = url_attr(&e) {
                        if is_routable(&url) {
                            urls.push(url);
                        }
                    }
                }
                b"Redirect" => mark_redirect(&mut open),
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Page" {
                    if let Some(page) = open.pop() {
                        match page.url {
                            Some(url) if !page.redirect && is_routable(&url) => urls.push(url),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "stopped parsing main layout"
                );
                break;
            }
            _ => {}
        }
    }

    urls
}

fn mark_redirect(open: &mut [OpenPage]) {
    if let Some(page) = open.last_mut() {
        page.redirect = true;
    }
}

fn url_attr(e: &BytesStart) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == b"url" {
            a.unescape_value().ok().map(|v| v.trim().to_string())
        } else {
            None
        }
    })
}

fn is_routable(url: &str) -> bool {
    url.starts_with('/') && !url.contains('*') && !url.contains(':') && url != "/404"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_urls_skip_wildcards_404_and_redirects() {
        let layout = r#"
<App>
  <Pages>
    <Page url="/">
      <Markdown content="home" />
    </Page>
    <Page url="/howto/paginate-a-list"><Markdown /></Page>
    <Page url="/components/*"><ComponentPage /></Page>
    <Page url="/404"><Text>Not found</Text></Page>
    <Page url="/old-guide">
      <Redirect to="/guides/markup" />
    </Page>
    <Page url="/guides/markup" />
  </Pages>
</App>"#;
        let urls = page_urls(layout);
        assert_eq!(urls, vec!["/", "/howto/paginate-a-list", "/guides/markup"]);
    }

    #[test]
    fn test_candidate_paths_for_component_docs() {
        let pages = "docs/content/pages";
        assert_eq!(
            candidate_paths("docs/content/components/Button.md", pages),
            vec!["/components/Button"]
        );
        assert_eq!(
            candidate_paths("docs/content/components/xmlui-search/Search.md", pages),
            vec!["/extensions/xmlui-search/Search"]
        );
        assert!(candidate_paths("docs/content/components/misc/Thing.md", pages).is_empty());
    }

    #[test]
    fn test_candidate_paths_for_pages_and_source() {
        let pages = "docs/content/pages";
        assert_eq!(
            candidate_paths("docs/content/pages/howto/paginate-a-list.md", pages),
            vec!["/howto/paginate-a-list", "/howto/paginate-a-list"]
        );
        assert_eq!(
            candidate_paths("xmlui/src/components/Button/Button.tsx", pages),
            vec!["/components/Button"]
        );
        assert!(candidate_paths("README.md", pages).is_empty());
    }

    #[test]
    fn test_validate_requires_membership() {
        let reg = UrlRegistry {
            base_url: "https://docs.xmlui.org".to_string(),
            pages_rel: "docs/content/pages".to_string(),
            paths: ["/components/Button".to_string()].into_iter().collect(),
        };
        assert_eq!(
            reg.validate("https://docs.xmlui.org/components/Button").as_deref(),
            Some("https://docs.xmlui.org/components/Button")
        );
        assert!(reg.validate("https://docs.xmlui.org/components/Dialog").is_none());
        assert!(reg.validate("https://elsewhere.org/components/Button").is_none());
        assert!(reg.is_valid("/components/Button#properties"));
    }
}
