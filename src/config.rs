//! TOML configuration.
//!
//! Every section is optional. A missing file is not an error for the
//! server: [`Config::minimal`] supplies the same defaults the individual
//! `#[serde(default)]` functions do.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 9090
//!
//! [docs]
//! base_url = "https://docs.xmlui.org"
//!
//! [corpus]
//! tag_prefix = "xmlui@"
//! download_timeout_secs = 300
//!
//! [search]
//! max_file_results = 10
//! max_snippets_per_file = 3
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    9090
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsConfig {
    /// Public documentation site every emitted link is rooted at.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://docs.xmlui.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Overrides the platform cache root (`<cache>/xmlui/xmlui-mcp`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_release_api")]
    pub release_api: String,
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
    #[serde(default = "default_fallback_tag")]
    pub fallback_tag: String,
    #[serde(default)]
    pub fallback_archive_url: Option<String>,
    #[serde(default = "default_archive_url_template")]
    pub archive_url_template: String,
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Hex SHA-256 the downloaded archive must match, when pinned.
    #[serde(default)]
    pub archive_sha256: Option<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            release_api: default_release_api(),
            tag_prefix: default_tag_prefix(),
            fallback_tag: default_fallback_tag(),
            fallback_archive_url: None,
            archive_url_template: default_archive_url_template(),
            list_timeout_secs: default_list_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            archive_sha256: None,
        }
    }
}

impl CorpusConfig {
    /// Archive URL for a release tag.
    pub fn archive_url(&self, tag: &str) -> String {
        self.archive_url_template.replace("{tag}", tag)
    }

    /// Archive URL used when the release listing is unavailable.
    pub fn fallback_url(&self) -> String {
        self.fallback_archive_url
            .clone()
            .unwrap_or_else(|| self.archive_url(&self.fallback_tag))
    }
}

fn default_release_api() -> String {
    "https://api.github.com/repos/xmlui-org/xmlui/releases".to_string()
}
fn default_tag_prefix() -> String {
    "xmlui@".to_string()
}
fn default_fallback_tag() -> String {
    "xmlui@0.10.5".to_string()
}
fn default_archive_url_template() -> String {
    "https://github.com/xmlui-org/xmlui/archive/refs/tags/{tag}.zip".to_string()
}
fn default_list_timeout_secs() -> u64 {
    15
}
fn default_download_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_max_snippet_length")]
    pub max_snippet_length: usize,
    #[serde(default = "default_max_file_results")]
    pub max_file_results: usize,
    #[serde(default = "default_max_snippets_per_file")]
    pub max_snippets_per_file: usize,
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_snippet_length: default_max_snippet_length(),
            max_file_results: default_max_file_results(),
            max_snippets_per_file: default_max_snippets_per_file(),
            file_extensions: default_file_extensions(),
        }
    }
}

fn default_max_results() -> usize {
    50
}
fn default_max_snippet_length() -> usize {
    200
}
fn default_max_file_results() -> usize {
    10
}
fn default_max_snippets_per_file() -> usize {
    3
}
fn default_file_extensions() -> Vec<String> {
    [".mdx", ".md", ".tsx", ".scss"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_enabled")]
    pub enabled: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_analytics_enabled(),
        }
    }
}

fn default_analytics_enabled() -> bool {
    true
}

impl Config {
    /// Defaults for every section; used when no config file is given.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Directory holding the snapshot, the lock file, the analytics log,
    /// and the server log.
    pub fn cache_root(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.corpus.cache_dir {
            return Some(dir.clone());
        }
        crate::provision::default_cache_root()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate search limits
    if config.search.max_results < 1 {
        anyhow::bail!("search.max_results must be >= 1");
    }
    if config.search.max_file_results < 1 {
        anyhow::bail!("search.max_file_results must be >= 1");
    }
    if config.search.max_snippets_per_file < 1 {
        anyhow::bail!("search.max_snippets_per_file must be >= 1");
    }
    if config.search.max_snippet_length < 20 {
        anyhow::bail!("search.max_snippet_length must be >= 20");
    }
    for ext in &config.search.file_extensions {
        if !ext.starts_with('.') {
            anyhow::bail!("search.file_extensions entries must start with '.', got '{}'", ext);
        }
    }

    // Validate docs
    let base = &config.docs.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("docs.base_url must be an http(s) URL, got '{}'", base);
    }

    // Validate corpus
    if config.corpus.tag_prefix.is_empty() {
        anyhow::bail!("corpus.tag_prefix must not be empty");
    }
    if !config.corpus.archive_url_template.contains("{tag}") {
        anyhow::bail!("corpus.archive_url_template must contain '{{tag}}'");
    }

    Ok(())
}
