//! Tool trait, shared tool state, and the dispatching registry.
//!
//! Every tool the server exposes implements [`Tool`] and is registered in
//! a [`ToolRegistry`]. Both transports (MCP and the REST surface) go
//! through [`ToolRegistry::call`], which is the single place arguments
//! are validated, failures are classified, and analytics are recorded.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌─────────┐ ┌─────────┐ ┌────────────┐ │
//! │  │ docs    │ │ search  │ │ prompts /  │ │
//! │  │ lookup  │ │ family  │ │ sessions   │ │
//! │  └─────────┘ └─────────┘ └────────────┘ │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!     call() → validate → execute → analytics
//! ```

use chrono::Utc;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::analytics::{Analytics, AnalyticsRecord};
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::ToolError;
use crate::mediator::{self, MediatedResult, MediatorConfig, SearchEnv};
use crate::params::validate_params;
use crate::sessions::SessionStore;
use crate::tools::pattern::PatternTable;
use crate::topics::TopicIndex;
use crate::urls::{self, UrlRegistry};

/// Leading marker of a tool result that reports a failure in-band.
pub const FAILURE_SIGIL: &str = "❌";

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// `execute` is synchronous: handlers read files and walk directories, so
/// the transports run it on the blocking pool.
pub trait Tool: Send + Sync {
    /// Route and MCP name, e.g. `"component_docs"`.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool with arguments already checked against
    /// [`parameters_schema`](Tool::parameters_schema).
    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Facts about a mediated search, recorded as a `search_query` entry.
#[derive(Debug, Clone)]
pub struct SearchTrace {
    pub query: String,
    pub result_count: usize,
    pub search_paths: Vec<String>,
    pub found_urls: Vec<String>,
}

impl SearchTrace {
    pub fn from_result(result: &MediatedResult, cfg: &MediatorConfig, corpus: &Corpus) -> Self {
        Self {
            query: result.query.raw.clone(),
            result_count: result.ranked.len(),
            search_paths: cfg.roots.iter().map(|r| corpus.relative(r)).collect(),
            found_urls: result.found_urls(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub search: Option<SearchTrace>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            search: None,
        }
    }

    pub fn with_search(text: impl Into<String>, trace: SearchTrace) -> Self {
        Self {
            text: text.into(),
            search: Some(trace),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Process-wide state handed to every tool invocation.
///
/// Cloning is cheap. The URL registry, topic index, pattern table, and
/// suggestion pool are built on first use and never change afterwards.
#[derive(Clone)]
pub struct ToolContext {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    corpus: Corpus,
    example_roots: Vec<PathBuf>,
    analytics: Analytics,
    sessions: SessionStore,
    urls: OnceLock<UrlRegistry>,
    topics: OnceLock<TopicIndex>,
    patterns: OnceLock<PatternTable>,
    suggestion_pool: OnceLock<Vec<String>>,
}

impl ToolContext {
    pub fn new(config: Config, corpus: Corpus, example_roots: Vec<PathBuf>, analytics: Analytics) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                corpus,
                example_roots,
                analytics,
                sessions: SessionStore::new(),
                urls: OnceLock::new(),
                topics: OnceLock::new(),
                patterns: OnceLock::new(),
                suggestion_pool: OnceLock::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.inner.corpus
    }

    pub fn corpus_root(&self) -> &Path {
        self.inner.corpus.root()
    }

    /// User-supplied example directories, in CLI order.
    pub fn example_roots(&self) -> &[PathBuf] {
        &self.inner.example_roots
    }

    pub fn analytics(&self) -> &Analytics {
        &self.inner.analytics
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn urls(&self) -> &UrlRegistry {
        self.inner
            .urls
            .get_or_init(|| UrlRegistry::build(&self.inner.corpus, &self.inner.config.docs.base_url))
    }

    pub fn topics(&self) -> &TopicIndex {
        self.inner
            .topics
            .get_or_init(|| TopicIndex::build(&self.inner.corpus, self.urls()))
    }

    pub fn patterns(&self) -> &PatternTable {
        self.inner.patterns.get_or_init(|| PatternTable::build(self.urls()))
    }

    /// Component names and topic names, for "did you mean".
    pub fn suggestion_pool(&self) -> &[String] {
        self.inner.suggestion_pool.get_or_init(|| {
            let components = self.inner.corpus.component_docs_dir();
            let mut pool = urls::markdown_stems(&components);
            for ext in urls::extension_dirs(&components) {
                pool.extend(urls::markdown_stems(&components.join(ext)));
            }
            pool.extend(self.topics().entries().iter().map(|t| t.name.clone()));
            pool.sort();
            pool.dedup();
            pool
        })
    }

    /// Run the mediated search pipeline against this snapshot.
    pub fn mediate(&self, cfg: &MediatorConfig, query: &str) -> MediatedResult {
        let env = SearchEnv {
            corpus_root: self.corpus_root(),
            urls: self.urls(),
            topics: self.topics(),
            suggestion_pool: self.suggestion_pool(),
        };
        mediator::mediate(cfg, query, &env)
    }

    /// Build the lazy indexes now rather than on the first request.
    pub fn warm(&self) {
        let started = Instant::now();
        let urls = self.urls().len();
        let topics = self.topics().len();
        let patterns = self.patterns().len();
        tracing::info!(
            urls,
            topics,
            patterns,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexes ready"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registered tools plus the dispatching wrapper.
///
/// ```rust
/// use xmlui_mcp::traits::ToolRegistry;
///
/// let tools = ToolRegistry::with_builtins();
/// assert!(tools.find("search").is_some());
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry with every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::tools::register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Validate, execute, classify, and record one tool invocation.
    ///
    /// A handler error or a result starting with [`FAILURE_SIGIL`] counts
    /// as a failure. Unexpected errors (including panics) are logged in
    /// full and replaced with a short message naming the tool.
    pub fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let started = Instant::now();
        let arguments = params.clone();

        let outcome = match self.find(name) {
            None => Err(ToolError::NotFound(format!("no tool named '{}'", name))),
            Some(tool) => match validate_params(&tool.parameters_schema(), &params) {
                Err(e) => Err(e),
                Ok(validated) => catch_unwind(AssertUnwindSafe(|| tool.execute(validated, ctx)))
                    .unwrap_or_else(|_| Err(ToolError::Unexpected("handler panicked".to_string()))),
            },
        };

        let outcome = outcome.map_err(|e| match e {
            ToolError::Unexpected(detail) => {
                tracing::error!(tool = name, error = %detail, "tool failed unexpectedly");
                ToolError::Unexpected(format!("{} failed; see the server log", name))
            }
            other => other,
        });

        let (success, size, error_msg) = match &outcome {
            Ok(out) if out.text.starts_with(FAILURE_SIGIL) => (
                false,
                out.text.len(),
                out.text.lines().next().map(|l| l.to_string()),
            ),
            Ok(out) => (true, out.text.len(), None),
            Err(e) => (false, 0, Some(e.to_string())),
        };

        tracing::info!(
            tool = name,
            success,
            result_bytes = size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call"
        );

        let analytics = ctx.analytics();
        analytics.record(&AnalyticsRecord::ToolInvocation {
            timestamp: Utc::now(),
            tool_name: name.to_string(),
            arguments,
            success,
            result_size_chars: size,
            error_msg,
        });

        match outcome {
            Ok(out) => {
                if let Some(trace) = out.search {
                    analytics.record(&AnalyticsRecord::SearchQuery {
                        timestamp: Utc::now(),
                        tool_name: name.to_string(),
                        query: trace.query,
                        result_count: trace.result_count,
                        success,
                        search_paths: trace.search_paths,
                        found_urls: trace.found_urls,
                    });
                }
                Ok(out.text)
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct Echo;

    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the text argument"
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }
        fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
            let text = params["text"].as_str().unwrap_or_default();
            match text {
                "boom" => Err(ToolError::Unexpected("disk on fire".into())),
                "panic" => panic!("handler bug"),
                _ => Ok(ToolOutput::text(text)),
            }
        }
    }

    fn ctx(tmp: &TempDir) -> ToolContext {
        let analytics = Analytics::open(&tmp.path().join("a.jsonl"));
        ToolContext::new(Config::minimal(), Corpus::new(tmp.path()), Vec::new(), analytics)
    }

    fn records(tmp: &TempDir) -> Vec<Value> {
        std::fs::read_to_string(tmp.path().join("a.jsonl"))
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_call_records_success_and_sigil_failure() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let mut reg = ToolRegistry::new();
        reg.register(Box::new(Echo));

        assert_eq!(reg.call("echo", json!({ "text": "hi" }), &ctx).unwrap(), "hi");
        let out = reg.call("echo", json!({ "text": "❌ nope" }), &ctx).unwrap();
        assert!(out.starts_with(FAILURE_SIGIL));

        let recs = records(&tmp);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["success"], true);
        assert_eq!(recs[1]["success"], false);
        assert_eq!(recs[1]["error_msg"], "❌ nope");
        // Sizes are UTF-8 bytes: the sigil alone is three.
        assert_eq!(recs[0]["result_size_chars"], 2);
        assert_eq!(recs[1]["result_size_chars"], 8);
    }

    #[test]
    fn test_unexpected_errors_are_opaque() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let mut reg = ToolRegistry::new();
        reg.register(Box::new(Echo));

        let err = reg.call("echo", json!({ "text": "boom" }), &ctx).unwrap_err();
        assert!(err.to_string().contains("echo failed"));
        assert!(!err.to_string().contains("disk on fire"));

        let err = reg.call("echo", json!({ "text": "panic" }), &ctx).unwrap_err();
        assert!(matches!(err, ToolError::Unexpected(_)));
    }

    #[test]
    fn test_validation_and_unknown_tool() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let mut reg = ToolRegistry::new();
        reg.register(Box::new(Echo));

        let err = reg.call("echo", json!({}), &ctx).unwrap_err();
        assert!(err.to_string().starts_with("invalid argument:"));
        let err = reg.call("nope", json!({}), &ctx).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(records(&tmp).len(), 2);
    }
}
