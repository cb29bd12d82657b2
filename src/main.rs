//! # xmlui-mcp
//!
//! Serves XMLUI documentation tools to MCP clients.
//!
//! ## Usage
//!
//! ```bash
//! xmlui-mcp [CORPUS_DIR] [EXAMPLE_ROOT] [EXAMPLE_DIRS] [--http] [--port N] [--config FILE]
//! ```
//!
//! Without `CORPUS_DIR` the snapshot is provisioned under the cache root
//! on first start. stdio is the default transport.
//!
//! ## Examples
//!
//! ```bash
//! # stdio, provisioning the snapshot if needed
//! xmlui-mcp
//!
//! # Existing checkout plus local example apps
//! xmlui-mcp ~/src/xmlui ~/src/apps demo,crm
//!
//! # HTTP on port 9090 (MCP at /mcp)
//! xmlui-mcp --http --port 9090
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use xmlui_mcp::analytics::{Analytics, ANALYTICS_FILE};
use xmlui_mcp::config::{self, Config};
use xmlui_mcp::corpus::Corpus;
use xmlui_mcp::logging::{self, LOG_FILE};
use xmlui_mcp::provision::Provisioner;
use xmlui_mcp::traits::{ToolContext, ToolRegistry};
use xmlui_mcp::{mcp, server};

/// XMLUI documentation assistant for coding agents (MCP server).
#[derive(Parser)]
#[command(name = "xmlui-mcp", version)]
struct Cli {
    /// Existing XMLUI snapshot or checkout; skips provisioning.
    corpus_dir: Option<PathBuf>,

    /// Directory holding example applications.
    example_root: Option<PathBuf>,

    /// Comma-separated subdirectories of EXAMPLE_ROOT to search.
    example_dirs: Option<String>,

    /// Serve over HTTP instead of stdio.
    #[arg(long)]
    http: bool,

    /// HTTP port (overrides `[server].port`).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::minimal(),
    };
    let cache_root = cfg.cache_root();

    logging::init_logging(cache_root.as_ref().map(|r| r.join(LOG_FILE)).as_deref(), cli.verbose);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting xmlui-mcp");

    let corpus_root = match &cli.corpus_dir {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("corpus directory not found: {}", dir.display()))?,
        None => {
            let root = cache_root
                .clone()
                .context("no cache directory on this platform; pass CORPUS_DIR or set [corpus].cache_dir")?;
            let corpus_cfg = cfg.corpus.clone();
            tokio::task::spawn_blocking(move || Provisioner::from_config(root, &corpus_cfg).ensure_corpus())
                .await
                .context("provisioning task failed")??
        }
    };

    let corpus = Corpus::new(&corpus_root);
    tracing::info!(
        path = %corpus_root.display(),
        tag = corpus.version().as_deref().unwrap_or("unversioned"),
        "corpus ready"
    );

    let example_roots = example_roots(cli.example_root.as_ref(), cli.example_dirs.as_deref());
    for root in &example_roots {
        if !root.is_dir() {
            tracing::warn!(path = %root.display(), "example directory does not exist");
        }
    }

    let analytics = match (&cache_root, cfg.analytics.enabled) {
        (Some(root), true) => Analytics::open(&root.join(ANALYTICS_FILE)),
        _ => Analytics::disabled(),
    };

    let http = cli.http;
    let bind = cfg.server.bind.clone();
    let port = cli.port.unwrap_or(cfg.server.port);

    let ctx = ToolContext::new(cfg, corpus, example_roots, analytics);
    let warm_ctx = ctx.clone();
    tokio::task::spawn_blocking(move || warm_ctx.warm())
        .await
        .context("index build failed")?;

    let tools = Arc::new(ToolRegistry::with_builtins());
    if http {
        server::run_http(&bind, port, tools, ctx).await
    } else {
        mcp::serve_stdio(tools, ctx).await
    }
}

/// `EXAMPLE_ROOT` alone, or `EXAMPLE_ROOT/<dir>` for each listed dir.
fn example_roots(root: Option<&PathBuf>, dirs: Option<&str>) -> Vec<PathBuf> {
    let Some(root) = root else {
        return Vec::new();
    };
    match dirs {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| root.join(d))
            .collect(),
        None => vec![root.clone()],
    }
}
