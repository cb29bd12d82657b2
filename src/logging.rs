//! Tracing subscriber setup.
//!
//! Logs go to stderr and, when a cache root is known, are appended to
//! `<cache_root>/xmlui-mcp-server.log`. Stdout is never written: in stdio
//! mode it carries the MCP protocol stream.
//!
//! Filter priority: `XMLUI_MCP_LOG`, then `RUST_LOG`, then `-v` (debug) or
//! the default `info`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "xmlui-mcp-server.log";
pub const LOG_ENV: &str = "XMLUI_MCP_LOG";

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) {
    let filter = build_env_filter(verbose);

    let file_layer = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            ),
            Err(e) => {
                eprintln!("xmlui-mcp: cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if verbose {
        EnvFilter::new("xmlui_mcp=debug,info")
    } else {
        EnvFilter::new("info")
    }
}
