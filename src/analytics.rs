//! Append-only JSONL analytics log.
//!
//! One JSON object per line, tagged with `entry_type`. Writes are
//! serialized through a mutex around a long-lived append handle. A failed
//! write is logged at debug level and otherwise ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ANALYTICS_FILE: &str = "xmlui-mcp-analytics.jsonl";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "entry_type", rename_all = "snake_case")]
pub enum AnalyticsRecord {
    ToolInvocation {
        timestamp: DateTime<Utc>,
        tool_name: String,
        arguments: Value,
        success: bool,
        /// UTF-8 byte length of the returned text.
        result_size_chars: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    SearchQuery {
        timestamp: DateTime<Utc>,
        tool_name: String,
        query: String,
        result_count: usize,
        success: bool,
        search_paths: Vec<String>,
        found_urls: Vec<String>,
    },
}

pub struct Analytics {
    path: Option<PathBuf>,
    file: Option<Mutex<File>>,
}

impl Analytics {
    /// Open `path` for appending. An unopenable file disables analytics.
    pub fn open(path: &Path) -> Self {
        let opened = path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| OpenOptions::new().create(true).append(true).open(path));
        match opened {
            Ok(file) => Self {
                path: Some(path.to_path_buf()),
                file: Some(Mutex::new(file)),
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "analytics disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            file: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, record: &AnalyticsRecord) {
        let Some(file) = &self.file else {
            return;
        };
        let line = match serde_json::to_string(record) {
            Ok(l) => l,
            Err(e) => {
                tracing::debug!(error = %e, "analytics record not serializable");
                return;
            }
        };
        let mut guard = match file.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(guard, "{}", line) {
            tracing::debug!(error = %e, "analytics write failed");
        }
    }
}
