//! `read_file`: raw file contents from a fixed set of corpus directories.

use serde::Deserialize;
use serde_json::Value;
use std::path::{Component, Path};

use super::single_string_schema;
use crate::error::ToolError;
use crate::params::{non_empty, parse};
use crate::traits::{Tool, ToolContext, ToolOutput};

pub const ALLOWED_EXTENSIONS: &[&str] = &["mdx", "tsx", "scss", "md"];

/// Snapshot subdirectories a path must resolve under.
pub const ALLOWED_PREFIXES: &[&str] = &["docs/content", "docs/public/pages", "docs/src", "xmlui/src"];

#[derive(Deserialize)]
struct ReadParams {
    path: String,
}

pub struct ReadFileTool;

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a documentation or source file from the XMLUI snapshot by its relative path"
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema(
            "path",
            "Snapshot-relative path, e.g. \"xmlui/src/components/Button/Button.tsx\"",
        )
    }

    fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let p: ReadParams = parse(params)?;
        let rel = non_empty("path", &p.path)?.replace('\\', "/");
        let root = ctx.corpus_root();
        let path = resolve(root, &rel)?;
        let content = std::fs::read_to_string(&path)?;
        Ok(ToolOutput::text(content))
    }
}

/// Check `rel` and return its absolute location inside `root`.
///
/// Order matters for the error kind: traversal and absolute paths are path
/// violations even when the extension is also wrong.
pub fn resolve(root: &Path, rel: &str) -> Result<std::path::PathBuf, ToolError> {
    let rel_path = Path::new(rel);
    if rel_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ToolError::PathViolation(format!(
            "'{}' must be a relative path without '..'",
            rel
        )));
    }

    let ext = rel_path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext) {
        return Err(ToolError::Validation(format!(
            "unsupported file type '{}'; allowed: .{}",
            rel,
            ALLOWED_EXTENSIONS.join(", .")
        )));
    }

    let normalized = rel.trim_start_matches("./");
    if !ALLOWED_PREFIXES
        .iter()
        .any(|p| normalized.starts_with(&format!("{}/", p)))
    {
        return Err(ToolError::PathViolation(format!(
            "'{}' is outside the readable directories ({})",
            rel,
            ALLOWED_PREFIXES.join(", ")
        )));
    }

    let joined = root.join(normalized);
    if !joined.is_file() {
        return Err(ToolError::NotFound(format!("no file at '{}'", rel)));
    }

    // Symlinks inside the snapshot must not lead out of it.
    let canonical_root = root.canonicalize()?;
    let canonical = joined.canonicalize()?;
    let inside = ALLOWED_PREFIXES
        .iter()
        .any(|p| canonical.starts_with(canonical_root.join(p)));
    if !inside {
        return Err(ToolError::PathViolation(format!("'{}' resolves outside the snapshot", rel)));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("xmlui/src/components/Button");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Button.tsx"), "export const Button = 1;\n").unwrap();
        fs::write(tmp.path().join("README.md"), "top\n").unwrap();
        tmp
    }

    #[test]
    fn test_resolves_allowed_file() {
        let tmp = snapshot();
        let p = resolve(tmp.path(), "xmlui/src/components/Button/Button.tsx").unwrap();
        assert!(p.ends_with("Button.tsx"));
    }

    #[test]
    fn test_traversal_is_path_violation() {
        let tmp = snapshot();
        for bad in ["../outside.md", "../../etc/passwd", "/etc/passwd.md", "docs/content/../../x.md"] {
            let err = resolve(tmp.path(), bad).unwrap_err();
            assert!(matches!(err, ToolError::PathViolation(_)), "{} -> {:?}", bad, err);
        }
    }

    #[test]
    fn test_extension_and_prefix_rules() {
        let tmp = snapshot();
        assert!(matches!(
            resolve(tmp.path(), "xmlui/src/index.js").unwrap_err(),
            ToolError::Validation(_)
        ));
        assert!(matches!(
            resolve(tmp.path(), "README.md").unwrap_err(),
            ToolError::PathViolation(_)
        ));
        assert!(matches!(
            resolve(tmp.path(), "docs/content/components/Nope.md").unwrap_err(),
            ToolError::NotFound(_)
        ));
    }
}
