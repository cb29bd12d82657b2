//! Layout of an installed documentation snapshot.
//!
//! A snapshot is a read-only copy of the XMLUI repository tagged with a
//! release identifier. Nothing in this crate writes inside it after the
//! provisioner renames it into place.
//!
//! ```text
//! repo/
//!   .xmlui-version              release tag
//!   docs/content/components/    reference pages (+ xmlui-* extension dirs)
//!   docs/content/pages/         pages tree (older releases: docs/public/pages/)
//!   docs/src/components/        authored examples
//!   docs/src/Main.xmlui         page declarations
//!   xmlui/src/components/       framework source
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Name of the marker file holding the installed release tag.
pub const VERSION_MARKER: &str = ".xmlui-version";

/// Top-level directory of the framework source inside the snapshot.
pub const SOURCE_DIR: &str = "xmlui";

pub const COMPONENT_DOCS: &str = "docs/content/components";
pub const EXAMPLE_SOURCES: &str = "docs/src/components";
pub const FRAMEWORK_COMPONENTS: &str = "xmlui/src/components";

const PAGES_CANDIDATES: [&str; 2] = ["docs/content/pages", "docs/public/pages"];
const MAIN_LAYOUT_CANDIDATES: [&str; 2] = ["docs/src/Main.xmlui", "docs/Main.xmlui"];

/// Returns `true` if `root` holds a complete snapshot: a non-empty version
/// marker plus the `docs/` and framework-source directories.
pub fn is_valid_snapshot(root: &Path) -> bool {
    let marker = match std::fs::read_to_string(root.join(VERSION_MARKER)) {
        Ok(s) => s,
        Err(_) => return false,
    };
    !marker.trim().is_empty() && root.join("docs").is_dir() && root.join(SOURCE_DIR).is_dir()
}

/// Read-only view of a snapshot directory.
#[derive(Debug)]
pub struct Corpus {
    root: PathBuf,
    pages: OnceLock<PathBuf>,
}

impl Corpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pages: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Installed release tag, if the marker is present.
    pub fn version(&self) -> Option<String> {
        std::fs::read_to_string(self.root.join(VERSION_MARKER))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn component_docs_dir(&self) -> PathBuf {
        self.root.join(COMPONENT_DOCS)
    }

    pub fn example_sources_dir(&self) -> PathBuf {
        self.root.join(EXAMPLE_SOURCES)
    }

    pub fn framework_components_dir(&self) -> PathBuf {
        self.root.join(FRAMEWORK_COMPONENTS)
    }

    /// The pages tree. Detected once: the first candidate that exists wins,
    /// otherwise the newer layout is assumed.
    pub fn pages_dir(&self) -> &Path {
        self.pages.get_or_init(|| {
            PAGES_CANDIDATES
                .iter()
                .map(|p| self.root.join(p))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| self.root.join(PAGES_CANDIDATES[0]))
        })
    }

    pub fn howto_dir(&self) -> PathBuf {
        self.pages_dir().join("howto")
    }

    /// The layout file declaring `<Page url="…">` routes.
    pub fn main_layout(&self) -> Option<PathBuf> {
        MAIN_LAYOUT_CANDIDATES
            .iter()
            .map(|p| self.root.join(p))
            .find(|p| p.is_file())
    }

    /// Path of `abs` relative to the snapshot root, with `/` separators.
    /// Files outside the snapshot keep their absolute path.
    pub fn relative(&self, abs: &Path) -> String {
        let rel = abs.strip_prefix(&self.root).unwrap_or(abs);
        rel.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validity_requires_marker_and_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        assert!(!is_valid_snapshot(root));

        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("xmlui")).unwrap();
        assert!(!is_valid_snapshot(root));

        fs::write(root.join(VERSION_MARKER), "  \n").unwrap();
        assert!(!is_valid_snapshot(root), "blank marker is not valid");

        fs::write(root.join(VERSION_MARKER), "xmlui@0.1.0\n").unwrap();
        assert!(is_valid_snapshot(root));
        assert_eq!(Corpus::new(root).version().as_deref(), Some("xmlui@0.1.0"));
    }

    #[test]
    fn test_pages_dir_prefers_existing_layout() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs/public/pages")).unwrap();
        let corpus = Corpus::new(tmp.path());
        assert!(corpus.pages_dir().ends_with("docs/public/pages"));
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let corpus = Corpus::new("/snap");
        let rel = corpus.relative(Path::new("/snap/docs/content/components/Button.md"));
        assert_eq!(rel, "docs/content/components/Button.md");
    }
}
