//! Corpus provisioning: download, verify, and atomically install a
//! release snapshot under the cache root.
//!
//! # Layout
//!
//! ```text
//! <cache_root>/
//!   .repo.lock          advisory lock serializing installs
//!   .tmp/               scratch space, removed on every exit path
//!     archive.zip
//!     extract/<top>/    unpacked archive
//!     final/            the snapshot being assembled
//!   repo/               installed snapshot (with .xmlui-version)
//! ```
//!
//! `repo/` only ever appears through a rename of a fully written
//! `.tmp/final/`, so a reader never observes a partial install.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::config::CorpusConfig;
use crate::corpus::{is_valid_snapshot, VERSION_MARKER};

pub const REPO_DIR: &str = "repo";
pub const TMP_DIR: &str = ".tmp";
pub const LOCK_FILE: &str = ".repo.lock";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("extract failed: {0}")]
    ExtractFailed(String),
    #[error("archive entry escapes the destination: {0}")]
    IllegalPath(String),
    #[error("install failed: {0}")]
    InstallFailed(String),
}

fn install_err(context: &str, e: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::InstallFailed(format!("{}: {}", context, e))
}

/// `<platform cache dir>/xmlui/xmlui-mcp`.
pub fn default_cache_root() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("xmlui").join("xmlui-mcp"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub archive_url: String,
}

/// Where releases come from. The network implementation is
/// [`GithubReleases`]; tests substitute a local source.
pub trait ReleaseSource: Send + Sync {
    /// The newest release whose tag carries the framework prefix.
    fn latest_release(&self) -> Result<Release, ProvisionError>;

    /// Write the archive at `url` to `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError>;
}

// ═══════════════════════════════════════════════════════════════════════
// GitHub releases
// ═══════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct GhRelease {
    tag_name: String,
}

pub struct GithubReleases {
    cfg: CorpusConfig,
}

impl GithubReleases {
    pub fn new(cfg: CorpusConfig) -> Self {
        Self { cfg }
    }

    fn client(&self, timeout_secs: u64) -> Result<reqwest::blocking::Client, ProvisionError> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("xmlui-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProvisionError::FetchFailed(e.to_string()))
    }
}

impl ReleaseSource for GithubReleases {
    fn latest_release(&self) -> Result<Release, ProvisionError> {
        let releases: Vec<GhRelease> = self
            .client(self.cfg.list_timeout_secs)?
            .get(&self.cfg.release_api)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| ProvisionError::FetchFailed(format!("release listing: {}", e)))?;

        releases
            .into_iter()
            .find(|r| r.tag_name.starts_with(&self.cfg.tag_prefix))
            .map(|r| Release {
                archive_url: self.cfg.archive_url(&r.tag_name),
                tag: r.tag_name,
            })
            .ok_or_else(|| {
                ProvisionError::FetchFailed(format!("no release tagged '{}*'", self.cfg.tag_prefix))
            })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError> {
        let fetch_err = |e: reqwest::Error| ProvisionError::FetchFailed(format!("{}: {}", url, e));
        let mut response = self
            .client(self.cfg.download_timeout_secs)?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        let mut file = File::create(dest).map_err(|e| install_err("create archive file", e))?;
        response.copy_to(&mut file).map_err(fetch_err)?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Provisioner
// ═══════════════════════════════════════════════════════════════════════

pub struct Provisioner {
    cache_root: PathBuf,
    source: Box<dyn ReleaseSource>,
    fallback: Release,
    expected_sha256: Option<String>,
}

impl Provisioner {
    pub fn new(cache_root: impl Into<PathBuf>, source: Box<dyn ReleaseSource>, fallback: Release) -> Self {
        Self {
            cache_root: cache_root.into(),
            source,
            fallback,
            expected_sha256: None,
        }
    }

    /// Provisioner backed by the GitHub releases API.
    pub fn from_config(cache_root: impl Into<PathBuf>, cfg: &CorpusConfig) -> Self {
        let fallback = Release {
            tag: cfg.fallback_tag.clone(),
            archive_url: cfg.fallback_url(),
        };
        Self::new(cache_root, Box::new(GithubReleases::new(cfg.clone())), fallback)
            .with_sha256(cfg.archive_sha256.clone())
    }

    pub fn with_sha256(mut self, digest: Option<String>) -> Self {
        self.expected_sha256 = digest.map(|d| d.trim().to_lowercase());
        self
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.cache_root.join(REPO_DIR)
    }

    /// Return the installed snapshot, installing it first if needed.
    ///
    /// Blocks while another process holds the install lock, then re-checks
    /// the destination before doing any work of its own.
    pub fn ensure_corpus(&self) -> Result<PathBuf, ProvisionError> {
        let dest = self.repo_dir();
        if is_valid_snapshot(&dest) {
            return Ok(dest);
        }

        fs::create_dir_all(&self.cache_root).map_err(|e| install_err("create cache root", e))?;
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.cache_root.join(LOCK_FILE))
            .map_err(|e| install_err("open lock file", e))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write().map_err(|e| install_err("acquire lock", e))?;

        if is_valid_snapshot(&dest) {
            tracing::info!(path = %dest.display(), "snapshot installed by another process");
            return Ok(dest);
        }

        self.install(&dest)?;
        Ok(dest)
    }

    fn install(&self, dest: &Path) -> Result<(), ProvisionError> {
        let tmp = self.cache_root.join(TMP_DIR);
        if tmp.exists() {
            tracing::warn!(path = %tmp.display(), "removing stale temp directory");
            fs::remove_dir_all(&tmp).map_err(|e| install_err("remove stale temp dir", e))?;
        }
        fs::create_dir_all(&tmp).map_err(|e| install_err("create temp dir", e))?;
        let _cleanup = TempDirGuard(tmp.clone());

        let release = match self.source.latest_release() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, fallback = %self.fallback.tag, "release lookup failed; using fallback");
                self.fallback.clone()
            }
        };

        tracing::info!(tag = %release.tag, url = %release.archive_url, "downloading snapshot");
        let archive = tmp.join("archive.zip");
        self.source.download(&release.archive_url, &archive)?;

        let digest = sha256_file(&archive).map_err(|e| install_err("hash archive", e))?;
        tracing::info!(sha256 = %digest, "archive downloaded");
        if let Some(expected) = &self.expected_sha256 {
            if *expected != digest {
                return Err(ProvisionError::FetchFailed(format!(
                    "archive digest {} does not match pinned {}",
                    digest, expected
                )));
            }
        }

        let extract_dir = tmp.join("extract");
        extract_zip(&archive, &extract_dir)?;
        let top = single_top_dir(&extract_dir)?;

        let final_dir = tmp.join("final");
        fs::rename(&top, &final_dir).map_err(|e| install_err("stage snapshot", e))?;
        fs::write(final_dir.join(VERSION_MARKER), format!("{}\n", release.tag))
            .map_err(|e| install_err("write version marker", e))?;
        if !is_valid_snapshot(&final_dir) {
            return Err(ProvisionError::InstallFailed(format!(
                "release {} lacks the docs/ and xmlui/ trees",
                release.tag
            )));
        }

        if dest.exists() {
            fs::remove_dir_all(dest).map_err(|e| install_err("remove old snapshot", e))?;
        }
        fs::rename(&final_dir, dest).map_err(|e| install_err("move snapshot into place", e))?;

        tracing::info!(tag = %release.tag, path = %dest.display(), "snapshot installed");
        Ok(())
    }
}

/// Removes the temp directory on every exit path.
struct TempDirGuard(PathBuf);

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.0) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.0.display(), error = %e, "temp cleanup failed");
            }
        }
    }
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Unpack `archive` into `dest`, rejecting any entry that would land
/// outside it.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let extract_err = |e: &dyn std::fmt::Display| ProvisionError::ExtractFailed(e.to_string());
    let file = File::open(archive).map_err(|e| extract_err(&e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(&e))?;
    fs::create_dir_all(dest).map_err(|e| extract_err(&e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| extract_err(&e))?;
        let name = entry.name().to_string();
        let escapes = Path::new(&name)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        let rel = match entry.enclosed_name() {
            Some(p) if !escapes => p,
            _ => return Err(ProvisionError::IllegalPath(name)),
        };

        let out = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| extract_err(&e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| extract_err(&e))?;
        }
        let mut target = File::create(&out).map_err(|e| extract_err(&e))?;
        io::copy(&mut entry, &mut target).map_err(|e| extract_err(&e))?;
    }
    Ok(())
}

/// The archive's synthetic top-level directory, or `dir` itself when the
/// archive has no single wrapper.
fn single_top_dir(dir: &Path) -> Result<PathBuf, ProvisionError> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ProvisionError::ExtractFailed(e.to_string()))?
        .flatten()
        .map(|e| e.path())
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        [] => Err(ProvisionError::ExtractFailed("archive is empty".to_string())),
        _ => Ok(dir.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_rejects_parent_dir_entries() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("a.zip");
        write_zip(&archive, &[("top/ok.md", "ok"), ("top/../../evil.md", "bad")]);
        let err = extract_zip(&archive, &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, ProvisionError::IllegalPath(_)));
        assert!(!tmp.path().join("evil.md").exists());
    }

    #[test]
    fn test_single_top_dir_descends() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("a.zip");
        write_zip(&archive, &[("xmlui-0.1/docs/a.md", "a"), ("xmlui-0.1/xmlui/b.tsx", "b")]);
        let out = tmp.path().join("out");
        extract_zip(&archive, &out).unwrap();
        let top = single_top_dir(&out).unwrap();
        assert!(top.ends_with("xmlui-0.1"));
        assert!(top.join("docs/a.md").is_file());
    }

    #[test]
    fn test_sha256_file() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("x");
        fs::write(&p, "abc").unwrap();
        assert_eq!(
            sha256_file(&p).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
