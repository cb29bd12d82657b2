//! Snapshot provisioning against an in-memory release source.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use xmlui_mcp::corpus::{is_valid_snapshot, VERSION_MARKER};
use xmlui_mcp::provision::{
    sha256_file, ProvisionError, Provisioner, Release, ReleaseSource, LOCK_FILE, REPO_DIR, TMP_DIR,
};

const TAG: &str = "xmlui@0.9.0";
const FALLBACK_TAG: &str = "xmlui@0.8.0";

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn release_archive() -> Vec<u8> {
    zip_bytes(&[
        ("xmlui-xmlui-0.9.0/docs/content/components/Button.md", "# Button\n"),
        ("xmlui-xmlui-0.9.0/docs/src/Main.xmlui", "<App />\n"),
        ("xmlui-xmlui-0.9.0/xmlui/src/components/Button/Button.tsx", "export {};\n"),
    ])
}

#[derive(Clone, Default)]
struct Counters {
    listings: Arc<AtomicUsize>,
    downloads: Arc<AtomicUsize>,
}

struct FakeSource {
    archive: Vec<u8>,
    listing_fails: bool,
    download_delay: Duration,
    counters: Counters,
}

impl FakeSource {
    fn new(archive: Vec<u8>, counters: Counters) -> Self {
        Self {
            archive,
            listing_fails: false,
            download_delay: Duration::ZERO,
            counters,
        }
    }
}

impl ReleaseSource for FakeSource {
    fn latest_release(&self) -> Result<Release, ProvisionError> {
        self.counters.listings.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails {
            return Err(ProvisionError::FetchFailed("listing unavailable".to_string()));
        }
        Ok(Release {
            tag: TAG.to_string(),
            archive_url: format!("mem://{}", TAG),
        })
    }

    fn download(&self, _url: &str, dest: &Path) -> Result<(), ProvisionError> {
        self.counters.downloads.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.download_delay);
        fs::write(dest, &self.archive).map_err(|e| ProvisionError::FetchFailed(e.to_string()))
    }
}

fn fallback() -> Release {
    Release {
        tag: FALLBACK_TAG.to_string(),
        archive_url: format!("mem://{}", FALLBACK_TAG),
    }
}

fn provisioner(cache: &Path, source: FakeSource) -> Provisioner {
    Provisioner::new(cache, Box::new(source), fallback())
}

fn leftovers(cache: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(cache)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n != LOCK_FILE)
        .collect();
    names.sort();
    names
}

#[test]
fn test_fresh_install() {
    let tmp = TempDir::new().unwrap();
    let counters = Counters::default();
    let p = provisioner(tmp.path(), FakeSource::new(release_archive(), counters.clone()));

    let repo = p.ensure_corpus().unwrap();
    assert_eq!(repo, tmp.path().join(REPO_DIR));
    assert!(is_valid_snapshot(&repo));
    assert_eq!(fs::read_to_string(repo.join(VERSION_MARKER)).unwrap(), format!("{}\n", TAG));
    assert!(repo.join("docs/content/components/Button.md").is_file());
    assert_eq!(leftovers(tmp.path()), vec![REPO_DIR.to_string()]);

    // Second call is a no-op.
    p.ensure_corpus().unwrap();
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(counters.listings.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_start_downloads_once() {
    let tmp = TempDir::new().unwrap();
    let counters = Counters::default();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let cache = tmp.path().to_path_buf();
            let counters = counters.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut source = FakeSource::new(release_archive(), counters);
                source.download_delay = Duration::from_millis(200);
                let p = provisioner(&cache, source);
                barrier.wait();
                p.ensure_corpus()
            })
        })
        .collect();

    let paths: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(paths[0], paths[1]);
    assert!(is_valid_snapshot(&paths[0]));
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 1);
    assert!(!tmp.path().join(TMP_DIR).exists());
}

#[test]
fn test_listing_failure_uses_fallback_release() {
    let tmp = TempDir::new().unwrap();
    let mut source = FakeSource::new(release_archive(), Counters::default());
    source.listing_fails = true;

    let repo = provisioner(tmp.path(), source).ensure_corpus().unwrap();
    assert_eq!(
        fs::read_to_string(repo.join(VERSION_MARKER)).unwrap().trim(),
        FALLBACK_TAG
    );
}

#[test]
fn test_pinned_digest_mismatch_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let source = FakeSource::new(release_archive(), Counters::default());
    let p = provisioner(tmp.path(), source).with_sha256(Some("00".repeat(32)));

    let err = p.ensure_corpus().unwrap_err();
    assert!(matches!(err, ProvisionError::FetchFailed(_)), "{}", err);
    assert!(!tmp.path().join(REPO_DIR).exists());
    assert!(!tmp.path().join(TMP_DIR).exists());
}

#[test]
fn test_pinned_digest_match_installs() {
    let tmp = TempDir::new().unwrap();
    let archive = release_archive();
    let reference = tmp.path().join("reference.zip");
    fs::write(&reference, &archive).unwrap();
    let digest = sha256_file(&reference).unwrap().to_uppercase();

    let cache = tmp.path().join("cache");
    let p = provisioner(&cache, FakeSource::new(archive, Counters::default())).with_sha256(Some(digest));
    assert!(is_valid_snapshot(&p.ensure_corpus().unwrap()));
}

#[test]
fn test_stale_temp_from_crash_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let stale = tmp.path().join(TMP_DIR).join("final/docs");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("half-written.md"), "partial").unwrap();

    let repo = provisioner(tmp.path(), FakeSource::new(release_archive(), Counters::default()))
        .ensure_corpus()
        .unwrap();
    assert!(is_valid_snapshot(&repo));
    assert!(!repo.join("docs/half-written.md").exists());
    assert!(!tmp.path().join(TMP_DIR).exists());
}

#[test]
fn test_invalid_existing_snapshot_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join(REPO_DIR);
    fs::create_dir_all(repo.join("docs")).unwrap();
    fs::write(repo.join("docs/leftover.md"), "old").unwrap();

    let counters = Counters::default();
    let installed = provisioner(tmp.path(), FakeSource::new(release_archive(), counters.clone()))
        .ensure_corpus()
        .unwrap();
    assert_eq!(installed, repo);
    assert!(is_valid_snapshot(&repo));
    assert!(!repo.join("docs/leftover.md").exists());
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_traversal_archive_installs_nothing() {
    let tmp = TempDir::new().unwrap();
    let archive = zip_bytes(&[
        ("xmlui-xmlui-0.9.0/docs/a.md", "a"),
        ("xmlui-xmlui-0.9.0/../../escape.md", "bad"),
    ]);

    let err = provisioner(tmp.path(), FakeSource::new(archive, Counters::default()))
        .ensure_corpus()
        .unwrap_err();
    assert!(matches!(err, ProvisionError::IllegalPath(_)));
    assert!(!tmp.path().join(REPO_DIR).exists());
    assert!(!tmp.path().join(TMP_DIR).exists());
    assert!(!tmp.path().parent().unwrap().join("escape.md").exists());
}

#[test]
fn test_existing_valid_snapshot_skips_network() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join(REPO_DIR);
    fs::create_dir_all(repo.join("docs")).unwrap();
    fs::create_dir_all(repo.join("xmlui")).unwrap();
    fs::write(repo.join(VERSION_MARKER), "xmlui@0.7.0\n").unwrap();

    let counters = Counters::default();
    provisioner(tmp.path(), FakeSource::new(Vec::new(), counters.clone()))
        .ensure_corpus()
        .unwrap();
    assert_eq!(counters.listings.load(Ordering::SeqCst), 0);
    assert_eq!(counters.downloads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_archive_without_snapshot_layout_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join(REPO_DIR);
    fs::create_dir_all(repo.join("docs")).unwrap();
    fs::create_dir_all(repo.join("xmlui")).unwrap();
    // Blank marker: invalid, so the provisioner tries to replace it.
    fs::write(repo.join(VERSION_MARKER), "\n").unwrap();

    let archive = zip_bytes(&[("top/docs/a.md", "a")]);
    let err = provisioner(tmp.path(), FakeSource::new(archive, Counters::default()))
        .ensure_corpus()
        .unwrap_err();
    assert!(matches!(err, ProvisionError::InstallFailed(_)), "{}", err);
    assert!(repo.join("docs").is_dir(), "previous tree removed");
    assert!(!tmp.path().join(TMP_DIR).exists());
}
