use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vidqueue::download::{TaskSnapshot, TaskStage, TaskState};
use vidqueue::downloader::{CoordinatorBuilder, Settings};
use vidqueue::media::{Container, ManifestProvider, StreamInfo, StreamManifest, Video};
use vidqueue::progress::ProgressSink;
use vidqueue::transfer::{Tagger, Transfer, TransferRequest};
use vidqueue::{Error, Result};

// Common test constants
pub const TEST_MEDIA_HOST: &str = "https://media.example.com";
pub const TEST_VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test subscriber; `RUST_LOG=vidqueue=debug` shows engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates an empty placeholder file, as the host does before a download
pub fn create_placeholder(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, b"").expect("Failed to write placeholder file");
    file_path
}

/// Wait until `condition` holds, failing the test after [`TEST_TIMEOUT`]
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + TEST_TIMEOUT;
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// === Stream Helpers ===

/// Creates a stream URL on the test media host
pub fn stream_url(name: &str) -> Url {
    Url::parse(&format!("{}/{}", TEST_MEDIA_HOST, name)).expect("Invalid test URL")
}

pub fn audio(name: &str, container: Container, bitrate: u64) -> StreamInfo {
    StreamInfo::audio(stream_url(name), container, bitrate)
}

pub fn video_only(name: &str, container: Container, quality: u32, framerate: u32) -> StreamInfo {
    StreamInfo::video_only(stream_url(name), container, quality, framerate)
}

pub fn muxed(name: &str, container: Container, quality: u32, framerate: u32) -> StreamInfo {
    StreamInfo::muxed(stream_url(name), container, quality, framerate)
}

/// A manifest shaped like a typical video page
pub fn create_test_manifest() -> StreamManifest {
    StreamManifest::new(vec![
        muxed("360", Container::mp4(), 360, 30),
        video_only("1080-30", Container::mp4(), 1080, 30),
        video_only("1080-60", Container::webm(), 1080, 60),
        video_only("720", Container::mp4(), 720, 30),
        audio("a-mp4", Container::mp4(), 128_000),
        audio("a-webm", Container::webm(), 160_000),
    ])
}

pub fn create_test_video() -> Video {
    Video::new(TEST_VIDEO_ID, "Never Gonna Give You Up").with_author("Rick Astley")
}

pub fn create_test_videos(count: usize) -> Vec<Video> {
    (1..=count)
        .map(|i| Video::new(format!("video{}", i), format!("Video {}", i)))
        .collect()
}

// === Collaborator Mocks ===

/// Serves one manifest for every video, or reports every video unavailable.
pub struct MockManifests {
    manifest: Option<StreamManifest>,
    calls: AtomicUsize,
}

impl MockManifests {
    pub fn new(manifest: StreamManifest) -> Arc<Self> {
        Arc::new(Self {
            manifest: Some(manifest),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            manifest: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestProvider for MockManifests {
    async fn get_manifest(&self, video_id: &str) -> Result<StreamManifest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.manifest
            .clone()
            .ok_or_else(|| Error::VideoUnavailable(video_id.to_string()))
    }
}

/// A transfer that reports half progress, then waits for a release.
///
/// Tracks how many runs are active at once so tests can check admission.
pub struct MockTransfer {
    releases: Semaphore,
    active: AtomicUsize,
    max_active: AtomicUsize,
    runs: AtomicUsize,
    fail_next: Mutex<Option<String>>,
    requests: Mutex<Vec<TransferRequest>>,
}

impl MockTransfer {
    /// Every run completes as soon as it starts.
    pub fn instant() -> Arc<Self> {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    /// Every run waits for [`MockTransfer::release`].
    pub fn gated() -> Arc<Self> {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            releases: Semaphore::new(permits),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Let `count` waiting or future runs finish.
    pub fn release(&self, count: usize) {
        self.releases.add_permits(count);
    }

    /// Make the next run to finish fail with `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transfer for MockTransfer {
    async fn run(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        progress.report(0.5);

        // Decremented on drop too: the task drops this future on cancellation.
        let _active = ActiveGuard::enter(&self.active);
        self.max_active
            .fetch_max(self.active.load(Ordering::SeqCst), Ordering::SeqCst);

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            permit = self.releases.acquire() => {
                if let Ok(permit) = permit {
                    permit.forget();
                }
                match self.fail_next.lock().take() {
                    Some(message) => Err(Error::Transfer(message)),
                    None => Ok(()),
                }
            }
        }
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl<'a> ActiveGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Counts tag injections and optionally fails them.
#[derive(Default)]
pub struct MockTagger {
    calls: AtomicUsize,
    fail: Mutex<Option<String>>,
}

impl MockTagger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let tagger = Self::default();
        *tagger.fail.lock() = Some(message.to_string());
        Arc::new(tagger)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tagger for MockTagger {
    async fn inject(
        &self,
        _video: &Video,
        _format: &str,
        _path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail.lock().clone() {
            Some(message) => Err(Error::Tagging(message)),
            None => Ok(()),
        }
    }
}

// === Observer Helpers ===

/// Records every transition seen by the state-change callback.
#[derive(Clone, Default)]
pub struct TransitionLog {
    entries: Arc<Mutex<Vec<(PathBuf, TaskState, Option<TaskStage>)>>>,
}

impl TransitionLog {
    pub fn record(&self, snapshot: &TaskSnapshot) {
        self.entries
            .lock()
            .push((snapshot.path.clone(), snapshot.state, snapshot.stage));
    }

    /// States reported for `path`, consecutive duplicates collapsed.
    pub fn states_for(&self, path: &Path) -> Vec<TaskState> {
        let mut states: Vec<TaskState> = self
            .entries
            .lock()
            .iter()
            .filter(|(p, _, _)| p == path)
            .map(|(_, state, _)| *state)
            .collect();
        states.dedup();
        states
    }

    /// Stages reported for `path` while running.
    pub fn stages_for(&self, path: &Path) -> Vec<TaskStage> {
        self.entries
            .lock()
            .iter()
            .filter(|(p, _, _)| p == path)
            .filter_map(|(_, _, stage)| *stage)
            .collect()
    }
}

// === Coordinator Builder Helpers ===

/// Creates a coordinator builder over the test manifest with tagging off
pub fn create_test_builder(transfer: Arc<MockTransfer>) -> CoordinatorBuilder {
    let settings = Arc::new(Settings::default());
    settings.set_should_inject_tags(false);
    CoordinatorBuilder::new(MockManifests::new(create_test_manifest()), transfer).settings(settings)
}

/// Creates a coordinator builder that records transitions into `log`
pub fn create_logged_builder(transfer: Arc<MockTransfer>, log: &TransitionLog) -> CoordinatorBuilder {
    let log = log.clone();
    create_test_builder(transfer).on_state_change(move |snapshot| log.record(snapshot))
}

// === Assertion Helpers ===

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

/// Asserts that a file has the expected content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).expect("Failed to read file");
    assert_eq!(content, expected, "File content mismatch at path: {:?}", path);
}

/// Asserts that a task settled in `expected` within the test timeout
pub async fn assert_settles(task: &vidqueue::DownloadTask, expected: TaskState) {
    let state = tokio::time::timeout(TEST_TIMEOUT, task.wait())
        .await
        .expect("task did not settle");
    assert_eq!(state, expected, "unexpected final state for {:?}", task.path());
}
