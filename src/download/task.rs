//! The per-download state machine.
//!
//! A [`DownloadTask`] turns one video into one file. Starting it spawns a
//! pipeline on the Tokio runtime:
//!
//! 1. wait for the admission gate (`Queued`)
//! 2. fetch the stream manifest and pick the option matching the requested
//!    format, unless an option was assigned up front (`Resolving`)
//! 3. run the transfer collaborator (`Transferring`)
//! 4. write metadata tags when enabled (`Tagging`)
//!
//! The gate permit is dropped before the terminal state is published. Every
//! suspension point races the run's cancellation token, so cancelling settles
//! the task as `Canceled` without a failure reason. Any other error settles it
//! as `Failed` with the error's display string.

use super::option::DownloadOption;
use super::selector::OptionSelector;
use super::status::{TaskSnapshot, TaskStage, TaskState};
use crate::downloader::{AdmissionGate, CoordinatorConfig};
use crate::error::{Error, Result};
use crate::media::{ManifestProvider, Video};
use crate::progress::{ProgressManager, ProgressOperation, ProgressSink, DOWNLOAD_WEIGHT};
use crate::transfer::{Tagger, Transfer, TransferRequest};

use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A request to download one video to one path.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// The video to download.
    pub video: Video,
    /// Destination file. Must already exist as a placeholder.
    pub path: PathBuf,
    /// Requested container/codec identifier, e.g. `mp4` or `mp3`.
    pub format: String,
    /// Pre-selected option. Resolved from the manifest when absent.
    pub option: Option<DownloadOption>,
}

impl DownloadRequest {
    /// Creates a request that resolves its option when it runs.
    pub fn new(video: Video, path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            video,
            path: path.into(),
            format: format.into(),
            option: None,
        }
    }

    /// Creates a request for a pre-selected option, in that option's format.
    pub fn with_option(video: Video, path: impl Into<PathBuf>, option: DownloadOption) -> Self {
        Self {
            video,
            path: path.into(),
            format: option.format().to_string(),
            option: Some(option),
        }
    }
}

/// Collaborators shared by every task of a coordinator.
pub struct TaskContext {
    pub(crate) config: CoordinatorConfig,
    pub(crate) selector: OptionSelector,
    pub(crate) gate: Arc<AdmissionGate>,
    pub(crate) manifests: Arc<dyn ManifestProvider>,
    pub(crate) transfer: Arc<dyn Transfer>,
    pub(crate) tagger: Arc<dyn Tagger>,
    pub(crate) progress: ProgressManager,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct RunState {
    state: TaskState,
    stage: Option<TaskStage>,
    progress: f64,
    fail_reason: Option<String>,
    option: Option<DownloadOption>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

struct TaskInner {
    video: Video,
    path: PathBuf,
    format: String,
    context: Arc<TaskContext>,
    run: Mutex<RunState>,
    state_tx: watch::Sender<TaskState>,
}

/// Handle to one download.
///
/// Cloning the handle is cheap; clones refer to the same task and compare
/// equal.
#[derive(Clone)]
pub struct DownloadTask {
    inner: Arc<TaskInner>,
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("video", &self.inner.video.id)
            .field("path", &self.inner.path)
            .field("format", &self.inner.format)
            .field("state", &self.state())
            .finish()
    }
}

impl PartialEq for DownloadTask {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DownloadTask {}

impl DownloadTask {
    pub(crate) fn new(request: DownloadRequest, context: Arc<TaskContext>) -> Self {
        let (state_tx, _) = watch::channel(TaskState::Idle);
        Self {
            inner: Arc::new(TaskInner {
                video: request.video,
                path: request.path,
                format: request.format,
                context,
                run: Mutex::new(RunState {
                    option: request.option,
                    ..RunState::default()
                }),
                state_tx,
            }),
        }
    }

    /// Get the video.
    pub fn video(&self) -> &Video {
        &self.inner.video
    }

    /// Get the destination path.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Get the requested format.
    pub fn format(&self) -> &str {
        &self.inner.format
    }

    /// Get the chosen option, once assigned or resolved.
    pub fn option(&self) -> Option<DownloadOption> {
        self.inner.run.lock().option.clone()
    }

    /// Get the current state.
    pub fn state(&self) -> TaskState {
        self.inner.run.lock().state
    }

    /// Get the current stage. `None` unless running.
    pub fn stage(&self) -> Option<TaskStage> {
        self.inner.run.lock().stage
    }

    /// Get the completed fraction of the current run.
    pub fn progress(&self) -> f64 {
        self.inner.run.lock().progress
    }

    /// Get the failure message of the last run.
    pub fn fail_reason(&self) -> Option<String> {
        self.inner.run.lock().fail_reason.clone()
    }

    /// Returns `true` while the task is running.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Take an immutable view of the task.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.inner.snapshot()
    }

    /// Start a new run.
    ///
    /// Only allowed from `Idle` or a terminal state; returns `false` while
    /// the task is running. Must be called within a Tokio runtime.
    pub fn start(&self) -> bool {
        let (cancel, generation, snapshot) = {
            let mut run = self.inner.run.lock();
            if run.state.is_running() {
                return false;
            }
            let cancel = CancellationToken::new();
            run.state = TaskState::Running;
            run.stage = Some(TaskStage::Queued);
            run.progress = 0.0;
            run.fail_reason = None;
            run.cancel = Some(cancel.clone());
            run.handle = None;
            run.generation += 1;
            self.inner.state_tx.send_replace(run.state);
            (cancel, run.generation, self.inner.snapshot_of(&run))
        };

        info!("Starting download of {} to {:?}", self.inner.video, self.inner.path);
        self.inner.notify(&snapshot);

        let operation = self.inner.context.progress.create_operation(DOWNLOAD_WEIGHT);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let guard = Settlement {
                task: inner.clone(),
                cancel: cancel.clone(),
                settled: false,
            };
            let result = inner.execute(&cancel, &operation).await;
            drop(operation);
            guard.settle(result);
        });

        let mut run = self.inner.run.lock();
        if run.generation == generation && run.state.is_running() {
            run.handle = Some(handle);
        }
        true
    }

    /// Request cancellation of the current run.
    ///
    /// Does nothing unless the task is running, so calling it repeatedly is
    /// harmless. The task settles as `Canceled` once the pipeline notices.
    pub fn cancel(&self) {
        let token = {
            let run = self.inner.run.lock();
            if !run.state.is_running() {
                return;
            }
            run.cancel.clone()
        };
        if let Some(token) = token {
            debug!("Cancelling download to {:?}", self.inner.path);
            token.cancel();
        }
    }

    /// Start again after the task ended.
    ///
    /// Returns `false` and does nothing while the task is `Idle` or running.
    /// A previously resolved option is reused.
    pub fn restart(&self) -> bool {
        if !self.state().is_terminal() {
            return false;
        }
        self.start()
    }

    /// Wait until the current run settles and return the resulting state.
    ///
    /// Returns immediately when the task is not running.
    pub async fn wait(&self) -> TaskState {
        let mut rx = self.inner.state_tx.subscribe();
        let settled = match rx.wait_for(|state| !state.is_running()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        settled
    }

    /// Take the run handle so it can be joined or aborted.
    pub(crate) fn take_handle(&self) -> Option<JoinHandle<()>> {
        self.inner.run.lock().handle.take()
    }
}

impl TaskInner {
    fn snapshot(&self) -> TaskSnapshot {
        self.snapshot_of(&self.run.lock())
    }

    fn snapshot_of(&self, run: &RunState) -> TaskSnapshot {
        TaskSnapshot {
            video: self.video.clone(),
            path: self.path.clone(),
            format: self.format.clone(),
            option: run.option.clone(),
            state: run.state,
            stage: run.stage,
            progress: run.progress,
            fail_reason: run.fail_reason.clone(),
        }
    }

    /// Hand a transition to the observer. Called without the run lock.
    fn notify(&self, snapshot: &TaskSnapshot) {
        if let Some(callback) = &self.context.config.on_state_change {
            callback(snapshot);
        }
    }

    fn set_stage(&self, stage: TaskStage) {
        let snapshot = {
            let mut run = self.run.lock();
            if !run.state.is_running() {
                return;
            }
            run.stage = Some(stage);
            self.snapshot_of(&run)
        };
        debug!("Download to {:?} is {}", self.path, stage);
        self.notify(&snapshot);
    }

    fn set_progress(&self, fraction: f64) {
        let mut run = self.run.lock();
        if run.state.is_running() {
            run.progress = fraction;
        }
    }

    async fn execute(
        self: &Arc<Self>,
        cancel: &CancellationToken,
        operation: &ProgressOperation,
    ) -> Result<()> {
        let context = &self.context;
        let settings = &*context.config.settings;

        let _permit = context.gate.acquire(settings, cancel).await?;

        let assigned = self.run.lock().option.clone();
        let option = match assigned {
            Some(option) => option,
            None => {
                self.set_stage(TaskStage::Resolving);
                self.resolve(cancel).await?
            }
        };

        self.set_stage(TaskStage::Transferring);
        let request = TransferRequest {
            video: self.video.clone(),
            option,
            path: self.path.clone(),
            format: self.format.clone(),
            preset: context.config.quality_preset,
        };
        let sink = TaskSink {
            task: &**self,
            operation,
        };
        // Collaborators observe `cancel` themselves and clean up before returning.
        context.transfer.run(&request, &sink, cancel).await?;

        if settings.should_inject_tags() {
            self.set_stage(TaskStage::Tagging);
            context
                .tagger
                .inject(&self.video, &self.format, &self.path, cancel)
                .await?;
        }

        Ok(())
    }

    async fn resolve(&self, cancel: &CancellationToken) -> Result<DownloadOption> {
        let manifest = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            manifest = self.context.manifests.get_manifest(&self.video.id) => manifest?,
        };

        let options = self.context.selector.download_options(&manifest);
        let option = options
            .find_by_format(&self.format)
            .cloned()
            .ok_or_else(|| Error::NoMatchingOption {
                format: self.format.clone(),
            })?;

        debug!("Resolved {} to option {}", self.video.id, option);
        self.run.lock().option = Some(option.clone());
        Ok(option)
    }

    fn settle(&self, result: Result<()>, cancel: &CancellationToken) {
        let snapshot = {
            let mut run = self.run.lock();
            match result {
                Ok(()) => {
                    run.state = TaskState::Succeeded;
                    run.progress = 1.0;
                }
                Err(e) if e.is_cancelled() || cancel.is_cancelled() => {
                    run.state = TaskState::Canceled;
                }
                Err(e) => {
                    run.state = TaskState::Failed;
                    run.fail_reason = Some(e.to_string());
                }
            }
            run.stage = None;
            run.cancel = None;
            self.state_tx.send_replace(run.state);
            self.snapshot_of(&run)
        };

        match &snapshot.fail_reason {
            Some(reason) => warn!("Download of {} to {:?} failed: {}", self.video, self.path, reason),
            None => info!("Download of {} to {:?} {}", self.video, self.path, snapshot.state),
        }
        self.notify(&snapshot);
    }
}

/// Settles the run exactly once, as `Canceled` if the pipeline is dropped
/// before it finishes.
struct Settlement {
    task: Arc<TaskInner>,
    cancel: CancellationToken,
    settled: bool,
}

impl Settlement {
    fn settle(mut self, result: Result<()>) {
        self.settled = true;
        self.task.settle(result, &self.cancel);
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        if !self.settled {
            self.task.settle(Err(Error::Cancelled), &self.cancel);
        }
    }
}

/// Feeds transfer progress to both the task and its aggregator operation.
struct TaskSink<'a> {
    task: &'a TaskInner,
    operation: &'a ProgressOperation,
}

impl ProgressSink for TaskSink<'_> {
    fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.task.set_progress(fraction);
        self.operation.report(fraction);
    }
}
