//! Registry and lifecycle control of download tasks.
//!
//! The [`Coordinator`] keeps every task in insertion order, at most one per
//! destination path. Tasks stay in the registry after they end; only an
//! explicit removal, a bulk cleanup or a newer request for the same path
//! takes them out.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidqueue::downloader::CoordinatorBuilder;
//! use vidqueue::download::DownloadRequest;
//! use vidqueue::media::{ManifestProvider, Video};
//! use vidqueue::transfer::FfmpegTransfer;
//!
//! # async fn example(manifests: Arc<impl ManifestProvider + 'static>) {
//! let coordinator = CoordinatorBuilder::new(manifests, Arc::new(FfmpegTransfer::new()))
//!     .max_concurrent_downloads(3)
//!     .build();
//!
//! let video = Video::new("dQw4w9WgXcQ", "Never Gonna Give You Up");
//! let task = coordinator.enqueue_and_start(DownloadRequest::new(video, "/tmp/video.mp4", "mp4"));
//! task.wait().await;
//!
//! coordinator.remove_successful();
//! # }
//! ```

use super::gate::AdmissionGate;
use super::config::Settings;
use crate::download::{DownloadRequest, DownloadTask, TaskContext, TaskState};
use crate::progress::ProgressManager;

use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Represents the download coordinator.
///
/// A coordinator can be created via its builder, see
/// [`CoordinatorBuilder`](super::CoordinatorBuilder). Clones share the same
/// registry.
#[derive(Clone)]
pub struct Coordinator {
    context: Arc<TaskContext>,
    tasks: Arc<Mutex<Vec<DownloadTask>>>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("context", &self.context)
            .field("tasks", &self.tasks.lock().len())
            .finish()
    }
}

impl Coordinator {
    /// Creates a new Coordinator sharing the given collaborators.
    pub(crate) fn new(context: TaskContext) -> Self {
        Self {
            context: Arc::new(context),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a task that is neither registered nor started.
    pub fn create_task(&self, request: DownloadRequest) -> DownloadTask {
        DownloadTask::new(request, self.context.clone())
    }

    /// Register a download and start it.
    ///
    /// Any task already registered for the same path is cancelled and
    /// removed first, under the same lock as the insertion, so the newest
    /// request for a path always wins.
    pub fn enqueue_and_start(&self, request: DownloadRequest) -> DownloadTask {
        let task = self.create_task(request);
        {
            let mut tasks = self.tasks.lock();
            tasks.retain(|existing| {
                if existing.path() != task.path() {
                    return true;
                }
                debug!("Evicting download to {:?}", existing.path());
                existing.cancel();
                false
            });
            tasks.push(task.clone());
        }
        task.start();
        // Evicted between the insertion and the start: the evictor saw it idle.
        if !self.tasks.lock().contains(&task) {
            task.cancel();
        }
        task
    }

    /// Cancel a task and remove it, whatever its state.
    pub fn remove(&self, task: &DownloadTask) {
        task.cancel();
        self.tasks.lock().retain(|t| t != task);
    }

    /// Remove every task that is not running.
    pub fn remove_inactive(&self) {
        self.tasks.lock().retain(|t| t.is_running());
    }

    /// Remove every task that succeeded.
    pub fn remove_successful(&self) {
        self.tasks.lock().retain(|t| t.state() != TaskState::Succeeded);
    }

    /// Restart every failed task and return how many were restarted.
    pub fn restart_failed(&self) -> usize {
        let failed: Vec<DownloadTask> = self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.state() == TaskState::Failed)
            .cloned()
            .collect();

        let restarted = failed.iter().filter(|t| t.restart()).count();
        if restarted > 0 {
            info!("Restarted {} failed downloads", restarted);
        }
        restarted
    }

    /// Cancel every task without waiting for them to settle.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().iter() {
            task.cancel();
        }
    }

    /// Cancel every task and wait up to `grace` for the runs to end.
    ///
    /// Runs still going after the grace period are aborted; they settle as
    /// `Canceled`.
    pub async fn shutdown_graceful(&self, grace: Duration) {
        let handles: Vec<_> = {
            let tasks = self.tasks.lock();
            tasks
                .iter()
                .filter_map(|task| {
                    task.cancel();
                    task.take_handle()
                })
                .collect()
        };

        let deadline = Instant::now() + grace;
        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                warn!("Download did not stop within {:?}, aborting", grace);
                handle.abort();
                let _ = handle.await;
            }
        }
    }

    /// Get a copy of the registered tasks, in insertion order.
    pub fn tasks(&self) -> Vec<DownloadTask> {
        self.tasks.lock().clone()
    }

    /// Get the task registered for `path`.
    pub fn task_at(&self, path: impl AsRef<Path>) -> Option<DownloadTask> {
        let path = path.as_ref();
        self.tasks.lock().iter().find(|t| t.path() == path).cloned()
    }

    /// Get the overall progress of every tracked operation.
    pub fn progress(&self) -> f64 {
        self.context.progress.progress()
    }

    /// Get the progress manager, e.g. to track query resolution alongside
    /// the downloads.
    pub fn progress_manager(&self) -> &ProgressManager {
        &self.context.progress
    }

    /// Returns `true` while any task is running.
    pub fn is_busy(&self) -> bool {
        self.tasks.lock().iter().any(|t| t.is_running())
    }

    /// Change the concurrency limit; waiting tasks re-check it.
    pub fn set_max_concurrent_downloads(&self, max: usize) {
        self.context.config.settings.set_max_concurrent_downloads(max);
    }

    /// Get the live settings.
    pub fn settings(&self) -> &Arc<Settings> {
        &self.context.config.settings
    }

    /// Get the admission gate.
    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.context.gate
    }
}
