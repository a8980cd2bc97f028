//! Weighted aggregation of progress across concurrent operations.
//!
//! Each running download registers a [`ProgressOperation`] with a
//! [`ProgressManager`]. The overall progress is the weighted mean of every
//! registered operation's completed fraction.
//!
//! Dropping an operation marks it completed. A completed operation keeps its
//! weight and last reported value in the mean until every registered
//! operation has completed; then the manager forgets all of them. The
//! overall value is therefore not monotonic: registering a new operation can
//! lower it.
//!
//! # Examples
//!
//! ```rust
//! use vidqueue::progress::{ProgressManager, DOWNLOAD_WEIGHT};
//!
//! let manager = ProgressManager::new();
//! let a = manager.create_operation(DOWNLOAD_WEIGHT);
//! let b = manager.create_operation(DOWNLOAD_WEIGHT);
//!
//! a.report(1.0);
//! b.report(0.5);
//! assert_eq!(manager.progress(), 0.75);
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

/// Weight of one download.
pub const DOWNLOAD_WEIGHT: f64 = 1.0;

/// Weight of auxiliary work such as resolving a query.
pub const QUERY_WEIGHT: f64 = 0.01;

/// Receives fractional progress in `[0, 1]` from long-running work.
pub trait ProgressSink: Send + Sync {
    /// Report the completed fraction.
    fn report(&self, fraction: f64);
}

/// A sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _fraction: f64) {}
}

#[derive(Debug)]
struct Entry {
    id: u64,
    weight: f64,
    progress: f64,
    completed: bool,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn entry_mut(&mut self, id: u64) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

/// Tracks registered operations and computes the overall progress.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct ProgressManager {
    registry: Arc<Mutex<Registry>>,
}

impl ProgressManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation contributing `weight` to the mean.
    ///
    /// Non-finite or negative weights count as zero.
    pub fn create_operation(&self, weight: f64) -> ProgressOperation {
        let weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        };

        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            weight,
            progress: 0.0,
            completed: false,
        });

        ProgressOperation {
            id,
            weight,
            registry: self.registry.clone(),
        }
    }

    /// Overall progress in `[0, 1]`; `0` when nothing is registered.
    pub fn progress(&self) -> f64 {
        let registry = self.registry.lock();
        let total: f64 = registry.entries.iter().map(|e| e.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let done: f64 = registry
            .entries
            .iter()
            .map(|e| e.weight * e.progress)
            .sum();
        (done / total).clamp(0.0, 1.0)
    }

    /// Returns `true` while at least one operation has not completed.
    pub fn is_active(&self) -> bool {
        self.registry.lock().entries.iter().any(|e| !e.completed)
    }

    /// Number of operations currently counted in the mean.
    pub fn operation_count(&self) -> usize {
        self.registry.lock().entries.len()
    }
}

/// One registered contribution to a [`ProgressManager`].
///
/// Dropping the operation marks it completed.
#[derive(Debug)]
pub struct ProgressOperation {
    id: u64,
    weight: f64,
    registry: Arc<Mutex<Registry>>,
}

impl ProgressOperation {
    /// Report the completed fraction, clamped to `[0, 1]`. `NaN` is ignored.
    pub fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.entry_mut(self.id) {
            entry.progress = fraction.clamp(0.0, 1.0);
        }
    }

    /// Last reported fraction.
    pub fn progress(&self) -> f64 {
        let mut registry = self.registry.lock();
        registry.entry_mut(self.id).map(|e| e.progress).unwrap_or(0.0)
    }

    /// Weight of this operation.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl ProgressSink for ProgressOperation {
    fn report(&self, fraction: f64) {
        ProgressOperation::report(self, fraction);
    }
}

impl Drop for ProgressOperation {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.entry_mut(self.id) {
            entry.completed = true;
        }
        if registry.entries.iter().all(|e| e.completed) {
            registry.entries.clear();
        }
    }
}
