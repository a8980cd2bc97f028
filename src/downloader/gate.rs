//! Bounded-concurrency admission with a live capacity.
//!
//! The [`AdmissionGate`] counts admitted downloads. A caller is admitted once
//! the count is below the capacity read from a [`CapacityProvider`] at that
//! very evaluation, so a capacity change takes effect on the next decision.
//! Lowering the capacity never evicts holders; it only delays new
//! admissions until enough permits are dropped.
//!
//! Waiters park on a [`Notify`] and are woken whenever a permit is released,
//! when [`AdmissionGate::capacity_changed`] is called, or when the provider's
//! own [change notifier](CapacityProvider::change_notifier) fires. No lock is
//! held while waiting. Admission order is not FIFO.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vidqueue::downloader::AdmissionGate;
//!
//! # #[tokio::main]
//! # async fn main() -> vidqueue::Result<()> {
//! let gate = Arc::new(AdmissionGate::new());
//! let cancel = CancellationToken::new();
//!
//! let permit = gate.acquire(&1usize, &cancel).await?;
//! assert_eq!(gate.admitted(), 1);
//! assert!(gate.try_acquire(&1usize).is_none());
//!
//! drop(permit);
//! assert_eq!(gate.admitted(), 0);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Source of the maximum number of concurrent admissions.
///
/// Read on every evaluation, never cached.
pub trait CapacityProvider: Send + Sync {
    /// Current capacity.
    fn capacity(&self) -> usize;

    /// Notified whenever the capacity changes, so waiters re-evaluate.
    ///
    /// Providers without one rely on releases and
    /// [`AdmissionGate::capacity_changed`].
    fn change_notifier(&self) -> Option<&Notify> {
        None
    }
}

impl CapacityProvider for usize {
    fn capacity(&self) -> usize {
        *self
    }
}

impl CapacityProvider for AtomicUsize {
    fn capacity(&self) -> usize {
        self.load(Ordering::SeqCst)
    }
}

impl<T: CapacityProvider + ?Sized> CapacityProvider for Arc<T> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn change_notifier(&self) -> Option<&Notify> {
        (**self).change_notifier()
    }
}

/// Counts admitted downloads against a live capacity.
#[derive(Default)]
pub struct AdmissionGate {
    admitted: Mutex<usize>,
    wake: Notify,
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("admitted", &self.admitted())
            .finish()
    }
}

impl AdmissionGate {
    /// Creates a gate with nobody admitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently admitted holders.
    pub fn admitted(&self) -> usize {
        *self.admitted.lock()
    }

    /// Wait until admitted or until `cancel` fires.
    ///
    /// Returns [`Error::Cancelled`] without touching the count if the token
    /// fires first. The returned permit releases the slot when dropped.
    pub async fn acquire(
        self: &Arc<Self>,
        capacity: &dyn CapacityProvider,
        cancel: &CancellationToken,
    ) -> Result<AdmissionPermit> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            // Register for wake-ups before checking so a release or a
            // capacity change between the check and the wait is not lost.
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let changed = capacity.change_notifier().map(Notify::notified);
            tokio::pin!(changed);
            if let Some(changed) = changed.as_mut().as_pin_mut() {
                changed.enable();
            }

            if let Some(permit) = self.try_acquire(capacity) {
                return Ok(permit);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = &mut notified => {}
                _ = async {
                    match changed.as_mut().as_pin_mut() {
                        Some(changed) => changed.await,
                        None => std::future::pending().await,
                    }
                } => {}
            }
        }
    }

    /// Admit immediately if a slot is free.
    pub fn try_acquire(self: &Arc<Self>, capacity: &dyn CapacityProvider) -> Option<AdmissionPermit> {
        let mut admitted = self.admitted.lock();
        let limit = capacity.capacity();
        if *admitted >= limit {
            return None;
        }
        *admitted += 1;
        debug!("Admitted download ({}/{})", *admitted, limit);
        Some(AdmissionPermit { gate: self.clone() })
    }

    /// Wake every waiter so it re-reads the capacity.
    pub fn capacity_changed(&self) {
        self.wake.notify_waiters();
    }

    fn release(&self) {
        {
            let mut admitted = self.admitted.lock();
            debug_assert!(*admitted > 0, "admission gate released more than acquired");
            *admitted = admitted.saturating_sub(1);
            debug!("Released download slot ({} admitted)", *admitted);
        }
        self.wake.notify_waiters();
    }
}

/// Proof of admission. Dropping it frees the slot exactly once.
#[must_use = "dropping the permit releases the slot immediately"]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPermit").finish_non_exhaustive()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
