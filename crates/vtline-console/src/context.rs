// SPDX-License-Identifier: MIT
//
// Cooperative cancellation.
//
// A `CancelToken` is the context the render loop and the signal bridge
// share. Anyone holding a clone can cancel it; anyone can wait on it.
// Cancelling twice is the same as cancelling once, which matters because
// the bridge calls its callback for every terminal signal it sees, and a
// user mashing Ctrl-C sends several.
//
// Waiting uses a condition variable rather than polling, so a blocked
// waiter wakes the moment `cancel` runs.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    changed: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool, a panicking holder cannot corrupt it.
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cloneable, idempotent cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// A fresh, not yet cancelled, token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and wake every waiter. Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.lock();
        if !*cancelled {
            *cancelled = true;
            self.inner.changed.notify_all();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.lock()
    }

    /// Block until the token is cancelled.
    pub fn wait(&self) {
        let mut cancelled = self.inner.lock();
        while !*cancelled {
            cancelled = self
                .inner
                .changed
                .wait(cancelled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the token is cancelled or `timeout` elapses.
    ///
    /// Returns `true` if the token is cancelled. Returns immediately when
    /// it already was.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.inner.lock();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = self
                .inner
                .changed
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
