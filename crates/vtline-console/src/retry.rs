// SPDX-License-Identifier: MIT
//
// Retry policy for the POSIX flush loop.
//
// A write to a terminal fd can be cut short by a signal (EINTR) or, on a
// non-blocking fd, bounce with EAGAIN. Both clear up on their own, so the
// flush loop tries again a bounded number of times. Anything else (EPIPE,
// EBADF, EIO) means the other end is gone, and retrying only delays the
// error, so it surfaces on the first failure.

use std::io;
use std::time::Duration;

/// How the POSIX writer retries failed writes within one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed per flush after the first failure. Default: 3,
    /// so a target that always fails sees 4 write calls.
    pub max_retries: u32,

    /// Pause before each retry. Default: zero (retry immediately).
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const NONE: Self = Self {
        max_retries: 0,
        backoff: Duration::ZERO,
    };

    /// Whether an error of this kind is worth another attempt.
    #[must_use]
    pub const fn is_retryable(kind: io::ErrorKind) -> bool {
        matches!(kind, io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
    }

    /// Sleep for the configured backoff, if any.
    pub(crate) fn pause(&self) {
        if !self.backoff.is_zero() {
            std::thread::sleep(self.backoff);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_three_retries_no_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff, Duration::ZERO);
    }

    #[test]
    fn interruption_class_is_retryable() {
        assert!(RetryPolicy::is_retryable(io::ErrorKind::Interrupted));
        assert!(RetryPolicy::is_retryable(io::ErrorKind::WouldBlock));
    }

    #[test]
    fn closed_class_is_not_retryable() {
        assert!(!RetryPolicy::is_retryable(io::ErrorKind::BrokenPipe));
        assert!(!RetryPolicy::is_retryable(io::ErrorKind::WriteZero));
        assert!(!RetryPolicy::is_retryable(io::ErrorKind::Other));
    }

    #[test]
    fn none_policy() {
        assert_eq!(RetryPolicy::NONE.max_retries, 0);
    }
}
