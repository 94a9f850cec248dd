// SPDX-License-Identifier: MIT
//
// POSIX console writer — VT100 bytes straight to a file descriptor.
//
// Flush is a single pass over the buffer with an offset cursor. Each
// `write(2)` may take fewer bytes than offered (pipes, slow ptys, signals
// landing mid-call); the loop just advances the offset and offers the
// rest. Interruption-class failures are retried a bounded number of
// times per flush. Everything else ends the flush at once.
//
// A failed flush never touches the buffer. The terminal may already have
// received a prefix of it, but the writer cannot take those bytes back,
// so it leaves the decision (resend the frame or drop it) to the caller.
#![allow(unsafe_code)]

use std::io;

use crate::error::FlushError;
use crate::output::VtBuffer;
use crate::retry::RetryPolicy;
use crate::scroll::Index;
use crate::writer::ConsoleWriter;

// ─── Targets ─────────────────────────────────────────────────────────────────

/// Somewhere bytes can be written one system call at a time.
///
/// Unlike [`io::Write::write_all`], an implementation must make exactly one
/// attempt per call and report how many bytes it took. The writer owns the
/// resume and retry logic.
pub trait RawTarget {
    /// Write a prefix of `buf`, returning its length.
    ///
    /// # Errors
    ///
    /// Returns the OS error for a failed attempt.
    fn write_once(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// A raw file descriptor, written with `libc::write`.
///
/// The descriptor is borrowed, not owned: dropping the target does not
/// close it.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdTarget {
    fd: libc::c_int,
}

#[cfg(unix)]
impl FdTarget {
    /// Wrap an already-open descriptor.
    #[must_use]
    pub const fn new(fd: libc::c_int) -> Self {
        Self { fd }
    }

    /// Standard output (fd 1).
    #[must_use]
    pub const fn stdout() -> Self {
        Self::new(libc::STDOUT_FILENO)
    }

    /// Standard error (fd 2).
    #[must_use]
    pub const fn stderr() -> Self {
        Self::new(libc::STDERR_FILENO)
    }

    /// The wrapped descriptor.
    #[must_use]
    pub const fn fd(self) -> libc::c_int {
        self.fd
    }
}

#[cfg(unix)]
impl RawTarget for FdTarget {
    fn write_once(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: `buf` is a live slice for the duration of the call and
        // `write` reads at most `buf.len()` bytes from it.
        let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }
}

// ─── PosixWriter ─────────────────────────────────────────────────────────────

/// Console writer for POSIX terminals.
///
/// Scroll-down is VT100 Index (`ESC D`); the column argument is ignored.
#[derive(Debug)]
pub struct PosixWriter<T> {
    buffer: VtBuffer<Index>,
    target: T,
    retry: RetryPolicy,
}

impl<T: RawTarget> PosixWriter<T> {
    /// A writer over `target` with the default retry policy.
    #[must_use]
    pub fn new(target: T) -> Self {
        Self::with_retry(target, RetryPolicy::default())
    }

    /// A writer over `target` with a custom retry policy.
    #[must_use]
    pub fn with_retry(target: T, retry: RetryPolicy) -> Self {
        Self {
            buffer: VtBuffer::new(),
            target,
            retry,
        }
    }

    /// The pending, not yet flushed, bytes.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &VtBuffer<Index> {
        &self.buffer
    }

    /// The target the writer flushes to.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// The active retry policy.
    #[inline]
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl<T: RawTarget> ConsoleWriter for PosixWriter<T> {
    fn write_raw(&mut self, data: &[u8]) {
        self.buffer.write_raw(data);
    }

    fn write_text(&mut self, text: &str) {
        self.buffer.write_text(text);
    }

    fn flush(&mut self) -> Result<(), FlushError> {
        let bytes = self.buffer.as_bytes();
        let mut offset = 0;
        let mut failures = 0u32;

        while offset < bytes.len() {
            let remaining = &bytes[offset..];
            match self.target.write_once(remaining) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => offset += n.min(remaining.len()),
                Err(err) if RetryPolicy::is_retryable(err.kind()) => {
                    failures += 1;
                    if failures > self.retry.max_retries {
                        return Err(FlushError::RetriesExhausted {
                            attempts: failures,
                            source: err,
                        });
                    }
                    self.retry.pause();
                }
                Err(err) => return Err(FlushError::Io(err)),
            }
        }

        self.buffer.clear();
        Ok(())
    }

    fn scroll_up(&mut self) {
        self.buffer.scroll_up();
    }

    fn scroll_down(&mut self, column: i32) {
        self.buffer.scroll_down(column);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
