// SPDX-License-Identifier: MIT
//
// The console writer capability and its factories.
//
// A renderer talks to exactly one trait. Which concrete writer sits
// behind it is decided when the crate is compiled:
//
//   unix    → PosixWriter over the raw stdout/stderr file descriptor
//   windows → LegacyConsoleWriter over a VT-enabled console stream
//
// The `StdWriter` alias names whichever one this build carries.

use crate::error::FlushError;

/// Buffered, flushable output that speaks VT100.
///
/// Appends go into an in-memory buffer; nothing reaches the terminal
/// until [`flush`](Self::flush). Implementations are not synchronized:
/// drive one writer from a single render loop.
pub trait ConsoleWriter {
    /// Append bytes verbatim.
    fn write_raw(&mut self, data: &[u8]);

    /// Append text with `ESC` bytes neutralized.
    fn write_text(&mut self, text: &str);

    /// Drain the buffer to the terminal.
    ///
    /// On success the buffer is empty. On failure it holds exactly what it
    /// held before the call.
    ///
    /// # Errors
    ///
    /// Returns the write error that ended the flush.
    fn flush(&mut self) -> Result<(), FlushError>;

    /// Scroll the display up one line.
    fn scroll_up(&mut self);

    /// Scroll the display down one line. `column` is the cursor's current
    /// column, for platforms that have to restore it.
    fn scroll_down(&mut self, column: i32);
}

// ─── Factories ───────────────────────────────────────────────────────────────

/// The writer type this build uses for the standard streams.
#[cfg(unix)]
pub type StdWriter = crate::posix::PosixWriter<crate::posix::FdTarget>;

/// The writer type this build uses for the standard streams.
#[cfg(windows)]
pub type StdWriter = crate::legacy::LegacyConsoleWriter<crate::legacy::ConsoleStream>;

/// A writer bound to standard output.
///
/// Emits VT100 sequences: nearly every POSIX terminal emulator is built on
/// the VT100 specification.
#[cfg(unix)]
#[must_use]
pub fn new_stdout_writer() -> StdWriter {
    tracing::debug!(fd = libc::STDOUT_FILENO, "posix console writer bound");
    crate::posix::PosixWriter::new(crate::posix::FdTarget::stdout())
}

/// A writer bound to standard error.
#[cfg(unix)]
#[must_use]
pub fn new_stderr_writer() -> StdWriter {
    tracing::debug!(fd = libc::STDERR_FILENO, "posix console writer bound");
    crate::posix::PosixWriter::new(crate::posix::FdTarget::stderr())
}

/// A writer bound to standard output.
///
/// Turns on virtual-terminal processing for the console so the VT100
/// bytes are translated into console operations.
#[cfg(windows)]
#[must_use]
pub fn new_stdout_writer() -> StdWriter {
    tracing::debug!(stream = "stdout", "legacy console writer bound");
    crate::legacy::LegacyConsoleWriter::new(crate::legacy::ConsoleStream::stdout())
}

/// A writer bound to standard error.
#[cfg(windows)]
#[must_use]
pub fn new_stderr_writer() -> StdWriter {
    tracing::debug!(stream = "stderr", "legacy console writer bound");
    crate::legacy::LegacyConsoleWriter::new(crate::legacy::ConsoleStream::stderr())
}

/// Old name for [`new_stdout_writer`].
#[deprecated(note = "use `new_stdout_writer`")]
#[must_use]
pub fn new_standard_output_writer() -> StdWriter {
    new_stdout_writer()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
