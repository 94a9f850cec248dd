// SPDX-License-Identifier: MIT
//
// Legacy console writer — VT100 bytes through a translating stream.
//
// The Windows console only understands VT sequences once virtual-terminal
// processing is switched on for the handle, and even then it has no Index
// (ESC D). So this writer pairs the cursor-forward scroll encoding with a
// stream that does the translation, and flushes in one attempt. Short
// writes are resumed, but the first failed write ends the flush, even an
// interrupted one: a console handle that failed once is not going to
// recover on an immediate retry.

use std::io::{self, Write};

use crate::error::FlushError;
use crate::output::VtBuffer;
use crate::scroll::CursorForward;
use crate::writer::ConsoleWriter;

// ─── ConsoleStream ───────────────────────────────────────────────────────────

/// Standard output or standard error as a VT-capable stream.
#[derive(Debug)]
pub enum ConsoleStream {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
}

impl ConsoleStream {
    /// Standard output, with VT processing enabled where the OS needs it.
    #[must_use]
    pub fn stdout() -> Self {
        enable_vt_processing();
        Self::Stdout(io::stdout())
    }

    /// Standard error, with VT processing enabled where the OS needs it.
    #[must_use]
    pub fn stderr() -> Self {
        enable_vt_processing();
        Self::Stderr(io::stderr())
    }
}

impl Write for ConsoleStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(out) => out.write(buf),
            Self::Stderr(err) => err.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.lock().write_all(buf),
            Self::Stderr(err) => err.lock().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::Stderr(err) => err.flush(),
        }
    }
}

/// Turn on `ENABLE_VIRTUAL_TERMINAL_PROCESSING` for the console.
///
/// Best effort: on a console that refuses (very old Windows, redirected
/// output) the bytes still go out, they just are not interpreted.
#[cfg(windows)]
fn enable_vt_processing() {
    if let Err(code) = enable_ansi_support::enable_ansi_support() {
        tracing::debug!(code, "console refused virtual terminal processing");
    }
}

#[cfg(not(windows))]
const fn enable_vt_processing() {
    // Terminals outside Windows interpret VT sequences natively.
}

// ─── LegacyConsoleWriter ─────────────────────────────────────────────────────

/// Console writer for legacy consoles.
///
/// Scroll-down is a line feed plus cursor-forward to the given column.
#[derive(Debug)]
pub struct LegacyConsoleWriter<W> {
    buffer: VtBuffer<CursorForward>,
    out: W,
}

impl<W: Write> LegacyConsoleWriter<W> {
    /// A writer over `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            buffer: VtBuffer::new(),
            out,
        }
    }

    /// The pending, not yet flushed, bytes.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &VtBuffer<CursorForward> {
        &self.buffer
    }

    /// The stream the writer flushes to.
    #[inline]
    #[must_use]
    pub const fn stream(&self) -> &W {
        &self.out
    }

    /// Give back the stream, dropping any unflushed bytes.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ConsoleWriter for LegacyConsoleWriter<W> {
    fn write_raw(&mut self, data: &[u8]) {
        self.buffer.write_raw(data);
    }

    fn write_text(&mut self, text: &str) {
        self.buffer.write_text(text);
    }

    fn flush(&mut self) -> Result<(), FlushError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let bytes = self.buffer.as_bytes();
        let mut offset = 0;
        while offset < bytes.len() {
            match self.out.write(&bytes[offset..])? {
                0 => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                n => offset += n.min(bytes.len() - offset),
            }
        }
        self.out.flush()?;
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
