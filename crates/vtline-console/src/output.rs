// SPDX-License-Identifier: MIT
//
// Output buffering — the byte accumulator every console writer shares.
//
// A render frame is built up as a sequence of appends (raw escape
// sequences, user text, scroll intents) and then handed to the platform
// writer in one flush. The buffer never consumes anything itself: bytes
// stay exactly as appended, in order, until the owning writer reports a
// fully successful flush and calls `clear`.
//
// The buffer is generic over its scroll encoding. Scroll-up is the same
// two bytes everywhere, but scroll-down differs between VT100 terminals
// and the legacy console, and that choice is made by the type parameter
// rather than by a runtime flag. See `scroll.rs`.

use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;

use crate::scroll::{self, ScrollEncoding};

/// Default capacity: 4 KB. A prompt frame is a line or two of text plus a
/// handful of escape sequences, so this rarely reallocates.
const DEFAULT_CAPACITY: usize = 4096;

/// Replacement byte for `ESC` inside text appended with
/// [`write_text`](VtBuffer::write_text).
const ESC_REPLACEMENT: u8 = b'?';

// ─── VtBuffer ────────────────────────────────────────────────────────────────

/// An append-only byte buffer with scroll encoding `E`.
///
/// Bytes are appended by the caller and drained by a platform writer's
/// flush. Nothing in here reorders, deduplicates, or drops bytes.
pub struct VtBuffer<E> {
    buf: Vec<u8>,
    encoding: PhantomData<E>,
}

impl<E: ScrollEncoding> VtBuffer<E> {
    /// Create an empty buffer with default capacity (4 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
            encoding: PhantomData,
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes, oldest first.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append bytes verbatim. No escaping.
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Append text, replacing every `ESC` byte with `?`.
    ///
    /// Use this for anything the user typed or a completion source
    /// produced: it can never start a control sequence.
    pub fn write_text(&mut self, text: &str) {
        self.buf.extend(
            text.bytes()
                .map(|b| if b == scroll::ESC { ESC_REPLACEMENT } else { b }),
        );
    }

    /// Scroll the display up one line (Reverse Index).
    #[inline]
    pub fn scroll_up(&mut self) {
        self.buf.extend_from_slice(scroll::REVERSE_INDEX);
    }

    /// Scroll the display down one line using this buffer's encoding.
    #[inline]
    pub fn scroll_down(&mut self, column: i32) {
        E::scroll_down(&mut self.buf, column);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    ///
    /// Writers call this only after the whole buffer reached the target.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<E: ScrollEncoding> Write for VtBuffer<E> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op. Draining to the terminal belongs to the platform writer.
        Ok(())
    }
}

impl<E: ScrollEncoding> Default for VtBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for VtBuffer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VtBuffer")
            .field("len", &self.buf.len())
            .field("encoding", &std::any::type_name::<E>())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
