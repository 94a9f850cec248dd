// SPDX-License-Identifier: MIT
//
// Scroll sequence encoding.
//
// Two scroll primitives, one of which diverges by platform:
//
//   Reverse Index (ESC M) scrolls up one line and works everywhere.
//
//   Index (ESC D) scrolls down one line on VT100 terminals, but the
//   legacy Windows console does not implement it. There we emit a line
//   feed followed by CUF (ESC [ n C) to walk the cursor back out to the
//   column it was on. Different bytes, same picture.
//
// The divergence is a zero-sized type parameter on `VtBuffer`, so each
// build carries exactly one encoding and the choice never reaches a
// runtime branch.

/// The escape byte.
pub const ESC: u8 = 0x1b;

/// Reverse Index: scroll up one line.
pub const REVERSE_INDEX: &[u8] = &[ESC, b'M'];

/// Index: scroll down one line (VT100).
pub const INDEX: &[u8] = &[ESC, b'D'];

/// How a platform encodes "scroll down one line".
pub trait ScrollEncoding {
    /// Append the scroll-down sequence to `out`.
    ///
    /// `column` is the cursor's current column. Encodings that can scroll
    /// without moving the cursor ignore it.
    fn scroll_down(out: &mut Vec<u8>, column: i32);
}

// ─── Index (VT100) ───────────────────────────────────────────────────────────

/// VT100 Index. Terminals scroll one line regardless of the cursor column,
/// so `column` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Index;

impl ScrollEncoding for Index {
    #[inline]
    fn scroll_down(out: &mut Vec<u8>, _column: i32) {
        out.extend_from_slice(INDEX);
    }
}

// ─── Cursor Forward (legacy console) ─────────────────────────────────────────

/// Line feed plus CUF back to `column`, for consoles without Index.
///
/// CUF treats a parameter of 0 as 1, so for `column <= 0` only the line
/// feed is emitted: the cursor is already at the left edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorForward;

impl ScrollEncoding for CursorForward {
    fn scroll_down(out: &mut Vec<u8>, column: i32) {
        out.push(b'\n');
        if column > 0 {
            out.extend_from_slice(&[ESC, b'[']);
            out.extend_from_slice(column.to_string().as_bytes());
            out.push(b'C');
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
