//! Bounded line accumulator for the serial link.
//!
//! Bytes are appended to a fixed-capacity buffer until the `\n`
//! terminator arrives.  Once the buffer is full, further bytes are dropped
//! until the terminator; the truncated content is still emitted as a line
//! so the decoder can decide what it is worth.  Nothing is ever written past
//! the capacity.

use std::borrow::Cow;

use log::warn;

/// Line terminator on the serial link.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Maximum line length before truncation.
pub const LINE_CAPACITY: usize = 127;

/// A complete, terminator-stripped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<const N: usize = LINE_CAPACITY> {
    bytes: heapless::Vec<u8, N>,
    truncated: bool,
}

impl<const N: usize> Line<N> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Line content as text.  Invalid UTF-8 is replaced, never rejected.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether bytes were dropped because the buffer filled up.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Streaming line accumulator.
pub struct LineAccumulator<const N: usize = LINE_CAPACITY> {
    buf: heapless::Vec<u8, N>,
    /// Set once the current line has lost a byte.
    overflowed: bool,
    /// Total bytes dropped since construction.
    dropped: u32,
}

impl<const N: usize> Default for LineAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineAccumulator<N> {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
            dropped: 0,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some(line)` when `byte` is the terminator.  The buffer is
    /// cleared afterwards.
    pub fn feed(&mut self, byte: u8) -> Option<Line<N>> {
        if byte == LINE_TERMINATOR {
            let line = Line {
                bytes: core::mem::take(&mut self.buf),
                truncated: self.overflowed,
            };
            self.overflowed = false;
            return Some(line);
        }

        if self.buf.push(byte).is_err() {
            if !self.overflowed {
                warn!("LineAccumulator: buffer overflow at {} bytes, dropping until terminator", N);
                self.overflowed = true;
            }
            self.dropped = self.dropped.saturating_add(1);
        }
        None
    }

    /// Feed a slice, invoking `on_line` for every completed line in order.
    pub fn feed_slice(&mut self, data: &[u8], mut on_line: impl FnMut(Line<N>)) {
        for &byte in data {
            if let Some(line) = self.feed(byte) {
                on_line(line);
            }
        }
    }

    /// Discard any partial line (e.g. after the link was reopened).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether the current partial line has already lost bytes.
    pub fn is_overflowing(&self) -> bool {
        self.overflowed
    }

    /// Total bytes dropped to overflow since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
