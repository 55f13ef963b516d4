//! Byte stream to protocol line framing.
//!
//! Reads arrive in arbitrary chunks: a chunk may hold several lines, part of a
//! line, or end in the middle of a multi-byte character. The framer buffers
//! raw bytes and only decodes a line once its `\n` has arrived.

use bytes::{Buf, BytesMut};
use tracing::warn;

/// Longest accepted line in bytes, terminator included.
pub const MAX_LINE_LEN: usize = 8191;

pub struct Framer {
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to hold no `\n`.
    scanned: usize,
    /// Set while skipping the rest of a line that outgrew the limit.
    discarding: bool,
    max_line_len: usize,
}

impl Framer {
    pub fn new() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            scanned: 0,
            discarding: false,
            max_line_len,
        }
    }

    /// Append `chunk` and return every line it completed, in order, with the
    /// `\n` and an optional preceding `\r` stripped. An unterminated tail
    /// stays buffered for the next call. Lines longer than the limit are
    /// dropped with a warning.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        loop {
            let found = self.buffer[self.scanned..].iter().position(|&b| b == b'\n');
            let Some(offset) = found else {
                self.scanned = self.buffer.len();
                if self.buffer.len() > self.max_line_len {
                    if !self.discarding {
                        warn!(limit = self.max_line_len, "Dropping oversized line");
                    }
                    self.discarding = true;
                    self.buffer.clear();
                    self.scanned = 0;
                }
                break;
            };

            let pos = self.scanned + offset;
            let raw = self.buffer.split_to(pos + 1);
            self.scanned = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if raw.len() > self.max_line_len {
                warn!(len = raw.len(), limit = self.max_line_len, "Dropping oversized line");
                continue;
            }

            let mut line = &raw[..pos];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        lines
    }

    /// Bytes held back waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = false;
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
