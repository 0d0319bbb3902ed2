//! Line framer: turns arbitrarily split byte chunks into decoded records.
//!
//! The framer owns all per-line state (partial line buffer, byte counter and
//! discarding flag). It is driven by one task and needs no locking.
//!
//! ## Memory bound
//!
//! The line buffer never holds more than [`MAX_LINE_LEN`] bytes. A line that
//! would exceed the limit is dropped: if its terminator has not arrived yet,
//! the framer switches to *discarding* and skips bytes until it sees one, so
//! the tail of an oversized line can never be mistaken for a fresh record.
//!
//! ## Fast and buffered paths
//!
//! When a whole line sits inside one chunk, it is decoded straight from the
//! chunk. Lines spanning several chunks are assembled in the buffer first.
//! Both paths share one validation and diagnostic routine.
//!
//! ```rust
//! use aerolink::LineFramer;
//! use std::time::Instant;
//!
//! let mut framer = LineFramer::new();
//! let mut records = Vec::new();
//!
//! let chunks: [&[u8]; 2] = [b"100,200,", b"30,40\n"];
//! for chunk in chunks {
//!     let mut offset = 0;
//!     while offset < chunk.len() {
//!         let outcome = framer.process(&chunk[offset..], Instant::now(), &mut records);
//!         offset += outcome.consumed;
//!     }
//! }
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].roll(), 40.0);
//! ```

use std::time::Instant;
use tracing::trace;

use crate::decoder;
use crate::diagnostics::Diagnostics;
use crate::types::TelemetryRecord;

/// Maximum bytes per line, terminator included.
pub const MAX_LINE_LEN: usize = decoder::MAX_LINE_LEN;

/// Result of one [`LineFramer::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Bytes of the chunk handled by this call
    pub consumed: usize,

    /// The caller should pause before feeding the rest of the chunk
    pub requires_backoff: bool,
}

/// Stateful line framer.
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,

    /// Bytes consumed toward the current line, terminator included
    total_line_bytes: usize,

    /// Dropping everything up to the next terminator
    discarding: bool,

    diagnostics: Diagnostics,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            total_line_bytes: 0,
            discarding: false,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Feed bytes from a chunk.
    ///
    /// Decoded records are appended to `out` in stream order. Returns early
    /// with `requires_backoff` set after an overflow or a decode failure;
    /// the caller pauses and calls again with `&chunk[consumed..]`.
    /// `now` is the pass timestamp used for diagnostic rate limiting.
    pub fn process(&mut self, chunk: &[u8], now: Instant, out: &mut Vec<TelemetryRecord>) -> ChunkOutcome {
        let mut consumed = 0;

        while consumed < chunk.len() {
            let rest = &chunk[consumed..];
            let terminator = rest.iter().position(|&b| b == b'\n' || b == b'\r');

            if self.discarding {
                match terminator {
                    Some(idx) => {
                        consumed += idx + 1 + crlf_partner(rest, idx);
                        self.discarding = false;
                        trace!("Resynchronized after oversized line");
                        continue;
                    }
                    None => {
                        consumed = chunk.len();
                        break;
                    }
                }
            }

            let Some(idx) = terminator else {
                // Continuation: the line goes on in a later chunk.
                if self.total_line_bytes + rest.len() > MAX_LINE_LEN {
                    self.diagnostics.line_too_long(self.total_line_bytes + rest.len(), MAX_LINE_LEN, now);
                    self.reset_line();
                    self.discarding = true;
                    return ChunkOutcome { consumed: chunk.len(), requires_backoff: true };
                }

                self.buffer.extend_from_slice(rest);
                self.total_line_bytes += rest.len();
                consumed = chunk.len();
                break;
            };

            let line_end = idx + 1 + crlf_partner(rest, idx);

            if self.total_line_bytes + idx + 1 > MAX_LINE_LEN {
                self.diagnostics.line_too_long(self.total_line_bytes + idx + 1, MAX_LINE_LEN, now);
                self.reset_line();
                return ChunkOutcome { consumed: consumed + line_end, requires_backoff: true };
            }

            consumed += line_end;

            let accepted = if self.buffer.is_empty() {
                // Fast path: the whole line is inside this chunk.
                self.finish_line(&rest[..idx], now, out)
            } else {
                self.buffer.extend_from_slice(&rest[..idx]);
                let line = std::mem::take(&mut self.buffer);
                let accepted = self.finish_line(&line, now, out);
                self.buffer = line;
                accepted
            };

            self.reset_line();

            if !accepted {
                return ChunkOutcome { consumed, requires_backoff: true };
            }
        }

        ChunkOutcome { consumed, requires_backoff: false }
    }

    /// Decode a complete line. Returns `false` when the line was rejected.
    ///
    /// Empty lines are skipped silently; they appear between a `\r` and a
    /// `\n` that arrive in different chunks.
    fn finish_line(&mut self, line: &[u8], now: Instant, out: &mut Vec<TelemetryRecord>) -> bool {
        if line.is_empty() {
            return true;
        }

        match decoder::decode(line) {
            Ok(record) => {
                out.push(record);
                true
            }
            Err(reason) => {
                self.diagnostics.decode_failed(line.len(), reason, now);
                false
            }
        }
    }

    fn reset_line(&mut self) {
        self.buffer.clear();
        self.total_line_bytes = 0;
    }

    /// Drop any partial line and leave discarding mode.
    pub fn reset(&mut self) {
        self.reset_line();
        self.discarding = false;
    }

    /// Bytes of the current incomplete line held in the buffer.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the framer is skipping the rest of an oversized line.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Rate limiter state for this framer's warnings.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// 1 when the terminator at `idx` is a `\r` directly followed by `\n`.
fn crlf_partner(bytes: &[u8], idx: usize) -> usize {
    usize::from(bytes[idx] == b'\r' && bytes.get(idx + 1) == Some(&b'\n'))
}
