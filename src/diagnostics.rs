//! Rate-limited warnings for the framing pipeline.
//!
//! A hostile or broken link can produce thousands of bad lines per second.
//! Each diagnostic class is therefore logged at most once per
//! [`DIAGNOSTIC_WINDOW`]; events inside the window are counted and the count
//! is reported with the next emission.
//!
//! The clock is never read here. Callers capture one timestamp per framing
//! pass and hand it in.

use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::Rejected;

/// Minimum spacing between two emissions of the same diagnostic class.
pub const DIAGNOSTIC_WINDOW: Duration = Duration::from_secs(1);

/// Kinds of rate-limited warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticClass {
    /// A line ran past the length limit and was discarded
    LineTooLong,
    /// A complete line did not decode into a record
    DecodeFailed,
}

/// Fixed-window limiter for one diagnostic class.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    last_emitted: Option<Instant>,
    emitted: u64,
    suppressed: u64,
    suppressed_since_emit: u64,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self { window, last_emitted: None, emitted: 0, suppressed: 0, suppressed_since_emit: 0 }
    }

    /// Record an event at `now`.
    ///
    /// Returns `Some(n)` when the event should be logged, where `n` is the
    /// number of events suppressed since the previous emission, or `None`
    /// when it falls inside the current window.
    pub fn check(&mut self, now: Instant) -> Option<u64> {
        let open = match self.last_emitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        };

        if open {
            self.last_emitted = Some(now);
            self.emitted += 1;
            Some(std::mem::take(&mut self.suppressed_since_emit))
        } else {
            self.suppressed += 1;
            self.suppressed_since_emit += 1;
            None
        }
    }

    /// Total events that were logged.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Total events swallowed by the window.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DIAGNOSTIC_WINDOW)
    }
}

/// Per-class limiters owned by a single framer.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    line_too_long: RateLimiter,
    decode_failed: RateLimiter,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an oversized line. Only the length is logged.
    pub fn line_too_long(&mut self, consumed: usize, limit: usize, now: Instant) {
        if let Some(suppressed) = self.line_too_long.check(now) {
            warn!(consumed, limit, suppressed, "Telemetry line exceeded length limit, dropped");
        }
    }

    /// Report a line that failed to decode. Only metadata is logged.
    pub fn decode_failed(&mut self, len: usize, reason: Rejected, now: Instant) {
        if let Some(suppressed) = self.decode_failed.check(now) {
            warn!(len, %reason, suppressed, "Failed to parse telemetry line");
        }
    }

    /// Limiter state for one class.
    pub fn limiter(&self, class: DiagnosticClass) -> &RateLimiter {
        match class {
            DiagnosticClass::LineTooLong => &self.line_too_long,
            DiagnosticClass::DecodeFailed => &self.decode_failed,
        }
    }
}
