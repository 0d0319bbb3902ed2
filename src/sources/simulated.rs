//! Simulated telemetry link
//!
//! Emits CSV telemetry lines at a fixed pace, the way a sensor board on the
//! other end of a serial cable would. Useful for demos and for exercising the
//! pipeline without hardware. Optionally corrupts a fraction of the lines so
//! the rejection path sees traffic too.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::source::ByteSource;

/// Default pause between generated lines.
pub const DEFAULT_LINE_INTERVAL: Duration = Duration::from_millis(500);

/// Simulated sensor link producing well-formed (and optionally corrupt) lines.
pub struct SimulatedLink {
    rng: StdRng,

    /// Line pacing
    interval: Interval,

    /// Encoded line not yet handed out
    pending: Vec<u8>,
    pending_pos: usize,

    /// Probability in [0, 1] that a line is corrupted
    fault_rate: f64,

    lines_generated: u64,
}

impl SimulatedLink {
    /// Create a link emitting one line per `line_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(line_interval: Duration, seed: u64) -> Self {
        let mut interval = interval(line_interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(?line_interval, seed, "Simulated link created");

        Self {
            rng: StdRng::seed_from_u64(seed),
            interval,
            pending: Vec::with_capacity(64),
            pending_pos: 0,
            fault_rate: 0.0,
            lines_generated: 0,
        }
    }

    /// Corrupt roughly `rate` of the generated lines.
    pub fn with_fault_rate(mut self, rate: f64) -> Self {
        self.fault_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    /// Lines generated so far.
    pub fn lines_generated(&self) -> u64 {
        self.lines_generated
    }

    fn generate_line(&mut self) {
        let altitude = 10_000.0 + self.rng.random::<f64>() * 100.0;
        let velocity = 250.0 + self.rng.random::<f64>() * 10.0;
        let pitch = self.rng.random::<f64>() * 2.0 - 1.0;
        let roll = self.rng.random::<f64>() * 2.0 - 1.0;

        self.pending.clear();
        self.pending_pos = 0;

        let line = if self.fault_rate > 0.0 && self.rng.random_bool(self.fault_rate) {
            match self.rng.random_range(0..3) {
                0 => format!("{altitude:.2},{velocity:.2},NaN,{roll:.3}\r\n"),
                1 => format!("{altitude:.2},{velocity:.2},{pitch:.3},{roll:.3},EXTRA\r\n"),
                _ => "\u{1b}[2J#noise#\r\n".to_string(),
            }
        } else {
            format!("{altitude:.2},{velocity:.2},{pitch:.3},{roll:.3}\r\n")
        };

        self.pending.extend_from_slice(line.as_bytes());
        self.lines_generated += 1;
        trace!(line = self.lines_generated, "Generated simulated line");
    }
}

#[async_trait::async_trait]
impl ByteSource for SimulatedLink {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pending_pos >= self.pending.len() {
            self.interval.tick().await;
            self.generate_line();
        }

        let available = &self.pending[self.pending_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        Ok(n)
    }
}
