//! Stream pump: drives the line framer against a live byte source.
//!
//! The pump is pull-based. Nothing happens until the consumer asks for the
//! next record; the pump then reads, frames and decodes until it has one,
//! suspending only on the source read and on deliberate pauses:
//!
//! - idle pause after a zero-byte read (the link is quiet, not closed)
//! - error pause after a transport failure, which also drops any partial line
//! - backoff pause after an oversized or undecodable line
//!
//! Cancellation is checked before every yield and interrupts reads and
//! pauses. A cancelled pump hands out nothing more, neither records already
//! decoded from the current chunk nor a partially buffered line.

use futures::Stream;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::PumpConfig;
use crate::framer::LineFramer;
use crate::sanitize::sanitize_for_log;
use crate::source::ByteSource;
use crate::types::TelemetryRecord;
use crate::LinkError;

/// Drives a [`LineFramer`] with chunks from a [`ByteSource`].
pub struct StreamPump<S> {
    source: S,
    framer: LineFramer,
    config: PumpConfig,

    /// Last chunk read from the source
    chunk: Box<[u8]>,
    filled: usize,
    offset: usize,

    /// Records decoded but not yet handed out
    pending: VecDeque<TelemetryRecord>,
    batch: Vec<TelemetryRecord>,

    /// The framer asked for a pause before the rest of the chunk
    backoff_due: bool,

    records_emitted: u64,
    transport_errors: u64,
}

impl<S: ByteSource> StreamPump<S> {
    /// Create a pump with a fresh framer.
    pub fn new(source: S, config: PumpConfig) -> Self {
        let chunk_size = config.chunk_size.clamp(1, PumpConfig::MAX_CHUNK_SIZE);
        Self {
            source,
            framer: LineFramer::new(),
            config,
            chunk: vec![0u8; chunk_size].into_boxed_slice(),
            filled: 0,
            offset: 0,
            pending: VecDeque::new(),
            batch: Vec::new(),
            backoff_due: false,
            records_emitted: 0,
            transport_errors: 0,
        }
    }

    /// Next record, or `None` once `cancel` fires.
    pub async fn next_record(&mut self, cancel: &CancellationToken) -> Option<TelemetryRecord> {
        loop {
            // Records already decoded from the current chunk are dropped too.
            if cancel.is_cancelled() {
                return None;
            }

            if let Some(record) = self.pending.pop_front() {
                self.records_emitted += 1;
                return Some(record);
            }

            if self.backoff_due {
                self.backoff_due = false;
                trace!(backoff_ms = self.config.backoff_ms, "Backing off after rejected input");
                if !pause(cancel, self.config.backoff()).await {
                    return None;
                }
            }

            if self.offset < self.filled {
                self.process_fragment();
                continue;
            }

            let read = tokio::select! {
                _ = cancel.cancelled() => return None,
                read = self.source.read_chunk(&mut self.chunk[..]) => read,
            };

            match read {
                Ok(0) => {
                    if !pause(cancel, self.config.idle_retry()).await {
                        return None;
                    }
                }
                Ok(n) => {
                    self.filled = n.min(self.chunk.len());
                    self.offset = 0;
                    trace!(bytes = self.filled, "Read chunk");
                }
                Err(e) => {
                    let err = LinkError::from(e);
                    self.transport_errors += 1;
                    error!(
                        error = %sanitize_for_log(&err.to_string()),
                        retryable = err.is_retryable(),
                        retry_ms = self.config.error_retry_ms,
                        "Error reading from telemetry source"
                    );
                    self.framer.reset();
                    self.filled = 0;
                    self.offset = 0;
                    if !pause(cancel, self.config.error_retry()).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Run the framer over the unconsumed part of the current chunk.
    fn process_fragment(&mut self) {
        // One clock read per pass, shared by every diagnostic in it.
        let now = tokio::time::Instant::now().into_std();

        let outcome = self.framer.process(&self.chunk[self.offset..self.filled], now, &mut self.batch);

        self.offset += outcome.consumed;
        self.backoff_due = outcome.requires_backoff;
        self.pending.extend(self.batch.drain(..));
    }

    /// Turn the pump into a lazy record stream that ends when `cancel` fires.
    pub fn into_stream(self, cancel: CancellationToken) -> impl Stream<Item = TelemetryRecord> + Send + 'static {
        info!(chunk_size = self.chunk.len(), "Telemetry stream started");
        futures::stream::unfold((self, cancel), |(mut pump, cancel)| async move {
            match pump.next_record(&cancel).await {
                Some(record) => Some((record, (pump, cancel))),
                None => {
                    debug!(records = pump.records_emitted, "Telemetry stream stopped");
                    None
                }
            }
        })
    }

    /// Records handed out so far.
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }

    /// Failed source reads so far.
    pub fn transport_errors(&self) -> u64 {
        self.transport_errors
    }

    /// The framer, for inspection.
    pub fn framer(&self) -> &LineFramer {
        &self.framer
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
async fn pause(cancel: &CancellationToken, duration: std::time::Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
