//! Hardened ingestion for untrusted serial telemetry links.
//!
//! Aerolink turns a raw byte stream from a sensor link into validated
//! [`TelemetryRecord`]s. Bytes may arrive in any chunking; lines may be split
//! anywhere, padded with garbage, oversized or outright hostile. The pipeline
//! keeps memory bounded, never forwards non-finite values, and rate-limits its
//! own diagnostics so a noisy link cannot flood the logs.
//!
//! # Features
//!
//! - **Bounded framing**: lines longer than 1024 bytes are dropped without
//!   buffering more than the limit
//! - **Strict decoding**: exactly four finite numbers per line
//! - **Safe diagnostics**: sanitized, length-only, at most one per second per class
//! - **Async streaming**: lazy record streams with cancellation and
//!   broadcast fan-out to subscribers
//!
//! # Wire format
//!
//! ```text
//! altitude,velocity,pitch,roll\n
//! ```
//!
//! Lines end with `\n`, `\r\n` or `\r`.
//!
//! ## Example (simulated link)
//!
//! ```rust,no_run
//! use aerolink::{Aerolink, LinkConfig, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> aerolink::Result<()> {
//!     let connection = Aerolink::simulate(LinkConfig::default(), 42)?;
//!     let mut records = connection.subscribe(UpdateRate::Max(2));
//!
//!     while let Some(record) = records.next().await {
//!         println!("altitude {:.1} m", record.altitude());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod sanitize;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Framing and decoding
pub mod decoder;
pub mod diagnostics;
pub mod framer;

// Stream-based telemetry architecture
pub mod config;
pub mod connection;
pub mod driver;
pub mod pump;
pub mod source;
pub mod sources;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{LinkConfig, PumpConfig, SerialConfig};
pub use decoder::MAX_LINE_LEN;
pub use framer::{ChunkOutcome, LineFramer};
pub use pump::StreamPump;
pub use sanitize::{is_valid_device_identifier, sanitize_for_log};
pub use source::ByteSource;
pub use sources::{ReaderSource, SimulatedLink};

pub use connection::LinkConnection;

use tokio::io::AsyncRead;

/// Unified entry point for telemetry links.
///
/// The transport itself is opened by the caller; Aerolink only needs
/// something it can read bytes from.
///
/// # Examples
///
/// ## Any async reader
/// ```rust,no_run
/// use aerolink::{Aerolink, LinkConfig};
///
/// #[tokio::main]
/// async fn main() -> aerolink::Result<()> {
///     let connection = Aerolink::from_reader(tokio::io::empty(), LinkConfig::default())?;
///     // Use connection...
///     Ok(())
/// }
/// ```
pub struct Aerolink;

impl Aerolink {
    /// Start a link over any [`ByteSource`].
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation: an unsafe device
    /// identifier, a non-standard baud rate, or out-of-range pump settings.
    pub fn open<S: ByteSource>(source: S, config: LinkConfig) -> Result<LinkConnection> {
        LinkConnection::open(source, config)
    }

    /// Start a link over an [`AsyncRead`] such as an opened serial port.
    pub fn from_reader<R>(reader: R, config: LinkConfig) -> Result<LinkConnection>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        LinkConnection::open(ReaderSource::new(reader), config)
    }

    /// Start a simulated link producing one line every 500 ms.
    ///
    /// Must be called from within a tokio runtime.
    pub fn simulate(config: LinkConfig, seed: u64) -> Result<LinkConnection> {
        let link = SimulatedLink::new(sources::simulated::DEFAULT_LINE_INTERVAL, seed);
        LinkConnection::open(link, config)
    }
}
