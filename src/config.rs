//! Link configuration
//!
//! Configuration is plain serde data, loadable from YAML. Every field has a
//! default so a file only needs to name what it changes:
//!
//! ```yaml
//! serial:
//!   device: /dev/ttyACM0
//!   baud_rate: 115200
//! pump:
//!   backoff_ms: 250
//! ```
//!
//! Values that reach the transport are checked by [`LinkConfig::validate`]
//! before use. The device identifier comes from outside the process, so it
//! is validated against a strict allow-list and sanitized before it appears
//! in any error or log line.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::sanitize::{DevicePlatform, is_valid_device_identifier, sanitize_for_log};
use crate::{LinkError, Result};

/// Baud rates accepted by [`SerialConfig::validate`].
pub const STANDARD_BAUD_RATES: &[u32] = &[
    300, 600, 1200, 2400, 4800, 9600, 14400, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// Top-level link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Transport settings, consumed by whoever opens the port
    pub serial: SerialConfig,

    /// Pump timings
    pub pump: PumpConfig,

    /// Records buffered per subscriber before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { serial: SerialConfig::default(), pump: PumpConfig::default(), channel_capacity: 256 }
    }
}

impl LinkConfig {
    /// Largest subscriber buffer, in records.
    pub const MAX_CHANNEL_CAPACITY: usize = 64 * 1024;

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config("Link configuration", format!("YAML parsing failed: {e}")))?;
        debug!(?config, "Parsed link configuration");
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| LinkError::ConfigFile { path: path.to_path_buf(), source })?;
        info!(path = %sanitize_for_log(&path.display().to_string()), "Loaded link configuration");
        Self::from_yaml_str(&yaml)
    }

    /// Check every value that is used to open or drive the link.
    pub fn validate(&self) -> Result<()> {
        self.serial.validate()?;
        self.pump.validate()?;

        if self.channel_capacity == 0 || self.channel_capacity > Self::MAX_CHANNEL_CAPACITY {
            return Err(LinkError::config(
                "channel_capacity",
                format!("must be between 1 and {}, got {}", Self::MAX_CHANNEL_CAPACITY, self.channel_capacity),
            ));
        }

        Ok(())
    }
}

/// Serial transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Device identifier such as `COM3` or `/dev/ttyUSB0`
    pub device: String,

    /// Line rate in baud
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { device: DevicePlatform::host().default_device().to_string(), baud_rate: 9600 }
    }
}

impl SerialConfig {
    /// Validate the device identifier and baud rate.
    ///
    /// Failures are fatal to opening the transport. The device text in the
    /// returned error is sanitized.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_device_identifier(&self.device) {
            return Err(LinkError::invalid_device(&self.device));
        }

        if !STANDARD_BAUD_RATES.contains(&self.baud_rate) {
            return Err(LinkError::InvalidBaudRate { baud_rate: self.baud_rate });
        }

        info!(
            device = %sanitize_for_log(&self.device),
            baud_rate = self.baud_rate,
            "Serial configuration validated"
        );
        Ok(())
    }
}

/// Stream pump settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PumpConfig {
    /// Bytes requested per read
    pub chunk_size: usize,

    /// Pause after a zero-byte read
    pub idle_retry_ms: u64,

    /// Pause after a transport error
    pub error_retry_ms: u64,

    /// Pause after an oversized or undecodable line
    pub backoff_ms: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self { chunk_size: 4096, idle_retry_ms: 10, error_retry_ms: 1000, backoff_ms: 100 }
    }
}

impl PumpConfig {
    /// Largest read buffer the pump will allocate.
    pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > Self::MAX_CHUNK_SIZE {
            return Err(LinkError::config(
                "pump.chunk_size",
                format!("must be between 1 and {}, got {}", Self::MAX_CHUNK_SIZE, self.chunk_size),
            ));
        }
        Ok(())
    }

    pub fn idle_retry(&self) -> Duration {
        Duration::from_millis(self.idle_retry_ms)
    }

    pub fn error_retry(&self) -> Duration {
        Duration::from_millis(self.error_retry_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}
