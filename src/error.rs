//! Error types for the telemetry link.
//!
//! Errors fall into two groups:
//!
//! - [`LinkError`] covers initialization and transport failures: invalid
//!   configuration, unreadable config files, and byte-source I/O problems.
//! - [`Rejected`] is the outcome of decoding a single line that is not a
//!   well-formed record. It is a value, not a failure of the stream; the
//!   framer drops the line and moves on.
//!
//! Neither type ever carries raw line content. Strings that originate from
//! configuration are passed through [`sanitize_for_log`](crate::sanitize_for_log)
//! before they are stored, so displaying an error cannot forge log lines.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use aerolink::LinkError;
//!
//! let error = LinkError::transport(std::io::Error::other("port unplugged"));
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::sanitize_for_log;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link setup and transport operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Transport read failed: {source}")]
    Transport {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid device identifier: '{device}'")]
    InvalidDeviceIdentifier { device: String },

    #[error("Unsupported baud rate: {baud_rate}")]
    InvalidBaudRate { baud_rate: u32 },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Pump task failed: {details}")]
    TaskFailed { details: String },
}

impl LinkError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Transport { .. } => true,
            LinkError::InvalidDeviceIdentifier { .. } => false,
            LinkError::InvalidBaudRate { .. } => false,
            LinkError::Config { .. } => false,
            LinkError::ConfigFile { .. } => false,
            LinkError::Cancelled => false,
            LinkError::TaskFailed { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::Transport { .. } => vec![
                "Check that the device is still connected",
                "Verify cabling and link power",
                "Wait for the pump to retry automatically",
            ],
            LinkError::InvalidDeviceIdentifier { .. } => vec![
                "Use a device name such as COM3 or /dev/ttyUSB0",
                "Remove path traversal sequences and shell characters",
                "Keep device names under 100 characters",
            ],
            LinkError::InvalidBaudRate { .. } => vec![
                "Use a standard baud rate such as 9600 or 115200",
                "Match the rate configured on the transmitting device",
            ],
            LinkError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Compare field names against the documented schema",
            ],
            LinkError::ConfigFile { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            LinkError::Cancelled => vec!["Restart the link if the shutdown was not intended"],
            LinkError::TaskFailed { .. } => vec![
                "Check the logs for the failure that stopped the pump",
                "Open a new connection to resume reading",
            ],
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport(source: std::io::Error) -> Self {
        LinkError::Transport { source }
    }

    /// Helper constructor for device identifier errors.
    ///
    /// The identifier is sanitized before it is stored.
    pub fn invalid_device(device: &str) -> Self {
        LinkError::InvalidDeviceIdentifier { device: sanitize_for_log(device) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(context: impl Into<String>, details: impl AsRef<str>) -> Self {
        LinkError::Config { context: context.into(), details: sanitize_for_log(details.as_ref()) }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Transport { source: err }
    }
}

impl From<tokio::task::JoinError> for LinkError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            LinkError::Cancelled
        } else {
            LinkError::TaskFailed { details: sanitize_for_log(&err.to_string()) }
        }
    }
}

/// Reason a line was not accepted as a telemetry record.
///
/// Carries metadata only; the offending bytes are never retained.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("line length {len} exceeds limit of {limit} bytes")]
    TooLong { len: usize, limit: usize },

    #[error("line is empty")]
    Empty,

    #[error("expected 4 fields, found {found}")]
    FieldCount { found: usize },

    #[error("field {field} is not a number")]
    InvalidNumber { field: Field },

    #[error("field {field} is not finite")]
    NonFinite { field: Field },
}

/// Position of a field within a telemetry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Altitude,
    Velocity,
    Pitch,
    Roll,
}

impl Field {
    /// Fields in wire order.
    pub const ALL: [Field; 4] = [Field::Altitude, Field::Velocity, Field::Pitch, Field::Roll];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Altitude => "altitude",
            Field::Velocity => "velocity",
            Field::Pitch => "pitch",
            Field::Roll => "roll",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn device_errors_never_carry_control_characters(device in ".*") {
                let error = LinkError::invalid_device(&device);
                let message = error.to_string();
                prop_assert!(!message.contains('\n'));
                prop_assert!(!message.contains('\r'));
                prop_assert!(!message.chars().any(char::is_control));
            }

            #[test]
            fn config_errors_sanitize_details(details in ".*") {
                let error = LinkError::config("serial", &details);
                prop_assert!(!error.to_string().chars().any(char::is_control));
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();
        assert_send_sync_static::<Rejected>();

        let error = LinkError::invalid_device("COM1");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let transport = LinkError::transport(std::io::Error::other("gone"));
        let device = LinkError::invalid_device("../etc/passwd");
        let baud = LinkError::InvalidBaudRate { baud_rate: 12345 };

        assert!(transport.is_retryable());
        assert!(!device.is_retryable());
        assert!(!baud.is_retryable());

        for error in [&transport, &device, &baud] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn io_errors_convert_to_transport() {
        let err: LinkError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        match err {
            LinkError::Transport { source } => assert_eq!(source.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn transport_message_includes_cause() {
        let err = LinkError::transport(std::io::Error::other("port unplugged"));
        assert_eq!(err.to_string(), "Transport read failed: port unplugged");
    }

    #[tokio::test]
    async fn aborted_task_maps_to_cancelled() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();

        let err = LinkError::from(task.await.unwrap_err());
        assert!(matches!(err, LinkError::Cancelled));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn panicked_task_maps_to_sanitized_failure() {
        let task = tokio::spawn(async { panic!("bad state\nforged entry") });

        let err = LinkError::from(task.await.unwrap_err());
        assert!(matches!(err, LinkError::TaskFailed { .. }));
        assert!(!err.to_string().chars().any(char::is_control));
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn invalid_device_message_is_sanitized() {
        let err = LinkError::invalid_device("COM1\nINJECTED_LOG");
        assert_eq!(err.to_string(), "Invalid device identifier: 'COM1_INJECTED_LOG'");
    }

    #[test]
    fn rejected_messages_name_the_field() {
        let err = Rejected::NonFinite { field: Field::Pitch };
        assert_eq!(err.to_string(), "field pitch is not finite");
        let err = Rejected::TooLong { len: 2000, limit: 1024 };
        assert!(err.to_string().contains("2000"));
    }
}
