//! Core value types.
//!
//! - [`TelemetryRecord`] is the validated output of the decoder
//! - [`UpdateRate`] selects how often a subscriber wants to see records

mod record;
mod update_rate;

pub use record::TelemetryRecord;
pub use update_rate::UpdateRate;
