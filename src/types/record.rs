//! Validated telemetry record

use serde::Serialize;
use std::time::SystemTime;

use crate::error::{Field, Rejected};

/// One validated telemetry reading.
///
/// All four measurements are finite. A record can only be built through
/// [`TelemetryRecord::new`] (or the decoder, which calls it), so a NaN or
/// infinity can never reach a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    altitude: f64,
    velocity: f64,
    pitch: f64,
    roll: f64,

    /// Local capture time, never taken from the wire
    captured_at: SystemTime,
}

impl TelemetryRecord {
    /// Build a record stamped with the current time.
    pub fn new(altitude: f64, velocity: f64, pitch: f64, roll: f64) -> Result<Self, Rejected> {
        Self::with_timestamp(altitude, velocity, pitch, roll, SystemTime::now())
    }

    /// Build a record with an explicit capture time.
    pub fn with_timestamp(
        altitude: f64,
        velocity: f64,
        pitch: f64,
        roll: f64,
        captured_at: SystemTime,
    ) -> Result<Self, Rejected> {
        let values = [altitude, velocity, pitch, roll];
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Rejected::NonFinite { field: Field::ALL[index] });
        }

        Ok(Self { altitude, velocity, pitch, roll, captured_at })
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn roll(&self) -> f64 {
        self.roll
    }

    /// When the decoder accepted this record.
    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// The four measurements in wire order.
    pub fn values(&self) -> [f64; 4] {
        [self.altitude, self.velocity, self.pitch, self.roll]
    }
}
