//! Record decoder for `altitude,velocity,pitch,roll` lines.
//!
//! The grammar is strict: exactly four comma-separated numbers, each
//! optionally padded with ASCII whitespace (space, tab, CR, LF). A fifth
//! field, a trailing comma or trailing text rejects the whole line. Numbers
//! use Rust's locale-independent `f64` syntax and must be finite.
//!
//! ```rust
//! use aerolink::decoder;
//!
//! let record = decoder::decode(b" 100.5, 200 ,-3,4e1\r\n").unwrap();
//! assert_eq!(record.values(), [100.5, 200.0, -3.0, 40.0]);
//!
//! assert!(decoder::decode(b"1,2,3,4,").is_err());
//! assert!(decoder::decode(b"1,2,NaN,4").is_err());
//! ```

use std::time::SystemTime;

use crate::error::{Field, Rejected};
use crate::types::TelemetryRecord;

/// Longest line, in bytes, the decoder will look at.
pub const MAX_LINE_LEN: usize = 1024;

const FIELD_COUNT: usize = 4;

/// Decode one line into a record stamped with the current time.
///
/// Works directly on the borrowed bytes; nothing is copied.
pub fn decode(line: &[u8]) -> Result<TelemetryRecord, Rejected> {
    let values = parse_fields(line)?;
    let [altitude, velocity, pitch, roll] = values;
    TelemetryRecord::with_timestamp(altitude, velocity, pitch, roll, SystemTime::now())
}

/// Decode a line that is already text.
pub fn decode_str(line: &str) -> Result<TelemetryRecord, Rejected> {
    decode(line.as_bytes())
}

fn parse_fields(line: &[u8]) -> Result<[f64; FIELD_COUNT], Rejected> {
    if line.len() > MAX_LINE_LEN {
        return Err(Rejected::TooLong { len: line.len(), limit: MAX_LINE_LEN });
    }

    if trim_ascii_ws(line).is_empty() {
        return Err(Rejected::Empty);
    }

    let found = line.iter().filter(|&&b| b == b',').count() + 1;
    if found != FIELD_COUNT {
        return Err(Rejected::FieldCount { found });
    }

    let mut values = [0.0; FIELD_COUNT];
    for ((slot, raw), field) in values.iter_mut().zip(line.split(|&b| b == b',')).zip(Field::ALL) {
        *slot = parse_number(raw, field)?;
    }

    Ok(values)
}

fn parse_number(raw: &[u8], field: Field) -> Result<f64, Rejected> {
    let text = std::str::from_utf8(trim_ascii_ws(raw)).map_err(|_| Rejected::InvalidNumber { field })?;
    let value: f64 = text.parse().map_err(|_| Rejected::InvalidNumber { field })?;

    // `1e309` parses to infinity, so the range check happens here, not in the parser.
    if !value.is_finite() {
        return Err(Rejected::NonFinite { field });
    }

    Ok(value)
}

/// Trim space, tab, CR and LF from both ends.
fn trim_ascii_ws(bytes: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let start = bytes.iter().position(|b| !is_ws(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_ws(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
