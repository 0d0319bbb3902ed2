//! Log-safe string handling and device identifier validation.
//!
//! Anything that originates outside the process (configuration values,
//! transport error text) goes through [`sanitize_for_log`] before it reaches
//! a log sink, and device identifiers are checked with
//! [`is_valid_device_identifier`] before a transport is opened with them.

/// Maximum number of input characters kept by [`sanitize_for_log`].
pub const MAX_LOG_CHARS: usize = 500;

/// Marker appended when [`sanitize_for_log`] truncates its input.
pub const TRUNCATION_MARKER: &str = "...[TRUNCATED]";

/// Maximum accepted length of a device identifier, in characters.
pub const MAX_DEVICE_IDENTIFIER_LEN: usize = 100;

/// Make a string safe for a single log line.
///
/// Each run of control, format, line-separator or paragraph-separator code
/// points is replaced by a single `_`. At most [`MAX_LOG_CHARS`] input
/// characters are processed; longer input gets [`TRUNCATION_MARKER`]
/// appended. Printable text, including multi-byte and emoji sequences, is
/// left as is.
///
/// ```rust
/// use aerolink::sanitize_for_log;
///
/// assert_eq!(sanitize_for_log("BadData\n[INFO] Forged"), "BadData_[INFO] Forged");
/// ```
pub fn sanitize_for_log(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(input.len().min(MAX_LOG_CHARS * 4) + TRUNCATION_MARKER.len());
    let mut chars = input.chars();
    let mut in_unsafe_run = false;

    for ch in chars.by_ref().take(MAX_LOG_CHARS) {
        if is_unsafe_for_log(ch) {
            if !in_unsafe_run {
                out.push('_');
                in_unsafe_run = true;
            }
        } else {
            out.push(ch);
            in_unsafe_run = false;
        }
    }

    if chars.next().is_some() {
        out.push_str(TRUNCATION_MARKER);
    }

    out
}

/// Control (Cc), format (Cf), line separator (Zl) and paragraph separator (Zp).
///
/// U+200D is kept so emoji ZWJ sequences survive.
fn is_unsafe_for_log(ch: char) -> bool {
    ch.is_control() || is_format_char(ch) || matches!(ch, '\u{2028}' | '\u{2029}')
}

fn is_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200C}'
            | '\u{200E}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Naming convention a device identifier is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePlatform {
    /// `COM1` .. `COM999`
    Windows,
    /// `/dev/tty*` and `/dev/cu.*`
    Unix,
}

impl DevicePlatform {
    /// Convention of the platform this crate was compiled for.
    pub fn host() -> Self {
        if cfg!(windows) { DevicePlatform::Windows } else { DevicePlatform::Unix }
    }

    /// Device opened when configuration does not name one.
    pub fn default_device(self) -> &'static str {
        match self {
            DevicePlatform::Windows => "COM3",
            DevicePlatform::Unix => "/dev/ttyUSB0",
        }
    }
}

/// Validate a device identifier against the host platform's convention.
///
/// See [`is_valid_device_identifier_for`].
pub fn is_valid_device_identifier(name: &str) -> bool {
    is_valid_device_identifier_for(name, DevicePlatform::host())
}

/// Validate an externally supplied device identifier.
///
/// Accepts only `[A-Za-z0-9._-/\]`, rejects `..` anywhere, rejects names
/// longer than [`MAX_DEVICE_IDENTIFIER_LEN`], and requires the platform's
/// naming pattern.
pub fn is_valid_device_identifier_for(name: &str, platform: DevicePlatform) -> bool {
    // Length first so nothing below scans an oversized input.
    if name.is_empty() || name.len() > MAX_DEVICE_IDENTIFIER_LEN {
        return false;
    }

    let allowed = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'/' | b'\\');
    if !name.bytes().all(allowed) {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    match platform {
        DevicePlatform::Windows => {
            let Some(prefix) = name.get(..3) else {
                return false;
            };
            let digits = &name[3..];
            prefix.eq_ignore_ascii_case("COM")
                && (1..=3).contains(&digits.len())
                && digits.bytes().all(|b| b.is_ascii_digit())
        }
        DevicePlatform::Unix => ["/dev/tty", "/dev/cu."].iter().any(|prefix| {
            name.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        }),
    }
}
