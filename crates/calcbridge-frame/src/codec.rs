use crate::error::Result;

/// The frame terminator: a single null byte.
pub const DELIMITER: u8 = 0;

/// Legacy two-character escape form of the terminator, emitted by older
/// calculator firmware.
const LEGACY_DELIMITER: &[u8; 2] = b"/0";

/// Remove every delimiter from `bytes`: null bytes and the legacy `/0`
/// escape pair. Delimiters may appear anywhere in the frame, not only at
/// the tail.
pub fn strip_delimiters(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == DELIMITER {
            i += 1;
            continue;
        }
        if bytes[i..].starts_with(LEGACY_DELIMITER) {
            i += LEGACY_DELIMITER.len();
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Decode bytes as UTF-8 without altering them. Socket-side frames are
/// forwarded verbatim, so no delimiter stripping happens here.
pub fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Decode a frame read from the serial device: strip delimiters, then
/// interpret the remainder as UTF-8.
pub fn decode_serial_payload(bytes: &[u8]) -> Result<String> {
    let stripped = strip_delimiters(bytes);
    let text = std::str::from_utf8(&stripped)?;
    Ok(text.to_string())
}

/// Append the delimiter to a control frame for the serial wire.
pub fn terminated(frame: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + 1);
    out.extend_from_slice(frame.as_bytes());
    out.push(DELIMITER);
    out
}
