//! eISCP frame encoding and decoding.
//!
//! An eISCP frame is a 16-byte header followed by an ISCP message:
//!
//! | Offset | Size | Field          | Value                    |
//! |--------|------|----------------|--------------------------|
//! | 0      | 4    | Magic          | `ISCP`                   |
//! | 4      | 4    | Header length  | `16`                     |
//! | 8      | 4    | Payload length | byte length of payload   |
//! | 12     | 1    | Version        | `1`                      |
//! | 13     | 3    | Reserved       | `0,0,0`                  |
//! | 16     | n    | Payload        | `!1` + command + `\r`    |
//!
//! All integers are big-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol_constants::{
    EISCP_HEADER_SIZE, EISCP_MAGIC, EISCP_VERSION, ISCP_END, ISCP_START, ISCP_TRAILER,
};

/// Encodes an ISCP command (e.g. `"MVL20"`) into a complete eISCP frame.
#[must_use]
pub fn encode(command: &str) -> Bytes {
    let payload_len = ISCP_START.len() + command.len() + 1;

    let mut buf = BytesMut::with_capacity(EISCP_HEADER_SIZE + payload_len);
    buf.put_slice(&EISCP_MAGIC);
    buf.put_u32(EISCP_HEADER_SIZE as u32);
    buf.put_u32(payload_len as u32);
    buf.put_u8(EISCP_VERSION);
    buf.put_slice(&[0, 0, 0]);

    buf.put_slice(ISCP_START);
    buf.put_slice(command.as_bytes());
    buf.put_u8(ISCP_END);

    buf.freeze()
}

/// Extracts the ISCP command from a raw eISCP frame.
///
/// Input shorter than a header is returned unchanged (lossily decoded as
/// UTF-8) so partial reads surface to the caller instead of being dropped.
///
/// Only the first frame is decoded: bytes past the declared payload length
/// are ignored, and a declared length larger than the buffer is truncated to
/// what is actually present.
///
/// The two-byte start marker (`!` plus unit type) is stripped only when the
/// payload actually begins with `!`. A payload without it is returned as-is
/// rather than losing its first two characters.
#[must_use]
pub fn decode(raw: &[u8]) -> String {
    if raw.len() < EISCP_HEADER_SIZE {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let declared = u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
    let end = EISCP_HEADER_SIZE.saturating_add(declared).min(raw.len());
    let payload = &raw[EISCP_HEADER_SIZE..end];

    // `!` followed by a one-byte unit type
    let message = match payload.first() {
        Some(b'!') => payload.get(ISCP_START.len()..).unwrap_or_default(),
        _ => payload,
    };

    String::from_utf8_lossy(message)
        .trim_end_matches(ISCP_TRAILER)
        .trim()
        .to_string()
}

/// Reads the payload length field of a frame header, if one is present.
#[must_use]
pub fn payload_len(raw: &[u8]) -> Option<u32> {
    if raw.len() < EISCP_HEADER_SIZE || raw[..4] != EISCP_MAGIC {
        return None;
    }
    Some(u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]))
}
