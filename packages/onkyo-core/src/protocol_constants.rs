//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the eISCP wire format or by the receiver's
//! documented command ranges, and changing them would break compatibility.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// eISCP Framing
// ─────────────────────────────────────────────────────────────────────────────

/// Frame signature at offset 0.
pub const EISCP_MAGIC: [u8; 4] = *b"ISCP";

/// Size of the eISCP header in bytes (also written into the header itself).
pub const EISCP_HEADER_SIZE: usize = 16;

/// eISCP protocol version byte.
pub const EISCP_VERSION: u8 = 0x01;

/// Start marker prefixed to every ISCP message: `!` + unit type `1` (receiver).
pub const ISCP_START: &[u8; 2] = b"!1";

/// Terminator appended to outgoing ISCP messages.
pub const ISCP_END: u8 = b'\r';

/// Characters a receiver may append after an ISCP message (EOF, CR, LF).
pub const ISCP_TRAILER: [char; 3] = ['\x1a', '\r', '\n'];

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Default eISCP TCP port.
pub const DEFAULT_EISCP_PORT: u16 = 60128;

/// Maximum time to wait for the TCP connection to be established.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum time to wait for the first inbound chunk after a query.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Capacity of the inbound chunk queue between the reader task and callers.
pub const INBOUND_QUEUE_CAPACITY: usize = 100;

/// Size of the reader task's socket read buffer.
pub const READ_BUFFER_SIZE: usize = 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Command Ranges
// ─────────────────────────────────────────────────────────────────────────────

/// Highest master volume accepted by `MVL`.
pub const MAX_VOLUME: u8 = 50;

/// Subwoofer trim range accepted by `SWL` (dB steps).
pub const MIN_SUBWOOFER_LEVEL: i8 = -8;
pub const MAX_SUBWOOFER_LEVEL: i8 = 8;

/// Highest display dimmer level accepted by `DIM`.
pub const MAX_DIMMER_LEVEL: u8 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Service identifier returned by the health endpoint.
pub const SERVICE_ID: &str = "onkyo-ctl";

/// Default HTTP API port.
pub const DEFAULT_BIND_PORT: u16 = 8080;
