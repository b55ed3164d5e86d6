//! Container format constants for `.slp` replay files.
//!
//! This module is the single source of truth for the bytes that frame the raw
//! event stream: the UBJSON-style magic prefix and the one-byte event codes
//! that lead every event.
//!
//! # Example
//!
//! ```
//! use slp_shared::{EventCode, SLP_MAGIC};
//!
//! assert_eq!(SLP_MAGIC.len(), 11);
//! assert_eq!(EventCode::PayloadSizes.code(), 0x35);
//! assert_eq!(EventCode::from_code(0x36), Some(EventCode::GameStart));
//! ```

/// Magic bytes opening the raw element: `{U\x03raw[$U#l`.
pub const SLP_MAGIC: &[u8; 11] = b"{U\x03raw[$U#l";

/// Width of the big-endian total-length field that follows the magic.
pub const RAW_LENGTH_WIDTH: usize = 4;

/// Bytes before the first event: magic plus raw length.
pub const HEADER_LEN: usize = SLP_MAGIC.len() + RAW_LENGTH_WIDTH;

/// Maximum number of ports (players) in one match.
pub const MAX_PORTS: usize = 4;

/// Event codes known to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventCode {
    /// Payload-size table; always the first event in the stream
    PayloadSizes = 0x35,
    /// Match-start block
    GameStart = 0x36,
    /// Per-port input/state record taken before the frame is simulated
    PreFrameUpdate = 0x37,
    /// Per-port state record taken after the frame is simulated
    PostFrameUpdate = 0x38,
    /// Match-end block
    GameEnd = 0x39,
    /// Injected code list carried through as an opaque blob
    GeckoList = 0x3D,
}

impl EventCode {
    /// Raw command byte for this event.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a known event by its command byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x35 => Some(Self::PayloadSizes),
            0x36 => Some(Self::GameStart),
            0x37 => Some(Self::PreFrameUpdate),
            0x38 => Some(Self::PostFrameUpdate),
            0x39 => Some(Self::GameEnd),
            0x3D => Some(Self::GeckoList),
            _ => None,
        }
    }

    /// Human-readable event name, used in logs and `inspect` output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PayloadSizes => "payload sizes",
            Self::GameStart => "game start",
            Self::PreFrameUpdate => "pre-frame update",
            Self::PostFrameUpdate => "post-frame update",
            Self::GameEnd => "game end",
            Self::GeckoList => "gecko list",
        }
    }
}
