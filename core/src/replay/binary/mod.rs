//! Binary container format (`.slp` raw element)
//!
//! # File Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Magic `{U\x03raw[$U#l` (11 bytes)                │
//! │ Raw length: u32 BE (bytes of every event below)  │
//! ├──────────────────────────────────────────────────┤
//! │ 0x35 payload-size table                          │
//! │ ├─ table size: u8 (3 × entries + 1)              │
//! │ └─ entries: (code: u8, payload size: u16 BE)     │
//! ├──────────────────────────────────────────────────┤
//! │ 0x36 game start                                  │
//! │ 0x3D gecko list (optional, carried opaquely)     │
//! │ 0x37 / 0x38 pre/post frame updates               │
//! │ 0x39 game end                                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Every event is its one-byte code followed by exactly the payload size the
//! table declares for that code.

mod prefix;
mod reader;
mod writer;

use thiserror::Error;

use crate::version::Version;

pub use prefix::{ContainerPrefix, PrefixBuilder};
pub use reader::{ContainerHeader, ContainerReader, PayloadSizeTable, extract_blob};
pub use writer::BinaryWriter;

/// Structural problems in a container
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerFormatError {
    #[error("bad magic bytes: found {found:02x?}")]
    BadMagic { found: Vec<u8> },

    #[error("expected payload-size table (0x35), found command 0x{0:02x}")]
    UnexpectedCommand(u8),

    #[error("payload-size table size {0} does not describe whole (code, size) entries")]
    UnevenSizeTable(u8),

    #[error("event code 0x{0:02x} is reserved for the payload-size table")]
    ReservedCode(u8),

    #[error("event 0x{code:02x} payload is {size} bytes, too large for its size field")]
    PayloadTooLarge { code: u8, size: usize },

    #[error("event 0x{code:02x} declared with payload sizes {declared} and {got}")]
    InconsistentPayloadSize { code: u8, declared: u16, got: usize },

    #[error("event 0x{0:02x} block is empty; it must start with its command byte")]
    EmptyBlock(u8),

    #[error("event 0x{code:02x} block does not start with its command byte at version {version}")]
    MissingCommandByte { code: u8, version: Version },

    #[error("container raw length {0} does not fit in 32 bits")]
    TooLong(usize),
}

/// Binary read ran past the end of the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected end of stream at offset {offset}: needed {requested} bytes, {remaining} remaining")]
pub struct EndOfStream {
    pub offset: usize,
    pub requested: usize,
    pub remaining: usize,
}

/// Errors while reading a captured container
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Format(#[from] ContainerFormatError),
    #[error(transparent)]
    EndOfStream(#[from] EndOfStream),
}

/// Opaque event carried through unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBlob {
    pub code: u8,
    pub payload: Vec<u8>,
}

impl EmbeddedBlob {
    pub fn new(code: u8, payload: Vec<u8>) -> Self {
        Self { code, payload }
    }

    /// Encoded length: code byte plus payload
    pub fn len(&self) -> usize {
        1 + self.payload.len()
    }

    /// Never true; a blob always carries its code byte
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `code ‖ payload`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.code);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
