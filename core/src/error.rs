//! Top-level encode error

use std::io;
use thiserror::Error;

use crate::replay::binary::{ContainerFormatError, EndOfStream, ReadError};
use crate::schema::{SchemaError, ValueError};
use crate::version::VersionFormatError;

/// Everything that can abort an encode. There is no partial success: either
/// the whole container is produced or one of these is returned.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Version(#[from] VersionFormatError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Container(#[from] ContainerFormatError),

    #[error(transparent)]
    EndOfStream(#[from] EndOfStream),

    /// A replay-model value does not fit the wire type of its field
    #[error("field `{path}`: {source}")]
    ValueOutOfRange { path: String, source: ValueError },

    /// Bytes written after the header differ from the declared total length
    #[error("payload length mismatch: header declares {declared} bytes, wrote {written}")]
    LengthMismatch { declared: u64, written: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ReadError> for EncodeError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Format(e) => EncodeError::Container(e),
            ReadError::EndOfStream(e) => EncodeError::EndOfStream(e),
        }
    }
}

/// Result alias for encoder operations
pub type Result<T, E = EncodeError> = std::result::Result<T, E>;
