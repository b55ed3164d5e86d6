//! Declarative field schema
//!
//! A schema describes every field of the container: wire type, repeat count,
//! the version that introduced it and its default value. It is loaded once
//! into an immutable [`FieldSpec`] tree and instantiated per encode.
//!
//! # Example Schema
//!
//! ```json
//! {
//!   "start": {
//!     "commandbyte": { "value": "0x36", "type": "uint8", "introduced-version": "0.1.0" },
//!     "playerdata": {
//!       "template": {
//!         "externalcharid": { "value": "0", "type": "uint8", "introduced-version": "0.1.0" }
//!       },
//!       "repetition-count": 4
//!     }
//!   }
//! }
//! ```

mod loader;
mod spec;
mod value;

use std::path::PathBuf;
use thiserror::Error;

use crate::version::VersionFormatError;

pub use spec::{
    END_BLOCK, FRAME_BLOCK, FieldSpec, LeafSpec, POST_FRAME, PRE_FRAME, START_BLOCK, Schema,
};
pub use value::{FieldType, Scalar, Value, ValueError};

/// Schema format errors. The schema is a build artifact, so all of these are
/// fatal at load time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read schema {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("field `{path}`: expected a mapping")]
    NotAMapping { path: String },

    #[error("field `{path}`: missing `{key}`")]
    MissingKey { path: String, key: &'static str },

    #[error("field `{path}`: unknown type tag {tag:?}")]
    UnknownType { path: String, tag: String },

    #[error("field `{path}`: `{key}` must be a non-negative integer, got {value}")]
    NotAnInteger {
        path: String,
        key: &'static str,
        value: String,
    },

    #[error("field `{path}`: `{key}` must be a string, got {value}")]
    NotAString {
        path: String,
        key: &'static str,
        value: String,
    },

    #[error("field `{path}`: len must be at least 1")]
    ZeroLength { path: String },

    #[error("field `{path}`: {source}")]
    BadLiteral { path: String, source: ValueError },

    #[error("field `{path}`: {source}")]
    BadVersion {
        path: String,
        source: VersionFormatError,
    },

    #[error("schema has no `{0}` block")]
    MissingBlock(String),
}
