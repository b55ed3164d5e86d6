//! SLP Core - schema-driven replay container encoder
//!
//! Writes `.slp` raw-element containers from a replay model. Field layout,
//! wire types and the format version that introduced each field come from a
//! declarative schema rather than from code.
//!
//! # Architecture
//!
//! - [`Schema`] - Typed field tree loaded from the JSON schema
//! - [`ValueNode`] - Per-encode instantiation of the schema with live values
//! - [`TreeBuilder`] - Populates value trees from a [`ReplayModel`]
//! - [`BinaryWriter`] - Version-gated big-endian writer
//! - [`Encoder`] - Prefix computation, block ordering and file output
//!
//! # Example
//!
//! ```ignore
//! use slp_core::{Encoder, Schema};
//! use slp_shared::Game;
//!
//! let game = Game::from_json(&std::fs::read_to_string("game.json")?)?;
//! let encoder = Encoder::new(Schema::bundled()?);
//! encoder.write_file(Some(&game), Path::new("game.slp"))?;
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod replay;
pub mod schema;
pub mod tree;
pub mod version;

pub use config::{ConfigError, EncoderConfig};
pub use encoder::Encoder;
pub use error::{EncodeError, Result};
pub use replay::{
    BinaryWriter, BuiltReplay, ContainerFormatError, EmbeddedBlob, EndOfStream, PayloadSizeTable,
    TreeBuilder, extract_blob,
};
pub use schema::{FieldSpec, FieldType, Schema, SchemaError};
pub use tree::{ValueLeaf, ValueNode};
pub use version::{Version, VersionFormatError};

// Re-export the replay model so callers need only one dependency
pub use slp_shared::{Game, ReplayModel};
