//! Replay container encoding
//!
//! Turns a replay model into populated value trees and writes them as a
//! `.slp` raw-element container.
//!
//! # Example
//!
//! ```ignore
//! use slp_core::replay::{BinaryWriter, TreeBuilder};
//!
//! let built = TreeBuilder::new(&schema).build(Some(&game))?;
//! let prefix = built.prefix(None)?;
//!
//! let mut writer = BinaryWriter::new(file, built.version);
//! writer.write_prefix(&prefix)?;
//! writer.write_node(&built.start)?;
//! for event in &built.frames {
//!     writer.write_node(&event.tree)?;
//! }
//! ```

pub mod binary;
pub mod builder;
pub mod flags;
pub mod mapping;

pub use binary::{
    BinaryWriter, ContainerFormatError, ContainerHeader, ContainerPrefix, ContainerReader,
    EmbeddedBlob, EndOfStream, PayloadSizeTable, PrefixBuilder, ReadError, extract_blob,
};
pub use builder::{BuiltReplay, FrameEvent, TreeBuilder};
pub use flags::{STATE_FLAG_BYTES, STATE_FLAG_FIELDS, STATE_FLAG_LAYOUT, pack_state_flags};
