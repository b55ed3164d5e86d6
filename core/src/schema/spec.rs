//! Typed field tree produced by the schema loader.

use super::value::{FieldType, Value};
use super::{SchemaError, loader};
use crate::version::Version;
use std::path::Path;

/// Top-level block holding the match-start fields
pub const START_BLOCK: &str = "start";
/// Top-level block holding the per-frame event templates
pub const FRAME_BLOCK: &str = "frametemplate";
/// Top-level block holding the match-end fields
pub const END_BLOCK: &str = "end";
/// Pre-frame template inside [`FRAME_BLOCK`]
pub const PRE_FRAME: &str = "pre";
/// Post-frame template inside [`FRAME_BLOCK`]
pub const POST_FRAME: &str = "post";

/// One scalar wire value, possibly repeated
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSpec {
    pub ty: FieldType,
    /// Number of consecutive copies on the wire (at least 1)
    pub len: usize,
    /// First format version that carries this field
    pub introduced: Version,
    pub default: Value,
}

impl LeafSpec {
    /// Bytes this leaf occupies when written under `version`
    pub fn size_at(&self, version: Version) -> usize {
        if self.introduced <= version {
            self.ty.width() * self.len
        } else {
            0
        }
    }
}

/// Schema node
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    Leaf(LeafSpec),
    /// Named children in declared order
    Composite(Vec<(String, FieldSpec)>),
    /// `count` independent copies of `template`
    Array {
        template: Box<FieldSpec>,
        count: usize,
    },
}

impl FieldSpec {
    /// Named child of a composite node
    pub fn child(&self, name: &str) -> Option<&FieldSpec> {
        match self {
            FieldSpec::Composite(children) => {
                children.iter().find(|(key, _)| key == name).map(|(_, c)| c)
            }
            _ => None,
        }
    }

    /// Newest introduced-version of any leaf below this node
    pub fn max_introduced(&self) -> Option<Version> {
        match self {
            FieldSpec::Leaf(leaf) => Some(leaf.introduced),
            FieldSpec::Composite(children) => {
                children.iter().filter_map(|(_, c)| c.max_introduced()).max()
            }
            FieldSpec::Array { template, .. } => template.max_introduced(),
        }
    }
}

/// Loaded schema: named top-level blocks in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    blocks: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub(crate) fn from_blocks(blocks: Vec<(String, FieldSpec)>) -> Self {
        Self { blocks }
    }

    /// Parse a schema from JSON text
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        loader::load_schema(&value)
    }

    /// Build a schema from an already parsed JSON document
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SchemaError> {
        loader::load_schema(value)
    }

    /// Read and parse a schema file
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Schema for the current container revision, bundled with the crate
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::from_json(include_str!("../../resources/slp_schema.json"))
    }

    /// Look up a top-level block
    pub fn block(&self, name: &str) -> Option<&FieldSpec> {
        self.blocks.iter().find(|(key, _)| key == name).map(|(_, b)| b)
    }

    /// Look up a top-level block that must exist
    pub fn require_block(&self, name: &str) -> Result<&FieldSpec, SchemaError> {
        self.block(name)
            .ok_or_else(|| SchemaError::MissingBlock(name.to_string()))
    }

    /// Pre/post templates of the frame block, if the schema declares them
    pub fn frame_templates(&self) -> Result<(&FieldSpec, &FieldSpec), SchemaError> {
        let frame = self.require_block(FRAME_BLOCK)?;
        let missing = |name: &str| SchemaError::MissingBlock(format!("{FRAME_BLOCK}.{name}"));
        let pre = frame.child(PRE_FRAME).ok_or_else(|| missing(PRE_FRAME))?;
        let post = frame.child(POST_FRAME).ok_or_else(|| missing(POST_FRAME))?;
        Ok((pre, post))
    }

    /// Iterate over top-level blocks
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.blocks.iter().map(|(k, b)| (k.as_str(), b))
    }

    /// Newest introduced-version declared anywhere in the schema
    pub fn max_introduced_version(&self) -> Option<Version> {
        self.blocks.iter().filter_map(|(_, b)| b.max_introduced()).max()
    }
}
