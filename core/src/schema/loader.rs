//! Schema loader
//!
//! Converts the declarative JSON schema into a [`FieldSpec`] tree. Node kind
//! is decided once here from the key set:
//!
//! - `value` + `type` + `introduced-version` (optional `len`) → leaf
//! - `template` + `repetition-count` → array
//! - anything else → composite over every child key
//!
//! A partial leaf or array key set is a [`SchemaError::MissingKey`], so those
//! key names cannot name composite children.
//!
//! The spellings used by older schema files (`val`, `dtype`, `added`,
//! `data`, `repetitions`) are accepted as aliases.

use serde_json::{Map, Value as Json};

use super::SchemaError;
use super::spec::{FieldSpec, LeafSpec, Schema};
use super::value::FieldType;
use crate::version::Version;

const VALUE_KEYS: &[&str] = &["value", "val"];
const TYPE_KEYS: &[&str] = &["type", "dtype"];
const INTRODUCED_KEYS: &[&str] = &["introduced-version", "added"];
const LEN_KEYS: &[&str] = &["len"];
const TEMPLATE_KEYS: &[&str] = &["template", "data"];
const REPETITION_KEYS: &[&str] = &["repetition-count", "repetitions"];

/// Load every top-level block of a schema document
pub(crate) fn load_schema(document: &Json) -> Result<Schema, SchemaError> {
    let root = document
        .as_object()
        .ok_or_else(|| SchemaError::NotAMapping {
            path: "<root>".to_string(),
        })?;

    let mut blocks = Vec::with_capacity(root.len());
    for (name, node) in root {
        blocks.push((name.clone(), load_node(node, name)?));
    }
    Ok(Schema::from_blocks(blocks))
}

/// Load one node; `path` is its dotted location, used in errors
pub(crate) fn load_node(node: &Json, path: &str) -> Result<FieldSpec, SchemaError> {
    let map = node.as_object().ok_or_else(|| SchemaError::NotAMapping {
        path: path.to_string(),
    })?;

    let value = find(map, VALUE_KEYS);
    let ty = find(map, TYPE_KEYS);
    let introduced = find(map, INTRODUCED_KEYS);

    match (value, ty, introduced) {
        (Some(value), Some(ty), Some(introduced)) => {
            let len = match find(map, LEN_KEYS) {
                Some(len) => integer(len, path, "len")?,
                None => 1,
            };
            return load_leaf(value, ty, introduced, len, path).map(FieldSpec::Leaf);
        }
        (None, None, None) => {}
        _ => {
            let missing = [
                (value, VALUE_KEYS[0]),
                (ty, TYPE_KEYS[0]),
                (introduced, INTRODUCED_KEYS[0]),
            ]
            .into_iter()
            .find(|(found, _)| found.is_none())
            .map(|(_, key)| key)
            .unwrap_or(VALUE_KEYS[0]);
            return Err(SchemaError::MissingKey {
                path: path.to_string(),
                key: missing,
            });
        }
    }

    match (find(map, TEMPLATE_KEYS), find(map, REPETITION_KEYS)) {
        (Some(template), Some(count)) => {
            let count = integer(count, path, "repetition-count")?;
            let template = load_node(template, &format!("{path}[]"))?;
            Ok(FieldSpec::Array {
                template: Box::new(template),
                count,
            })
        }
        (Some(_), None) => Err(SchemaError::MissingKey {
            path: path.to_string(),
            key: REPETITION_KEYS[0],
        }),
        (None, Some(_)) => Err(SchemaError::MissingKey {
            path: path.to_string(),
            key: TEMPLATE_KEYS[0],
        }),
        (None, None) => {
            let mut children = Vec::with_capacity(map.len());
            for (name, child) in map {
                let child_path = format!("{path}.{name}");
                children.push((name.clone(), load_node(child, &child_path)?));
            }
            Ok(FieldSpec::Composite(children))
        }
    }
}

fn load_leaf(
    value: &Json,
    ty: &Json,
    introduced: &Json,
    len: usize,
    path: &str,
) -> Result<LeafSpec, SchemaError> {
    let tag = ty.as_str().ok_or_else(|| SchemaError::UnknownType {
        path: path.to_string(),
        tag: ty.to_string(),
    })?;
    let ty = FieldType::from_tag(tag).ok_or_else(|| SchemaError::UnknownType {
        path: path.to_string(),
        tag: tag.to_string(),
    })?;

    if len == 0 {
        return Err(SchemaError::ZeroLength {
            path: path.to_string(),
        });
    }

    let introduced = introduced
        .as_str()
        .ok_or_else(|| SchemaError::NotAString {
            path: path.to_string(),
            key: INTRODUCED_KEYS[0],
            value: introduced.to_string(),
        })
        .and_then(|s| {
            Version::parse(s).map_err(|source| SchemaError::BadVersion {
                path: path.to_string(),
                source,
            })
        })?;

    let literal = match value {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => (*b as u8).to_string(),
        other => {
            return Err(SchemaError::NotAString {
                path: path.to_string(),
                key: VALUE_KEYS[0],
                value: other.to_string(),
            });
        }
    };
    let default = ty
        .parse_literal(&literal, len)
        .map_err(|source| SchemaError::BadLiteral {
            path: path.to_string(),
            source,
        })?;

    Ok(LeafSpec {
        ty,
        len,
        introduced,
        default,
    })
}

fn find<'a>(map: &'a Map<String, Json>, keys: &[&str]) -> Option<&'a Json> {
    keys.iter().find_map(|key| map.get(*key))
}

/// Integer-valued key; accepts a JSON number or a decimal string
fn integer(value: &Json, path: &str, key: &'static str) -> Result<usize, SchemaError> {
    let parsed = match value {
        Json::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SchemaError::NotAnInteger {
        path: path.to_string(),
        key,
        value: value.to_string(),
    })
}
