//! Value trees
//!
//! A [`ValueNode`] tree is one concrete instantiation of a [`FieldSpec`] tree.
//! Arrays are expanded into owned elements, so every element is an independent
//! deep copy: overriding a leaf in one element never affects its siblings.
//! Leaves keep their introduced-version so gating happens at size/write time.

use crate::schema::{FieldSpec, FieldType, LeafSpec, Scalar, Value, ValueError};
use crate::version::Version;

/// Leaf with a concrete value.
///
/// The value always holds exactly `len` items of `ty`; it only changes
/// through [`set`](Self::set).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLeaf {
    ty: FieldType,
    len: usize,
    introduced: Version,
    value: Value,
}

impl ValueLeaf {
    fn from_spec(spec: &LeafSpec) -> Self {
        Self {
            ty: spec.ty,
            len: spec.len,
            introduced: spec.introduced,
            value: spec.default.clone(),
        }
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    /// Repeat count
    pub fn repeat(&self) -> usize {
        self.len
    }

    pub fn introduced(&self) -> Version {
        self.introduced
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the value, narrowing `scalar` to this leaf's type
    pub fn set(&mut self, scalar: impl Into<Scalar>) -> Result<(), ValueError> {
        self.value = Value::from_scalar(self.ty, scalar.into(), self.len)?;
        Ok(())
    }

    /// Whether the leaf exists on the wire at `version`
    pub fn is_active(&self, version: Version) -> bool {
        self.introduced <= version
    }

    /// Bytes written for this leaf at `version`
    pub fn size_at(&self, version: Version) -> usize {
        if self.is_active(version) {
            self.ty.width() * self.len
        } else {
            0
        }
    }
}

/// Node of a value tree
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Leaf(ValueLeaf),
    /// Children in schema-declared order
    Composite(Vec<(String, ValueNode)>),
    /// Expanded array elements
    Array(Vec<ValueNode>),
}

impl ValueNode {
    /// Instantiate a schema node with its default values
    pub fn instantiate(spec: &FieldSpec) -> Self {
        match spec {
            FieldSpec::Leaf(leaf) => ValueNode::Leaf(ValueLeaf::from_spec(leaf)),
            FieldSpec::Composite(children) => ValueNode::Composite(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), ValueNode::instantiate(child)))
                    .collect(),
            ),
            FieldSpec::Array { template, count } => {
                let element = ValueNode::instantiate(template);
                ValueNode::Array(vec![element; *count])
            }
        }
    }

    /// Serialized size at `version`: sum of active leaf widths
    pub fn serialized_size(&self, version: Version) -> usize {
        match self {
            ValueNode::Leaf(leaf) => leaf.size_at(version),
            ValueNode::Composite(children) => children
                .iter()
                .map(|(_, child)| child.serialized_size(version))
                .sum(),
            ValueNode::Array(elements) => elements
                .iter()
                .map(|element| element.serialized_size(version))
                .sum(),
        }
    }

    /// First leaf written at `version`, in write order
    pub fn first_active_leaf(&self, version: Version) -> Option<&ValueLeaf> {
        match self {
            ValueNode::Leaf(leaf) => leaf.is_active(version).then_some(leaf),
            ValueNode::Composite(children) => children
                .iter()
                .find_map(|(_, child)| child.first_active_leaf(version)),
            ValueNode::Array(elements) => elements
                .iter()
                .find_map(|element| element.first_active_leaf(version)),
        }
    }

    /// Named child of a composite
    pub fn child(&self, name: &str) -> Option<&ValueNode> {
        match self {
            ValueNode::Composite(children) => {
                children.iter().find(|(key, _)| key == name).map(|(_, c)| c)
            }
            _ => None,
        }
    }

    /// Mutable named child of a composite
    pub fn child_mut(&mut self, name: &str) -> Option<&mut ValueNode> {
        match self {
            ValueNode::Composite(children) => children
                .iter_mut()
                .find(|(key, _)| key == name)
                .map(|(_, c)| c),
            _ => None,
        }
    }

    /// Array element by index
    pub fn element(&self, index: usize) -> Option<&ValueNode> {
        match self {
            ValueNode::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Mutable array element by index
    pub fn element_mut(&mut self, index: usize) -> Option<&mut ValueNode> {
        match self {
            ValueNode::Array(elements) => elements.get_mut(index),
            _ => None,
        }
    }

    /// Resolve a dotted path such as `gameinfoblock.playerdata[2].teamid`
    pub fn get(&self, path: &str) -> Option<&ValueNode> {
        let mut node = self;
        for segment in path.split('.') {
            let (name, index) = parse_segment(segment)?;
            if !name.is_empty() {
                node = node.child(name)?;
            }
            if let Some(index) = index {
                node = node.element(index)?;
            }
        }
        Some(node)
    }

    /// Mutable variant of [`get`](Self::get)
    pub fn get_mut(&mut self, path: &str) -> Option<&mut ValueNode> {
        let mut node = self;
        for segment in path.split('.') {
            let (name, index) = parse_segment(segment)?;
            if !name.is_empty() {
                node = node.child_mut(name)?;
            }
            if let Some(index) = index {
                node = node.element_mut(index)?;
            }
        }
        Some(node)
    }

    /// Leaf at `path`, if the path resolves to a leaf
    pub fn leaf(&self, path: &str) -> Option<&ValueLeaf> {
        match self.get(path)? {
            ValueNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Mutable leaf at `path`
    pub fn leaf_mut(&mut self, path: &str) -> Option<&mut ValueLeaf> {
        match self.get_mut(path)? {
            ValueNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/// Split `name[3]` into (`name`, Some(3)); `name` into (`name`, None)
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    if segment.is_empty() {
        return None;
    }
    match segment.find('[') {
        Some(open) => {
            let index = segment[open + 1..].strip_suffix(']')?.parse().ok()?;
            Some((&segment[..open], Some(index)))
        }
        None => Some((segment, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn schema() -> Schema {
        Schema::from_json(
            r#"{
                "start": {
                    "commandbyte": { "value": "0x36", "type": "uint8", "introduced-version": "0.1.0" },
                    "playerdata": {
                        "template": {
                            "externalcharid": { "value": "0", "type": "uint8", "introduced-version": "0.1.0" },
                            "offense": { "value": "1.0", "type": "float32", "introduced-version": "0.1.0" }
                        },
                        "repetition-count": 4
                    },
                    "tag": { "value": "0", "type": "string-byte", "introduced-version": "1.3.0", "len": 8 },
                    "late": { "value": "0", "type": "uint32", "introduced-version": "99.0.0" }
                }
            }"#,
        )
        .unwrap()
    }

    fn start() -> ValueNode {
        ValueNode::instantiate(schema().block("start").unwrap())
    }

    #[test]
    fn test_instantiate_expands_arrays() {
        let tree = start();
        let ValueNode::Array(players) = tree.get("playerdata").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(players.len(), 4);
        assert_eq!(
            tree.leaf("playerdata[3].offense").unwrap().value(),
            &Value::F32(1.0)
        );
    }

    #[test]
    fn test_array_copies_are_independent() {
        let mut tree = start();
        tree.leaf_mut("playerdata[1].externalcharid")
            .unwrap()
            .set(20u8)
            .unwrap();

        assert_eq!(
            tree.leaf("playerdata[1].externalcharid").unwrap().value(),
            &Value::U8(20)
        );
        for sibling in [0, 2, 3] {
            let path = format!("playerdata[{sibling}].externalcharid");
            assert_eq!(tree.leaf(&path).unwrap().value(), &Value::U8(0));
        }
    }

    #[test]
    fn test_serialized_size_respects_version() {
        let tree = start();
        // commandbyte + 4 * (u8 + f32)
        let base = 1 + 4 * 5;
        assert_eq!(tree.serialized_size(Version::new(1, 0, 0)), base);
        assert_eq!(tree.serialized_size(Version::new(1, 3, 0)), base + 8);
        assert_eq!(tree.serialized_size(Version::new(99, 0, 0)), base + 8 + 4);
    }

    #[test]
    fn test_path_resolution() {
        let tree = start();
        assert!(tree.leaf("commandbyte").is_some());
        assert!(tree.leaf("playerdata[4].externalcharid").is_none());
        assert!(tree.leaf("playerdata.externalcharid").is_none());
        assert!(tree.leaf("missing").is_none());
        assert!(tree.leaf("playerdata[x].offense").is_none());
        assert!(tree.leaf("").is_none());
        assert!(tree.leaf("playerdata").is_none());
    }

    #[test]
    fn test_leaf_set_rejects_out_of_range() {
        let mut tree = start();
        let leaf = tree.leaf_mut("commandbyte").unwrap();
        assert!(leaf.set(300i32).is_err());
        assert_eq!(leaf.value(), &Value::U8(0x36));
    }

    #[test]
    fn test_first_active_leaf() {
        let tree = start();
        let first = tree.first_active_leaf(Version::new(0, 1, 0)).unwrap();
        assert_eq!(first.ty(), FieldType::U8);
        assert_eq!(first.repeat(), 1);
        assert_eq!(first.value(), &Value::U8(0x36));
        assert!(tree.first_active_leaf(Version::new(0, 0, 9)).is_none());

        let tag = tree.leaf("tag").unwrap();
        assert_eq!(tag.introduced(), Version::new(1, 3, 0));
        assert_eq!(tag.repeat(), 8);
    }

    #[test]
    fn test_string_leaf_set_from_text() {
        let mut tree = start();
        tree.leaf_mut("tag").unwrap().set("FOX").unwrap();
        assert_eq!(
            tree.leaf("tag").unwrap().value(),
            &Value::Bytes(vec![b'F', b'O', b'X', 0, 0, 0, 0, 0])
        );
    }
}
