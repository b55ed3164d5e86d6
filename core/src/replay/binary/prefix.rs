//! Container prefix (magic, raw length, payload-size table)
//!
//! Sizes are computed from the value trees before anything is written, so
//! the header always agrees with the bytes that follow it.

use slp_shared::EventCode;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::{ContainerFormatError, EmbeddedBlob};
use crate::tree::ValueNode;
use crate::version::Version;

/// Largest number of table entries whose size byte still fits in a `u8`
const MAX_TABLE_ENTRIES: usize = (u8::MAX as usize - 1) / 3;

/// Accumulates payload sizes for every event that will be written
#[derive(Debug, Clone)]
pub struct PrefixBuilder {
    version: Version,
    sizes: BTreeMap<u8, u16>,
    events_len: usize,
}

impl PrefixBuilder {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            sizes: BTreeMap::new(),
            events_len: 0,
        }
    }

    /// Account for one schema block. Its first active leaf must be the
    /// one-byte command `code`, so the payload is everything after it.
    pub fn add_block(&mut self, code: u8, tree: &ValueNode) -> Result<(), ContainerFormatError> {
        let payload = tree
            .serialized_size(self.version)
            .checked_sub(1)
            .ok_or(ContainerFormatError::EmptyBlock(code))?;
        if !starts_with_command(tree, self.version, code) {
            return Err(ContainerFormatError::MissingCommandByte {
                code,
                version: self.version,
            });
        }
        self.add_event(code, payload)
    }

    /// Account for one opaque event
    pub fn add_blob(&mut self, blob: &EmbeddedBlob) -> Result<(), ContainerFormatError> {
        self.add_event(blob.code, blob.payload.len())
    }

    /// Account for one event of `code` with a `payload`-byte body.
    ///
    /// Every event sharing a code must share the payload size.
    pub fn add_event(&mut self, code: u8, payload: usize) -> Result<(), ContainerFormatError> {
        if code == EventCode::PayloadSizes.code() {
            return Err(ContainerFormatError::ReservedCode(code));
        }
        let size = u16::try_from(payload)
            .map_err(|_| ContainerFormatError::PayloadTooLarge { code, size: payload })?;

        match self.sizes.entry(code) {
            Entry::Vacant(entry) => {
                entry.insert(size);
            }
            Entry::Occupied(entry) if *entry.get() != size => {
                return Err(ContainerFormatError::InconsistentPayloadSize {
                    code,
                    declared: *entry.get(),
                    got: payload,
                });
            }
            Entry::Occupied(_) => {}
        }

        self.events_len += 1 + payload;
        Ok(())
    }

    pub fn finish(self) -> Result<ContainerPrefix, ContainerFormatError> {
        let entries = self.sizes.len();
        if entries > MAX_TABLE_ENTRIES {
            return Err(ContainerFormatError::PayloadTooLarge {
                code: EventCode::PayloadSizes.code(),
                size: 3 * entries + 1,
            });
        }

        let table_len = 2 + 3 * entries;
        let total = table_len + self.events_len;
        let raw_length = u32::try_from(total).map_err(|_| ContainerFormatError::TooLong(total))?;

        Ok(ContainerPrefix {
            sizes: self.sizes,
            raw_length,
        })
    }
}

fn starts_with_command(tree: &ValueNode, version: Version, code: u8) -> bool {
    let Some(leaf) = tree.first_active_leaf(version) else {
        return false;
    };
    let mut bytes = Vec::with_capacity(1);
    leaf.ty().width() * leaf.repeat() == 1
        && leaf.value().write(&mut bytes, leaf.repeat()).is_ok()
        && bytes == [code]
}

/// Finished header ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPrefix {
    sizes: BTreeMap<u8, u16>,
    raw_length: u32,
}

impl ContainerPrefix {
    /// Byte count of every event, the size table included
    pub fn raw_length(&self) -> u32 {
        self.raw_length
    }

    pub fn table_code(&self) -> u8 {
        EventCode::PayloadSizes.code()
    }

    /// Declared size byte of the table: three bytes per entry plus itself
    pub fn table_size(&self) -> u8 {
        (3 * self.sizes.len() + 1) as u8
    }

    /// Table entries in ascending code order
    pub fn entries(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        self.sizes.iter().map(|(code, size)| (*code, *size))
    }

    pub fn payload_size(&self, code: u8) -> Option<u16> {
        self.sizes.get(&code).copied()
    }

    /// Bytes the prefix occupies on the wire
    pub fn encoded_len(&self) -> usize {
        slp_shared::HEADER_LEN + 2 + 3 * self.sizes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn test_raw_length_counts_table_and_events() {
        let mut builder = PrefixBuilder::new(Version::default());
        builder.add_event(0x36, 0x140).unwrap();
        builder.add_event(0x37, 0x3F).unwrap();
        builder.add_event(0x37, 0x3F).unwrap();
        builder.add_event(0x39, 2).unwrap();
        let prefix = builder.finish().unwrap();

        let table = 2 + 3 * 3;
        let events = (1 + 0x140) + 2 * (1 + 0x3F) + (1 + 2);
        assert_eq!(prefix.raw_length() as usize, table + events);
        assert_eq!(prefix.table_size(), 10);
        assert_eq!((prefix.table_size() - 1) % 3, 0);
        assert_eq!(prefix.encoded_len(), slp_shared::HEADER_LEN + table);
    }

    #[test]
    fn test_entries_ascending() {
        let mut builder = PrefixBuilder::new(Version::default());
        builder.add_event(0x39, 1).unwrap();
        builder.add_event(0x3D, 8).unwrap();
        builder.add_event(0x36, 4).unwrap();
        let prefix = builder.finish().unwrap();
        let entries: Vec<_> = prefix.entries().collect();
        assert_eq!(entries, vec![(0x36, 4), (0x39, 1), (0x3D, 8)]);
        assert_eq!(prefix.payload_size(0x3D), Some(8));
        assert_eq!(prefix.payload_size(0x37), None);
    }

    #[test]
    fn test_inconsistent_sizes_rejected() {
        let mut builder = PrefixBuilder::new(Version::default());
        builder.add_event(0x37, 10).unwrap();
        assert_eq!(
            builder.add_event(0x37, 11),
            Err(ContainerFormatError::InconsistentPayloadSize {
                code: 0x37,
                declared: 10,
                got: 11
            })
        );
    }

    #[test]
    fn test_payload_too_large() {
        let mut builder = PrefixBuilder::new(Version::default());
        assert_eq!(
            builder.add_event(0x3D, 70_000),
            Err(ContainerFormatError::PayloadTooLarge {
                code: 0x3D,
                size: 70_000
            })
        );
    }

    #[test]
    fn test_reserved_code() {
        let mut builder = PrefixBuilder::new(Version::default());
        assert_eq!(
            builder.add_event(0x35, 1),
            Err(ContainerFormatError::ReservedCode(0x35))
        );
    }

    #[test]
    fn test_empty_block() {
        let mut builder = PrefixBuilder::new(Version::default());
        let tree = ValueNode::Composite(Vec::new());
        assert_eq!(
            builder.add_block(0x36, &tree),
            Err(ContainerFormatError::EmptyBlock(0x36))
        );
    }

    fn start_block(json: &str) -> ValueNode {
        let schema = Schema::from_json(json).unwrap();
        ValueNode::instantiate(schema.block("start").unwrap())
    }

    #[test]
    fn test_block_must_lead_with_command_byte() {
        let tree = start_block(
            r#"{
                "start": {
                    "commandbyte": { "value": "0x36", "type": "uint8", "introduced-version": "0.1.0" },
                    "major": { "value": "0", "type": "uint8", "introduced-version": "0.0.0" },
                    "seed": { "value": "0", "type": "uint32", "introduced-version": "0.0.0" }
                }
            }"#,
        );

        let mut builder = PrefixBuilder::new(Version::new(0, 1, 0));
        builder.add_block(0x36, &tree).unwrap();
        assert_eq!(builder.finish().unwrap().payload_size(0x36), Some(5));

        let gated = Version::new(0, 0, 5);
        let mut builder = PrefixBuilder::new(gated);
        assert_eq!(
            builder.add_block(0x36, &tree),
            Err(ContainerFormatError::MissingCommandByte {
                code: 0x36,
                version: gated
            })
        );

        let mut builder = PrefixBuilder::new(Version::new(0, 1, 0));
        assert!(matches!(
            builder.add_block(0x39, &tree),
            Err(ContainerFormatError::MissingCommandByte { code: 0x39, .. })
        ));
    }

    #[test]
    fn test_wide_leading_leaf_is_not_a_command_byte() {
        let tree = start_block(
            r#"{
                "start": {
                    "commandbyte": { "value": "0x0036", "type": "uint16", "introduced-version": "0.1.0" },
                    "seed": { "value": "0", "type": "uint32", "introduced-version": "0.1.0" }
                }
            }"#,
        );
        let mut builder = PrefixBuilder::new(Version::new(0, 1, 0));
        assert!(matches!(
            builder.add_block(0x36, &tree),
            Err(ContainerFormatError::MissingCommandByte { .. })
        ));
    }

    #[test]
    fn test_empty_container() {
        let prefix = PrefixBuilder::new(Version::default()).finish().unwrap();
        assert_eq!(prefix.raw_length(), 2);
        assert_eq!(prefix.table_size(), 1);
    }
}
