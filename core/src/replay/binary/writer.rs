//! Binary container writer
//!
//! Streams the header, value trees and opaque blobs in big-endian order.
//! Leaves whose introduced-version is newer than the active version are
//! skipped entirely.

use byteorder::{BigEndian, WriteBytesExt};
use slp_shared::SLP_MAGIC;
use std::io::{self, Write};

use super::{ContainerPrefix, EmbeddedBlob};
use crate::tree::{ValueLeaf, ValueNode};
use crate::version::Version;

/// Counts bytes that actually reach the inner writer
struct Counting<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for Counting<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writer for the binary container format
pub struct BinaryWriter<W: Write> {
    writer: Counting<W>,
    version: Version,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer gated at `version`
    pub fn new(writer: W, version: Version) -> Self {
        Self {
            writer: Counting {
                inner: writer,
                count: 0,
            },
            version,
        }
    }

    /// Active container version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Total bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.writer.count
    }

    /// Write magic, raw length and the payload-size table
    pub fn write_prefix(&mut self, prefix: &ContainerPrefix) -> io::Result<()> {
        self.writer.write_all(SLP_MAGIC)?;
        self.writer.write_u32::<BigEndian>(prefix.raw_length())?;
        self.writer.write_u8(prefix.table_code())?;
        self.writer.write_u8(prefix.table_size())?;
        for (code, size) in prefix.entries() {
            self.writer.write_u8(code)?;
            self.writer.write_u16::<BigEndian>(size)?;
        }
        Ok(())
    }

    /// Write every active leaf of `node` in declaration order
    pub fn write_node(&mut self, node: &ValueNode) -> io::Result<()> {
        match node {
            ValueNode::Leaf(leaf) => self.write_leaf(leaf),
            ValueNode::Composite(children) => {
                for (_, child) in children {
                    self.write_node(child)?;
                }
                Ok(())
            }
            ValueNode::Array(elements) => {
                for element in elements {
                    self.write_node(element)?;
                }
                Ok(())
            }
        }
    }

    fn write_leaf(&mut self, leaf: &ValueLeaf) -> io::Result<()> {
        if !leaf.is_active(self.version) {
            return Ok(());
        }
        leaf.value().write(&mut self.writer, leaf.repeat())
    }

    /// Write an opaque event verbatim
    pub fn write_blob(&mut self, blob: &EmbeddedBlob) -> io::Result<()> {
        self.writer.write_u8(blob.code)?;
        self.writer.write_all(&blob.payload)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer.inner
    }
}
