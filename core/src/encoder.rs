//! Encoder facade
//!
//! Builds the trees, computes the prefix, writes everything in block order
//! (start, embedded blob, frame events, end) and verifies the declared
//! length against what was actually written.

use slp_shared::{HEADER_LEN, ReplayModel};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::EncoderConfig;
use crate::error::{EncodeError, Result};
use crate::replay::{BinaryWriter, EmbeddedBlob, TreeBuilder, extract_blob};
use crate::schema::Schema;

/// Writes replay models as `.slp` containers
pub struct Encoder {
    schema: Schema,
    config: EncoderConfig,
    blob: Option<EmbeddedBlob>,
}

impl Encoder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            config: EncoderConfig::default(),
            blob: None,
        }
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Carry `blob` verbatim right after the start block
    pub fn with_blob(mut self, blob: EmbeddedBlob) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn blob(&self) -> Option<&EmbeddedBlob> {
        self.blob.as_ref()
    }

    /// Encode to `writer`, returning the total bytes written
    pub fn encode_to<M, W>(&self, model: Option<&M>, writer: W) -> Result<u64>
    where
        M: ReplayModel + ?Sized,
        W: Write,
    {
        let built = TreeBuilder::new(&self.schema)
            .with_fallback_version(self.config.fallback_version)
            .build(model)?;
        let prefix = built.prefix(self.blob.as_ref())?;

        let mut out = BinaryWriter::new(writer, built.version);
        out.write_prefix(&prefix)?;
        out.write_node(&built.start)?;
        if let Some(blob) = &self.blob {
            out.write_blob(blob)?;
        }
        for event in &built.frames {
            out.write_node(&event.tree)?;
        }
        if let Some(end) = &built.end {
            out.write_node(end)?;
        }
        out.flush()?;

        let total = out.bytes_written();
        let declared = u64::from(prefix.raw_length());
        let written = total.saturating_sub(HEADER_LEN as u64);
        if written != declared {
            return Err(EncodeError::LengthMismatch { declared, written });
        }

        tracing::info!(
            "Encoded {} bytes at version {} ({} frame events, blob {})",
            total,
            built.version,
            built.frames.len(),
            if self.blob.is_some() { "embedded" } else { "none" }
        );
        Ok(total)
    }

    /// Encode into memory
    pub fn encode<M>(&self, model: Option<&M>) -> Result<Vec<u8>>
    where
        M: ReplayModel + ?Sized,
    {
        let mut bytes = Vec::new();
        self.encode_to(model, &mut bytes)?;
        Ok(bytes)
    }

    /// Encode to `path`, replacing any existing file.
    ///
    /// With `atomic_write` the container is written to a temporary file in
    /// the same directory and renamed into place only on success.
    pub fn write_file<M>(&self, model: Option<&M>, path: &Path) -> Result<u64>
    where
        M: ReplayModel + ?Sized,
    {
        if !self.config.atomic_write {
            let mut writer = BufWriter::new(File::create(path)?);
            let written = self.encode_to(model, &mut writer)?;
            writer.flush()?;
            return Ok(written);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropped (and removed) on every early return below
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        let written = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let written = self.encode_to(model, &mut writer)?;
            writer.flush()?;
            written
        };
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| EncodeError::Io(e.error))?;

        tracing::debug!("Wrote {}", path.display());
        Ok(written)
    }

    /// Load a previously captured container and extract the event `code`
    pub fn capture_blob(path: &Path, code: u8) -> Result<Option<EmbeddedBlob>> {
        let data = std::fs::read(path)?;
        let blob = extract_blob(&data, code)?;
        match &blob {
            Some(blob) => tracing::debug!(
                "Captured event 0x{:02x} ({} bytes) from {}",
                code,
                blob.len(),
                path.display()
            ),
            None => tracing::warn!("No event 0x{:02x} in {}", code, path.display()),
        }
        Ok(blob)
    }
}
