//! Encoder configuration (TOML)
//!
//! ```toml
//! fallback_version = "3.4.0"
//! atomic_write = true
//! blob_code = 0x3D
//! ```
//!
//! Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::version::Version;

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Version used when the replay model carries no build version
    /// (default: the newest version the schema declares)
    #[serde(default)]
    pub fallback_version: Option<Version>,
    /// Write through a temporary file and rename on success (default: true)
    #[serde(default = "default_true")]
    pub atomic_write: bool,
    /// Event code of the blob carried over from a capture file (default: 0x3D)
    #[serde(default = "default_blob_code")]
    pub blob_code: u8,
}

fn default_true() -> bool {
    true
}
fn default_blob_code() -> u8 {
    slp_shared::EventCode::GeckoList.code()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            fallback_version: None,
            atomic_write: default_true(),
            blob_code: default_blob_code(),
        }
    }
}

/// Config file could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EncoderConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
