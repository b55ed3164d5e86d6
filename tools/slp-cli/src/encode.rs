//! Encode command - replay model dump → .slp container

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use slp_core::{Encoder, EncoderConfig, Game, Schema, Version};

/// Arguments for the encode command
#[derive(Args)]
pub struct EncodeArgs {
    /// Replay model dump (JSON); omit to write a defaults-only container
    pub model: Option<PathBuf>,

    /// Output container (.slp)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Field schema (JSON); defaults to the bundled schema
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Encoder config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Captured container to carry the embedded blob over from
    #[arg(long)]
    pub capture: Option<PathBuf>,

    /// Event code of the blob to carry over (overrides config)
    #[arg(long, value_parser = crate::parse_event_code)]
    pub blob_code: Option<u8>,

    /// Version used when the model has no build version (overrides config)
    #[arg(long)]
    pub fallback_version: Option<Version>,

    /// Write the output directly instead of through a temporary file
    #[arg(long)]
    pub no_atomic: bool,
}

/// Resolve the effective config: file first, then flag overrides
fn load_config(args: &EncodeArgs) -> Result<EncoderConfig> {
    let mut config = match &args.config {
        Some(path) => EncoderConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EncoderConfig::default(),
    };
    if let Some(code) = args.blob_code {
        config.blob_code = code;
    }
    if let Some(version) = args.fallback_version {
        config.fallback_version = Some(version);
    }
    if args.no_atomic {
        config.atomic_write = false;
    }
    Ok(config)
}

/// Execute the encode command
pub fn execute(args: EncodeArgs) -> Result<()> {
    let config = load_config(&args)?;

    let schema = match &args.schema {
        Some(path) => Schema::from_file(path)
            .with_context(|| format!("Failed to load schema: {}", path.display()))?,
        None => Schema::bundled().context("Failed to load bundled schema")?,
    };

    let game = match &args.model {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read model: {}", path.display()))?;
            let game = Game::from_json(&json)
                .with_context(|| format!("Failed to parse model: {}", path.display()))?;
            Some(game)
        }
        None => None,
    };

    let blob_code = config.blob_code;
    let mut encoder = Encoder::new(schema).with_config(config);
    if let Some(capture) = &args.capture {
        let blob = Encoder::capture_blob(capture, blob_code)
            .with_context(|| format!("Failed to read capture: {}", capture.display()))?;
        match blob {
            Some(blob) => encoder = encoder.with_blob(blob),
            None => tracing::warn!(
                "Capture {} has no event 0x{:02x}; writing without it",
                capture.display(),
                blob_code
            ),
        }
    }

    println!("Encoding: {}", args.output.display());

    let written = encoder
        .write_file(game.as_ref(), &args.output)
        .with_context(|| format!("Failed to encode {}", args.output.display()))?;

    println!();
    println!("=== Encoding Complete ===");
    println!("Bytes: {}", written);
    println!(
        "Frames: {}",
        game.as_ref().map(|g| g.frames.len()).unwrap_or(0)
    );
    if let Some(blob) = encoder.blob() {
        println!("Blob: 0x{:02x} ({} bytes)", blob.code, blob.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output: PathBuf) -> EncodeArgs {
        EncodeArgs {
            model: None,
            output,
            schema: None,
            config: None,
            capture: None,
            blob_code: None,
            fallback_version: None,
            no_atomic: false,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("encoder.toml");
        std::fs::write(&config_path, "blob_code = 0x3E\nfallback_version = \"1.0.0\"\n").unwrap();

        let mut args = args(dir.path().join("out.slp"));
        args.config = Some(config_path);
        args.fallback_version = Some(Version::new(2, 0, 0));
        args.no_atomic = true;

        let config = load_config(&args).unwrap();
        assert_eq!(config.blob_code, 0x3E);
        assert_eq!(config.fallback_version, Some(Version::new(2, 0, 0)));
        assert!(!config.atomic_write);
    }

    #[test]
    fn test_encode_defaults_only() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.slp");
        execute(args(output.clone())).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..slp_shared::SLP_MAGIC.len()], slp_shared::SLP_MAGIC);
    }

    #[test]
    fn test_missing_model_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path().join("out.slp"));
        args.model = Some(dir.path().join("missing.json"));
        let err = execute(args).unwrap_err();
        assert!(format!("{err}").contains("missing.json"));
    }
}
