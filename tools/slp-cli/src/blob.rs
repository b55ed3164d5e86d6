//! Blob command - extract one embedded event from a captured container

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use slp_core::Encoder;

/// Arguments for the blob command
#[derive(Args)]
pub struct BlobArgs {
    /// Captured container (.slp)
    pub capture: PathBuf,

    /// Event code to extract
    #[arg(long, default_value = "0x3D", value_parser = crate::parse_event_code)]
    pub code: u8,

    /// Write the raw event (code + payload) here instead of printing hex
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the blob command
pub fn execute(args: BlobArgs) -> Result<()> {
    let blob = Encoder::capture_blob(&args.capture, args.code)
        .with_context(|| format!("Failed to read capture: {}", args.capture.display()))?
        .with_context(|| {
            format!(
                "No event 0x{:02x} in {}",
                args.code,
                args.capture.display()
            )
        })?;

    let bytes = blob.to_bytes();
    match &args.output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write blob: {}", path.display()))?;
            println!(
                "Extracted 0x{:02x} ({} bytes) -> {}",
                blob.code,
                bytes.len(),
                path.display()
            );
        }
        None => println!("{}", hex::encode(&bytes)),
    }

    Ok(())
}
