//! slp-write - Encode and inspect .slp replay containers
//!
//! # Commands
//!
//! - `slp-write encode` - Encode a replay model dump (JSON) into a container
//! - `slp-write blob` - Extract one embedded event from a captured container
//! - `slp-write inspect` - Print the header and event counts of a container
//!
//! # Usage
//!
//! ```bash
//! # Encode with the bundled schema, carrying the gecko list from a capture
//! slp-write encode game.json -o game.slp --capture template.slp
//!
//! # Dump the gecko list of a capture as hex
//! slp-write blob template.slp
//!
//! # Check what was written
//! slp-write inspect game.slp
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

mod blob;
mod encode;
mod inspect;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// slp-write - Schema-driven .slp container writer
#[derive(Parser)]
#[command(name = "slp-write")]
#[command(about = "Encode and inspect .slp replay containers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a replay model dump into a container
    Encode(encode::EncodeArgs),

    /// Extract one embedded event from a captured container
    Blob(blob::BlobArgs),

    /// Print the header and event counts of a container
    Inspect(inspect::InspectArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => encode::execute(args),
        Commands::Blob(args) => blob::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}

/// Parse an event code given as hex (`0x3D`) or decimal (`61`)
pub(crate) fn parse_event_code(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid event code '{s}' (expected 0x00-0xFF)"))
}
