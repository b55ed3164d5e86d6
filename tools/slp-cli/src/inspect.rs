//! Inspect command - print a container's header and event counts

use anyhow::{Context, Result};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use slp_core::replay::{ContainerHeader, ContainerReader};
use slp_shared::EventCode;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Container to inspect (.slp)
    pub input: PathBuf,
}

/// Result of walking a container's event stream
#[derive(Debug, Default, PartialEq, Eq)]
struct EventSummary {
    counts: BTreeMap<u8, usize>,
    /// Bytes consumed, size table included
    consumed: usize,
    /// First code missing from the size table, if the walk stopped early
    unknown: Option<u8>,
}

fn summarize(header: &ContainerHeader, reader: &mut ContainerReader<'_>) -> Result<EventSummary> {
    let mut summary = EventSummary {
        consumed: header.sizes.encoded_len(),
        ..Default::default()
    };

    while summary.consumed < header.raw_length as usize {
        let code = reader.read_u8()?;
        let Some(size) = header.sizes.get(code) else {
            summary.unknown = Some(code);
            break;
        };
        reader.read_bytes(size as usize)?;
        *summary.counts.entry(code).or_default() += 1;
        summary.consumed += 1 + size as usize;
    }

    Ok(summary)
}

fn event_name(code: u8) -> &'static str {
    EventCode::from_code(code).map_or("unknown", |c| c.name())
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let data = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read: {}", args.input.display()))?;

    let mut reader = ContainerReader::new(&data);
    let header = ContainerHeader::read(&mut reader)
        .with_context(|| format!("Invalid container: {}", args.input.display()))?;
    let summary = summarize(&header, &mut reader)
        .with_context(|| format!("Truncated container: {}", args.input.display()))?;

    println!("=== {} ===", args.input.display());
    println!("Raw length: {} bytes", header.raw_length);
    println!("File size: {} bytes", data.len());
    println!();
    println!("Payload sizes:");
    for (code, size) in header.sizes.iter() {
        println!("  0x{:02x} {:<20} {:>6} bytes", code, event_name(code), size);
    }
    println!();
    println!("Events:");
    for (code, count) in &summary.counts {
        println!("  0x{:02x} {:<20} {:>6}", code, event_name(*code), count);
    }

    if let Some(code) = summary.unknown {
        println!();
        println!("Stopped at unknown event 0x{:02x}", code);
    } else if summary.consumed != header.raw_length as usize {
        anyhow::bail!(
            "Event sizes overrun the declared raw length ({} > {})",
            summary.consumed,
            header.raw_length
        );
    }

    Ok(())
}
