//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use giztoy_mp3::{Audio, Quality};

use crate::Cli;

/// Opens an input file for buffered reading.
pub fn open_input(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Creates (or truncates) an output file for buffered writing.
pub fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Parses a `--quality` value.
pub fn parse_quality(level: u8) -> anyhow::Result<Quality> {
    Quality::new(level).ok_or_else(|| anyhow::anyhow!("quality must be in 0..=9, got {}", level))
}

/// Prints the stream parameters of decoded audio.
pub fn print_stream_info(audio: &impl Audio) {
    print_info(&format!("Sample rate: {} Hz", audio.sample_rate()));
    print_info(&format!("Bit rate: {} kbps", audio.bit_rate()));
    print_info(&format!("Channels: {}", audio.channel_count()));
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints info message.
pub fn print_info(msg: &str) {
    eprintln!("\x1b[34mℹ\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Formats a duration as `m:ss.mmm`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    format!("{}:{:02}.{:03}", millis / 60_000, (millis / 1000) % 60, millis % 1000)
}
