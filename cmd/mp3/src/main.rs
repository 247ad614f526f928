//! MP3 CLI - decode, encode and convert MP3 files.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConvertCommand, DecodeCommand, EncodeCommand, InfoCommand};

/// MP3 CLI - decode, encode and convert MP3 files.
///
/// Raw PCM on either side is interleaved 16-bit signed little-endian
/// (s16le), the layout the library produces and accepts.
#[derive(Parser)]
#[command(name = "mp3")]
#[command(about = "MP3 decode/encode/convert tool")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print stream information of an MP3 file
    Info(InfoCommand),
    /// Decode an MP3 file to raw s16le PCM
    Decode(DecodeCommand),
    /// Encode raw s16le PCM to MP3
    Encode(EncodeCommand),
    /// Decode an MP3 file and re-encode it with its own parameters
    Convert(ConvertCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise warnings, or debug with --verbose.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Info(cmd) => cmd.run(&cli),
        Commands::Decode(cmd) => cmd.run(&cli),
        Commands::Encode(cmd) => cmd.run(&cli),
        Commands::Convert(cmd) => cmd.run(&cli),
    }
}
