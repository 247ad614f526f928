//! Stream information command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use giztoy_mp3::Audio;

use super::{format_duration, open_input, print_verbose};
use crate::Cli;

/// Print stream information of an MP3 file.
///
/// The whole file is decoded, so sample count and duration are exact.
#[derive(Args)]
pub struct InfoCommand {
    /// MP3 file to inspect
    input: PathBuf,
}

impl InfoCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        print_verbose(cli, &format!("Decoding {}", self.input.display()));

        let audio = giztoy_mp3::decode(open_input(&self.input)?)
            .with_context(|| format!("failed to decode {}", self.input.display()))?;

        println!("sample rate: {} Hz", audio.sample_rate());
        println!("bit rate: {} kbps", audio.bit_rate());
        println!("channels: {}", audio.channel_count());
        println!("samples: {}", audio.samples().len());
        println!("frames: {}", audio.frames());
        println!("duration: {}", format_duration(audio.duration()));
        Ok(())
    }
}
