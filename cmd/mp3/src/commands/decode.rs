//! MP3 to raw PCM command.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use giztoy_mp3::{AudioFormat, Mp3Decoder};

use super::{
    create_output, format_bytes, open_input, print_stream_info, print_success, print_verbose,
};
use crate::Cli;

/// Decode an MP3 file to raw s16le PCM.
#[derive(Args)]
pub struct DecodeCommand {
    /// MP3 file to decode
    input: PathBuf,

    /// Raw PCM output file
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl DecodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        print_verbose(
            cli,
            &format!("Decoding {} to {}", self.input.display(), self.output.display()),
        );

        let (format, written) = decode_file(&self.input, &self.output)?;
        if let Some(format) = format {
            print_stream_info(&format);
        }
        print_success(&format!(
            "PCM saved to: {} ({})",
            self.output.display(),
            format_bytes(written)
        ));
        Ok(())
    }
}

/// Streams `input` through the decoder's byte adapter into `output`.
///
/// Returns the stream format (if a header was found) and the PCM byte count.
pub(crate) fn decode_file(
    input: &Path,
    output: &Path,
) -> anyhow::Result<(Option<AudioFormat>, u64)> {
    let mut decoder = Mp3Decoder::new(open_input(input)?)
        .with_context(|| format!("failed to open decoder for {}", input.display()))?;
    let mut writer = create_output(output)?;

    let written = io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("failed to decode {}", input.display()))?;
    writer.flush()?;

    let format = decoder.format();
    decoder.close()?;
    Ok((format, written))
}
