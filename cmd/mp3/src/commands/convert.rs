//! MP3 re-encode command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use giztoy_mp3::{DecodedAudio, EncoderOptions, Quality, decode, encode};

use super::{
    format_bytes, format_duration, open_input, parse_quality, print_info, print_stream_info,
    print_success, print_verbose,
};
use crate::Cli;

/// Decode an MP3 file and re-encode it.
///
/// The output keeps the channel count, sample rate and bit rate of the
/// input; only the encoder quality is configurable.
#[derive(Args)]
pub struct ConvertCommand {
    /// MP3 file to read
    input: PathBuf,

    /// MP3 file to write
    output: PathBuf,

    /// Quality, 0 (best) to 9 (fastest)
    #[arg(short = 'q', long, default_value_t = 5)]
    quality: u8,
}

impl ConvertCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let quality = parse_quality(self.quality)?;
        print_verbose(
            cli,
            &format!("Converting {} to {}", self.input.display(), self.output.display()),
        );

        let (audio, written) = convert_file(&self.input, &self.output, quality)?;

        print_stream_info(&audio);
        print_info(&format!("Length: {} samples", audio.samples().len()));
        print_info(&format!("Duration: {}", format_duration(audio.duration())));
        print_success(&format!(
            "MP3 saved to: {} ({})",
            self.output.display(),
            format_bytes(written)
        ));
        Ok(())
    }
}

/// Decodes `input` fully and encodes it to `output` with the decoded
/// stream's own parameters.
pub(crate) fn convert_file(
    input: &Path,
    output: &Path,
    quality: Quality,
) -> anyhow::Result<(DecodedAudio, u64)> {
    let audio = decode(open_input(input)?)
        .with_context(|| format!("failed to decode {}", input.display()))?;

    let format = audio.format();
    let options = EncoderOptions::default()
        .with_channels(format.channels())
        .with_sample_rate(format.sample_rate())
        .with_bit_rate(format.bit_rate())
        .with_quality(quality);
    tracing::debug!("re-encoding {} samples with {:?}", audio.samples().len(), options);
    let mp3 = encode(audio.samples(), &options).context("failed to encode")?;

    std::fs::write(output, &mp3)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok((audio, mp3.len() as u64))
}
