//! Raw PCM to MP3 command.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use giztoy_mp3::{EncoderOptions, Mp3Encoder};

use super::{
    create_output, format_bytes, open_input, parse_quality, print_success, print_verbose,
    print_warning,
};
use crate::Cli;

/// Encode raw s16le PCM to MP3.
#[derive(Args)]
pub struct EncodeCommand {
    /// Raw interleaved s16le PCM file
    input: PathBuf,

    /// MP3 output file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Number of interleaved channels (1 or 2)
    #[arg(long, default_value_t = 1)]
    channels: u16,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Bit rate in kbps
    #[arg(long, default_value_t = 128)]
    bit_rate: u32,

    /// Quality, 0 (best) to 9 (fastest)
    #[arg(short = 'q', long, default_value_t = 5)]
    quality: u8,
}

impl EncodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let options = EncoderOptions::default()
            .with_channels(self.channels)
            .with_sample_rate(self.sample_rate)
            .with_bit_rate(self.bit_rate)
            .with_quality(parse_quality(self.quality)?);
        options.validate()?;
        print_verbose(cli, &format!("Encoder options: {:?}", options));

        let pcm_len = std::fs::metadata(&self.input)
            .with_context(|| format!("failed to stat {}", self.input.display()))?
            .len();
        let frame_bytes = 2 * u64::from(self.channels);
        if pcm_len % frame_bytes != 0 {
            print_warning(&format!(
                "input length {} is not a multiple of {} bytes; the trailing partial frame is dropped",
                pcm_len, frame_bytes
            ));
        }

        let written = encode_file(&self.input, &self.output, &options)?;
        print_success(&format!(
            "MP3 saved to: {} ({})",
            self.output.display(),
            format_bytes(written)
        ));
        Ok(())
    }
}

/// Counts bytes passing through to the inner writer.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streams raw PCM from `input` through the encoder's byte adapter.
///
/// Returns the number of MP3 bytes written.
pub(crate) fn encode_file(
    input: &Path,
    output: &Path,
    options: &EncoderOptions,
) -> anyhow::Result<u64> {
    let mut reader = open_input(input)?;
    let sink = CountingWriter {
        inner: create_output(output)?,
        count: 0,
    };
    let mut encoder = Mp3Encoder::new(sink, options).context("failed to create encoder")?;

    io::copy(&mut reader, &mut encoder)
        .with_context(|| format!("failed to encode {}", input.display()))?;
    let sink = encoder.finish().context("failed to finish encoding")?;
    Ok(sink.count)
}
