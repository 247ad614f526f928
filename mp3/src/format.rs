//! PCM stream format descriptions.

use std::time::Duration;

use crate::error::{Error, Result};

/// Bytes per PCM sample. Only 16-bit signed samples are produced or accepted.
pub const SAMPLE_SIZE_BYTES: u32 = 2;

/// Channel count, sample rate and bit rate of an MP3 stream.
///
/// The bit rate is the encoder target in kbps; on the decode side it is the
/// value reported by the first parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    channels: u16,
    sample_rate: u32,
    bit_rate: u32,
}

impl AudioFormat {
    /// Creates a format, rejecting channel counts other than 1 or 2 and a
    /// zero sample rate.
    pub fn new(channels: u16, sample_rate: u32, bit_rate: u32) -> Result<Self> {
        if channels != 1 && channels != 2 {
            return Err(Error::InvalidParams(format!(
                "channels must be 1 or 2, got {}",
                channels
            )));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidParams("sample rate must be positive".to_string()));
        }
        Ok(Self {
            channels,
            sample_rate,
            bit_rate,
        })
    }

    /// Returns the number of channels (1 or 2).
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the bit rate in kbps.
    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    /// Returns the size of one sample in bytes (always 2).
    pub fn sample_size_bytes(&self) -> u32 {
        SAMPLE_SIZE_BYTES
    }

    /// Returns the size of one sample in bits (always 16).
    pub fn sample_size_bits(&self) -> u32 {
        SAMPLE_SIZE_BYTES * 8
    }

    /// Returns the size of one interleaved frame (one sample per channel)
    /// in bytes.
    pub fn frame_byte_size(&self) -> u32 {
        SAMPLE_SIZE_BYTES * self.channels as u32
    }

    /// Returns the playback duration of `samples` interleaved samples.
    pub fn duration(&self, samples: usize) -> Duration {
        let frames = samples as u64 / self.channels as u64;
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate as u64)
    }

    /// Derives the PCM layout crossing the decoder/encoder boundary.
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat {
            encoding: PcmEncoding::Signed,
            sample_rate: self.sample_rate,
            sample_size_bits: self.sample_size_bits(),
            channels: self.channels,
            frame_size: self.frame_byte_size(),
            frame_rate: self.sample_rate,
            big_endian: false,
        }
    }
}

/// Sample encoding of a [`PcmFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEncoding {
    Signed,
    Unsigned,
}

/// Full description of an uncompressed PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub encoding: PcmEncoding,
    /// Samples per second per channel.
    pub sample_rate: u32,
    pub sample_size_bits: u32,
    pub channels: u16,
    /// Bytes per interleaved frame.
    pub frame_size: u32,
    /// Frames per second; equal to the sample rate for PCM.
    pub frame_rate: u32,
    pub big_endian: bool,
}

/// Read-only stream parameters shared by a live decoder and a finished
/// decode result.
///
/// Values are `-1` while unknown, which only happens on a decoder that has
/// not parsed a frame header yet.
pub trait Audio {
    /// Returns the number of channels, or -1 if unknown.
    fn channel_count(&self) -> i32;

    /// Returns the sample rate in Hz, or -1 if unknown.
    fn sample_rate(&self) -> i32;

    /// Returns the bit rate in kbps, or -1 if unknown.
    fn bit_rate(&self) -> i32;
}

impl Audio for AudioFormat {
    fn channel_count(&self) -> i32 {
        self.channels as i32
    }

    fn sample_rate(&self) -> i32 {
        self.sample_rate as i32
    }

    fn bit_rate(&self) -> i32 {
        self.bit_rate as i32
    }
}

/// Builds an [`AudioFormat`] from anything exposing [`Audio`] parameters.
///
/// Returns `None` while any parameter is still unknown or out of range.
pub fn audio_format<A: Audio + ?Sized>(audio: &A) -> Option<AudioFormat> {
    let channels = u16::try_from(audio.channel_count()).ok()?;
    let sample_rate = u32::try_from(audio.sample_rate()).ok()?;
    let bit_rate = u32::try_from(audio.bit_rate()).ok()?;
    AudioFormat::new(channels, sample_rate, bit_rate).ok()
}
