//! Native codec engines behind the streaming decoder and encoder.
//!
//! The streaming types only talk to these traits:
//!
//! - [`DecodeEngine`]: one compressed frame in, planar PCM out
//! - [`EncodeEngine`]: PCM in, compressed bytes out, plus a final flush
//!
//! Engines own their native handle and release it in `Drop`, so a handle is
//! freed exactly once, when its owner goes away.

mod lame;
mod minimp3;

pub use lame::LameEngine;
pub use minimp3::Minimp3Engine;

use crate::error::Result;

/// Stream parameters read from an MPEG frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub channels: u16,
    pub sample_rate: u32,
    /// Bit rate in kbps.
    pub bit_rate: u32,
    /// Size of the frame in bytes, header included.
    pub frame_bytes: usize,
}

/// Result of one [`DecodeEngine::decode_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Samples written to each channel plane.
    pub samples: usize,
    /// Input bytes the engine is done with, skipped garbage included.
    pub consumed: usize,
    /// Header of the decoded frame, if one was parsed.
    pub header: Option<FrameHeader>,
}

/// A frame-based MP3 decoder.
pub trait DecodeEngine {
    /// Largest per-channel sample count one call can produce.
    const MAX_SAMPLES_PER_CHANNEL: usize;

    /// Decodes at most one frame from the start of `input`.
    ///
    /// Channel 0 goes to `left`; channel 1, if present, to `right`. Both must
    /// hold at least [`Self::MAX_SAMPLES_PER_CHANNEL`] samples.
    ///
    /// `consumed == 0` means no progress: the engine needs more input than
    /// `input` holds, and any samples reported are ignored.
    fn decode_frame(
        &mut self,
        input: &[u8],
        left: &mut [i16],
        right: &mut [i16],
    ) -> Result<DecodedFrame>;
}

/// A frame-based MP3 encoder.
///
/// Encoders buffer partial frames internally; [`EncodeEngine::flush`] must
/// run before the engine is dropped or that audio is lost.
pub trait EncodeEngine {
    /// Encodes mono samples, returning the number of bytes written to `out`.
    fn encode_mono(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize>;

    /// Encodes interleaved stereo samples (`L0 R0 L1 R1 ...`), returning the
    /// number of bytes written to `out`.
    fn encode_interleaved(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize>;

    /// Emits any buffered audio, returning the number of bytes written.
    fn flush(&mut self, out: &mut [u8]) -> Result<usize>;
}
