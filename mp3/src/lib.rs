//! Streaming MP3 decoding and encoding.
//!
//! This crate wraps frame-based native MP3 codecs (minimp3 for decoding,
//! LAME for encoding) in two streaming types:
//!
//! - [`Mp3Decoder`]: compressed bytes from any [`std::io::Read`] in, one
//!   frame of interleaved PCM samples out per call
//! - [`Mp3Encoder`]: interleaved PCM samples in, compressed bytes out to any
//!   [`std::io::Write`], with the mandatory flush on close
//!
//! PCM crossing the crate boundary is always interleaved 16-bit signed
//! samples (`L0 R0 L1 R1 ...` for stereo); the byte-level adapters use
//! little-endian order.
//!
//! # Whole-stream conversion
//!
//! ```no_run
//! use giztoy_mp3::{Audio, EncoderOptions, Quality, decode, encode};
//!
//! let pcm = vec![0i16; 48000];
//! let options = EncoderOptions::default()
//!     .with_sample_rate(48000)
//!     .with_quality(Quality::HIGH);
//! let mp3 = encode(&pcm, &options).unwrap();
//!
//! let audio = decode(mp3.as_slice()).unwrap();
//! assert_eq!(audio.sample_rate(), 48000);
//! assert_eq!(audio.channel_count(), 1);
//! ```
//!
//! # Streaming
//!
//! ```no_run
//! use giztoy_mp3::Mp3Decoder;
//! use std::fs::File;
//!
//! let decoder = Mp3Decoder::new(File::open("song.mp3").unwrap()).unwrap();
//! while let Some(samples) = decoder.decode_next_frame().unwrap() {
//!     println!("{} samples", samples.len());
//! }
//! decoder.close().unwrap();
//! ```
//!
//! # Sample buffers
//!
//! [`SampleBuffer`] accumulates an unbounded decoded stream with amortized
//! growth and fails explicitly instead of overflowing.

mod buffer;
mod decoder;
mod encoder;
pub mod engine;
mod error;
mod format;

pub use buffer::{MAX_SAMPLE_BUFFER_LEN, SampleBuffer};
pub use decoder::{
    DecodedAudio, DecoderState, MAGIC_BYTES, Mp3Decoder, READ_CHUNK_SIZE, decode, has_magic_bytes,
};
pub use encoder::{
    EncoderOptions, FLUSH_BUFFER_SIZE, Mp3Encoder, Quality, encode, mp3_buffer_size,
};
pub use error::{Error, Result};
pub use format::{Audio, AudioFormat, PcmEncoding, PcmFormat, SAMPLE_SIZE_BYTES, audio_format};
