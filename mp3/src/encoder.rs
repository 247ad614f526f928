//! Streaming MP3 encoder.

use std::fmt;
use std::io::{self, Write};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::engine::{EncodeEngine, LameEngine};
use crate::error::{Error, Result};
use crate::format::AudioFormat;

/// Size of the buffer handed to the final flush. LAME never emits more than
/// this from its internal buffers.
pub const FLUSH_BUFFER_SIZE: usize = 7200;

/// Returns the worst-case encoder output size for `num_samples` input
/// samples: `ceil(1.25 * num_samples + 7200)`.
pub fn mp3_buffer_size(num_samples: usize) -> usize {
    num_samples
        .saturating_add(num_samples.div_ceil(4))
        .saturating_add(FLUSH_BUFFER_SIZE)
}

/// Encoder quality, 0 (best, slowest) to 9 (worst, fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Best quality, slowest.
    pub const BEST: Quality = Quality(0);
    pub const HIGH: Quality = Quality(2);
    /// LAME's default trade-off.
    pub const MEDIUM: Quality = Quality(5);
    pub const LOW: Quality = Quality(7);
    /// Worst quality, fastest.
    pub const WORST: Quality = Quality(9);

    /// Returns the quality level if it is within `0..=9`.
    pub const fn new(level: u8) -> Option<Self> {
        if level <= 9 { Some(Self(level)) } else { None }
    }

    /// Returns the numeric quality level.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl TryFrom<i32> for Quality {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        u8::try_from(level)
            .ok()
            .and_then(Quality::new)
            .ok_or_else(|| Error::InvalidParams(format!("quality must be in 0..=9, got {}", level)))
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MP3 encoder options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Number of interleaved input channels, 1 or 2.
    pub channels: u16,
    /// Input sample rate in Hz.
    pub sample_rate: u32,
    /// Target bit rate in kbps.
    pub bit_rate: u32,
    pub quality: Quality,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bit_rate: 128,
            quality: Quality::MEDIUM,
        }
    }
}

impl EncoderOptions {
    /// Sets the number of input channels.
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the input sample rate in Hz.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the target bit rate in kbps.
    pub fn with_bit_rate(mut self, kbps: u32) -> Self {
        self.bit_rate = kbps;
        self
    }

    /// Sets the encoder quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Checks the options before any native resource is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.channels != 1 && self.channels != 2 {
            return Err(Error::InvalidParams(format!(
                "channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if self.sample_rate == 0 || self.sample_rate > i32::MAX as u32 {
            return Err(Error::InvalidParams(format!(
                "invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.bit_rate == 0 || self.bit_rate > i32::MAX as u32 {
            return Err(Error::InvalidParams(format!("invalid bit rate: {}", self.bit_rate)));
        }
        Ok(())
    }

    /// Returns the stream format these options describe.
    pub fn format(&self) -> Result<AudioFormat> {
        AudioFormat::new(self.channels, self.sample_rate, self.bit_rate)
    }
}

/// Streaming MP3 encoder.
///
/// PCM samples go in through [`Mp3Encoder::write`] as interleaved 16-bit
/// samples; compressed bytes are written to the sink as the native encoder
/// produces them. [`Mp3Encoder::close`] (or [`Mp3Encoder::finish`]) must be
/// called at the end: it flushes the frames the encoder still buffers, then
/// releases the native handle, then closes the sink, in that order.
///
/// Every operation holds the instance lock, so one encoder can be shared
/// between threads; calls are serialized.
///
/// # Example
///
/// ```no_run
/// use giztoy_mp3::{EncoderOptions, Mp3Encoder};
///
/// let options = EncoderOptions::default().with_sample_rate(48000);
/// let encoder = Mp3Encoder::new(Vec::new(), &options).unwrap();
/// encoder.write(&[0i16; 960]).unwrap();
/// let mp3 = encoder.finish().unwrap();
/// assert!(!mp3.is_empty());
/// ```
pub struct Mp3Encoder<W: Write, E: EncodeEngine = LameEngine> {
    inner: Mutex<EncoderInner<W, E>>,
}

struct EncoderInner<W, E> {
    writer: Option<W>,
    engine: Option<E>,
    channels: usize,
    mp3buf: Vec<u8>,
    /// Bytes written through `io::Write` that do not yet form a whole frame.
    pending: Vec<u8>,
}

impl<W: Write> Mp3Encoder<W> {
    /// Creates an encoder writing to `writer`.
    pub fn new(writer: W, options: &EncoderOptions) -> Result<Self> {
        Self::with_engine(writer, options, LameEngine::new)
    }

    /// Creates an encoder from integer parameters.
    ///
    /// `channels` must be 1 or 2 and `quality` within `0..=9`.
    pub fn open(
        writer: W,
        channels: i32,
        sample_rate: i32,
        bit_rate: i32,
        quality: i32,
    ) -> Result<Self> {
        let channels = u16::try_from(channels)
            .map_err(|_| Error::InvalidParams(format!("channels must be 1 or 2, got {}", channels)))?;
        let sample_rate = u32::try_from(sample_rate)
            .map_err(|_| Error::InvalidParams(format!("invalid sample rate: {}", sample_rate)))?;
        let bit_rate = u32::try_from(bit_rate)
            .map_err(|_| Error::InvalidParams(format!("invalid bit rate: {}", bit_rate)))?;
        let options = EncoderOptions {
            channels,
            sample_rate,
            bit_rate,
            quality: Quality::try_from(quality)?,
        };
        Self::new(writer, &options)
    }
}

impl<W: Write, E: EncodeEngine> Mp3Encoder<W, E> {
    /// Creates an encoder over the engine built by `make_engine`.
    ///
    /// `make_engine` only runs once the options have been validated.
    pub fn with_engine<F>(writer: W, options: &EncoderOptions, make_engine: F) -> Result<Self>
    where
        F: FnOnce(&EncoderOptions) -> Result<E>,
    {
        options.validate()?;
        let engine = make_engine(options)?;
        debug!(
            "mp3 encoder opened: channels={} sample_rate={} bit_rate={} quality={}",
            options.channels, options.sample_rate, options.bit_rate, options.quality
        );

        Ok(Self {
            inner: Mutex::new(EncoderInner {
                writer: Some(writer),
                engine: Some(engine),
                channels: options.channels as usize,
                mp3buf: Vec::new(),
                pending: Vec::new(),
            }),
        })
    }

    /// Returns true once the encoder has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().engine.is_none()
    }

    /// Encodes interleaved PCM samples and writes the produced bytes.
    ///
    /// `samples.len()` must be a multiple of the channel count. Returns the
    /// number of compressed bytes written to the sink.
    pub fn write(&self, samples: &[i16]) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.encode(samples)
    }

    /// Flushes buffered frames, releases the native encoder and closes the
    /// sink. Later calls do nothing.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.finalize().map(drop)
    }

    /// Runs the same protocol as [`Mp3Encoder::close`] but hands the sink
    /// back instead of dropping it.
    pub fn finish(self) -> Result<W> {
        let mut inner = self.inner.lock();
        inner.finalize()?.ok_or(Error::Closed("encoder"))
    }
}

impl<W: Write, E: EncodeEngine> EncoderInner<W, E> {
    fn encode(&mut self, samples: &[i16]) -> Result<usize> {
        let Self {
            writer,
            engine,
            channels,
            mp3buf,
            ..
        } = self;
        let (Some(writer), Some(engine)) = (writer.as_mut(), engine.as_mut()) else {
            return Err(Error::Closed("encoder"));
        };

        if samples.len() % *channels != 0 {
            return Err(Error::InvalidParams(format!(
                "input length {} is not a multiple of {} channels",
                samples.len(),
                channels
            )));
        }
        if samples.is_empty() {
            return Ok(0);
        }

        let required = mp3_buffer_size(samples.len()).saturating_mul(*channels);
        if mp3buf.len() < required {
            mp3buf.resize(required, 0);
        }

        let encoded = if *channels == 1 {
            engine.encode_mono(samples, mp3buf)?
        } else {
            engine.encode_interleaved(samples, mp3buf)?
        };
        trace!("mp3 encoded {} samples into {} bytes", samples.len(), encoded);

        if encoded > 0 {
            writer.write_all(&mp3buf[..encoded])?;
        }
        Ok(encoded)
    }

    /// Flush, release, close sink. Returns the sink on the first call and
    /// `None` afterwards.
    fn finalize(&mut self) -> Result<Option<W>> {
        let Some(mut engine) = self.engine.take() else {
            return Ok(None);
        };
        let writer = self.writer.take();

        if !self.pending.is_empty() {
            warn!(
                "mp3 encoder closed with {} bytes of an incomplete PCM frame; dropping them",
                self.pending.len()
            );
            self.pending.clear();
        }

        let mut flushed = [0u8; FLUSH_BUFFER_SIZE];
        let flushed_len = engine.flush(&mut flushed)?;

        let Some(mut writer) = writer else {
            return Ok(None);
        };
        writer.write_all(&flushed[..flushed_len])?;
        drop(engine);
        writer.flush()?;
        debug!("mp3 encoder closed, flushed {} bytes", flushed_len);

        Ok(Some(writer))
    }

    /// Encodes the complete frames in `pending` followed by `buf`, keeping
    /// any trailing partial frame for the next call.
    ///
    /// On failure `pending` is left as it was before the call, so none of
    /// `buf` counts as consumed.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        let frame_bytes = 2 * self.channels;
        let held = self.pending.len();
        self.pending.extend_from_slice(buf);
        let whole = self.pending.len() - self.pending.len() % frame_bytes;
        if whole == 0 {
            return Ok(());
        }

        let samples: Vec<i16> = self.pending[..whole]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        if let Err(e) = self.encode(&samples) {
            self.pending.truncate(held);
            return Err(e);
        }
        self.pending.drain(..whole);
        Ok(())
    }
}

impl<W: Write, E: EncodeEngine> Drop for Mp3Encoder<W, E> {
    fn drop(&mut self) {
        if self.inner.get_mut().engine.is_some() {
            warn!("mp3 encoder dropped without close; buffered audio is discarded");
        }
    }
}

/// Accepts interleaved 16-bit little-endian PCM bytes in any split.
impl<W: Write, E: EncodeEngine> Write for Mp3Encoder<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = self.inner.get_mut();
        if inner.engine.is_none() {
            return Err(Error::Closed("encoder").into());
        }
        inner.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.get_mut().writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Encodes a whole interleaved PCM buffer into an in-memory MP3 stream.
pub fn encode(samples: &[i16], options: &EncoderOptions) -> Result<Vec<u8>> {
    let encoder = Mp3Encoder::new(Vec::new(), options)?;
    encoder.write(samples)?;
    encoder.finish()
}
