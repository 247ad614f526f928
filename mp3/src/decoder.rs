//! Streaming MP3 decoder.

use std::io::{self, Read};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::buffer::SampleBuffer;
use crate::engine::{DecodeEngine, FrameHeader, Minimp3Engine};
use crate::error::{Error, Result};
use crate::format::{Audio, AudioFormat};

/// Size of one read from the input source. The carry region never holds
/// more than this.
pub const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Byte sequences a stream must start with to be accepted: MPEG audio sync
/// words and the ID3v2 tag signature.
pub const MAGIC_BYTES: [&[u8]; 4] = [&[0xFF, 0xFB], &[0xFF, 0xF3], &[0xFF, 0xF2], b"ID3"];

/// Returns true if `data` starts with one of [`MAGIC_BYTES`].
pub fn has_magic_bytes(data: &[u8]) -> bool {
    MAGIC_BYTES.iter().any(|magic| data.starts_with(magic))
}

/// Header state of an [`Mp3Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No frame header has been decoded yet.
    HeaderUnparsed,
    /// Stream parameters are latched.
    HeaderParsed,
    /// Terminal; the native handle and input source are released.
    Closed,
}

/// Streaming MP3 decoder.
///
/// Each [`Mp3Decoder::decode_next_frame`] call decodes one frame from the
/// input, carrying undecoded bytes over to the next call, and returns the
/// frame's samples interleaved (`L0 R0 L1 R1 ...` for stereo).
///
/// Stream parameters are latched from the first decoded frame header and
/// stay fixed afterwards. Until then the [`Audio`] queries return -1.
///
/// Every operation holds the instance lock, so one decoder can be shared
/// between threads; calls are serialized.
pub struct Mp3Decoder<R: Read, E: DecodeEngine = Minimp3Engine> {
    inner: Mutex<DecoderInner<R, E>>,
}

struct DecoderInner<R, E> {
    reader: Option<R>,
    engine: Option<E>,
    /// Carried bytes occupy `input[..carry_len]`.
    input: Box<[u8]>,
    carry_len: usize,
    eof: bool,
    left: Box<[i16]>,
    right: Box<[i16]>,
    header: Option<FrameHeader>,
    /// Little-endian PCM not yet handed out by `io::Read`.
    pcm: Vec<u8>,
    pcm_pos: usize,
}

impl<R: Read> Mp3Decoder<R> {
    /// Opens a decoder over `reader`.
    ///
    /// Reads the first chunk and fails with [`Error::InvalidFormat`] if it
    /// does not start with a recognized magic byte sequence. An empty input
    /// is accepted and decodes to nothing.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_engine(reader, Minimp3Engine::new)
    }
}

impl<R: Read, E: DecodeEngine> Mp3Decoder<R, E> {
    /// Opens a decoder over the engine built by `make_engine`.
    ///
    /// `make_engine` only runs once the first chunk passed the format check.
    pub fn with_engine<F>(mut reader: R, make_engine: F) -> Result<Self>
    where
        F: FnOnce() -> E,
    {
        let mut input = vec![0u8; READ_CHUNK_SIZE].into_boxed_slice();
        let n = read_full(&mut reader, &mut input)?;
        if n > 0 && !has_magic_bytes(&input[..n]) {
            return Err(Error::InvalidFormat);
        }
        debug!("mp3 decoder opened, first chunk {} bytes", n);

        Ok(Self {
            inner: Mutex::new(DecoderInner {
                reader: Some(reader),
                engine: Some(make_engine()),
                input,
                carry_len: n,
                eof: n < READ_CHUNK_SIZE,
                left: vec![0; E::MAX_SAMPLES_PER_CHANNEL].into_boxed_slice(),
                right: vec![0; E::MAX_SAMPLES_PER_CHANNEL].into_boxed_slice(),
                header: None,
                pcm: Vec::new(),
                pcm_pos: 0,
            }),
        })
    }

    /// Decodes the next frame.
    ///
    /// Returns `Ok(None)` at end of stream. A returned chunk may be empty
    /// when the engine skipped bytes without producing audio.
    pub fn decode_next_frame(&self) -> Result<Option<Vec<i16>>> {
        self.inner.lock().next_frame()
    }

    /// Returns true once a frame header has been parsed.
    pub fn header_parsed(&self) -> bool {
        self.inner.lock().header.is_some()
    }

    /// Returns the latched stream format, or `None` before the header is
    /// parsed.
    pub fn format(&self) -> Option<AudioFormat> {
        crate::format::audio_format(self)
    }

    pub fn state(&self) -> DecoderState {
        let inner = self.inner.lock();
        if inner.engine.is_none() {
            DecoderState::Closed
        } else if inner.header.is_some() {
            DecoderState::HeaderParsed
        } else {
            DecoderState::HeaderUnparsed
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().engine.is_none()
    }

    /// Releases the native decoder and closes the input source.
    ///
    /// Later calls do nothing. The latched header stays queryable.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.engine.take().is_some() {
            inner.reader = None;
            inner.carry_len = 0;
            inner.pcm.clear();
            inner.pcm_pos = 0;
            debug!("mp3 decoder closed");
        }
        Ok(())
    }

    /// Decodes the rest of the stream and closes the decoder.
    ///
    /// Fails with [`Error::NoAudioData`] if no samples were produced and
    /// with [`Error::NoHeader`] if no header was ever parsed. The decoder is
    /// closed on every path.
    pub fn decode_to_end(self) -> Result<DecodedAudio> {
        let mut buffer = SampleBuffer::with_capacity(2048);
        let drained = self.drain_into(&mut buffer);
        let closed = self.close();
        drained?;
        closed?;

        if buffer.is_empty() {
            return Err(Error::NoAudioData);
        }
        let header = self.inner.lock().header.ok_or(Error::NoHeader)?;
        let format = AudioFormat::new(header.channels, header.sample_rate, header.bit_rate)?;

        Ok(DecodedAudio {
            format,
            samples: buffer.finish(),
        })
    }

    fn drain_into(&self, buffer: &mut SampleBuffer) -> Result<()> {
        while let Some(samples) = self.decode_next_frame()? {
            buffer.append(&samples)?;
        }
        Ok(())
    }
}

impl<R: Read, E: DecodeEngine> DecoderInner<R, E> {
    fn next_frame(&mut self) -> Result<Option<Vec<i16>>> {
        let (Some(reader), Some(engine)) = (self.reader.as_mut(), self.engine.as_mut()) else {
            return Err(Error::Closed("decoder"));
        };

        if !self.eof && self.carry_len < self.input.len() {
            let n = read_full(reader, &mut self.input[self.carry_len..])?;
            self.eof = self.carry_len + n < self.input.len();
            self.carry_len += n;
        }

        let len = self.carry_len;
        if len == 0 {
            return Ok(None);
        }

        let frame = engine.decode_frame(&self.input[..len], &mut self.left, &mut self.right)?;
        if frame.samples > 0 && frame.header.is_none() {
            return Err(Error::HeaderParse);
        }
        if frame.consumed == 0 {
            if self.eof {
                warn!("mp3 decoder discarding {} trailing bytes", len);
                self.carry_len = 0;
                return Ok(None);
            }
            // A full chunk that yields nothing would stall forever.
            return Err(Error::Engine {
                op: "decode",
                status: 0,
            });
        }

        let consumed = frame.consumed.min(len);
        self.input.copy_within(consumed..len, 0);
        self.carry_len = len - consumed;

        if let Some(header) = frame.header {
            match self.header {
                None => {
                    debug!(
                        "mp3 header parsed: channels={} sample_rate={} bit_rate={}",
                        header.channels, header.sample_rate, header.bit_rate
                    );
                    self.header = Some(header);
                }
                Some(latched) if latched.channels != header.channels => {
                    warn!(
                        "mp3 frame has {} channels, stream header has {}",
                        header.channels, latched.channels
                    );
                }
                Some(_) => {}
            }
        }

        trace!(
            "mp3 decoded frame: samples={} consumed={} carried={}",
            frame.samples, consumed, self.carry_len
        );

        let n = frame.samples.min(self.left.len()).min(self.right.len());
        let frame_channels = frame.header.map_or(1, |h| h.channels);
        let stream_channels = self.header.map_or(frame_channels, |h| h.channels);
        // Output always follows the latched layout.
        let (left, right) = (&self.left[..n], &self.right[..n]);
        let samples = match (stream_channels, frame_channels) {
            (1, 1) => left.to_vec(),
            (1, _) => left
                .iter()
                .zip(right)
                .map(|(&l, &r)| ((l as i32 + r as i32) / 2) as i16)
                .collect(),
            (_, 1) => left.iter().flat_map(|&l| [l, l]).collect(),
            _ => left.iter().zip(right).flat_map(|(&l, &r)| [l, r]).collect(),
        };
        Ok(Some(samples))
    }
}

/// Reads until `buf` is full or the reader reports end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read, E: DecodeEngine> Audio for Mp3Decoder<R, E> {
    fn channel_count(&self) -> i32 {
        self.inner.lock().header.map_or(-1, |h| h.channels as i32)
    }

    fn sample_rate(&self) -> i32 {
        self.inner.lock().header.map_or(-1, |h| h.sample_rate as i32)
    }

    fn bit_rate(&self) -> i32 {
        self.inner.lock().header.map_or(-1, |h| h.bit_rate as i32)
    }
}

/// Yields the decoded stream as interleaved 16-bit little-endian PCM.
impl<R: Read, E: DecodeEngine> Read for Mp3Decoder<R, E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let inner = self.inner.get_mut();

        while inner.pcm_pos >= inner.pcm.len() {
            let Some(samples) = inner.next_frame()? else {
                return Ok(0);
            };
            inner.pcm.clear();
            inner.pcm_pos = 0;
            inner.pcm.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
        }

        let n = buf.len().min(inner.pcm.len() - inner.pcm_pos);
        buf[..n].copy_from_slice(&inner.pcm[inner.pcm_pos..inner.pcm_pos + n]);
        inner.pcm_pos += n;
        Ok(n)
    }
}

/// A fully decoded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    format: AudioFormat,
    samples: Vec<i16>,
}

impl DecodedAudio {
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels() as usize
    }

    pub fn duration(&self) -> Duration {
        self.format.duration(self.samples.len())
    }
}

impl Audio for DecodedAudio {
    fn channel_count(&self) -> i32 {
        self.format.channels() as i32
    }

    fn sample_rate(&self) -> i32 {
        self.format.sample_rate() as i32
    }

    fn bit_rate(&self) -> i32 {
        self.format.bit_rate() as i32
    }
}

/// Decodes a whole MP3 stream into memory.
pub fn decode<R: Read>(reader: R) -> Result<DecodedAudio> {
    Mp3Decoder::new(reader)?.decode_to_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DecodedFrame;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Frame layout understood by [`FakeEngine`]:
    /// `FF FB channels count`, then `count` bytes per channel (planar).
    /// Bytes before a sync word are skipped as junk.
    fn fake_frame(channels: u8, values: &[u8]) -> Vec<u8> {
        let count = values.len() / channels as usize;
        let mut frame = vec![0xFF, 0xFB, channels, count as u8];
        frame.extend_from_slice(values);
        frame
    }

    #[derive(Default)]
    struct FakeEngine {
        releases: Option<Arc<AtomicUsize>>,
    }

    impl DecodeEngine for FakeEngine {
        const MAX_SAMPLES_PER_CHANNEL: usize = 255;

        fn decode_frame(
            &mut self,
            input: &[u8],
            left: &mut [i16],
            right: &mut [i16],
        ) -> Result<DecodedFrame> {
            if let Some(skip) = input.iter().position(|&b| b == 0xFF) {
                if skip > 0 {
                    return Ok(DecodedFrame {
                        consumed: skip,
                        ..Default::default()
                    });
                }
            } else {
                return Ok(DecodedFrame {
                    consumed: input.len(),
                    ..Default::default()
                });
            }

            if input.len() < 4 {
                return Ok(DecodedFrame::default());
            }
            let channels = input[2] as usize;
            let count = input[3] as usize;
            let frame_bytes = 4 + channels * count;
            if input.len() < frame_bytes {
                return Ok(DecodedFrame::default());
            }

            let payload = &input[4..frame_bytes];
            for i in 0..count {
                left[i] = payload[i] as i16;
                if channels == 2 {
                    right[i] = -(payload[count + i] as i16);
                }
            }
            Ok(DecodedFrame {
                samples: count,
                consumed: frame_bytes,
                header: Some(FrameHeader {
                    channels: channels as u16,
                    sample_rate: 8000,
                    bit_rate: 64,
                    frame_bytes,
                }),
            })
        }
    }

    impl Drop for FakeEngine {
        fn drop(&mut self) {
            if let Some(releases) = &self.releases {
                releases.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Engine whose every call returns the same scripted outcome.
    struct FixedEngine(fn() -> Result<DecodedFrame>);

    impl DecodeEngine for FixedEngine {
        const MAX_SAMPLES_PER_CHANNEL: usize = 16;

        fn decode_frame(&mut self, _: &[u8], _: &mut [i16], _: &mut [i16]) -> Result<DecodedFrame> {
            (self.0)()
        }
    }

    /// Reader handing out at most `step` bytes per call.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
        drops: Option<Arc<AtomicUsize>>,
    }

    impl Trickle {
        fn new(data: Vec<u8>, step: usize) -> Self {
            Self {
                data: Cursor::new(data),
                step,
                drops: None,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.data.read(&mut buf[..n])
        }
    }

    impl Drop for Trickle {
        fn drop(&mut self) {
            if let Some(drops) = &self.drops {
                drops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn fake_decoder<R: Read>(reader: R) -> Mp3Decoder<R, FakeEngine> {
        Mp3Decoder::with_engine(reader, FakeEngine::default).unwrap()
    }

    fn drain<R: Read, E: DecodeEngine>(decoder: &Mp3Decoder<R, E>) -> Vec<i16> {
        let mut out = Vec::new();
        while let Some(chunk) = decoder.decode_next_frame().unwrap() {
            out.extend(chunk);
        }
        out
    }

    #[test]
    fn test_magic_bytes() {
        assert!(has_magic_bytes(&[0xFF, 0xFB, 0x90]));
        assert!(has_magic_bytes(&[0xFF, 0xF3]));
        assert!(has_magic_bytes(&[0xFF, 0xF2]));
        assert!(has_magic_bytes(b"ID3\x04"));
        assert!(!has_magic_bytes(&[0xFF]));
        assert!(!has_magic_bytes(&[0xFF, 0xFA]));
        assert!(!has_magic_bytes(b"RIFF"));
    }

    #[test]
    fn test_invalid_format_skips_engine() {
        let built = Cell::new(false);
        let result = Mp3Decoder::with_engine(Cursor::new(b"RIFF....WAVE".to_vec()), || {
            built.set(true);
            FakeEngine::default()
        });
        assert!(matches!(result, Err(Error::InvalidFormat)));
        assert!(!built.get());
    }

    #[test]
    fn test_empty_input() {
        let decoder = fake_decoder(Cursor::new(Vec::new()));
        assert_eq!(decoder.state(), DecoderState::HeaderUnparsed);
        assert!(decoder.decode_next_frame().unwrap().is_none());
        assert!(!decoder.header_parsed());
        decoder.close().unwrap();
        assert_eq!(decoder.state(), DecoderState::Closed);
    }

    #[test]
    fn test_header_latched_on_first_frame() {
        let mut data = fake_frame(1, &[1, 2, 3]);
        data.extend(fake_frame(1, &[4, 5]));
        let decoder = fake_decoder(Cursor::new(data));

        assert_eq!(decoder.channel_count(), -1);
        assert_eq!(decoder.sample_rate(), -1);
        assert_eq!(decoder.bit_rate(), -1);
        assert!(decoder.format().is_none());

        assert_eq!(decoder.decode_next_frame().unwrap(), Some(vec![1, 2, 3]));
        assert!(decoder.header_parsed());
        assert_eq!(decoder.state(), DecoderState::HeaderParsed);
        assert_eq!(decoder.channel_count(), 1);
        assert_eq!(decoder.sample_rate(), 8000);
        assert_eq!(decoder.bit_rate(), 64);
        assert_eq!(decoder.format().unwrap().sample_rate(), 8000);

        assert_eq!(decoder.decode_next_frame().unwrap(), Some(vec![4, 5]));
        assert!(decoder.decode_next_frame().unwrap().is_none());
    }

    #[test]
    fn test_stereo_interleaved() {
        let data = fake_frame(2, &[1, 2, 3, 10, 20, 30]);
        let decoder = fake_decoder(Cursor::new(data));
        assert_eq!(
            decoder.decode_next_frame().unwrap(),
            Some(vec![1, -10, 2, -20, 3, -30])
        );
        assert_eq!(decoder.channel_count(), 2);
    }

    #[test]
    fn test_channel_change_follows_latched_layout() {
        let mut data = fake_frame(2, &[1, 2, 3, 4]);
        data.extend(fake_frame(1, &[7, 8]));
        let decoder = fake_decoder(Cursor::new(data.clone()));
        assert_eq!(drain(&decoder), vec![1, -3, 2, -4, 7, 7, 8, 8]);
        assert_eq!(decoder.channel_count(), 2);

        let mut data = fake_frame(1, &[5]);
        data.extend(fake_frame(2, &[10, 4]));
        let decoder = fake_decoder(Cursor::new(data));
        assert_eq!(drain(&decoder), vec![5, 3]);
        assert_eq!(decoder.channel_count(), 1);
    }

    #[test]
    fn test_carry_over_across_chunks() {
        // 104-byte frames never line up with the 16 KiB chunk boundary.
        let mut data = Vec::new();
        let mut expected = Vec::new();
        for i in 0..400u32 {
            let values: Vec<u8> = (0..100).map(|j| ((i + j) % 200) as u8).collect();
            expected.extend(values.iter().map(|&v| v as i16));
            data.extend(fake_frame(1, &values));
        }
        assert!(data.len() > 2 * READ_CHUNK_SIZE);

        let decoder = fake_decoder(Trickle::new(data, 777));
        assert_eq!(drain(&decoder), expected);
    }

    #[test]
    fn test_junk_is_skipped() {
        let mut data = b"ID3\x03\x00junk".to_vec();
        data.extend(fake_frame(1, &[9, 8]));
        let decoder = fake_decoder(Cursor::new(data));

        assert_eq!(decoder.decode_next_frame().unwrap(), Some(vec![]));
        assert!(!decoder.header_parsed());
        assert_eq!(decoder.decode_next_frame().unwrap(), Some(vec![9, 8]));
    }

    #[test]
    fn test_truncated_tail_discarded() {
        let mut data = fake_frame(1, &[1, 2]);
        let partial = fake_frame(1, &[3, 4, 5]);
        data.extend_from_slice(&partial[..5]);
        let decoder = fake_decoder(Cursor::new(data));

        assert_eq!(drain(&decoder), vec![1, 2]);
        assert!(decoder.decode_next_frame().unwrap().is_none());
    }

    #[test]
    fn test_no_progress_on_full_chunk() {
        let mut data = vec![0xFF, 0xFB];
        data.resize(READ_CHUNK_SIZE + 100, 0);
        let decoder =
            Mp3Decoder::with_engine(Cursor::new(data), || FixedEngine(|| Ok(DecodedFrame::default())))
                .unwrap();
        let err = decoder.decode_next_frame().unwrap_err();
        assert!(matches!(err, Error::Engine { op: "decode", status: 0 }));
    }

    #[test]
    fn test_engine_failure_propagates() {
        let decoder = Mp3Decoder::with_engine(Cursor::new(vec![0xFF, 0xFB, 0, 0]), || {
            FixedEngine(|| Err(Error::Engine { op: "decode", status: -2 }))
        })
        .unwrap();
        let err = decoder.decode_next_frame().unwrap_err();
        assert!(matches!(err, Error::Engine { status: -2, .. }));
        assert!(!decoder.header_parsed());
    }

    #[test]
    fn test_samples_without_header() {
        let decoder = Mp3Decoder::with_engine(Cursor::new(vec![0xFF, 0xFB, 0, 0]), || {
            FixedEngine(|| {
                Ok(DecodedFrame {
                    samples: 4,
                    consumed: 4,
                    header: None,
                })
            })
        })
        .unwrap();
        assert!(matches!(decoder.decode_next_frame(), Err(Error::HeaderParse)));
    }

    #[test]
    fn test_close_releases_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let drops = Arc::new(AtomicUsize::new(0));
        let mut reader = Trickle::new(fake_frame(1, &[1]), 64);
        reader.drops = Some(Arc::clone(&drops));

        let engine_releases = Arc::clone(&releases);
        let decoder = Mp3Decoder::with_engine(reader, move || FakeEngine {
            releases: Some(engine_releases),
        })
        .unwrap();
        decoder.decode_next_frame().unwrap();

        decoder.close().unwrap();
        decoder.close().unwrap();
        drop(decoder);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_use_after_close() {
        let decoder = fake_decoder(Cursor::new(fake_frame(1, &[1, 2])));
        decoder.decode_next_frame().unwrap();
        decoder.close().unwrap();

        assert!(decoder.is_closed());
        assert!(matches!(decoder.decode_next_frame(), Err(Error::Closed("decoder"))));
        // Latched values survive close.
        assert_eq!(decoder.channel_count(), 1);
        assert_eq!(decoder.sample_rate(), 8000);
    }

    #[test]
    fn test_decode_to_end() {
        let mut data = fake_frame(2, &[1, 2, 3, 4]);
        data.extend(fake_frame(2, &[5, 6]));
        let audio = fake_decoder(Cursor::new(data)).decode_to_end().unwrap();

        assert_eq!(audio.samples(), &[1, -3, 2, -4, 5, -6]);
        assert_eq!(audio.frames(), 3);
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.bit_rate(), 64);
        assert_eq!(audio.duration(), Duration::from_micros(375));
        assert_eq!(audio.into_samples().len(), 6);
    }

    #[test]
    fn test_decode_to_end_no_audio() {
        let decoder = fake_decoder(Cursor::new(b"ID3 nothing here".to_vec()));
        assert!(matches!(decoder.decode_to_end(), Err(Error::NoAudioData)));

        let decoder = fake_decoder(Cursor::new(Vec::new()));
        assert!(matches!(decoder.decode_to_end(), Err(Error::NoAudioData)));
    }

    #[test]
    fn test_decode_to_end_closes_on_failure() {
        let releases = Arc::new(AtomicUsize::new(0));
        let engine_releases = Arc::clone(&releases);
        let decoder = Mp3Decoder::with_engine(Cursor::new(b"ID3".to_vec()), move || FakeEngine {
            releases: Some(engine_releases),
        })
        .unwrap();
        assert!(decoder.decode_to_end().is_err());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_io_read_little_endian() {
        let data = fake_frame(2, &[1, 2, 3, 4]);
        let mut decoder = fake_decoder(Cursor::new(data));

        let mut first = [0u8; 3];
        assert_eq!(decoder.read(&mut first).unwrap(), 3);
        let mut rest = Vec::new();
        decoder.read_to_end(&mut rest).unwrap();

        let mut bytes = first.to_vec();
        bytes.extend(rest);
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![1, -3, 2, -4]);
    }

    #[test]
    fn test_io_read_after_close() {
        let mut decoder = fake_decoder(Cursor::new(fake_frame(1, &[1])));
        decoder.close().unwrap();
        let mut buf = [0u8; 4];
        assert!(decoder.read(&mut buf).is_err());
    }

    #[test]
    fn test_decoder_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Mp3Decoder<Cursor<Vec<u8>>>>();
    }
}
