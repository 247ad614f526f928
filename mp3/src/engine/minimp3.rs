//! Decode engine backed by minimp3.

use std::mem;
use std::os::raw::c_int;

use minimp3_sys as ffi;

use super::{DecodeEngine, DecodedFrame, FrameHeader};
use crate::error::{Error, Result};

/// Maximum interleaved samples minimp3 writes for one frame (stereo).
const MAX_SAMPLES_PER_FRAME: usize = 1152 * 2;

/// MP3 decoder over minimp3's `mp3dec_decode_frame`.
///
/// minimp3 reports the bytes each call used (`frame_bytes`), including any
/// garbage it skipped while searching for a sync word, which is what the
/// streaming decoder needs to carry the remainder to the next call.
///
/// A LAME/Xing tag frame at the very start of the stream is reported with its
/// header but no samples, since it carries metadata rather than audio.
pub struct Minimp3Engine {
    dec: Box<ffi::mp3dec_t>,
    pcm: Box<[i16]>,
    first_frame: bool,
}

impl Minimp3Engine {
    /// Creates and initializes a new decoder.
    pub fn new() -> Self {
        // mp3dec_t is plain arrays and integers; all-zero is a valid value.
        let mut dec: Box<ffi::mp3dec_t> = Box::new(unsafe { mem::zeroed() });
        unsafe { ffi::mp3dec_init(&mut *dec) };
        Self {
            dec,
            pcm: vec![0i16; MAX_SAMPLES_PER_FRAME].into_boxed_slice(),
            first_frame: true,
        }
    }
}

impl Default for Minimp3Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeEngine for Minimp3Engine {
    const MAX_SAMPLES_PER_CHANNEL: usize = MAX_SAMPLES_PER_FRAME / 2;

    fn decode_frame(
        &mut self,
        input: &[u8],
        left: &mut [i16],
        right: &mut [i16],
    ) -> Result<DecodedFrame> {
        if left.len() < Self::MAX_SAMPLES_PER_CHANNEL || right.len() < Self::MAX_SAMPLES_PER_CHANNEL {
            return Err(Error::InvalidParams("output planes are too small".to_string()));
        }

        let input = &input[..input.len().min(c_int::MAX as usize)];
        let mut info: ffi::mp3dec_frame_info_t = unsafe { mem::zeroed() };
        let samples = unsafe {
            ffi::mp3dec_decode_frame(
                &mut *self.dec,
                input.as_ptr(),
                input.len() as c_int,
                self.pcm.as_mut_ptr(),
                &mut info,
            )
        };
        if samples < 0 {
            return Err(Error::Engine {
                op: "decode",
                status: samples,
            });
        }

        let consumed = (info.frame_bytes.max(0) as usize).min(input.len());
        // A skip over junk reports frame_bytes without channels or rate.
        let header = (info.frame_bytes > 0 && info.channels > 0 && info.hz > 0).then(|| FrameHeader {
            channels: info.channels as u16,
            sample_rate: info.hz as u32,
            bit_rate: info.bitrate_kbps.max(0) as u32,
            frame_bytes: info.frame_bytes as usize,
        });

        // frame_bytes also counts junk skipped before the sync word, such as an ID3 tag.
        let frame_start = (info.frame_offset.max(0) as usize).min(consumed);
        let mut samples = samples as usize;
        if samples > 0
            && mem::take(&mut self.first_frame)
            && is_tag_frame(&input[frame_start..consumed])
        {
            samples = 0;
        }
        match header.map(|h| h.channels) {
            Some(1) => left[..samples].copy_from_slice(&self.pcm[..samples]),
            Some(_) => {
                let frames = self.pcm[..samples * 2].chunks_exact(2);
                for ((l, r), frame) in left.iter_mut().zip(right.iter_mut()).zip(frames) {
                    *l = frame[0];
                    *r = frame[1];
                }
            }
            None => {}
        }

        Ok(DecodedFrame {
            samples,
            consumed,
            header,
        })
    }
}

/// Returns true if `frame` starts with a layer III frame whose side info is
/// followed by a `Xing` or `Info` tag.
fn is_tag_frame(frame: &[u8]) -> bool {
    if frame.len() < 4 || frame[0] != 0xFF || frame[1] & 0xE0 != 0xE0 {
        return false;
    }
    let layer3 = (frame[1] >> 1) & 0x03 == 0x01;
    let mpeg1 = frame[1] & 0x08 != 0;
    let crc = frame[1] & 0x01 == 0;
    let mono = frame[3] >> 6 == 0x03;
    if !layer3 {
        return false;
    }

    let side_info = match (mpeg1, mono) {
        (true, true) => 17,
        (true, false) => 32,
        (false, true) => 9,
        (false, false) => 17,
    };
    let offset = 4 + if crc { 2 } else { 0 } + side_info;
    matches!(frame.get(offset..offset + 4), Some(b"Xing") | Some(b"Info"))
}
