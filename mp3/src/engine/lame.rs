//! Encode engine backed by LAME.

use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use mp3lame_sys::{
    MPEG_mode, lame_close, lame_encode_buffer, lame_encode_buffer_interleaved, lame_encode_flush,
    lame_global_flags, lame_init, lame_init_params, lame_set_bWriteVbrTag, lame_set_brate,
    lame_set_in_samplerate, lame_set_mode, lame_set_num_channels, lame_set_quality,
};

use super::EncodeEngine;
use crate::encoder::EncoderOptions;
use crate::error::{Error, Result};

/// MP3 encoder over a LAME `lame_global_flags` handle.
///
/// The handle is closed when the engine is dropped; callers flush first.
pub struct LameEngine {
    gfp: NonNull<lame_global_flags>,
}

// Safety: LAME handles carry no thread affinity and the engine has exclusive
// ownership of its handle.
unsafe impl Send for LameEngine {}

impl LameEngine {
    /// Creates a LAME handle configured from `options`.
    ///
    /// `options` must already be validated.
    pub fn new(options: &EncoderOptions) -> Result<Self> {
        let gfp = NonNull::new(unsafe { lame_init() }).ok_or(Error::InitFailed(-1))?;
        // From here on a failed configuration closes the handle via Drop.
        let engine = Self { gfp };
        let lame = engine.gfp.as_ptr();

        let mode = if options.channels == 1 {
            MPEG_mode::MONO
        } else {
            MPEG_mode::JOINT_STEREO
        };
        let status = unsafe {
            lame_set_num_channels(lame, options.channels as c_int);
            lame_set_in_samplerate(lame, options.sample_rate as c_int);
            lame_set_brate(lame, options.bit_rate as c_int);
            lame_set_mode(lame, mode);
            lame_set_quality(lame, options.quality.get() as c_int);
            // The tag frame can only be filled in by seeking back in the
            // output, which a plain writer cannot do.
            lame_set_bWriteVbrTag(lame, 0);
            lame_init_params(lame)
        };
        if status < 0 {
            return Err(Error::InitFailed(status));
        }

        Ok(engine)
    }

    fn check(op: &'static str, status: c_int) -> Result<usize> {
        if status < 0 {
            return Err(Error::Engine { op, status });
        }
        Ok(status as usize)
    }
}

impl Drop for LameEngine {
    fn drop(&mut self) {
        unsafe { lame_close(self.gfp.as_ptr()) };
    }
}

/// Converts a slice length to the `int` LAME expects.
fn c_len(len: usize, what: &str) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| Error::InvalidParams(format!("{} too large: {}", what, len)))
}

impl EncodeEngine for LameEngine {
    fn encode_mono(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        let nsamples = c_len(pcm.len(), "sample count")?;
        let out_len = out.len().min(c_int::MAX as usize) as c_int;
        let status = unsafe {
            lame_encode_buffer(
                self.gfp.as_ptr(),
                pcm.as_ptr(),
                ptr::null(),
                nsamples,
                out.as_mut_ptr(),
                out_len,
            )
        };
        Self::check("encode", status)
    }

    fn encode_interleaved(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        let nsamples = c_len(pcm.len() / 2, "sample count")?;
        let out_len = out.len().min(c_int::MAX as usize) as c_int;
        // LAME takes a mutable pointer but only reads the input.
        let status = unsafe {
            lame_encode_buffer_interleaved(
                self.gfp.as_ptr(),
                pcm.as_ptr() as *mut i16,
                nsamples,
                out.as_mut_ptr(),
                out_len,
            )
        };
        Self::check("encode", status)
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize> {
        let out_len = out.len().min(c_int::MAX as usize) as c_int;
        let status = unsafe { lame_encode_flush(self.gfp.as_ptr(), out.as_mut_ptr(), out_len) };
        Self::check("flush", status)
    }
}
