use std::io;

use thiserror::Error;

/// Errors reported by the MP3 decoder, encoder and sample buffer.
#[derive(Error, Debug)]
pub enum Error {
    /// The first chunk of the stream carries no MPEG sync word or ID3 tag.
    #[error("mp3: invalid file format")]
    InvalidFormat,

    #[error("mp3: invalid params: {0}")]
    InvalidParams(String),

    /// The native encoder rejected its configuration.
    #[error("mp3: failed to initialize encoder (status {0})")]
    InitFailed(i32),

    /// A native decode, encode or flush call failed.
    #[error("mp3: {op} failed (status {status})")]
    Engine { op: &'static str, status: i32 },

    /// The engine produced samples without reporting a parsed header.
    #[error("mp3: failed to parse header")]
    HeaderParse,

    #[error("mp3: no audio data")]
    NoAudioData,

    #[error("mp3: no header found")]
    NoHeader,

    #[error("mp3: io error: {0}")]
    Io(#[from] io::Error),

    /// The named instance was used after `close`.
    #[error("mp3: {0} is closed")]
    Closed(&'static str),

    #[error("mp3: sample buffer cannot hold {required} samples")]
    CapacityOverflow { required: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            e @ (Error::InvalidFormat | Error::InvalidParams(_)) => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            other => io::Error::other(other),
        }
    }
}
