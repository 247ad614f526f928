//! CLI commands module.

mod convert;
mod decode;
mod encode;
mod info;
mod util;

pub use convert::ConvertCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use info::InfoCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
