// Per-device payload codecs

// Devices
pub mod d930;
pub mod e180;

use thiserror::Error;

use crate::bitwise::CursorError;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Incomplete(#[from] CursorError),

    #[error("detector block length {0} is not a multiple of the 16-byte record size")]
    InvalidBlockLength(u32),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Prefix of the acquisition network every scanner endpoint sits on.
const IP_PREFIX: &str = "192.168.";

/// Expand the two address octets carried on the wire into a dotted quad.
pub fn ip_string(value: u16) -> String {
    format!("{}{}.{}", IP_PREFIX, value >> 8, value & 0xFF)
}
