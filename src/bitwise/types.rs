// Byte-order selection for the parsing layer

use serde::{Deserialize, Serialize};

/// Byte order of multi-byte fields.
///
/// Scanner exports are little-endian unless configured otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endianness {
    Big,
    #[default]
    Little,
}
