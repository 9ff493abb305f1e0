// Binary parsing layer shared by the native and container codecs

pub mod cursor;
pub mod types;

pub use cursor::{ByteCursor, CursorError};
pub use types::Endianness;
