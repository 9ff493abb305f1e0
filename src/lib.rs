// DPET-RS: Rust codec for PET scanner acquisition and container files
// Copyright 2024 - Licensed under GPLv3

pub mod bitwise;
pub mod core;
pub mod drivers;
pub mod formats;

// Re-export commonly used types
pub use bitwise::{ByteCursor, CursorError, Endianness};
pub use self::core::{
    AcquisitionInfo, CalibrationKind, DataInfo, Device, DeviceInfo, FileKind, ImageInfo,
    PublicInfo,
};
pub use drivers::CodecError;
pub use formats::{
    from_scan, parse_scan, parse_scan_file, read_scan, Body, DataSet, Dataset, DpetError, Header,
    ParseOptions, Payload, ScanError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
