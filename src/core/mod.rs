// Core data model shared by the native parser and the container codec
pub mod sections;
pub mod types;

// Re-export commonly used types
pub use sections::{AcquisitionInfo, DataInfo, DeviceInfo, ImageInfo, PublicInfo};
pub use types::{CalibrationKind, Device, FileKind};
