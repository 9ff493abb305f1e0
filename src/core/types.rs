// Discriminants shared by the native parser and the container codec

use std::fmt;

use serde::{Deserialize, Serialize};

/// Device name written into 930 acquisition headers.
pub const DEVICE_NAME_930: &str = "DigitMI-930";
/// Device name written into E180 acquisition headers.
pub const DEVICE_NAME_E180: &str = "180";

/// Acquisition file type carried in the public header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    RawData,
    Listmode,
    Mich,
    EnergyCalibrationMap,
    TimeCalibrationMap,
    EnergySpectrum,
    PositionTable,
    EnergyMap,
}

impl FileKind {
    pub fn from_code(code: u16) -> Option<FileKind> {
        match code {
            0 => Some(FileKind::RawData),
            1 => Some(FileKind::Listmode),
            2 => Some(FileKind::Mich),
            3 => Some(FileKind::EnergyCalibrationMap),
            4 => Some(FileKind::TimeCalibrationMap),
            5 => Some(FileKind::EnergySpectrum),
            6 => Some(FileKind::PositionTable),
            7 => Some(FileKind::EnergyMap),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            FileKind::RawData => 0,
            FileKind::Listmode => 1,
            FileKind::Mich => 2,
            FileKind::EnergyCalibrationMap => 3,
            FileKind::TimeCalibrationMap => 4,
            FileKind::EnergySpectrum => 5,
            FileKind::PositionTable => 6,
            FileKind::EnergyMap => 7,
        }
    }

    /// True for the three event-stream types that have a record codec.
    pub fn has_payload_codec(&self) -> bool {
        matches!(self, FileKind::RawData | FileKind::Listmode | FileKind::Mich)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileKind::RawData => "raw data",
            FileKind::Listmode => "listmode",
            FileKind::Mich => "michelogram",
            FileKind::EnergyCalibrationMap => "energy calibration map",
            FileKind::TimeCalibrationMap => "time calibration map",
            FileKind::EnergySpectrum => "energy spectrum",
            FileKind::PositionTable => "position table",
            FileKind::EnergyMap => "energy map",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The calibration-style types that carry only a data section after the
/// device header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationKind {
    Energy,
    Time,
    Spectrum,
}

impl CalibrationKind {
    pub fn from_kind(kind: FileKind) -> Option<CalibrationKind> {
        match kind {
            FileKind::EnergyCalibrationMap => Some(CalibrationKind::Energy),
            FileKind::TimeCalibrationMap => Some(CalibrationKind::Time),
            FileKind::EnergySpectrum => Some(CalibrationKind::Spectrum),
            _ => None,
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            CalibrationKind::Energy => FileKind::EnergyCalibrationMap,
            CalibrationKind::Time => FileKind::TimeCalibrationMap,
            CalibrationKind::Spectrum => FileKind::EnergySpectrum,
        }
    }
}

/// Scanner family a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    D930,
    E180,
}

impl Device {
    /// Recognize the device spellings seen in real headers, case-insensitively:
    /// "930" / "DigitMI-930" and "180" / "e180". Anything else is
    /// unrecognized.
    pub fn parse(name: &str) -> Option<Device> {
        if name.eq_ignore_ascii_case("930") || name.eq_ignore_ascii_case(DEVICE_NAME_930) {
            Some(Device::D930)
        } else if name.eq_ignore_ascii_case("e180") || name.eq_ignore_ascii_case(DEVICE_NAME_E180) {
            Some(Device::E180)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::D930 => DEVICE_NAME_930,
            Device::E180 => DEVICE_NAME_E180,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_codes() {
        for code in 0..8 {
            let kind = FileKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(FileKind::from_code(8).is_none());
        assert!(FileKind::from_code(u16::MAX).is_none());
    }

    #[test]
    fn test_payload_codec_availability() {
        assert!(FileKind::RawData.has_payload_codec());
        assert!(FileKind::Listmode.has_payload_codec());
        assert!(FileKind::Mich.has_payload_codec());
        assert!(!FileKind::EnergyCalibrationMap.has_payload_codec());
        assert!(!FileKind::PositionTable.has_payload_codec());
    }

    #[test]
    fn test_calibration_kinds() {
        assert_eq!(
            CalibrationKind::from_kind(FileKind::TimeCalibrationMap),
            Some(CalibrationKind::Time)
        );
        assert!(CalibrationKind::from_kind(FileKind::Listmode).is_none());
        assert_eq!(CalibrationKind::Spectrum.kind(), FileKind::EnergySpectrum);
    }

    #[test]
    fn test_device_spellings() {
        assert_eq!(Device::parse("930"), Some(Device::D930));
        assert_eq!(Device::parse("DigitMI-930"), Some(Device::D930));
        assert_eq!(Device::parse("digitmi-930"), Some(Device::D930));
        assert_eq!(Device::parse("180"), Some(Device::E180));
        assert_eq!(Device::parse("e180"), Some(Device::E180));
        assert_eq!(Device::parse("E180"), Some(Device::E180));
        assert_eq!(Device::parse("unknown"), None);
        assert_eq!(Device::parse(""), None);
        // Names that merely contain the digits must not dispatch.
        assert_eq!(Device::parse("SN-2180"), None);
        assert_eq!(Device::parse("DigitMI-930X"), None);
    }
}
