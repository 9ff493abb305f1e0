// Native acquisition-file parser
//
// A native file is a 16-byte magic-key block, the public and device sections,
// then a type-dependent run of further sections and the payload region.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::ParseOptions;
use crate::bitwise::{ByteCursor, CursorError};
use crate::core::sections::{AcquisitionInfo, DataInfo, DeviceInfo, ImageInfo, PublicInfo};
use crate::core::types::{CalibrationKind, FileKind};
use crate::drivers::{self, d930};

/// Length of the magic-key block opening a native file.
pub const SCAN_PREAMBLE_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Incomplete(#[from] CursorError),

    #[error(transparent)]
    Codec(#[from] drivers::CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Payload of one native dataset, depending on how much decoding was asked
/// for.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Fully decoded records.
    Records(Vec<T>),
    /// Payload bytes carried verbatim.
    Opaque(Vec<u8>),
    /// Payload left unread by a header-only parse.
    Skipped,
}

/// Type-dependent remainder of a native dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw {
        acquisition: AcquisitionInfo,
        data: DataInfo,
        payload: Payload<d930::RawFrame>,
    },
    Listmode {
        acquisition: AcquisitionInfo,
        data: DataInfo,
        payload: Payload<d930::ListmodeEvent>,
    },
    Mich {
        acquisition: AcquisitionInfo,
        data: DataInfo,
        payload: Payload<u16>,
    },
    /// Calibration-style files carry only the data descriptor; their payload
    /// has no record structure and is kept as bytes.
    Calibration {
        kind: CalibrationKind,
        data: DataInfo,
        payload: Option<Vec<u8>>,
    },
    /// Fallback for image-bearing and unrecognized types.
    Image {
        acquisition: AcquisitionInfo,
        image: ImageInfo,
        data: DataInfo,
        payload: Option<Vec<u8>>,
    },
}

/// One fully parsed native file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub public: PublicInfo,
    pub device: DeviceInfo,
    pub body: Body,
}

impl DataSet {
    pub fn kind(&self) -> Option<FileKind> {
        self.public.kind()
    }
}

/// Parse a native acquisition file image.
pub fn parse_scan(buf: &[u8], options: ParseOptions) -> Result<DataSet> {
    let mut cur = ByteCursor::new(buf);
    cur.read_bytes(SCAN_PREAMBLE_LEN)?;
    let public = PublicInfo::decode(&mut cur)?;
    let device = DeviceInfo::decode(&mut cur)?;
    debug!(
        type_code = public.type_code,
        device = %device.device,
        "decoded native file header"
    );

    let body = match public.kind() {
        Some(FileKind::RawData) => {
            let acquisition = AcquisitionInfo::decode(&mut cur)?;
            let data = DataInfo::decode(&mut cur)?;
            let payload = if options.header_only {
                Payload::Skipped
            } else if !options.decode_payload {
                Payload::Opaque(cur.rest().to_vec())
            } else {
                let frames = d930::raw_frames(ByteCursor::new(cur.rest()))
                    .collect::<drivers::Result<Vec<_>>>()?;
                debug!(frames = frames.len(), "decoded raw payload");
                Payload::Records(frames)
            };
            Body::Raw {
                acquisition,
                data,
                payload,
            }
        }
        Some(FileKind::Listmode) => {
            let acquisition = AcquisitionInfo::decode(&mut cur)?;
            let data = DataInfo::decode(&mut cur)?;
            let payload = if options.header_only {
                Payload::Skipped
            } else if !options.decode_payload {
                Payload::Opaque(cur.rest().to_vec())
            } else {
                let events = d930::listmode_events(ByteCursor::new(cur.rest()))
                    .collect::<drivers::Result<Vec<_>>>()?;
                debug!(events = events.len(), "decoded listmode payload");
                Payload::Records(events)
            };
            Body::Listmode {
                acquisition,
                data,
                payload,
            }
        }
        Some(FileKind::Mich) => {
            let acquisition = AcquisitionInfo::decode(&mut cur)?;
            let data = DataInfo::decode(&mut cur)?;
            let payload = if options.header_only {
                Payload::Skipped
            } else if !options.decode_payload {
                Payload::Opaque(cur.rest().to_vec())
            } else {
                let words: Vec<u16> = d930::mich_words(ByteCursor::new(cur.rest())).collect();
                debug!(words = words.len(), "decoded michelogram payload");
                Payload::Records(words)
            };
            Body::Mich {
                acquisition,
                data,
                payload,
            }
        }
        Some(FileKind::EnergyCalibrationMap) => {
            calibration_body(CalibrationKind::Energy, &mut cur, options)?
        }
        Some(FileKind::TimeCalibrationMap) => {
            calibration_body(CalibrationKind::Time, &mut cur, options)?
        }
        Some(FileKind::EnergySpectrum) => {
            calibration_body(CalibrationKind::Spectrum, &mut cur, options)?
        }
        _ => Body::Image {
            acquisition: AcquisitionInfo::decode(&mut cur)?,
            image: ImageInfo::decode(&mut cur)?,
            data: DataInfo::decode(&mut cur)?,
            payload: remainder(&mut cur, options),
        },
    };

    Ok(DataSet {
        public,
        device,
        body,
    })
}

/// Parse a native acquisition file from disk.
pub fn parse_scan_file<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<DataSet> {
    let buf = fs::read(path)?;
    parse_scan(&buf, options)
}

fn calibration_body(
    kind: CalibrationKind,
    cur: &mut ByteCursor,
    options: ParseOptions,
) -> Result<Body> {
    Ok(Body::Calibration {
        kind,
        data: DataInfo::decode(cur)?,
        payload: remainder(cur, options),
    })
}

fn remainder(cur: &mut ByteCursor, options: ParseOptions) -> Option<Vec<u8>> {
    if options.header_only {
        None
    } else {
        Some(cur.rest().to_vec())
    }
}
