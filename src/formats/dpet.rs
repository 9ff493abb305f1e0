// Container file codec
//
// Wire layout: 4-byte magic, u16 marshal method, u32 content length, the
// header content document, then a deflate-compressed payload region. The
// payload decoder and encoder dispatch on the same (device, file type) pair
// so the two directions stay inverses.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::debug;

use super::header::{Header, HeaderContent, MAGIC, MARSHAL_STRUCTURED};
use super::ParseOptions;
use crate::bitwise::{ByteCursor, CursorError};
use crate::core::types::{Device, FileKind};
use crate::drivers::{self, d930, e180, CodecError};

#[derive(Error, Debug)]
pub enum DpetError {
    #[error("not a container file or file damaged")]
    WrongFileType,

    #[error("unknown marshal method {0}")]
    UnknownMarshalMethod(u16),

    #[error("cannot unmarshal file header content: {0}")]
    Unmarshal(#[from] serde_json::Error),

    #[error("unknown file type {0}")]
    UnknownFileType(u16),

    #[error("unknown drive {0:?}")]
    UnknownDrive(String),

    #[error("payload does not match the header file type and device")]
    PayloadMismatch,

    #[error(transparent)]
    Incomplete(#[from] CursorError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DpetError>;

/// Decoded payload of a container file.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerPayload {
    Raw930(Vec<d930::RawFrame>),
    Listmode930(Vec<d930::ListmodeEvent>),
    Mich930(Vec<u16>),
    RawE180(Vec<e180::BdmBlock>),
    CoinE180(Vec<e180::CoinPair>),
    MichE180(Vec<f32>),
    /// Payload bytes carried verbatim.
    Opaque(Vec<u8>),
    /// Payload not read or not present.
    HeaderOnly,
}

/// One container file: header document plus payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub header: Header,
    pub payload: ContainerPayload,
}

impl Dataset {
    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_code(self.header.content.public.file_type)
    }

    pub fn device(&self) -> Option<Device> {
        Device::parse(&self.header.content.scanner.device)
    }
}

/// Read a container file image.
pub fn read(buf: &[u8], options: ParseOptions) -> Result<Dataset> {
    let mut cur = ByteCursor::new(buf);
    let magic = cur.read_bytes(MAGIC.len()).map_err(|_| DpetError::WrongFileType)?;
    if magic != MAGIC {
        return Err(DpetError::WrongFileType);
    }
    let marshal_method = cur.read_u16()?;
    if marshal_method != MARSHAL_STRUCTURED {
        return Err(DpetError::UnknownMarshalMethod(marshal_method));
    }
    let content_len = cur.read_u32()? as usize;
    let content: HeaderContent = serde_json::from_slice(cur.read_bytes(content_len)?)?;
    let header = Header {
        marshal_method,
        content,
    };
    debug!(
        content_len,
        file_type = header.content.public.file_type,
        "decoded container header"
    );

    if options.header_only {
        return Ok(Dataset {
            header,
            payload: ContainerPayload::HeaderOnly,
        });
    }

    let mut payload_bytes = Vec::new();
    DeflateDecoder::new(cur.rest()).read_to_end(&mut payload_bytes)?;

    if !options.decode_payload {
        return Ok(Dataset {
            header,
            payload: ContainerPayload::Opaque(payload_bytes),
        });
    }

    let device = Device::parse(&header.content.scanner.device)
        .ok_or_else(|| DpetError::UnknownDrive(header.content.scanner.device.clone()))?;
    let payload = decode_payload(device, header.content.public.file_type, &payload_bytes)?;
    Ok(Dataset { header, payload })
}

/// Read a container file from disk.
pub fn read_file<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Dataset> {
    let buf = fs::read(path)?;
    read(&buf, options)
}

fn decode_payload(device: Device, file_type: u16, bytes: &[u8]) -> Result<ContainerPayload> {
    let kind = match FileKind::from_code(file_type) {
        Some(kind) => kind,
        None => return Err(DpetError::UnknownFileType(file_type)),
    };
    let cur = ByteCursor::new(bytes);
    let payload = match device {
        Device::D930 => match kind {
            FileKind::RawData => {
                ContainerPayload::Raw930(d930::raw_frames(cur).collect::<drivers::Result<_>>()?)
            }
            FileKind::Listmode => ContainerPayload::Listmode930(
                d930::listmode_events(cur).collect::<drivers::Result<_>>()?,
            ),
            FileKind::Mich => ContainerPayload::Mich930(d930::mich_words(cur).collect()),
            _ => return Err(DpetError::UnknownFileType(file_type)),
        },
        Device::E180 => match kind {
            FileKind::RawData => {
                ContainerPayload::RawE180(e180::bdm_blocks(cur).collect::<drivers::Result<_>>()?)
            }
            FileKind::Listmode => {
                ContainerPayload::CoinE180(e180::coin_pairs(cur).collect::<drivers::Result<_>>()?)
            }
            FileKind::Mich => ContainerPayload::MichE180(e180::mich_samples(cur).collect()),
            _ => return Err(DpetError::UnknownFileType(file_type)),
        },
    };
    Ok(payload)
}

/// Write a container file.
pub fn write<W: Write>(dataset: &Dataset, out: &mut W) -> Result<()> {
    write_header(&dataset.header, out)?;

    let mut encoder = DeflateEncoder::new(out, Compression::best());
    match &dataset.payload {
        ContainerPayload::HeaderOnly => {}
        ContainerPayload::Opaque(bytes) => encoder.write_all(bytes)?,
        typed => {
            let scanner = &dataset.header.content.scanner;
            let device = Device::parse(&scanner.device)
                .ok_or_else(|| DpetError::UnknownDrive(scanner.device.clone()))?;
            encode_payload(device, dataset.header.content.public.file_type, typed, &mut encoder)?;
        }
    }
    encoder.finish()?;
    Ok(())
}

/// Write a container file to disk.
pub fn write_file<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
    let mut file = fs::File::create(path)?;
    write(dataset, &mut file)
}

fn write_header<W: Write>(header: &Header, out: &mut W) -> Result<()> {
    if header.marshal_method != MARSHAL_STRUCTURED {
        return Err(DpetError::UnknownMarshalMethod(header.marshal_method));
    }
    let content = serde_json::to_vec(&header.content)?;
    out.write_all(&MAGIC)?;
    out.write_u16::<LittleEndian>(header.marshal_method)?;
    out.write_u32::<LittleEndian>(content.len() as u32)?;
    out.write_all(&content)?;
    debug!(content_len = content.len(), "wrote container header");
    Ok(())
}

fn encode_payload<W: Write>(
    device: Device,
    file_type: u16,
    payload: &ContainerPayload,
    out: &mut W,
) -> Result<()> {
    let kind = match FileKind::from_code(file_type) {
        Some(kind) => kind,
        None => return Err(DpetError::UnknownFileType(file_type)),
    };
    match device {
        Device::D930 => match (kind, payload) {
            (FileKind::RawData, ContainerPayload::Raw930(frames)) => {
                d930::encode_raw(out, frames)?
            }
            (FileKind::Listmode, ContainerPayload::Listmode930(events)) => {
                d930::encode_listmode(out, events)?
            }
            (FileKind::Mich, ContainerPayload::Mich930(words)) => d930::encode_mich(out, words)?,
            (FileKind::RawData | FileKind::Listmode | FileKind::Mich, _) => {
                return Err(DpetError::PayloadMismatch)
            }
            _ => return Err(DpetError::UnknownFileType(file_type)),
        },
        Device::E180 => match (kind, payload) {
            (FileKind::RawData, ContainerPayload::RawE180(blocks)) => {
                e180::encode_bdm(out, blocks)?
            }
            (FileKind::Listmode, ContainerPayload::CoinE180(pairs)) => {
                e180::encode_coin(out, pairs)?
            }
            (FileKind::Mich, ContainerPayload::MichE180(samples)) => {
                e180::encode_mich(out, samples)?
            }
            (FileKind::RawData | FileKind::Listmode | FileKind::Mich, _) => {
                return Err(DpetError::PayloadMismatch)
            }
            _ => return Err(DpetError::UnknownFileType(file_type)),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::header::{PublicInfo, ScannerInfo};

    fn content(file_type: u16, device: &str) -> HeaderContent {
        HeaderContent {
            public: PublicInfo {
                file_type,
                ..PublicInfo::default()
            },
            scanner: ScannerInfo {
                device: device.to_string(),
                serial: "SN-7".to_string(),
                ..ScannerInfo::default()
            },
            ..HeaderContent::default()
        }
    }

    fn dataset(file_type: u16, device: &str, payload: ContainerPayload) -> Dataset {
        Dataset {
            header: Header::new(content(file_type, device)),
            payload,
        }
    }

    fn sample_events() -> Vec<d930::ListmodeEvent> {
        vec![
            d930::ListmodeEvent {
                ip: 0x0105,
                xtalk: true,
                reserved: 2,
                channel: 291,
                energy: 12.5,
                time: 0.003,
            },
            d930::ListmodeEvent {
                ip: 0x0208,
                xtalk: false,
                reserved: 7,
                channel: 4095,
                energy: 510.25,
                time: 12.5,
            },
        ]
    }

    #[test]
    fn test_listmode_930_round_trip() {
        let original = dataset(1, "930", ContainerPayload::Listmode930(sample_events()));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();
        assert_eq!(&wire[..4], b"DPET");

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
        assert_eq!(back.kind(), Some(FileKind::Listmode));
        assert_eq!(back.device(), Some(Device::D930));
    }

    #[test]
    fn test_raw_930_round_trip() {
        let frames = vec![
            d930::RawFrame {
                data: vec![0xAB; d930::RAW_FRAME_DATA_LEN],
                ip: 0x0105,
            },
            d930::RawFrame {
                data: vec![0xCD; d930::RAW_FRAME_DATA_LEN],
                ip: 0x0106,
            },
        ];
        let original = dataset(0, "DigitMI-930", ContainerPayload::Raw930(frames));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_mich_930_round_trip() {
        let original = dataset(2, "930", ContainerPayload::Mich930((0..512).collect()));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_bdm_e180_round_trip() {
        let blocks = vec![e180::BdmBlock {
            index: 1,
            ip: 0x0110,
            port: 5000,
            group_count: 2,
            group_index: 0,
            body: vec![
                e180::BdmHit {
                    head_du: 0x12,
                    bdm: 3,
                    time: [1, 2, 3, 4, 5, 6, 7, 8],
                    x: 10,
                    y: 11,
                    energy: [0x44, 0x01],
                    temperature: 21,
                    temperature_tail: 0x0F,
                };
                4
            ],
        }];
        let original = dataset(0, "e180", ContainerPayload::RawE180(blocks));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_coin_e180_round_trip() {
        let pairs = vec![e180::CoinPair([
            e180::CoinEvent {
                crystal_index: 10_001,
                energy: 420.5,
                time: 1.25e-6,
            },
            e180::CoinEvent {
                crystal_index: 44_203,
                energy: 508.0,
                time: 1.26e-6,
            },
        ])];
        let original = dataset(1, "180", ContainerPayload::CoinE180(pairs));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_mich_e180_round_trip() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 * 0.5).collect();
        let original = dataset(2, "e180", ContainerPayload::MichE180(samples));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_worked_listmode_example() {
        // One event on the wire: address 0x0105, channel word 0xA123,
        // energy 12.5, time 0.003.
        let mut payload = vec![0x05, 0x01, 0x23, 0xA1];
        payload.extend_from_slice(&12.5f32.to_le_bytes());
        payload.extend_from_slice(&0.003f64.to_le_bytes());
        let original = dataset(1, "930", ContainerPayload::Opaque(payload));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        match back.payload {
            ContainerPayload::Listmode930(events) => {
                assert_eq!(events.len(), 1);
                let event = &events[0];
                assert_eq!(event.ip_addr(), "192.168.1.5");
                assert!(event.xtalk);
                assert_eq!(event.reserved, 2);
                assert_eq!(event.channel, 291);
                assert_eq!(event.energy, 12.5);
                assert_eq!(event.time, 0.003);
            }
            other => panic!("expected listmode payload, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_dispatches_on_device() {
        // The same four payload bytes are one f32 sample for an E180
        // michelogram but two u16 words for a 930 michelogram.
        let bytes = 1.0f32.to_le_bytes().to_vec();

        let mut wire_930 = Vec::new();
        write(
            &dataset(2, "930", ContainerPayload::Opaque(bytes.clone())),
            &mut wire_930,
        )
        .unwrap();
        let back = read(&wire_930, ParseOptions::new()).unwrap();
        assert_eq!(back.payload, ContainerPayload::Mich930(vec![0x0000, 0x3F80]));

        let mut wire_e180 = Vec::new();
        write(
            &dataset(2, "e180", ContainerPayload::Opaque(bytes)),
            &mut wire_e180,
        )
        .unwrap();
        let back = read(&wire_e180, ParseOptions::new()).unwrap();
        assert_eq!(back.payload, ContainerPayload::MichE180(vec![1.0]));
    }

    #[test]
    fn test_wrong_magic() {
        assert!(matches!(
            read(b"PETD\x00\x00", ParseOptions::new()),
            Err(DpetError::WrongFileType)
        ));
        assert!(matches!(
            read(b"DP", ParseOptions::new()),
            Err(DpetError::WrongFileType)
        ));
        assert!(matches!(
            read(b"", ParseOptions::new()),
            Err(DpetError::WrongFileType)
        ));
    }

    #[test]
    fn test_unknown_marshal_method_on_read() {
        let mut wire = Vec::new();
        wire.extend_from_slice(b"DPET");
        wire.extend_from_slice(&7u16.to_le_bytes());
        assert!(matches!(
            read(&wire, ParseOptions::new()),
            Err(DpetError::UnknownMarshalMethod(7))
        ));
    }

    #[test]
    fn test_unknown_marshal_method_on_write() {
        let mut bad = dataset(1, "930", ContainerPayload::HeaderOnly);
        bad.header.marshal_method = 3;
        let mut wire = Vec::new();
        assert!(matches!(
            write(&bad, &mut wire),
            Err(DpetError::UnknownMarshalMethod(3))
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn test_corrupt_header_content() {
        let garbage = b"{not json";
        let mut wire = Vec::new();
        wire.extend_from_slice(b"DPET");
        wire.extend_from_slice(&0u16.to_le_bytes());
        wire.extend_from_slice(&(garbage.len() as u32).to_le_bytes());
        wire.extend_from_slice(garbage);
        assert!(matches!(
            read(&wire, ParseOptions::new()),
            Err(DpetError::Unmarshal(_))
        ));
    }

    #[test]
    fn test_truncated_header_content() {
        let mut wire = Vec::new();
        wire.extend_from_slice(b"DPET");
        wire.extend_from_slice(&0u16.to_le_bytes());
        wire.extend_from_slice(&100u32.to_le_bytes());
        wire.extend_from_slice(b"{}");
        assert!(matches!(
            read(&wire, ParseOptions::new()),
            Err(DpetError::Incomplete(_))
        ));
    }

    #[test]
    fn test_header_only_skips_payload_region() {
        let original = dataset(1, "930", ContainerPayload::Listmode930(sample_events()));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new().only_header()).unwrap();
        assert_eq!(back.header, original.header);
        assert_eq!(back.payload, ContainerPayload::HeaderOnly);
    }

    #[test]
    fn test_opaque_read_returns_decompressed_bytes() {
        let events = sample_events();
        let original = dataset(1, "930", ContainerPayload::Listmode930(events.clone()));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new().skip_payload()).unwrap();
        let mut expected = Vec::new();
        d930::encode_listmode(&mut expected, &events).unwrap();
        assert_eq!(back.payload, ContainerPayload::Opaque(expected));
    }

    #[test]
    fn test_unknown_drive() {
        let original = dataset(2, "930", ContainerPayload::Mich930(vec![1, 2, 3]));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let mut bad = read(&wire, ParseOptions::new().skip_payload()).unwrap();
        bad.header.content.scanner.device = "SIEMENS".to_string();
        let mut rewritten = Vec::new();
        write(&bad, &mut rewritten).unwrap();
        assert!(matches!(
            read(&rewritten, ParseOptions::new()),
            Err(DpetError::UnknownDrive(name)) if name == "SIEMENS"
        ));
    }

    #[test]
    fn test_unknown_drive_on_typed_write() {
        let original = dataset(2, "", ContainerPayload::Mich930(vec![1]));
        let mut wire = Vec::new();
        assert!(matches!(
            write(&original, &mut wire),
            Err(DpetError::UnknownDrive(_))
        ));
    }

    #[test]
    fn test_unknown_file_type_on_full_decode() {
        // Calibration containers have no record codec; their payload can only
        // be carried opaquely.
        let original = dataset(5, "930", ContainerPayload::Opaque(vec![9, 9, 9]));
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        assert!(matches!(
            read(&wire, ParseOptions::new()),
            Err(DpetError::UnknownFileType(5))
        ));
        let back = read(&wire, ParseOptions::new().skip_payload()).unwrap();
        assert_eq!(back.payload, ContainerPayload::Opaque(vec![9, 9, 9]));
    }

    #[test]
    fn test_payload_mismatch_on_write() {
        let original = dataset(1, "930", ContainerPayload::Mich930(vec![1, 2]));
        let mut wire = Vec::new();
        assert!(matches!(
            write(&original, &mut wire),
            Err(DpetError::PayloadMismatch)
        ));
    }

    #[test]
    fn test_header_only_writes_empty_payload_region() {
        let original = dataset(1, "930", ContainerPayload::HeaderOnly);
        let mut wire = Vec::new();
        write(&original, &mut wire).unwrap();

        let back = read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back.payload, ContainerPayload::Listmode930(Vec::new()));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dpet");
        let original = dataset(1, "930", ContainerPayload::Listmode930(sample_events()));

        write_file(&original, &path).unwrap();
        let back = read_file(&path, ParseOptions::new()).unwrap();
        assert_eq!(back, original);
    }
}
