// Native dataset to container dataset reformatter
//
// The header document is assembled from the native sections; optional header
// sections are dropped for file types they do not apply to. Payloads move
// across unchanged.

use tracing::debug;

use super::dpet::{ContainerPayload, Dataset};
use super::header::{self, Header, HeaderContent};
use super::scan::{self, Body, DataSet, Payload};
use super::ParseOptions;
use crate::core::types::FileKind;

/// Reformat a parsed native dataset into a container dataset.
pub fn from_scan(set: DataSet) -> Dataset {
    let kind = set.public.kind();
    let mut content = HeaderContent {
        public: header::PublicInfo {
            file_type: set.public.type_code,
            transfer_syntax: header::TransferSyntax::Deflate,
            md5: String::new(),
        },
        scan: Some(header::ScanInfo::default()),
        acquisition: None,
        scanner: header::ScannerInfo::from(&set.device),
        coincidence: Some(header::CoincidenceInfo::default()),
        image: None,
    };

    let payload = match set.body {
        Body::Raw {
            acquisition,
            payload,
            ..
        } => {
            content.acquisition = Some(header::AcquisitionInfo::from(&acquisition));
            content.coincidence = None;
            match payload {
                Payload::Records(frames) => ContainerPayload::Raw930(frames),
                Payload::Opaque(bytes) => ContainerPayload::Opaque(bytes),
                Payload::Skipped => ContainerPayload::HeaderOnly,
            }
        }
        Body::Listmode {
            acquisition,
            payload,
            ..
        } => {
            content.acquisition = Some(header::AcquisitionInfo::from(&acquisition));
            match payload {
                Payload::Records(events) => ContainerPayload::Listmode930(events),
                Payload::Opaque(bytes) => ContainerPayload::Opaque(bytes),
                Payload::Skipped => ContainerPayload::HeaderOnly,
            }
        }
        Body::Mich {
            acquisition,
            payload,
            ..
        } => {
            content.acquisition = Some(header::AcquisitionInfo::from(&acquisition));
            match payload {
                Payload::Records(words) => ContainerPayload::Mich930(words),
                Payload::Opaque(bytes) => ContainerPayload::Opaque(bytes),
                Payload::Skipped => ContainerPayload::HeaderOnly,
            }
        }
        Body::Calibration { payload, .. } => {
            content.scan = None;
            content.coincidence = None;
            match payload {
                Some(bytes) => ContainerPayload::Opaque(bytes),
                None => ContainerPayload::HeaderOnly,
            }
        }
        Body::Image {
            acquisition,
            image,
            payload,
            ..
        } => {
            // Position tables and energy maps keep only the public and
            // scanner sections, like the calibration types.
            if matches!(
                kind,
                Some(FileKind::PositionTable) | Some(FileKind::EnergyMap)
            ) {
                content.scan = None;
                content.coincidence = None;
            } else {
                content.acquisition = Some(header::AcquisitionInfo::from(&acquisition));
                content.image = Some(header::ImageInfo::from(&image));
            }
            match payload {
                Some(bytes) => ContainerPayload::Opaque(bytes),
                None => ContainerPayload::HeaderOnly,
            }
        }
    };
    debug!(
        file_type = content.public.file_type,
        device = %content.scanner.device,
        "reformatted native dataset"
    );

    Dataset {
        header: Header::new(content),
        payload,
    }
}

/// Parse a native file image and reformat it in one step.
pub fn read_scan(buf: &[u8], options: ParseOptions) -> scan::Result<Dataset> {
    Ok(from_scan(scan::parse_scan(buf, options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sections::{
        AcquisitionInfo, DataInfo, DeviceInfo, ImageInfo, PublicInfo,
    };
    use crate::core::types::CalibrationKind;
    use crate::drivers::d930::ListmodeEvent;

    fn public(type_code: u16) -> PublicInfo {
        PublicInfo {
            type_code,
            software_version: "v1.0.0".to_string(),
            ..PublicInfo::default()
        }
    }

    fn device() -> DeviceInfo {
        DeviceInfo {
            device: "DigitMI-930".to_string(),
            serial: "SN-7".to_string(),
            detector_channels: 576,
            ..DeviceInfo::default()
        }
    }

    fn acquisition() -> AcquisitionInfo {
        AcquisitionInfo {
            isotope: 18,
            duration: 600,
            patient_id: "P-1".to_string(),
            ..AcquisitionInfo::default()
        }
    }

    fn events() -> Vec<ListmodeEvent> {
        vec![ListmodeEvent {
            ip: 0x0105,
            xtalk: false,
            reserved: 1,
            channel: 77,
            energy: 420.0,
            time: 0.125,
        }]
    }

    #[test]
    fn test_listmode_conversion() {
        let set = DataSet {
            public: public(1),
            device: device(),
            body: Body::Listmode {
                acquisition: acquisition(),
                data: DataInfo::default(),
                payload: Payload::Records(events()),
            },
        };
        let container = from_scan(set);

        let content = &container.header.content;
        assert_eq!(content.public.file_type, 1);
        assert_eq!(content.scanner.device, "DigitMI-930");
        assert_eq!(content.scanner.detector_channels, 576);
        assert!(content.scan.is_some());
        assert!(content.coincidence.is_some());
        assert!(content.image.is_none());
        let acq = content.acquisition.as_ref().unwrap();
        assert_eq!(acq.isotope, 18);
        assert_eq!(acq.duration, 600);
        assert_eq!(container.payload, ContainerPayload::Listmode930(events()));
    }

    #[test]
    fn test_raw_conversion_drops_coincidence_and_image() {
        let set = DataSet {
            public: public(0),
            device: device(),
            body: Body::Raw {
                acquisition: acquisition(),
                data: DataInfo::default(),
                payload: Payload::Skipped,
            },
        };
        let container = from_scan(set);

        let content = &container.header.content;
        assert!(content.scan.is_some());
        assert!(content.acquisition.is_some());
        assert!(content.coincidence.is_none());
        assert!(content.image.is_none());
        assert_eq!(container.payload, ContainerPayload::HeaderOnly);
    }

    #[test]
    fn test_calibration_conversion_keeps_only_scanner() {
        let set = DataSet {
            public: public(3),
            device: device(),
            body: Body::Calibration {
                kind: CalibrationKind::Energy,
                data: DataInfo::default(),
                payload: Some(vec![1, 2, 3]),
            },
        };
        let container = from_scan(set);

        let content = &container.header.content;
        assert!(content.scan.is_none());
        assert!(content.acquisition.is_none());
        assert!(content.coincidence.is_none());
        assert!(content.image.is_none());
        assert_eq!(content.scanner.device, "DigitMI-930");
        assert_eq!(container.payload, ContainerPayload::Opaque(vec![1, 2, 3]));
    }

    #[test]
    fn test_position_table_conversion_keeps_only_scanner() {
        let set = DataSet {
            public: public(6),
            device: device(),
            body: Body::Image {
                acquisition: acquisition(),
                image: ImageInfo::default(),
                data: DataInfo::default(),
                payload: Some(vec![5, 5]),
            },
        };
        let container = from_scan(set);

        let content = &container.header.content;
        assert!(content.scan.is_none());
        assert!(content.acquisition.is_none());
        assert!(content.coincidence.is_none());
        assert!(content.image.is_none());
        assert_eq!(container.payload, ContainerPayload::Opaque(vec![5, 5]));
    }

    #[test]
    fn test_image_conversion_keeps_everything() {
        let set = DataSet {
            public: public(42),
            device: device(),
            body: Body::Image {
                acquisition: acquisition(),
                image: ImageInfo {
                    rows: 192,
                    recon_method: "OSEM".to_string(),
                    ..ImageInfo::default()
                },
                data: DataInfo::default(),
                payload: Some(Vec::new()),
            },
        };
        let container = from_scan(set);

        let content = &container.header.content;
        assert_eq!(content.public.file_type, 42);
        assert!(content.scan.is_some());
        assert!(content.acquisition.is_some());
        assert!(content.coincidence.is_some());
        let image = content.image.as_ref().unwrap();
        assert_eq!(image.rows, 192);
        assert_eq!(image.recon_method, "OSEM");
    }

    #[test]
    fn test_converted_dataset_round_trips_through_container() {
        let set = DataSet {
            public: public(1),
            device: device(),
            body: Body::Listmode {
                acquisition: acquisition(),
                data: DataInfo::default(),
                payload: Payload::Records(events()),
            },
        };
        let container = from_scan(set);

        let mut wire = Vec::new();
        crate::formats::dpet::write(&container, &mut wire).unwrap();
        let back = crate::formats::dpet::read(&wire, ParseOptions::new()).unwrap();
        assert_eq!(back, container);
    }

    #[test]
    fn test_opaque_payload_moves_across() {
        let set = DataSet {
            public: public(2),
            device: device(),
            body: Body::Mich {
                acquisition: acquisition(),
                data: DataInfo::default(),
                payload: Payload::Opaque(vec![0xAA, 0xBB]),
            },
        };
        let container = from_scan(set);
        assert_eq!(container.payload, ContainerPayload::Opaque(vec![0xAA, 0xBB]));
    }
}
