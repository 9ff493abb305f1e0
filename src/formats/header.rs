// Container header document
//
// The header travels as a length-prefixed structured document inside the
// container. Its sections mirror the native header sections with widened
// integer fields; the mapping from native sections is spelled out below so
// every copied field is visible and type-checked.

use serde::{Deserialize, Serialize};

use crate::core::sections;

/// Leading magic of a container file.
pub const MAGIC: [u8; 4] = *b"DPET";

/// Marshal method tag for structured (JSON) header content, the only method
/// this crate reads or writes.
pub const MARSHAL_STRUCTURED: u16 = 0;

/// Framing metadata plus the content document.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub marshal_method: u16,
    pub content: HeaderContent,
}

impl Header {
    pub fn new(content: HeaderContent) -> Self {
        Header {
            marshal_method: MARSHAL_STRUCTURED,
            content,
        }
    }
}

/// Compression applied to the payload region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferSyntax {
    #[default]
    Deflate,
}

/// Sections of the container header. Optional sections are omitted for file
/// types they do not apply to; the scanner section is always present since
/// payload decoding dispatches on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderContent {
    #[serde(default)]
    pub public: PublicInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<AcquisitionInfo>,
    #[serde(default)]
    pub scanner: ScannerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coincidence: Option<CoincidenceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicInfo {
    #[serde(default)]
    pub file_type: u16,
    #[serde(default)]
    pub transfer_syntax: TransferSyntax,
    #[serde(default)]
    pub md5: String,
}

/// Scan protocol settings taken from site configuration; left at defaults
/// when reformatting native files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanInfo {
    #[serde(default)]
    pub patient_position: String,
    #[serde(default)]
    pub scan_mode: String,
    #[serde(default)]
    pub bed_count: u32,
    #[serde(default)]
    pub bed_overlap: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionInfo {
    pub isotope: u32,
    pub activity: f32,
    pub inject_time: String,
    pub time: String,
    pub duration: u32,
    pub time_window: f32,
    pub delay_window: f32,
    pub xtalk_window: f32,
    pub energy_window: Vec<u32>,
    pub position_window: u32,
    pub corrected: u32,
    pub table_position: f32,
    pub table_height: f32,
    pub petct_spacing: f32,
    pub table_count: u32,
    pub table_index: u32,
    pub scan_length_per_table: f32,
    pub patient_id: String,
    pub study_id: String,
    pub patient_name: String,
    pub patient_sex: String,
    pub patient_height: f32,
    pub patient_weight: f32,
}

impl From<&sections::AcquisitionInfo> for AcquisitionInfo {
    fn from(info: &sections::AcquisitionInfo) -> Self {
        AcquisitionInfo {
            isotope: u32::from(info.isotope),
            activity: info.activity,
            inject_time: info.inject_time.clone(),
            time: info.time.clone(),
            duration: u32::from(info.duration),
            time_window: info.time_window,
            delay_window: info.delay_window,
            xtalk_window: info.xtalk_window,
            energy_window: info.energy_window.to_vec(),
            position_window: u32::from(info.position_window),
            corrected: u32::from(info.corrected),
            table_position: info.table_position,
            table_height: info.table_height,
            petct_spacing: info.petct_spacing,
            table_count: u32::from(info.table_count),
            table_index: u32::from(info.table_index),
            scan_length_per_table: info.scan_length_per_table,
            patient_id: info.patient_id.clone(),
            study_id: info.study_id.clone(),
            patient_name: info.patient_name.clone(),
            patient_sex: info.patient_sex.clone(),
            patient_height: info.patient_height,
            patient_weight: info.patient_weight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerInfo {
    pub device: String,
    pub serial: String,
    pub axis_detectors: u32,
    pub trans_detectors: u32,
    pub detector_rings: u32,
    pub detector_channels: u32,
    pub ip_count: u32,
    pub ip_start: u32,
    pub channel_count: u32,
    pub channel_start: u32,
    pub mvt_thresholds: Vec<f32>,
    pub mvt_parameters: Vec<f32>,
}

impl From<&sections::DeviceInfo> for ScannerInfo {
    fn from(info: &sections::DeviceInfo) -> Self {
        ScannerInfo {
            device: info.device.clone(),
            serial: info.serial.clone(),
            axis_detectors: u32::from(info.axis_detectors),
            trans_detectors: u32::from(info.trans_detectors),
            detector_rings: u32::from(info.detector_rings),
            detector_channels: u32::from(info.detector_channels),
            ip_count: u32::from(info.ip_count),
            ip_start: u32::from(info.ip_start),
            channel_count: u32::from(info.channel_count),
            channel_start: u32::from(info.channel_start),
            mvt_thresholds: info.mvt_thresholds.to_vec(),
            mvt_parameters: info.mvt_parameters.to_vec(),
        }
    }
}

/// Coincidence processing settings taken from site configuration; left at
/// defaults when reformatting native files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoincidenceInfo {
    pub time_window: f32,
    pub delay_window: f32,
    pub energy_window: Vec<u32>,
    pub max_ring_difference: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub rows: u32,
    pub cols: u32,
    pub slices: u32,
    pub row_pixel_size: f32,
    pub col_pixel_size: f32,
    pub slice_thickness: f32,
    pub recon_method: String,
    pub max_ring_diff: u32,
    pub subset_count: u32,
    pub iteration_count: u32,
    pub attn_calibration: u32,
    pub scat_calibration: u32,
    pub scat_params: Vec<f32>,
    pub tv_params: Vec<f32>,
    pub petct_fov_offset: Vec<f32>,
    pub ct_rotation_angle: f32,
    pub series_number: u32,
    pub recon_software_version: String,
    pub prompts_count: u32,
    pub delay_count: u32,
}

impl From<&sections::ImageInfo> for ImageInfo {
    fn from(info: &sections::ImageInfo) -> Self {
        ImageInfo {
            rows: u32::from(info.rows),
            cols: u32::from(info.cols),
            slices: u32::from(info.slices),
            row_pixel_size: info.row_pixel_size,
            col_pixel_size: info.col_pixel_size,
            slice_thickness: info.slice_thickness,
            recon_method: info.recon_method.clone(),
            max_ring_diff: u32::from(info.max_ring_diff),
            subset_count: u32::from(info.subset_count),
            iteration_count: u32::from(info.iteration_count),
            attn_calibration: u32::from(info.attn_calibration),
            scat_calibration: u32::from(info.scat_calibration),
            scat_params: info.scat_params.to_vec(),
            tv_params: info.tv_params.to_vec(),
            petct_fov_offset: info.petct_fov_offset.to_vec(),
            ct_rotation_angle: info.ct_rotation_angle,
            series_number: u32::from(info.series_number),
            recon_software_version: info.recon_software_version.clone(),
            prompts_count: info.prompts_count,
            delay_count: info.delay_count,
        }
    }
}
