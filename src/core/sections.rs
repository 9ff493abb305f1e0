// Header sections of a native acquisition file
//
// Every section is a flat value record decoded in one forward pass. CRC and
// length fields are carried as found, never verified here.

use serde::{Deserialize, Serialize};

use crate::bitwise::cursor::{ByteCursor, Result};
use crate::core::types::FileKind;

/// Leading public section.
///
/// Field layout:
///   header_crc        u16
///   length            u32
///   type_code         u16
///   software_version  16-byte string
///   header_length     u32
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicInfo {
    pub header_crc: u16,
    pub length: u32,
    pub type_code: u16,
    pub software_version: String,
    pub header_length: u32,
}

impl PublicInfo {
    pub fn decode(cur: &mut ByteCursor) -> Result<Self> {
        Ok(PublicInfo {
            header_crc: cur.read_u16()?,
            length: cur.read_u32()?,
            type_code: cur.read_u16()?,
            software_version: cur.read_string(16)?,
            header_length: cur.read_u32()?,
        })
    }

    /// File type behind the raw code, when it is one we know.
    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_code(self.type_code)
    }
}

/// Scanner geometry and addressing section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub length: u32,
    pub device: String,
    pub serial: String,
    pub axis_detectors: u16,
    pub trans_detectors: u16,
    pub detector_rings: u16,
    pub detector_channels: u16,
    pub ip_count: u16,
    pub ip_start: u16,
    pub channel_count: u16,
    pub channel_start: u16,
    pub mvt_thresholds: [f32; 8],
    pub mvt_parameters: [f32; 3],
}

impl DeviceInfo {
    pub fn decode(cur: &mut ByteCursor) -> Result<Self> {
        Ok(DeviceInfo {
            length: cur.read_u32()?,
            device: cur.read_string(16)?,
            serial: cur.read_string(16)?,
            axis_detectors: cur.read_u16()?,
            trans_detectors: cur.read_u16()?,
            detector_rings: cur.read_u16()?,
            detector_channels: cur.read_u16()?,
            ip_count: cur.read_u16()?,
            ip_start: cur.read_u16()?,
            channel_count: cur.read_u16()?,
            channel_start: cur.read_u16()?,
            mvt_thresholds: cur.read_f32_array()?,
            mvt_parameters: cur.read_f32_array()?,
        })
    }
}

/// Scan protocol, windows and patient demographics.
///
/// Field layout:
///   length                 u32
///   isotope                u16
///   activity               f32
///   inject_time            16-byte string
///   time                   16-byte string
///   duration               u16
///   time_window            f32
///   delay_window           f32
///   xtalk_window           f32
///   energy_window          2 x u32
///   position_window        u16
///   corrected              u16
///   table_position         f32
///   table_height           f32
///   petct_spacing          f32
///   table_count            u16
///   table_index            u16
///   scan_length_per_table  f32
///   patient_id             64-byte string
///   study_id               64-byte string
///   patient_name           128-byte string
///   patient_sex            8-byte string
///   patient_height         f32
///   patient_weight         f32
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionInfo {
    pub length: u32,
    pub isotope: u16,
    pub activity: f32,
    pub inject_time: String,
    pub time: String,
    pub duration: u16,
    pub time_window: f32,
    pub delay_window: f32,
    pub xtalk_window: f32,
    pub energy_window: [u32; 2],
    pub position_window: u16,
    pub corrected: u16,
    pub table_position: f32,
    pub table_height: f32,
    pub petct_spacing: f32,
    pub table_count: u16,
    pub table_index: u16,
    pub scan_length_per_table: f32,
    pub patient_id: String,
    pub study_id: String,
    pub patient_name: String,
    pub patient_sex: String,
    pub patient_height: f32,
    pub patient_weight: f32,
}

impl AcquisitionInfo {
    pub fn decode(cur: &mut ByteCursor) -> Result<Self> {
        Ok(AcquisitionInfo {
            length: cur.read_u32()?,
            isotope: cur.read_u16()?,
            activity: cur.read_f32()?,
            inject_time: cur.read_string(16)?,
            time: cur.read_string(16)?,
            duration: cur.read_u16()?,
            time_window: cur.read_f32()?,
            delay_window: cur.read_f32()?,
            xtalk_window: cur.read_f32()?,
            energy_window: cur.read_u32_array()?,
            position_window: cur.read_u16()?,
            corrected: cur.read_u16()?,
            table_position: cur.read_f32()?,
            table_height: cur.read_f32()?,
            petct_spacing: cur.read_f32()?,
            table_count: cur.read_u16()?,
            table_index: cur.read_u16()?,
            scan_length_per_table: cur.read_f32()?,
            patient_id: cur.read_string(64)?,
            study_id: cur.read_string(64)?,
            patient_name: cur.read_string(128)?,
            patient_sex: cur.read_string(8)?,
            patient_height: cur.read_f32()?,
            patient_weight: cur.read_f32()?,
        })
    }
}

/// Reconstruction parameters for image-bearing files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub length: u32,
    pub rows: u16,
    pub cols: u16,
    pub slices: u16,
    pub row_pixel_size: f32,
    pub col_pixel_size: f32,
    pub slice_thickness: f32,
    pub recon_method: String,
    pub max_ring_diff: u16,
    pub subset_count: u16,
    pub iteration_count: u16,
    pub attn_calibration: u16,
    pub scat_calibration: u16,
    pub scat_params: [f32; 6],
    pub tv_params: [f32; 2],
    pub petct_fov_offset: [f32; 3],
    pub ct_rotation_angle: f32,
    pub series_number: u16,
    pub recon_software_version: String,
    pub prompts_count: u32,
    pub delay_count: u32,
}

impl ImageInfo {
    pub fn decode(cur: &mut ByteCursor) -> Result<Self> {
        Ok(ImageInfo {
            length: cur.read_u32()?,
            rows: cur.read_u16()?,
            cols: cur.read_u16()?,
            slices: cur.read_u16()?,
            row_pixel_size: cur.read_f32()?,
            col_pixel_size: cur.read_f32()?,
            slice_thickness: cur.read_f32()?,
            recon_method: cur.read_string(16)?,
            max_ring_diff: cur.read_u16()?,
            subset_count: cur.read_u16()?,
            iteration_count: cur.read_u16()?,
            attn_calibration: cur.read_u16()?,
            scat_calibration: cur.read_u16()?,
            scat_params: cur.read_f32_array()?,
            tv_params: cur.read_f32_array()?,
            petct_fov_offset: cur.read_f32_array()?,
            ct_rotation_angle: cur.read_f32()?,
            series_number: cur.read_u16()?,
            recon_software_version: cur.read_string(16)?,
            prompts_count: cur.read_u32()?,
            delay_count: cur.read_u32()?,
        })
    }
}

/// Trailing descriptor of the payload region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataInfo {
    pub length: u32,
    pub data_length: u32,
    pub crc: u16,
}

impl DataInfo {
    pub fn decode(cur: &mut ByteCursor) -> Result<Self> {
        Ok(DataInfo {
            length: cur.read_u32()?,
            data_length: cur.read_u32()?,
            crc: cur.read_u16()?,
        })
    }
}
