//! DICOM attribute and pixel extraction
//!
//! Reads everything the quality pipeline needs from a DICOM object:
//! modality, calibration parameters, stored pixels, and the acquisition
//! summary shown alongside a verdict.

pub mod acquisition;
pub mod calibration;
pub mod pixels;
pub mod tags;
pub mod values;

pub use acquisition::{parse_dicom_date, AcquisitionInfo, PixelSpacing};
pub use calibration::{extract_calibration, extract_modality};
pub use pixels::read_raw_image;
pub use tags::*;
pub use values::parse_decimals;
