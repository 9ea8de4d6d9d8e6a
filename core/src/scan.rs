use dicom_object::{open_file, DefaultDicomObject};
use std::path::{Path, PathBuf};

use crate::calibration::{calibrate, CalibrationParams};
use crate::error::Result;
use crate::extraction::tags::{get_string_value, SOP_INSTANCE_UID};
use crate::extraction::{extract_calibration, extract_modality, read_raw_image, AcquisitionInfo};
use crate::types::{CalibratedImage, Modality};

/// Phantom scan loaded from a DICOM file
///
/// Combines the calibrated pixels with the attributes needed to identify
/// and describe the acquisition.
#[derive(Debug, Clone)]
pub struct PhantomScan {
    /// Path to the DICOM file
    pub file_path: PathBuf,

    /// SOP Instance UID
    pub sop_instance_uid: Option<String>,

    /// Calibration applied to the stored pixels
    pub calibration: CalibrationParams,

    /// Acquisition summary
    pub acquisition: AcquisitionInfo,

    /// Pixels in physical units
    pub image: CalibratedImage,
}

impl PhantomScan {
    /// Opens, decodes and calibrates a DICOM file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let obj = open_file(path)?;
        Self::from_dicom(path.to_path_buf(), &obj)
    }

    /// Builds a scan from an already-opened DICOM object
    ///
    /// # Errors
    ///
    /// Fails for unsupported modalities, undecodable pixel data and
    /// invalid calibration parameters.
    pub fn from_dicom(path: PathBuf, obj: &DefaultDicomObject) -> Result<Self> {
        let modality = extract_modality(obj)?;
        let calibration = extract_calibration(obj)?;
        let raw = read_raw_image(obj)?;
        let image = calibrate(&raw, modality, &calibration)?;

        Ok(Self {
            file_path: path,
            sop_instance_uid: get_string_value(obj, SOP_INSTANCE_UID),
            calibration,
            acquisition: AcquisitionInfo::extract(obj),
            image,
        })
    }

    pub fn modality(&self) -> Modality {
        self.image.modality()
    }

    /// Identifier used in verdicts: the SOP Instance UID, else the file name
    pub fn image_id(&self) -> String {
        self.sop_instance_uid.clone().unwrap_or_else(|| {
            self.file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.file_path.display().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawImage;

    fn scan(path: &str, uid: Option<&str>) -> PhantomScan {
        let raw = RawImage::new(2, 2, vec![0, 1, 2, 3]).unwrap();
        PhantomScan {
            file_path: PathBuf::from(path),
            sop_instance_uid: uid.map(str::to_string),
            calibration: CalibrationParams::rescale(1.0, -1024.0),
            acquisition: AcquisitionInfo::default(),
            image: calibrate(&raw, Modality::Ct, &CalibrationParams::rescale(1.0, -1024.0))
                .unwrap(),
        }
    }

    #[test]
    fn test_image_id_prefers_uid() {
        assert_eq!(scan("/data/ct/a.dcm", Some("1.2.3")).image_id(), "1.2.3");
        assert_eq!(scan("/data/ct/a.dcm", None).image_id(), "a.dcm");
        assert_eq!(scan("/data/ct/a.dcm", None).modality(), Modality::Ct);
    }

    #[test]
    fn test_missing_file() {
        assert!(PhantomScan::from_file("/nonexistent/phantom.dcm").is_err());
    }
}
