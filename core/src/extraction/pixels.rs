use dicom_object::DefaultDicomObject;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use log::debug;

use crate::error::{QcError, Result};
use crate::types::RawImage;

/// Decodes the stored pixel values of the first frame
///
/// The modality LUT is not applied here; rescaling belongs to pixel
/// calibration so that it is validated per modality.
///
/// # Errors
///
/// - [`QcError::DicomError`] if the pixel data cannot be decoded
/// - [`QcError::InvalidImage`] for color images or a truncated frame
pub fn read_raw_image(obj: &DefaultDicomObject) -> Result<RawImage> {
    let decoded = obj.decode_pixel_data()?;

    let samples = decoded.samples_per_pixel();
    if samples != 1 {
        return Err(QcError::InvalidImage(format!(
            "expected a grayscale image, got {} samples per pixel",
            samples
        )));
    }

    let width = decoded.columns() as usize;
    let height = decoded.rows() as usize;
    let frames = decoded.number_of_frames();
    if frames > 1 {
        debug!("multi-frame object with {} frames, using the first", frames);
    }

    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let mut pixels = decoded.to_vec_with_options::<i32>(&options)?;
    let frame_len = width * height;
    if pixels.len() < frame_len {
        return Err(QcError::InvalidImage(format!(
            "pixel data holds {} values, expected {} for {}x{}",
            pixels.len(),
            frame_len,
            width,
            height
        )));
    }
    pixels.truncate(frame_len);

    RawImage::new(width, height, pixels)
}
