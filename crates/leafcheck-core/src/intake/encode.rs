//! Re-encoding for hosted classifiers, which expect a small square JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::ImageError;

const JPEG_QUALITY: u8 = 90;

/// Resize to `size × size`, drop alpha, and encode as JPEG.
pub fn classifier_jpeg(image: &DynamicImage, size: u32) -> Result<Vec<u8>, ImageError> {
    let resized = image.resize_exact(size, size, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}
