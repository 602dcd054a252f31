//! Image decoding with format detection, size limits, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::ImageError;

/// Image decoder with configurable limits and timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// An uploaded image as seen by providers: the original bytes plus
/// whatever could be decoded from them.
#[derive(Debug, Clone)]
pub struct LeafImage {
    /// Original payload, forwarded untouched to vision models
    pub bytes: Arc<Vec<u8>>,
    /// Detected container format, if recognized
    pub format: Option<ImageFormat>,
    /// Decoded pixels; `None` when the pixel data could not be decoded
    pub pixels: Option<Arc<DynamicImage>>,
}

impl LeafImage {
    /// Format name used when building provider payloads.
    pub fn format_name(&self) -> &'static str {
        self.format.map(format_to_str).unwrap_or("jpeg")
    }
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory payload off the async runtime, bounded by the
    /// configured decode timeout.
    pub async fn decode(&self, bytes: Arc<Vec<u8>>) -> Result<DecodedImage, ImageError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(ImageError::FileTooLarge {
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_sync(&bytes)).await
        })
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ImageError::Decode(format!("Task join error: {e}"))),
            Err(_) => Err(ImageError::Timeout {
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    pub fn decode_sync(bytes: &[u8]) -> Result<DecodedImage, ImageError> {
        let format = detect_format(bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}

/// Detect the container format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat(
            "payload too small to be an image".to_string(),
        ));
    }
    image::guess_format(bytes)
        .map_err(|_| ImageError::UnsupportedFormat("unrecognized magic bytes".to_string()))
}

/// Convert an ImageFormat to its short name.
pub fn format_to_str(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Pnm => "pnm",
        ImageFormat::Avif => "avif",
        _ => "unknown",
    }
}
