//! Plant-plausibility check run before any provider is called.
//!
//! This is a cheap color-distribution filter against corrupt or obviously
//! non-plant input, not a strict gate. Unusual but valid photos pass with a
//! low confidence.

use image::DynamicImage;
use serde::Serialize;

use super::decode::{DecodedImage, ImageDecoder};
use crate::config::LimitsConfig;
use crate::error::ImageError;

/// Color analysis runs on a downscaled copy no larger than this.
const ANALYSIS_EDGE: u32 = 512;

/// Greenness ratio above which an image is accepted as foliage.
const GREEN_RATIO_THRESHOLD: f32 = 0.2;

const MAX_GREEN_CONFIDENCE: f32 = 95.0;
const BROWN_YELLOW_CONFIDENCE: f32 = 70.0;
const DEFAULT_CONFIDENCE: f32 = 60.0;
const UNDECODABLE_CONFIDENCE: f32 = 50.0;

/// Outcome of the precondition check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plausibility {
    pub is_plausible: bool,
    /// Percentage in [0, 100]
    pub confidence: f32,
}

impl Plausibility {
    const REJECTED: Self = Self {
        is_plausible: false,
        confidence: 0.0,
    };

    fn accepted(confidence: f32) -> Self {
        Self {
            is_plausible: true,
            confidence,
        }
    }
}

/// Mean channel intensities and the share of green-dominant pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStats {
    pub mean_red: f32,
    pub mean_green: f32,
    pub mean_blue: f32,
    /// Fraction of pixels where green exceeds both red and blue
    pub green_ratio: f32,
}

impl ColorStats {
    /// Compute stats over an image, downscaling large inputs first.
    pub fn from_image(image: &DynamicImage) -> Self {
        let sample = if image.width() > ANALYSIS_EDGE || image.height() > ANALYSIS_EDGE {
            image.thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE)
        } else {
            image.clone()
        };
        let rgb = sample.to_rgb8();

        let (mut r_sum, mut g_sum, mut b_sum) = (0u64, 0u64, 0u64);
        let mut green_dominant = 0u64;
        let mut count = 0u64;
        for pixel in rgb.as_raw().chunks_exact(3) {
            let (r, g, b) = (pixel[0], pixel[1], pixel[2]);
            r_sum += u64::from(r);
            g_sum += u64::from(g);
            b_sum += u64::from(b);
            if g > r && g > b {
                green_dominant += 1;
            }
            count += 1;
        }

        if count == 0 {
            return Self {
                mean_red: 0.0,
                mean_green: 0.0,
                mean_blue: 0.0,
                green_ratio: 0.0,
            };
        }
        let n = count as f32;
        Self {
            mean_red: r_sum as f32 / n,
            mean_green: g_sum as f32 / n,
            mean_blue: b_sum as f32 / n,
            green_ratio: green_dominant as f32 / n,
        }
    }

    /// Red and green both above blue: the brown/yellow cast of dried or
    /// diseased foliage.
    pub fn is_brown_yellow(&self) -> bool {
        self.mean_red > self.mean_blue && self.mean_green > self.mean_blue
    }
}

/// Runs the plausibility check against configured dimension limits.
#[derive(Debug, Clone)]
pub struct PlantCheck {
    min_dimension: u32,
    max_dimension: u32,
}

impl PlantCheck {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            min_dimension: limits.min_image_dimension,
            max_dimension: limits.max_image_dimension,
        }
    }

    /// Check raw bytes: decode, then assess.
    pub fn validate(&self, bytes: &[u8]) -> Plausibility {
        self.assess(&ImageDecoder::decode_sync(bytes))
    }

    /// Assess an already-attempted decode.
    ///
    /// An unrecognized container is rejected. A recognized container whose
    /// pixel data fails to decode is let through with low confidence.
    pub fn assess(&self, decoded: &Result<DecodedImage, ImageError>) -> Plausibility {
        match decoded {
            Ok(decoded) => self.assess_image(decoded.width, decoded.height, &decoded.image),
            Err(ImageError::Decode(message)) => {
                tracing::warn!("Pixel decode failed, continuing with low confidence: {message}");
                Plausibility::accepted(UNDECODABLE_CONFIDENCE)
            }
            Err(e) => {
                tracing::debug!("Image rejected before detection: {e}");
                Plausibility::REJECTED
            }
        }
    }

    fn assess_image(&self, width: u32, height: u32, image: &DynamicImage) -> Plausibility {
        if width < self.min_dimension || height < self.min_dimension {
            return Plausibility::REJECTED;
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Plausibility::REJECTED;
        }

        let stats = ColorStats::from_image(image);
        // Not monotonic: ratios just above the threshold score below
        // min_plausibility while the flat fallbacks below score 60-70.
        if stats.green_ratio > GREEN_RATIO_THRESHOLD {
            return Plausibility::accepted((stats.green_ratio * 100.0).min(MAX_GREEN_CONFIDENCE));
        }
        if stats.is_brown_yellow() {
            return Plausibility::accepted(BROWN_YELLOW_CONFIDENCE);
        }
        Plausibility::accepted(DEFAULT_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::decode::tests::solid_png;

    fn check() -> PlantCheck {
        PlantCheck::new(&LimitsConfig::default())
    }

    #[test]
    fn test_small_image_rejected() {
        let result = check().validate(&solid_png(50, 50, [0, 0, 0]));
        assert_eq!(result, Plausibility::REJECTED);
    }

    #[test]
    fn test_green_image_accepted_with_capped_confidence() {
        let result = check().validate(&solid_png(300, 300, [30, 160, 40]));
        assert!(result.is_plausible);
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn test_brown_image_gets_moderate_confidence() {
        let result = check().validate(&solid_png(200, 200, [140, 100, 40]));
        assert!(result.is_plausible);
        assert_eq!(result.confidence, 70.0);
    }

    #[test]
    fn test_blue_image_gets_low_confidence() {
        let result = check().validate(&solid_png(200, 200, [20, 40, 200]));
        assert!(result.is_plausible);
        assert_eq!(result.confidence, 60.0);
    }

    #[test]
    fn test_garbage_rejected() {
        let result = check().validate(b"this is a text file, not a photo");
        assert_eq!(result, Plausibility::REJECTED);
    }

    #[test]
    fn test_truncated_pixels_are_permissive() {
        let bytes = solid_png(300, 300, [30, 160, 40]);
        let result = check().validate(&bytes[..bytes.len() / 2]);
        assert!(result.is_plausible);
        assert_eq!(result.confidence, 50.0);
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let limits = LimitsConfig {
            min_image_dimension: 10,
            max_image_dimension: 150,
            ..LimitsConfig::default()
        };
        let result = PlantCheck::new(&limits).validate(&solid_png(200, 120, [0, 200, 0]));
        assert_eq!(result, Plausibility::REJECTED);
    }

    #[test]
    fn test_color_stats_green_ratio() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            10,
            10,
            image::Rgb([10, 200, 10]),
        ));
        let stats = ColorStats::from_image(&img);
        assert_eq!(stats.green_ratio, 1.0);
        assert_eq!(stats.mean_green, 200.0);
        assert!(!stats.is_brown_yellow());
    }
}
