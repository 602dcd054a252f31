//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.min_image_dimension >= self.limits.max_image_dimension {
            return Err(ConfigError::ValidationError(
                "limits.min_image_dimension must be < limits.max_image_dimension".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        for (key, value) in [
            ("detection.min_plausibility", self.detection.min_plausibility),
            ("detection.vision_confidence", self.detection.vision_confidence),
            ("detection.healthy_confidence", self.detection.healthy_confidence),
            (
                "detection.low_confidence_threshold",
                self.detection.low_confidence_threshold,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must be between 0 and 100"
                )));
            }
        }
        if self.providers.classifier.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "providers.classifier.image_size must be > 0".into(),
            ));
        }
        if self.treatment.max_items == 0 {
            return Err(ConfigError::ValidationError(
                "treatment.max_items must be > 0".into(),
            ));
        }
        if !matches!(
            self.treatment.provider.as_str(),
            "auto" | "gemini" | "openai" | "anthropic"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "treatment.provider must be auto, gemini, openai or anthropic (got {})",
                self.treatment.provider
            )));
        }
        Ok(())
    }
}
