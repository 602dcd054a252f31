//! Hosted image-classifier adapter with endpoint rotation.
//!
//! The image is resized to a small square JPEG and posted to one of several
//! redundant model endpoints. A model that is warming up or unavailable
//! moves the cursor to the next one. Each call tries every configured model
//! at most once.

use super::DetectionProvider;
use crate::config::ClassifierConfig;
use crate::error::{ImageError, ProviderError};
use crate::intake::encode::classifier_jpeg;
use crate::intake::LeafImage;
use crate::knowledge::format_label;
use crate::llm::provider::{ensure_success, transport_error};
use crate::llm::resolve_env_var;
use crate::types::{Alternative, DetectionResult, ProviderOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const NAME: &str = "classifier";
const LABEL: &str = "Hosted Classifier";

/// Number of runner-up labels surfaced as alternatives.
const MAX_ALTERNATIVES: usize = 2;

/// One ranked label from the classifier.
#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    label: String,
    score: f32,
}

/// Hosted classifier adapter.
pub struct ClassifierAdapter {
    client: reqwest::Client,
    base_url: String,
    models: Vec<String>,
    token: Option<String>,
    timeout: Duration,
    image_size: u32,
    /// Index of the model tried first on the next call
    cursor: AtomicUsize,
}

impl ClassifierAdapter {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            token: resolve_env_var(&config.api_token),
            timeout: Duration::from_millis(config.timeout_ms),
            image_size: config.image_size,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Whether requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// The model the next call will try first.
    pub fn current_model(&self) -> Option<&str> {
        if self.models.is_empty() {
            return None;
        }
        let idx = self.cursor.load(Ordering::Relaxed) % self.models.len();
        Some(&self.models[idx])
    }

    async fn classify(&self, model: &str, jpeg: &[u8]) -> Result<(Vec<Prediction>, serde_json::Value), ProviderError> {
        let url = format!("{}/{}", self.base_url, model);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "image/jpeg")
            .body(jpeg.to_vec())
            .timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let resp = request
            .send()
            .await
            .map_err(|e| transport_error(NAME, self.timeout, e))?;
        let resp = ensure_success(NAME, resp).await?;

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::parse(NAME, e.to_string()))?;
        let predictions = parse_predictions(&body)?;
        Ok((predictions, body))
    }

    fn build_result(&self, model: &str, mut predictions: Vec<Prediction>, raw: serde_json::Value) -> DetectionResult {
        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
        let mut ranked = predictions.into_iter();

        // Callers guarantee at least one prediction
        let top = ranked.next().unwrap_or(Prediction {
            label: String::new(),
            score: 0.0,
        });

        let mut result = DetectionResult::new(format_label(&top.label), top.score * 100.0, LABEL);
        result.alternatives = ranked
            .take(MAX_ALTERNATIVES)
            .map(|p| Alternative {
                name: format_label(&p.label),
                confidence: p.score * 100.0,
            })
            .collect();
        result.raw_response = serde_json::json!({
            "model": model,
            "predictions": raw,
        });
        result
    }
}

/// Whether a failure should move on to the next model endpoint.
///
/// Warm-up (503), rate limits, other 5xx, timeouts and connection failures
/// rotate, and so does a missing model. Auth failures stop the loop: every
/// endpoint shares the same token.
fn should_rotate(err: &ProviderError) -> bool {
    err.is_retryable() || err.status_code() == Some(404)
}

/// Accept both `[{label, score}]` and `[[{label, score}]]`.
///
/// An `{"error": "... loading ..."}` body is reported as a warm-up failure.
fn parse_predictions(body: &serde_json::Value) -> Result<Vec<Prediction>, ProviderError> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        let status = if message.to_lowercase().contains("loading") {
            Some(503)
        } else {
            None
        };
        return Err(ProviderError::http(NAME, message.to_string(), status));
    }

    let list = match body.as_array() {
        Some(outer) if outer.first().is_some_and(|v| v.is_array()) => &outer[0],
        Some(_) => body,
        None => return Err(ProviderError::parse(NAME, "expected a list of predictions")),
    };

    serde_json::from_value(list.clone()).map_err(|e| ProviderError::parse(NAME, e.to_string()))
}

#[async_trait]
impl DetectionProvider for ClassifierAdapter {
    fn name(&self) -> &str {
        NAME
    }

    async fn detect(&self, image: &LeafImage) -> ProviderOutcome {
        if self.models.is_empty() {
            return ProviderOutcome::NoResult;
        }
        let Some(pixels) = &image.pixels else {
            tracing::debug!("Classifier skipped: no decoded pixels to resize");
            return ProviderOutcome::NoResult;
        };
        let jpeg = match classifier_jpeg(pixels, self.image_size) {
            Ok(jpeg) => jpeg,
            Err(e) => return image_failure(e),
        };

        let count = self.models.len();
        let start = self.cursor.load(Ordering::Relaxed) % count;
        let mut last_error = String::new();

        for attempt in 0..count {
            let idx = (start + attempt) % count;
            let model = &self.models[idx];

            match self.classify(model, &jpeg).await {
                Ok((predictions, raw)) if !predictions.is_empty() => {
                    self.cursor.store(idx, Ordering::Relaxed);
                    let result = self.build_result(model, predictions, raw);
                    return ProviderOutcome::from_result(result);
                }
                Ok(_) => {
                    tracing::warn!(model = %model, "Classifier returned no predictions, rotating");
                    last_error = format!("{model}: empty prediction list");
                }
                Err(e) if should_rotate(&e) => {
                    tracing::warn!(model = %model, error = %e, "Classifier endpoint unavailable, rotating");
                    last_error = e.to_string();
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Classifier request rejected");
                    return ProviderOutcome::Failed(e.to_string());
                }
            }
            self.cursor.store((idx + 1) % count, Ordering::Relaxed);
        }

        ProviderOutcome::Failed(format!(
            "all {count} classifier endpoints failed, last error: {last_error}"
        ))
    }

    fn timeout(&self) -> Duration {
        // One full rotation pass plus encoding headroom
        self.timeout * self.models.len().max(1) as u32 + Duration::from_secs(1)
    }
}

/// The image could not be prepared, so no endpoint is worth calling.
fn image_failure(source: ImageError) -> ProviderOutcome {
    let error = ProviderError::Image {
        provider: NAME.to_string(),
        source,
    };
    tracing::warn!("{error}");
    ProviderOutcome::Failed(error.to_string())
}
