//! LLM client trait and request/response types.
//!
//! Defines the interface the vision and text-generation backends implement,
//! plus the factory that builds them from configuration.

use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A generation request, with or without an image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Image to analyze; `None` for text-only generation
    pub image: Option<ImageInput>,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Text-only request with conservative sampling defaults.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            image: None,
            prompt: prompt.into(),
            max_tokens: 800,
            temperature: 0.3,
        }
    }

    /// Image + instruction request.
    pub fn vision(image: ImageInput, prompt: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            prompt: prompt.into(),
            max_tokens: 500,
            temperature: 0.2,
        }
    }
}

/// The response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn LlmClient>` for dynamic dispatch).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Backend name for logging (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Human-readable label attached to detection results.
    fn label(&self) -> &str;

    /// Generate text for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError>;

    /// Per-request timeout for this backend.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Environment variable hint for a `${ENV_VAR}` config value.
fn env_hint(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        value[2..value.len() - 1].to_string()
    } else {
        "an api_key in the config file".to_string()
    }
}

/// Map a reqwest transport failure to a provider error.
pub(crate) fn transport_error(provider: &str, timeout: Duration, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        ProviderError::http(provider, format!("request failed: {e}"), None)
    }
}

/// Turn a non-2xx response into a provider error carrying the status code.
pub(crate) async fn ensure_success(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(ProviderError::http(
        provider,
        format!("HTTP {status}: {text}"),
        Some(status.as_u16()),
    ))
}

/// Factory that creates LLM clients from configuration.
pub struct LlmClientFactory;

impl LlmClientFactory {
    /// Names of the vision-capable backends in preference order.
    pub const VISION_BACKENDS: [&'static str; 3] = ["gemini", "openai", "anthropic"];

    /// Create an LLM client by backend name.
    ///
    /// Fails with `MissingCredential` when the configured key does not
    /// resolve to a non-empty value.
    pub fn create(
        backend: &str,
        config: &ProvidersConfig,
    ) -> Result<Arc<dyn LlmClient>, ProviderError> {
        match backend {
            "gemini" => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ProviderError::MissingCredential {
                        provider: backend.to_string(),
                        env_hint: env_hint(&cfg.api_key),
                    }
                })?;
                Ok(Arc::new(super::gemini::GeminiClient::new(&api_key, &cfg)))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ProviderError::MissingCredential {
                        provider: backend.to_string(),
                        env_hint: env_hint(&cfg.api_key),
                    }
                })?;
                Ok(Arc::new(super::openai::OpenAiClient::new(&api_key, &cfg)))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ProviderError::MissingCredential {
                        provider: backend.to_string(),
                        env_hint: env_hint(&cfg.api_key),
                    }
                })?;
                Ok(Arc::new(super::anthropic::AnthropicClient::new(
                    &api_key, &cfg,
                )))
            }
            other => Err(ProviderError::http(
                other,
                format!("Unknown LLM backend: {other}"),
                None,
            )),
        }
    }
}
