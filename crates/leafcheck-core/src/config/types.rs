//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Limits applied to incoming images before any provider is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum payload size in megabytes
    pub max_file_size_mb: u64,

    /// Smallest accepted width or height in pixels
    pub min_image_dimension: u32,

    /// Largest accepted width or height in pixels
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 16,
            min_image_dimension: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Detection chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Precondition confidence below which an image is rejected outright
    pub min_plausibility: f32,

    /// Confidence assigned to vision-LLM answers that report none
    pub vision_confidence: f32,

    /// Confidence assigned to vision-LLM "healthy" determinations
    pub healthy_confidence: f32,

    /// Results below this confidence get second-opinion suggestions
    pub low_confidence_threshold: f32,

    /// Emit a labeled demo result when no pixel signal is available
    pub demo_fallback: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_plausibility: 30.0,
            vision_confidence: 88.0,
            healthy_confidence: 95.0,
            low_confidence_threshold: 70.0,
            demo_fallback: true,
        }
    }
}

/// External provider configurations.
///
/// A vision-LLM section that is absent falls back to its default, whose
/// API key points at an environment variable. Resolution excludes the
/// provider when that variable is unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Google Gemini configuration
    pub gemini: Option<GeminiConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,

    /// Hosted image-classifier configuration
    pub classifier: ClassifierConfig,
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Chat Completions URL
    pub endpoint: String,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Messages API URL
    pub endpoint: String,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Hosted image-classifier configuration.
///
/// `models` is the rotation set: when one endpoint is warming up or
/// unavailable the adapter moves to the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Bearer token (supports ${ENV_VAR} syntax). Optional.
    pub api_token: String,

    /// Base URL that model ids are appended to
    pub base_url: String,

    /// Ordered model ids
    pub models: Vec<String>,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,

    /// Square input size the image is resized to
    pub image_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_token: "${HF_TOKEN}".to_string(),
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            models: vec![
                "linkanjarad/mobilenet_v2_1.0_224-plant-disease-identification".to_string(),
                "nateraw/vit-base-beans".to_string(),
                "Diginsa/Plant-Disease-Detection-Project".to_string(),
            ],
            timeout_ms: 20_000,
            image_size: 224,
        }
    }
}

/// Treatment derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentConfig {
    /// Ask a language model before falling back to the static table
    pub ai_enabled: bool,

    /// "auto" picks the first configured LLM; otherwise "gemini", "openai" or "anthropic"
    pub provider: String,

    /// Maximum items kept per section
    pub max_items: usize,

    /// Lines shorter than this are discarded as noise
    pub min_item_len: usize,

    /// Generation timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            provider: "auto".to_string(),
            max_items: 6,
            min_item_len: 6,
            timeout_ms: 30_000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
