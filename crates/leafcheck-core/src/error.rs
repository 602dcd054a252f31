//! Error types for the LeafCheck detection core.
//!
//! Errors are organized by stage so messages carry the context that matters
//! (file paths, provider names, HTTP status codes).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for LeafCheck operations.
#[derive(Error, Debug)]
pub enum LeafError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image loading and preparation errors
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Provider setup or call errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Image input errors.
#[derive(Error, Debug)]
pub enum ImageError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File could not be read
    #[error("Cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    /// Payload exceeds size limit
    #[error("Image too large: {size_mb}MB > {max_mb}MB")]
    FileTooLarge { size_mb: u64, max_mb: u64 },

    /// Image container not recognized
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Pixel data failed to decode
    #[error("Decode error: {0}")]
    Decode(String),

    /// Re-encoding for a provider failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Decoding took too long
    #[error("Image decode timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Errors raised by an individual provider. These never escape the
/// orchestrator; they are logged and the chain moves on.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP transport or status failure
    #[error("{provider}: {message}")]
    Http {
        provider: String,
        message: String,
        /// HTTP status code, when the server answered
        status_code: Option<u16>,
    },

    /// Response body could not be understood
    #[error("{provider}: unparseable response: {message}")]
    Parse { provider: String, message: String },

    /// The call exceeded the provider's timeout
    #[error("{provider}: timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// No usable credential was configured
    #[error("{provider}: no API key configured (set {env_hint})")]
    MissingCredential { provider: String, env_hint: String },

    /// The image could not be prepared for this provider
    #[error("{provider}: {source}")]
    Image {
        provider: String,
        #[source]
        source: ImageError,
    },
}

impl ProviderError {
    /// Build an HTTP error from a provider name and message.
    pub fn http(provider: &str, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Http {
            provider: provider.to_string(),
            message: message.into(),
            status_code,
        }
    }

    /// Build a parse error from a provider name and message.
    pub fn parse(provider: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status code, if the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether the failure is transient.
    ///
    /// Transient: timeouts, rate limits (429), server errors (5xx) and
    /// connection failures. Auth failures and bad requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http {
                status_code,
                message,
                ..
            } => {
                if let Some(code) = status_code {
                    return *code == 429 || (500..=599).contains(code);
                }
                // Non-HTTP transport failures (DNS, refused connection)
                message.contains("timed out") || message.contains("connect")
            }
            _ => false,
        }
    }
}

/// Convenience type alias for LeafCheck results.
pub type Result<T> = std::result::Result<T, LeafError>;
