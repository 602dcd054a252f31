//! Anthropic client using the Messages API.
//!
//! Sends image + prompt with base64 image content blocks.

use super::provider::{ensure_success, transport_error, LlmClient, LlmRequest, LlmResponse};
use crate::config::AnthropicConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Anthropic client using the Messages API.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(api_key: &str, config: &AnthropicConfig) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn label(&self) -> &str {
        "Claude Vision"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();

        let mut content = Vec::with_capacity(2);
        if let Some(image) = &request.image {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64".to_string(),
                    media_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            });
        }
        content.push(ContentBlock::Text {
            text: request.prompt.clone(),
        });

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(self.name(), self.timeout, e))?;

        let resp = ensure_success(self.name(), resp).await?;

        let messages_resp: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::parse(self.name(), e.to_string()))?;

        let text = messages_resp
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::parse(
                self.name(),
                "empty response, no text content generated",
            ));
        }

        Ok(LlmResponse {
            text,
            model: messages_resp.model,
            tokens_used: messages_resp
                .usage
                .map(|u| u.input_tokens + u.output_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnthropicClient {
        let config = AnthropicConfig {
            endpoint: format!("{}/v1/messages", server.uri()),
            ..AnthropicConfig::default()
        };
        AnthropicClient::new("ak-test", &config)
    }

    #[tokio::test]
    async fn test_text_blocks_are_joined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "content": [{"type": "text", "text": "ORGANIC:\n"}, {"type": "text", "text": "- Neem oil spray"}],
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .generate(&LlmRequest::text("treat rust"))
            .await
            .unwrap();
        assert_eq!(response.text, "ORGANIC:\n- Neem oil spray");
        assert_eq!(response.tokens_used, Some(15));
    }

    #[tokio::test]
    async fn test_auth_failure_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(&LlmRequest::text("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(!err.is_retryable());
    }
}
