//! Vision-LLM adapter: image + structured instruction in, free text out.

use super::DetectionProvider;
use crate::config::DetectionConfig;
use crate::intake::LeafImage;
use crate::knowledge::canonicalize;
use crate::llm::{ImageInput, LlmClient, LlmRequest};
use crate::types::{clamp_confidence, DetectionResult, ProviderOutcome, HEALTHY_PLANT};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Instruction sent with every image.
pub const VISION_PROMPT: &str = "You are an expert plant pathologist. Analyze this plant image and provide:

1. Plant/Crop type (if identifiable)
2. Disease name (or \"Healthy\" if no disease)
3. Confidence level (0-100)
4. Pathogen name (if diseased)
5. Key symptoms observed
6. Severity (Low/Medium/High)

Respond in exactly this format:
CROP: [crop name]
DISEASE: [disease name or Healthy]
CONFIDENCE: [number]
PATHOGEN: [pathogen name or None]
SYMPTOMS: [comma-separated symptoms]
SEVERITY: [Low/Medium/High/None]

If you cannot identify a disease, answer \"Healthy\" or \"Unknown\".";

/// Adapts an [`LlmClient`] into a detection provider.
pub struct VisionAdapter {
    client: Arc<dyn LlmClient>,
    default_confidence: f32,
    healthy_confidence: f32,
}

impl VisionAdapter {
    pub fn new(client: Arc<dyn LlmClient>, detection: &DetectionConfig) -> Self {
        Self {
            client,
            default_confidence: detection.vision_confidence,
            healthy_confidence: detection.healthy_confidence,
        }
    }

    /// Turn a model answer into a result.
    pub fn parse_response(&self, text: &str) -> DetectionResult {
        let fields = VisionFields::parse(text);

        let disease_source = fields.disease.as_deref().unwrap_or(text);
        let disease_name = canonicalize(disease_source);

        let mut result = DetectionResult::new(
            disease_name,
            fields.confidence.unwrap_or(self.default_confidence),
            self.client.label(),
        );
        result.crop = fields.crop;
        result.pathogen = fields.pathogen;
        result.symptoms = fields.symptoms;
        result.severity = fields.severity;

        if result.disease_name == HEALTHY_PLANT {
            result.confidence = clamp_confidence(self.healthy_confidence);
            result.severity = Some("None".to_string());
            result.pathogen = None;
        }
        result
    }
}

#[async_trait]
impl DetectionProvider for VisionAdapter {
    fn name(&self) -> &str {
        self.client.name()
    }

    async fn detect(&self, image: &LeafImage) -> ProviderOutcome {
        let input = ImageInput::from_bytes(&image.bytes, image.format_name());
        let request = LlmRequest::vision(input, VISION_PROMPT);

        match self.client.generate(&request).await {
            Ok(response) => {
                tracing::debug!(
                    provider = self.client.name(),
                    model = %response.model,
                    latency_ms = response.latency_ms,
                    "Vision model answered"
                );
                let mut result = self.parse_response(&response.text);
                result.raw_response = serde_json::json!({
                    "model": response.model,
                    "text": response.text,
                    "tokens_used": response.tokens_used,
                });
                ProviderOutcome::from_result(result)
            }
            Err(e) => ProviderOutcome::Failed(e.to_string()),
        }
    }

    fn timeout(&self) -> Duration {
        self.client.timeout()
    }
}

/// Labeled fields pulled out of a line-oriented answer.
#[derive(Debug, Default, PartialEq)]
struct VisionFields {
    crop: Option<String>,
    disease: Option<String>,
    confidence: Option<f32>,
    pathogen: Option<String>,
    symptoms: Vec<String>,
    severity: Option<String>,
}

impl VisionFields {
    fn parse(text: &str) -> Self {
        let mut fields = Self::default();
        for line in text.lines() {
            let Some((key, value)) = split_labeled_line(line) else {
                continue;
            };
            match key.as_str() {
                "CROP" => fields.crop = non_placeholder(value),
                "DISEASE" => fields.disease = disease_value(value).or(fields.disease),
                "CONFIDENCE" => fields.confidence = parse_confidence(value),
                "PATHOGEN" => fields.pathogen = non_placeholder(value),
                "SYMPTOMS" => {
                    fields.symptoms = value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
                "SEVERITY" => fields.severity = non_placeholder(value),
                _ => {}
            }
        }
        fields
    }
}

/// Split `**DISEASE:** Early blight` into ("DISEASE", "Early blight").
fn split_labeled_line(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key
        .trim()
        .trim_start_matches(['-', '*', '#', ' '])
        .trim_end_matches('*')
        .trim()
        .to_ascii_uppercase();
    if key.is_empty() || (key.contains(' ') && !key.starts_with("DISEASE")) {
        return None;
    }
    let key = if key.starts_with("DISEASE") {
        "DISEASE".to_string()
    } else {
        key
    };
    Some((key, value.trim().trim_matches('*').trim()))
}

/// Bracketed template text and "None"/"N/A" mean the model had nothing.
fn non_placeholder(value: &str) -> Option<String> {
    let value = value.trim().trim_matches(|c: char| c == '[' || c == ']').trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "none" | "n/a" | "na" | "-" => None,
        _ => Some(value.to_string()),
    }
}

/// A DISEASE label of "None" is a healthy verdict, not a missing field.
fn disease_value(value: &str) -> Option<String> {
    let bare = value.trim().trim_matches(|c: char| c == '[' || c == ']').trim();
    match bare.to_ascii_lowercase().as_str() {
        "none" | "no disease" | "nothing" => Some(HEALTHY_PLANT.to_string()),
        _ => non_placeholder(value),
    }
}

/// First number in the value. Fractions in (0, 1] are read as ratios.
fn parse_confidence(value: &str) -> Option<f32> {
    let number: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let parsed: f32 = number.trim_end_matches('.').parse().ok()?;
    if number.contains('.') && parsed <= 1.0 {
        Some(clamp_confidence(parsed * 100.0))
    } else {
        Some(clamp_confidence(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::llm::LlmResponse;
    use crate::types::AttemptStatus;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedClient {
        reply: Result<String, u16>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        fn label(&self) -> &str {
            "Scripted Vision"
        }

        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.image.is_some());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: "scripted-1".to_string(),
                    tokens_used: None,
                    latency_ms: 1,
                }),
                Err(code) => Err(ProviderError::http("scripted", "boom", Some(*code))),
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    fn adapter(client: ScriptedClient) -> VisionAdapter {
        VisionAdapter::new(Arc::new(client), &DetectionConfig::default())
    }

    fn leaf() -> LeafImage {
        LeafImage {
            bytes: Arc::new(vec![0xFF, 0xD8, 0xFF, 0xE0]),
            format: Some(image::ImageFormat::Jpeg),
            pixels: None,
        }
    }

    #[test]
    fn test_parse_structured_answer() {
        let text = "CROP: Tomato\nDISEASE: Early blight\nCONFIDENCE: 82%\nPATHOGEN: Alternaria solani\nSYMPTOMS: concentric rings, yellow halo\nSEVERITY: Medium";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Early Blight");
        assert_eq!(result.confidence, 82.0);
        assert_eq!(result.crop.as_deref(), Some("Tomato"));
        assert_eq!(result.pathogen.as_deref(), Some("Alternaria solani"));
        assert_eq!(result.symptoms, vec!["concentric rings", "yellow halo"]);
        assert_eq!(result.severity.as_deref(), Some("Medium"));
        assert_eq!(result.provider_label, "Scripted Vision");
    }

    #[test]
    fn test_parse_markdown_labels() {
        let text = "**Disease Name:** Powdery mildew\n**Confidence:** 0.9";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Powdery Mildew");
        assert_eq!(result.confidence, 90.0);
    }

    #[test]
    fn test_free_text_gets_fixed_confidence() {
        let text = "This leaf shows classic signs of late blight.";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Late Blight");
        assert_eq!(result.confidence, 88.0);
    }

    #[test]
    fn test_healthy_answer() {
        let text = "CROP: Bean\nDISEASE: Healthy\nCONFIDENCE: 60\nPATHOGEN: None";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Healthy Plant");
        assert_eq!(result.confidence, 95.0);
        assert_eq!(result.severity.as_deref(), Some("None"));
        assert!(result.pathogen.is_none());
    }

    #[test]
    fn test_disease_none_is_healthy_despite_symptom_keywords() {
        let text = "CROP: Tomato\nDISEASE: None\nCONFIDENCE: 90\nPATHOGEN: None\nSYMPTOMS: no visible spots, uniform green\nSEVERITY: None";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Healthy Plant");
        assert_eq!(result.confidence, 95.0);
        assert!(result.pathogen.is_none());
        assert_eq!(result.crop.as_deref(), Some("Tomato"));
    }

    #[test]
    fn test_missing_disease_line_falls_back_to_full_text() {
        let text = "CROP: Pepper\nSYMPTOMS: water-soaked lesions typical of bacterial spot";
        let result = adapter(ScriptedClient::answering("")).parse_response(text);
        assert_eq!(result.disease_name, "Bacterial Spot");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(parse_confidence("140"), Some(100.0));
        assert_eq!(parse_confidence("about 75 percent"), Some(75.0));
        assert_eq!(parse_confidence("high"), None);
    }

    #[tokio::test]
    async fn test_unknown_answer_is_unidentified() {
        let outcome = adapter(ScriptedClient::answering("DISEASE: Unknown"))
            .detect(&leaf())
            .await;
        assert_eq!(outcome.kind(), AttemptStatus::Unidentified);
    }

    #[tokio::test]
    async fn test_identified_answer_keeps_raw_text() {
        let outcome = adapter(ScriptedClient::answering("DISEASE: Leaf rust"))
            .detect(&leaf())
            .await;
        let ProviderOutcome::Identified(result) = outcome else {
            panic!("expected identified outcome");
        };
        assert_eq!(result.disease_name, "Rust");
        assert_eq!(result.raw_response["text"], "DISEASE: Leaf rust");
    }

    #[tokio::test]
    async fn test_client_error_is_failed() {
        let client = ScriptedClient {
            reply: Err(500),
            calls: AtomicU32::new(0),
        };
        let outcome = adapter(client).detect(&leaf()).await;
        assert!(matches!(outcome, ProviderOutcome::Failed(reason) if reason.contains("boom")));
    }
}
