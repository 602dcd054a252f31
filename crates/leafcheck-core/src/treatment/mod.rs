//! Treatment derivation: model-generated advice first, the static disease
//! table second, and a one-line default for any section still empty.

pub mod parse;

pub use parse::parse_sections;

use crate::config::TreatmentConfig;
use crate::knowledge::{healthy_plan, is_healthy_signal, KnowledgeBase};
use crate::llm::{LlmClient, LlmRequest};
use crate::types::TreatmentPlan;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_ORGANIC: &str = "Remove affected plant parts and monitor the plant closely";
const DEFAULT_CHEMICAL: &str = "Consult a local agricultural extension officer before applying chemicals";
const DEFAULT_PREVENTION: &str = "Inspect plants regularly for early signs of disease";

/// Build the treatment-generation prompt.
pub fn treatment_prompt(disease_name: &str, confidence: Option<f32>) -> String {
    let confidence = confidence
        .map(|c| format!(" (detection confidence {c:.0}%)"))
        .unwrap_or_default();
    format!(
        "You are an agricultural expert. Give treatment advice for the plant disease \"{disease_name}\"{confidence}.

Respond with exactly three sections, each a short bulleted list. Include concrete measurements (doses, dilutions, intervals) where applicable.

ORGANIC TREATMENT:
- ...

CHEMICAL TREATMENT:
- ...

PREVENTION:
- ..."
    )
}

/// Derives a [`TreatmentPlan`] for a canonical disease name.
#[derive(Clone)]
pub struct TreatmentDeriver {
    client: Option<Arc<dyn LlmClient>>,
    knowledge: KnowledgeBase,
    config: TreatmentConfig,
}

impl TreatmentDeriver {
    pub fn new(client: Option<Arc<dyn LlmClient>>, config: TreatmentConfig) -> Self {
        Self {
            client,
            knowledge: KnowledgeBase::builtin(),
            config,
        }
    }

    /// Deriver that only consults the static table.
    pub fn offline(config: TreatmentConfig) -> Self {
        Self::new(None, config)
    }

    pub fn has_ai(&self) -> bool {
        self.client.is_some()
    }

    /// Derive a plan. Never fails: generation errors fall back to the table.
    pub async fn derive(&self, disease_name: &str, confidence: Option<f32>) -> TreatmentPlan {
        if is_healthy_signal(disease_name) {
            return healthy_plan();
        }

        let static_plan = self.knowledge.static_plan(disease_name);
        let plan = match self.generate(disease_name, confidence).await {
            Some(mut generated) => {
                generated.immediate_actions = static_plan.immediate_actions;
                generated
            }
            None => static_plan,
        };
        fill_defaults(plan)
    }

    /// Ask the model. `None` when unavailable, failed, or nothing parsed.
    async fn generate(&self, disease_name: &str, confidence: Option<f32>) -> Option<TreatmentPlan> {
        let client = self.client.as_ref()?;
        let request = LlmRequest::text(treatment_prompt(disease_name, confidence));
        let limit = Duration::from_millis(self.config.timeout_ms);

        let response = match tokio::time::timeout(limit, client.generate(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(provider = client.name(), error = %e, "Treatment generation failed, using static rules");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    provider = client.name(),
                    timeout_ms = self.config.timeout_ms,
                    "Treatment generation timed out, using static rules"
                );
                return None;
            }
        };

        let plan = parse_sections(&response.text, self.config.max_items, self.config.min_item_len);
        if plan.is_blank() {
            tracing::warn!(provider = client.name(), "Treatment response had no usable sections, using static rules");
            return None;
        }
        tracing::debug!(
            provider = client.name(),
            organic = plan.organic.len(),
            chemical = plan.chemical.len(),
            prevention = plan.prevention.len(),
            "Treatment generated"
        );
        Some(plan)
    }
}

/// Give every required section at least one line.
fn fill_defaults(mut plan: TreatmentPlan) -> TreatmentPlan {
    if plan.organic.is_empty() {
        plan.organic.push(DEFAULT_ORGANIC.to_string());
    }
    if plan.chemical.is_empty() {
        plan.chemical.push(DEFAULT_CHEMICAL.to_string());
    }
    if plan.prevention.is_empty() {
        plan.prevention.push(DEFAULT_PREVENTION.to_string());
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Mock language model for testing.
    struct MockLlm {
        reply: Option<String>,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MockLlm {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        fn name(&self) -> &str {
            "mock"
        }

        fn label(&self) -> &str {
            "Mock"
        }

        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.image.is_none());
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Some(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: "mock-1".to_string(),
                    tokens_used: None,
                    latency_ms: 0,
                }),
                None => Err(ProviderError::http("mock", "HTTP 500", Some(500))),
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    fn assert_complete(plan: &TreatmentPlan) {
        assert!(!plan.organic.is_empty());
        assert!(!plan.chemical.is_empty());
        assert!(!plan.prevention.is_empty());
    }

    #[tokio::test]
    async fn test_every_plan_is_complete_offline() {
        let deriver = TreatmentDeriver::offline(TreatmentConfig::default());
        for name in [
            "Healthy Plant",
            "Tomato Early Blight",
            "Powdery Mildew",
            "Totally Novel Disease XYZ",
        ] {
            assert_complete(&deriver.derive(name, Some(80.0)).await);
        }
    }

    #[tokio::test]
    async fn test_every_plan_is_complete_with_failing_model() {
        let llm = MockLlm::failing();
        let deriver = TreatmentDeriver::new(Some(llm.clone()), TreatmentConfig::default());
        for name in [
            "Healthy Plant",
            "Tomato Early Blight",
            "Powdery Mildew",
            "Totally Novel Disease XYZ",
        ] {
            let plan = deriver.derive(name, None).await;
            assert_complete(&plan);
            assert!(!plan.ai_generated);
        }
        // Healthy short-circuits before the model
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_healthy_skips_model() {
        let llm = MockLlm::answering("ORGANIC:\n- Something long enough");
        let deriver = TreatmentDeriver::new(Some(llm.clone()), TreatmentConfig::default());
        let plan = deriver.derive("Tomato - Healthy", Some(99.0)).await;
        assert_eq!(plan, healthy_plan());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generated_plan_is_used() {
        let llm = MockLlm::answering(
            "ORGANIC TREATMENT:\n- Neem oil 5ml/L weekly\nCHEMICAL TREATMENT:\n- Mancozeb 2.5g/L\nPREVENTION:\n- Wider plant spacing",
        );
        let deriver = TreatmentDeriver::new(Some(llm), TreatmentConfig::default());
        let plan = deriver.derive("Early Blight", Some(91.0)).await;
        assert!(plan.ai_generated);
        assert_eq!(plan.organic, vec!["Neem oil 5ml/L weekly"]);
        assert_eq!(plan.chemical, vec!["Mancozeb 2.5g/L"]);
        // Immediate actions still come from the table
        assert!(plan.immediate_actions.iter().any(|a| a.contains("infected parts")));
    }

    #[tokio::test]
    async fn test_partial_generation_gets_defaults() {
        let llm = MockLlm::answering("ORGANIC:\n- Copper soap spray 2g/L");
        let deriver = TreatmentDeriver::new(Some(llm), TreatmentConfig::default());
        let plan = deriver.derive("Rust", None).await;
        assert!(plan.ai_generated);
        assert_eq!(plan.chemical, vec![DEFAULT_CHEMICAL]);
        assert_eq!(plan.prevention, vec![DEFAULT_PREVENTION]);
    }

    #[tokio::test]
    async fn test_unparseable_generation_falls_back() {
        let llm = MockLlm::answering("Sorry, I cannot help with that.");
        let deriver = TreatmentDeriver::new(Some(llm), TreatmentConfig::default());
        let plan = deriver.derive("Powdery Mildew", None).await;
        assert!(!plan.ai_generated);
        assert!(plan.organic.iter().any(|o| o.contains("milk solution")));
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let llm = Arc::new(MockLlm {
            reply: Some("ORGANIC:\n- Too late to matter".to_string()),
            delay: Duration::from_millis(500),
            calls: AtomicU32::new(0),
        });
        let config = TreatmentConfig {
            timeout_ms: 20,
            ..TreatmentConfig::default()
        };
        let deriver = TreatmentDeriver::new(Some(llm), config);
        let plan = deriver.derive("Late Blight", None).await;
        assert!(!plan.ai_generated);
        assert_complete(&plan);
    }

    #[test]
    fn test_prompt_names_sections() {
        let prompt = treatment_prompt("Rust", Some(72.4));
        assert!(prompt.contains("\"Rust\" (detection confidence 72%)"));
        assert!(prompt.contains("ORGANIC TREATMENT:"));
        assert!(prompt.contains("PREVENTION:"));
    }
}
