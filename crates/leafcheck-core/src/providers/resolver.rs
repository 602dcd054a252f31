//! Startup probe that turns configuration into an ordered provider chain.

use super::{ClassifierAdapter, DetectionProvider, VisionAdapter};
use crate::config::{Config, TreatmentConfig};
use crate::error::ProviderError;
use crate::llm::{LlmClient, LlmClientFactory};
use serde::Serialize;
use std::sync::Arc;

/// Provider family, in trust order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Supplied directly by the embedding application
    Custom,
    VisionLlm,
    HostedClassifier,
    Heuristic,
}

/// Setup status for one backend.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    /// Whether the provider made it into the chain
    pub available: bool,
    /// Setup note: missing credential, endpoint count, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of resolution. Built once, read-only afterwards.
pub struct ResolvedProviders {
    /// Detection chain in priority order; never empty
    pub chain: Vec<Arc<dyn DetectionProvider>>,
    /// Every backend considered, including excluded ones
    pub descriptors: Vec<ProviderDescriptor>,
    /// Configured language-model clients, in preference order
    pub llm_clients: Vec<Arc<dyn LlmClient>>,
}

impl ResolvedProviders {
    /// Pick the language model used for treatment generation.
    pub fn treatment_client(&self, treatment: &TreatmentConfig) -> Option<Arc<dyn LlmClient>> {
        if !treatment.ai_enabled {
            return None;
        }
        match treatment.provider.as_str() {
            "auto" => self.llm_clients.first().cloned(),
            name => self.llm_clients.iter().find(|c| c.name() == name).cloned(),
        }
    }

    /// Names of the chain members, in order.
    pub fn chain_names(&self) -> Vec<String> {
        self.chain.iter().map(|p| p.name().to_string()).collect()
    }
}

/// Probes credentials and builds the provider chain.
pub struct ProviderResolver;

impl ProviderResolver {
    /// Vision LLMs first, then the hosted classifier.
    ///
    /// A backend without a usable credential is left out of the chain. The
    /// classifier is always included, authenticated or not.
    pub fn resolve(config: &Config) -> ResolvedProviders {
        let mut chain: Vec<Arc<dyn DetectionProvider>> = Vec::new();
        let mut descriptors = Vec::new();
        let mut llm_clients = Vec::new();

        for backend in LlmClientFactory::VISION_BACKENDS {
            match LlmClientFactory::create(backend, &config.providers) {
                Ok(client) => {
                    tracing::debug!(provider = backend, "Vision provider configured");
                    chain.push(Arc::new(VisionAdapter::new(client.clone(), &config.detection)));
                    llm_clients.push(client);
                    descriptors.push(ProviderDescriptor {
                        name: backend.to_string(),
                        kind: ProviderKind::VisionLlm,
                        available: true,
                        detail: None,
                    });
                }
                Err(e) => {
                    let detail = match &e {
                        ProviderError::MissingCredential { env_hint, .. } => {
                            format!("no credential (set {env_hint})")
                        }
                        other => other.to_string(),
                    };
                    tracing::debug!(provider = backend, "Vision provider excluded: {detail}");
                    descriptors.push(ProviderDescriptor {
                        name: backend.to_string(),
                        kind: ProviderKind::VisionLlm,
                        available: false,
                        detail: Some(detail),
                    });
                }
            }
        }

        let classifier = ClassifierAdapter::new(&config.providers.classifier);
        let auth = if classifier.is_authenticated() {
            "authenticated"
        } else {
            "unauthenticated"
        };
        descriptors.push(ProviderDescriptor {
            name: classifier.name().to_string(),
            kind: ProviderKind::HostedClassifier,
            available: true,
            detail: Some(format!("{} endpoint(s), {auth}", classifier.models().len())),
        });
        chain.push(Arc::new(classifier));

        descriptors.push(ProviderDescriptor {
            name: "heuristic".to_string(),
            kind: ProviderKind::Heuristic,
            available: true,
            detail: Some("terminal fallback".to_string()),
        });

        tracing::info!(
            chain = ?chain.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Provider priority resolved"
        );

        ResolvedProviders {
            chain,
            descriptors,
            llm_clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnthropicConfig, GeminiConfig, OpenAiConfig, ProvidersConfig};

    fn config_with(providers: ProvidersConfig) -> Config {
        Config {
            providers,
            ..Config::default()
        }
    }

    fn no_credentials() -> ProvidersConfig {
        ProvidersConfig {
            gemini: Some(GeminiConfig {
                api_key: "${LEAFCHECK_TEST_UNSET_A}".to_string(),
                ..GeminiConfig::default()
            }),
            openai: Some(OpenAiConfig {
                api_key: "${LEAFCHECK_TEST_UNSET_B}".to_string(),
                ..OpenAiConfig::default()
            }),
            anthropic: Some(AnthropicConfig {
                api_key: String::new(),
                ..AnthropicConfig::default()
            }),
            ..ProvidersConfig::default()
        }
    }

    #[test]
    fn test_chain_never_empty_without_credentials() {
        let resolved = ProviderResolver::resolve(&config_with(no_credentials()));
        assert_eq!(resolved.chain_names(), vec!["classifier"]);
        assert!(resolved.llm_clients.is_empty());
        let excluded: Vec<_> = resolved
            .descriptors
            .iter()
            .filter(|d| !d.available)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(excluded, vec!["gemini", "openai", "anthropic"]);
    }

    #[test]
    fn test_vision_llms_rank_before_classifier() {
        let mut providers = no_credentials();
        providers.anthropic = Some(AnthropicConfig {
            api_key: "ak-literal".to_string(),
            ..AnthropicConfig::default()
        });
        providers.gemini = Some(GeminiConfig {
            api_key: "g-literal".to_string(),
            ..GeminiConfig::default()
        });
        let resolved = ProviderResolver::resolve(&config_with(providers));
        assert_eq!(resolved.chain_names(), vec!["gemini", "anthropic", "classifier"]);

        let kinds: Vec<_> = resolved.descriptors.iter().map(|d| d.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn test_treatment_client_selection() {
        let mut providers = no_credentials();
        providers.openai = Some(OpenAiConfig {
            api_key: "sk-literal".to_string(),
            ..OpenAiConfig::default()
        });
        let resolved = ProviderResolver::resolve(&config_with(providers));

        let auto = TreatmentConfig::default();
        assert_eq!(resolved.treatment_client(&auto).unwrap().name(), "openai");

        let named = TreatmentConfig {
            provider: "gemini".to_string(),
            ..TreatmentConfig::default()
        };
        assert!(resolved.treatment_client(&named).is_none());

        let disabled = TreatmentConfig {
            ai_enabled: false,
            ..TreatmentConfig::default()
        };
        assert!(resolved.treatment_client(&disabled).is_none());
    }
}
