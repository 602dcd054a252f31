//! LeafCheck Core - plant-leaf disease detection library.
//!
//! LeafCheck takes a leaf photograph and returns a disease label with a
//! treatment plan. Detection walks an ordered chain of external AI services
//! and stops at the first definite answer.
//!
//! # Architecture
//!
//! ```text
//! Image → Precondition Check → Provider Chain (first success) → Canonicalize → Treatment → JSON
//! ```
//!
//! Vision-capable language models rank before hosted image classifiers,
//! which rank before a pixel-color heuristic. The chain is resolved once
//! from configuration and never empty.
//!
//! # Usage
//!
//! ```rust,ignore
//! use leafcheck_core::{AnalyzeOptions, Config, DetectionRequest, LeafCheck};
//!
//! #[tokio::main]
//! async fn main() -> leafcheck_core::Result<()> {
//!     let config = Config::load()?;
//!     let leafcheck = LeafCheck::new(config);
//!
//!     let bytes = std::fs::read("./leaf.jpg")?;
//!     let report = leafcheck
//!         .analyze(DetectionRequest::new(bytes), AnalyzeOptions::default())
//!         .await;
//!     println!("{}: {:.0}%", report.result.disease_name, report.result.confidence);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod intake;
pub mod knowledge;
pub mod llm;
pub mod orchestrator;
pub mod output;
pub mod providers;
pub mod treatment;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ImageError, LeafError, ProviderError, Result};
pub use knowledge::{canonicalize, format_label, KnowledgeBase};
pub use orchestrator::{Detection, Orchestrator};
pub use output::{OutputFormat, OutputWriter};
pub use providers::{DetectionProvider, ProviderDescriptor, ProviderResolver};
pub use treatment::TreatmentDeriver;
pub use types::{
    DetectionRequest, DetectionResult, DiagnosisReport, ProviderAttempt, TreatmentPlan,
};

use llm::LlmClient;
use std::path::Path;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for a single analysis.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Derive a treatment plan for non-error results
    pub treatment: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self { treatment: true }
    }
}

/// LeafCheck - the main entry point.
///
/// Holds the resolved provider chain and the treatment deriver. Cheap to
/// share behind an `Arc`; every method takes `&self`.
pub struct LeafCheck {
    config: Config,
    orchestrator: Orchestrator,
    deriver: TreatmentDeriver,
    descriptors: Vec<ProviderDescriptor>,
}

impl LeafCheck {
    /// Resolve providers from configuration and build the pipeline.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing LeafCheck v{}", VERSION);
        let resolved = ProviderResolver::resolve(&config);
        let treatment_client = resolved.treatment_client(&config.treatment);
        if config.treatment.ai_enabled && treatment_client.is_none() {
            tracing::debug!("No language model for treatment generation, static rules only");
        }

        let orchestrator = Orchestrator::new(resolved.chain, &config);
        let deriver = TreatmentDeriver::new(treatment_client, config.treatment.clone());
        Self {
            config,
            orchestrator,
            deriver,
            descriptors: resolved.descriptors,
        }
    }

    /// Build with an explicit provider chain, bypassing resolution.
    pub fn with_providers(
        config: Config,
        chain: Vec<Arc<dyn DetectionProvider>>,
        treatment_client: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let descriptors = chain
            .iter()
            .map(|p| ProviderDescriptor {
                name: p.name().to_string(),
                kind: providers::ProviderKind::Custom,
                available: true,
                detail: Some("injected".to_string()),
            })
            .collect();
        let orchestrator = Orchestrator::new(chain, &config);
        let deriver = TreatmentDeriver::new(treatment_client, config.treatment.clone());
        Self {
            config,
            orchestrator,
            deriver,
            descriptors,
        }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Setup status of every backend considered at startup.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Whether treatment plans may be model-generated.
    pub fn has_ai_treatment(&self) -> bool {
        self.deriver.has_ai()
    }

    /// Run detection only.
    pub async fn detect_disease(&self, image: Vec<u8>) -> Detection {
        self.orchestrator.detect_disease(image).await
    }

    /// Run treatment derivation only.
    pub async fn derive_treatment(&self, disease_name: &str, confidence: Option<f32>) -> TreatmentPlan {
        self.deriver.derive(disease_name, confidence).await
    }

    /// Detect, then derive treatment for non-error results.
    pub async fn analyze(&self, request: DetectionRequest, options: AnalyzeOptions) -> DiagnosisReport {
        let detection = self.orchestrator.detect_disease(request.image).await;
        self.build_report(request.filename, detection, &options).await
    }

    /// Analyze an image file. Missing or unreadable files yield a
    /// "File Error" report.
    pub async fn analyze_file(&self, path: &Path, options: AnalyzeOptions) -> DiagnosisReport {
        let detection = self.orchestrator.detect_file(path).await;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.build_report(filename, detection, &options).await
    }

    async fn build_report(
        &self,
        filename: Option<String>,
        detection: Detection,
        options: &AnalyzeOptions,
    ) -> DiagnosisReport {
        let treatment = if options.treatment && !detection.result.is_error() {
            Some(
                self.deriver
                    .derive(&detection.result.disease_name, Some(detection.result.confidence))
                    .await,
            )
        } else {
            None
        };

        DiagnosisReport {
            filename,
            result: detection.result,
            treatment,
            attempts: detection.attempts,
        }
    }
}
