//! Detection orchestrator: precondition check, then a strictly sequential
//! first-success walk over the provider chain, then a safety fallback.

use crate::config::{Config, DetectionConfig};
use crate::error::ImageError;
use crate::intake::decode::detect_format;
use crate::intake::{ColorStats, ImageDecoder, LeafImage, PlantCheck};
use crate::knowledge::KnowledgeBase;
use crate::providers::heuristic::HEURISTIC_LABEL;
use crate::providers::{demo_result, pixel_heuristic, DetectionProvider};
use crate::types::{AttemptStatus, DetectionResult, ProviderAttempt, ProviderOutcome, UNKNOWN_DISEASE};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

const RETRY_SUGGESTIONS: &[&str] = &[
    "Upload a clear photo of the plant leaves",
    "Make sure the leaf fills most of the frame",
    "Use good natural lighting and avoid blur",
];

const FILE_SUGGESTIONS: &[&str] = &[
    "Check that the file exists and is readable",
    "Use a JPEG or PNG photo",
];

const LOW_CONFIDENCE_SUGGESTIONS: &[&str] = &[
    "Confidence is low: retake the photo closer to the affected area",
    "Consider a second opinion from a local agricultural expert",
];

/// Final result plus the per-provider attempt log.
#[derive(Debug, Clone)]
pub struct Detection {
    pub result: DetectionResult,
    pub attempts: Vec<ProviderAttempt>,
}

impl Detection {
    fn without_attempts(result: DetectionResult) -> Self {
        Self {
            result,
            attempts: Vec::new(),
        }
    }
}

/// Runs one diagnosis at a time against an immutable provider chain.
pub struct Orchestrator {
    providers: Vec<Arc<dyn DetectionProvider>>,
    decoder: ImageDecoder,
    check: PlantCheck,
    knowledge: KnowledgeBase,
    detection: DetectionConfig,
}

impl Orchestrator {
    pub fn new(providers: Vec<Arc<dyn DetectionProvider>>, config: &Config) -> Self {
        Self {
            providers,
            decoder: ImageDecoder::new(config.limits.clone()),
            check: PlantCheck::new(&config.limits),
            knowledge: KnowledgeBase::builtin(),
            detection: config.detection.clone(),
        }
    }

    pub fn providers(&self) -> &[Arc<dyn DetectionProvider>] {
        &self.providers
    }

    /// Read a file and diagnose it. Missing or unreadable files produce a
    /// "File Error" result without touching any provider.
    pub async fn detect_file(&self, path: &Path) -> Detection {
        if !path.exists() {
            return file_error(ImageError::FileNotFound(path.to_path_buf()));
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => self.detect_disease(bytes).await,
            Err(e) => file_error(ImageError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Diagnose an in-memory image.
    pub async fn detect_disease(&self, bytes: Vec<u8>) -> Detection {
        let bytes = Arc::new(bytes);
        let decoded = self.decoder.decode(Arc::clone(&bytes)).await;
        let plausibility = self.check.assess(&decoded);

        if !plausibility.is_plausible || plausibility.confidence < self.detection.min_plausibility {
            let error = match &decoded {
                Err(e) => format!("Invalid image: {e}"),
                Ok(_) => "Image does not look like a plant leaf photo".to_string(),
            };
            tracing::info!(
                confidence = plausibility.confidence,
                "Image rejected by precondition check: {error}"
            );
            return Detection::without_attempts(DetectionResult::input_error(
                "Not a Plant",
                error,
                RETRY_SUGGESTIONS,
            ));
        }

        let leaf = match decoded {
            Ok(decoded) => LeafImage {
                format: Some(decoded.format),
                pixels: Some(Arc::new(decoded.image)),
                bytes,
            },
            Err(_) => LeafImage {
                format: detect_format(&bytes).ok(),
                pixels: None,
                bytes,
            },
        };

        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let (outcome, attempt) = self.attempt(provider.as_ref(), &leaf).await;
            attempts.push(attempt);

            if let Some(ProviderOutcome::Identified(result)) = outcome {
                tracing::info!(
                    provider = provider.name(),
                    disease = %result.disease_name,
                    confidence = result.confidence,
                    "Disease identified"
                );
                return Detection {
                    result: self.finalize(result),
                    attempts,
                };
            }
        }

        tracing::warn!(
            attempted = attempts.len(),
            "No provider identified the image, using fallback"
        );
        Detection {
            result: self.finalize(self.fallback(&leaf)),
            attempts,
        }
    }

    /// Run one provider under its timeout, catching panics.
    async fn attempt(
        &self,
        provider: &dyn DetectionProvider,
        leaf: &LeafImage,
    ) -> (Option<ProviderOutcome>, ProviderAttempt) {
        let name = provider.name().to_string();
        let limit = provider.timeout();
        let start = Instant::now();
        tracing::debug!(provider = %name, "Trying provider");

        let guarded = AssertUnwindSafe(provider.detect(leaf)).catch_unwind();
        let (outcome, status, detail) = match tokio::time::timeout(limit, guarded).await {
            Ok(Ok(outcome)) => {
                // An "Identified" sentinel label does not stop the chain
                let outcome = match outcome {
                    ProviderOutcome::Identified(result) => ProviderOutcome::from_result(result),
                    other => other,
                };
                let detail = match &outcome {
                    ProviderOutcome::Identified(r) | ProviderOutcome::Unidentified(r) => {
                        Some(r.disease_name.clone())
                    }
                    ProviderOutcome::Failed(reason) => {
                        tracing::warn!(provider = %name, "Provider failed: {reason}");
                        Some(reason.clone())
                    }
                    ProviderOutcome::NoResult => None,
                };
                let status = outcome.kind();
                (Some(outcome), status, detail)
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(provider = %name, "Provider panicked: {message}");
                (None, AttemptStatus::Panicked, Some(message))
            }
            Err(_) => {
                tracing::warn!(provider = %name, timeout_ms = limit.as_millis() as u64, "Provider timed out");
                (None, AttemptStatus::TimedOut, Some(format!("timed out after {}ms", limit.as_millis())))
            }
        };

        let attempt = ProviderAttempt {
            provider: name,
            status,
            detail,
            latency_ms: start.elapsed().as_millis() as u64,
        };
        (outcome, attempt)
    }

    /// Safety result once the chain is exhausted.
    fn fallback(&self, leaf: &LeafImage) -> DetectionResult {
        if let Some(pixels) = &leaf.pixels {
            return pixel_heuristic(&ColorStats::from_image(pixels));
        }
        if self.detection.demo_fallback {
            return demo_result();
        }
        DetectionResult::new(UNKNOWN_DISEASE, 0.0, HEURISTIC_LABEL)
    }

    /// Invariants, knowledge enrichment and low-confidence hints.
    fn finalize(&self, result: DetectionResult) -> DetectionResult {
        let mut result = result.normalized();

        if let Some(entry) = self.knowledge.match_label(&result.disease_name) {
            if result.pathogen.is_none() {
                result.pathogen = entry.pathogen.map(str::to_string);
            }
            if result.symptoms.is_empty() {
                result.symptoms = entry.symptoms();
            }
        }

        if result.confidence < self.detection.low_confidence_threshold {
            for hint in LOW_CONFIDENCE_SUGGESTIONS {
                if !result.suggestions.iter().any(|s| s == hint) {
                    result.suggestions.push(hint.to_string());
                }
            }
        }
        result
    }
}

fn file_error(error: ImageError) -> Detection {
    tracing::warn!("{error}");
    Detection::without_attempts(DetectionResult::input_error(
        "File Error",
        error.to_string(),
        FILE_SUGGESTIONS,
    ))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::decode::tests::solid_png;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Scripted provider with a call counter.
    struct MockProvider {
        name: &'static str,
        outcome: ProviderOutcome,
        panics: bool,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MockProvider {
        fn new(name: &'static str, outcome: ProviderOutcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                panics: false,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn identified(name: &'static str, disease: &str, confidence: f32) -> Arc<Self> {
            Self::new(
                name,
                ProviderOutcome::Identified(DetectionResult::new(disease, confidence, name)),
            )
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DetectionProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn detect(&self, _image: &LeafImage) -> ProviderOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.panics {
                panic!("adapter exploded");
            }
            self.outcome.clone()
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(200)
        }
    }

    fn orchestrator(providers: Vec<Arc<MockProvider>>) -> Orchestrator {
        orchestrator_with(providers, Config::default())
    }

    fn orchestrator_with(providers: Vec<Arc<MockProvider>>, config: Config) -> Orchestrator {
        let chain = providers
            .into_iter()
            .map(|p| p as Arc<dyn DetectionProvider>)
            .collect();
        Orchestrator::new(chain, &config)
    }

    fn green_leaf() -> Vec<u8> {
        solid_png(300, 300, [40, 170, 50])
    }

    #[tokio::test]
    async fn test_tiny_image_rejected_without_provider_calls() {
        let mock = MockProvider::identified("a", "Rust", 90.0);
        let detection = orchestrator(vec![mock.clone()])
            .detect_disease(solid_png(50, 50, [0, 0, 0]))
            .await;

        assert!(detection.result.is_error());
        assert_eq!(detection.result.disease_name, "Not a Plant");
        assert!(!detection.result.suggestions.is_empty());
        assert!(detection.attempts.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_garbage_rejected_without_provider_calls() {
        let mock = MockProvider::identified("a", "Rust", 90.0);
        let detection = orchestrator(vec![mock.clone()])
            .detect_disease(b"GIF? no, just text".to_vec())
            .await;
        assert!(detection.result.is_error());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_low_plausibility_threshold_rejects() {
        let mock = MockProvider::identified("a", "Rust", 90.0);
        let mut config = Config::default();
        config.detection.min_plausibility = 65.0;
        // Blue-dominant images score 60
        let detection = orchestrator_with(vec![mock.clone()], config)
            .detect_disease(solid_png(200, 200, [20, 40, 200]))
            .await;
        assert!(detection.result.is_error());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let first = MockProvider::identified("first", "Early Blight", 90.0);
        let second = MockProvider::identified("second", "Rust", 99.0);
        let detection = orchestrator(vec![first.clone(), second.clone()])
            .detect_disease(green_leaf())
            .await;

        assert_eq!(detection.result.disease_name, "Early Blight");
        assert_eq!(detection.result.provider_label, "first");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
        assert_eq!(detection.attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_unidentified_and_failures_move_on() {
        let unknown = MockProvider::new(
            "unknown",
            ProviderOutcome::Unidentified(DetectionResult::new(UNKNOWN_DISEASE, 20.0, "unknown")),
        );
        let empty = MockProvider::new("empty", ProviderOutcome::NoResult);
        let broken = MockProvider::new("broken", ProviderOutcome::Failed("HTTP 500".to_string()));
        let last = MockProvider::identified("last", "Leaf Spot", 80.0);

        let detection = orchestrator(vec![unknown, empty, broken, last.clone()])
            .detect_disease(green_leaf())
            .await;

        assert_eq!(detection.result.disease_name, "Leaf Spot");
        let statuses: Vec<_> = detection.attempts.iter().map(|a| a.status).collect();
        assert_eq!(
            statuses,
            vec![
                AttemptStatus::Unidentified,
                AttemptStatus::NoResult,
                AttemptStatus::Failed,
                AttemptStatus::Identified
            ]
        );
        assert_eq!(detection.attempts[2].detail.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_all_empty_uses_pixel_fallback() {
        let a = MockProvider::new("a", ProviderOutcome::NoResult);
        let b = MockProvider::new("b", ProviderOutcome::NoResult);
        let detection = orchestrator(vec![a.clone(), b.clone()])
            .detect_disease(green_leaf())
            .await;

        assert!(!detection.result.is_error());
        assert_eq!(detection.result.disease_name, "Healthy Plant");
        assert_eq!(detection.result.provider_label, "Image Analysis");
        assert_eq!(detection.attempts.len(), 2);
        assert_eq!((a.call_count(), b.call_count()), (1, 1));
    }

    #[tokio::test]
    async fn test_undecodable_pixels_use_demo_result() {
        let bytes = green_leaf();
        let truncated = bytes[..bytes.len() / 2].to_vec();
        let mock = MockProvider::new("a", ProviderOutcome::NoResult);

        let detection = orchestrator(vec![mock.clone()]).detect_disease(truncated).await;
        assert!(!detection.result.is_error());
        assert_eq!(detection.result.disease_name, "Demo Result - Unverified");
        assert_eq!(detection.result.provider_label, "Demo Mode");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_demo_disabled_yields_unknown() {
        let bytes = green_leaf();
        let truncated = bytes[..bytes.len() / 2].to_vec();
        let mut config = Config::default();
        config.detection.demo_fallback = false;

        let detection = orchestrator_with(vec![], config).detect_disease(truncated).await;
        assert!(!detection.result.is_error());
        assert_eq!(detection.result.disease_name, UNKNOWN_DISEASE);
        assert_eq!(detection.result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_confidence_clamped() {
        let mut overconfident = DetectionResult::new("Rust", 0.0, "mock");
        overconfident.confidence = 140.0;
        let mock = MockProvider::new("mock", ProviderOutcome::Identified(overconfident));

        let detection = orchestrator(vec![mock]).detect_disease(green_leaf()).await;
        assert_eq!(detection.result.confidence, 100.0);
    }

    #[tokio::test]
    async fn test_panicking_provider_is_contained() {
        let exploding = Arc::new(MockProvider {
            name: "exploding",
            outcome: ProviderOutcome::NoResult,
            panics: true,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        });
        let backup = MockProvider::identified("backup", "Powdery Mildew", 85.0);

        let detection = orchestrator(vec![exploding, backup])
            .detect_disease(green_leaf())
            .await;
        assert_eq!(detection.result.disease_name, "Powdery Mildew");
        assert_eq!(detection.attempts[0].status, AttemptStatus::Panicked);
        assert_eq!(detection.attempts[0].detail.as_deref(), Some("adapter exploded"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let slow = Arc::new(MockProvider {
            name: "slow",
            outcome: ProviderOutcome::Identified(DetectionResult::new("Rust", 90.0, "slow")),
            panics: false,
            delay: Duration::from_secs(5),
            calls: AtomicU32::new(0),
        });
        let backup = MockProvider::identified("backup", "Wilt", 75.0);

        let detection = orchestrator(vec![slow, backup]).detect_disease(green_leaf()).await;
        assert_eq!(detection.result.disease_name, "Wilt");
        assert_eq!(detection.attempts[0].status, AttemptStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_accepted_result_is_enriched() {
        let mock = MockProvider::identified("mock", "Early Blight", 92.0);
        let detection = orchestrator(vec![mock]).detect_disease(green_leaf()).await;
        assert_eq!(detection.result.pathogen.as_deref(), Some("Alternaria solani"));
        assert!(!detection.result.symptoms.is_empty());
        assert!(detection.result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_low_confidence_gets_suggestions() {
        let mock = MockProvider::identified("mock", "Rust", 41.0);
        let detection = orchestrator(vec![mock]).detect_disease(green_leaf()).await;
        assert_eq!(detection.result.suggestions.len(), LOW_CONFIDENCE_SUGGESTIONS.len());
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let mock = MockProvider::identified("mock", "Rust", 90.0);
        let dir = tempfile::tempdir().unwrap();
        let detection = orchestrator(vec![mock.clone()])
            .detect_file(&dir.path().join("missing.jpg"))
            .await;
        assert_eq!(detection.result.disease_name, "File Error");
        assert!(detection.result.is_error());
        assert!(detection
            .result
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("File not found:") && e.ends_with("missing.jpg")));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_directory_path_is_unreadable() {
        let mock = MockProvider::identified("mock", "Rust", 90.0);
        let dir = tempfile::tempdir().unwrap();
        let detection = orchestrator(vec![mock.clone()]).detect_file(dir.path()).await;
        assert_eq!(detection.result.disease_name, "File Error");
        assert!(detection
            .result
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Cannot read")));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_identified_sentinel_does_not_stop_chain() {
        let blank = MockProvider::identified("blank", "", 90.0);
        let next = MockProvider::identified("next", "Rust", 80.0);
        let detection = orchestrator(vec![blank.clone(), next.clone()])
            .detect_disease(green_leaf())
            .await;

        assert_eq!(detection.result.disease_name, "Rust");
        assert_eq!(next.call_count(), 1);
        assert_eq!(detection.attempts[0].status, AttemptStatus::Unidentified);
        assert_eq!(detection.attempts[1].status, AttemptStatus::Identified);
    }

    #[tokio::test]
    async fn test_file_is_read_and_diagnosed() {
        let mock = MockProvider::identified("mock", "Mosaic Virus", 88.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        std::fs::write(&path, green_leaf()).unwrap();

        let detection = orchestrator(vec![mock]).detect_file(&path).await;
        assert_eq!(detection.result.disease_name, "Mosaic Virus");
    }
}
