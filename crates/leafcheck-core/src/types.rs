//! Core data types for the LeafCheck detection core.
//!
//! These types form the stable contract consumed by report rendering,
//! translation and audio layers.

use serde::{Deserialize, Serialize};

/// Disease label used when nothing could be identified.
pub const UNKNOWN_DISEASE: &str = "Unknown Disease";

/// Canonical label for a healthy determination.
pub const HEALTHY_PLANT: &str = "Healthy Plant";

/// An image submitted for diagnosis. Created per call, never persisted.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Raw image bytes in any common raster format
    pub image: Vec<u8>,
    /// Original filename, if the caller had one
    pub filename: Option<String>,
}

impl DetectionRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A runner-up label reported by a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    /// Percentage in [0, 100]
    pub confidence: f32,
}

/// The canonical output of any detection attempt.
///
/// `disease_name` is never empty once a result leaves the orchestrator,
/// and `confidence` is always within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Human-readable disease label
    pub disease_name: String,

    /// Percentage in [0, 100]
    pub confidence: f32,

    /// Which provider produced the answer (e.g. "Gemini AI")
    pub provider_label: String,

    /// Unprocessed provider payload, kept for diagnostics
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub raw_response: serde_json::Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Alternative>,

    /// Plant or crop type, when a provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,

    /// Causal organism, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathogen: Option<String>,

    /// Low / Medium / High / None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// User-facing hints (retry advice, second-opinion advice)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// Set only for input errors; the disease label is then informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Create a result with the given label, confidence (clamped) and provider.
    pub fn new(disease_name: impl Into<String>, confidence: f32, provider_label: &str) -> Self {
        Self {
            disease_name: disease_name.into(),
            confidence: clamp_confidence(confidence),
            provider_label: provider_label.to_string(),
            raw_response: serde_json::Value::Null,
            symptoms: Vec::new(),
            alternatives: Vec::new(),
            crop: None,
            pathogen: None,
            severity: None,
            suggestions: Vec::new(),
            error: None,
        }
    }

    /// Create an input-error result. No provider is consulted for these.
    pub fn input_error(label: &str, error: impl Into<String>, suggestions: &[&str]) -> Self {
        let mut result = Self::new(label, 0.0, "Input Check");
        result.error = Some(error.into());
        result.suggestions = suggestions.iter().map(|s| s.to_string()).collect();
        result
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the label is a generic "nothing identified" marker.
    pub fn is_unknown(&self) -> bool {
        is_unknown_label(&self.disease_name)
    }

    /// Enforce the result invariants: clamped confidence, non-empty label,
    /// trimmed list entries.
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self.disease_name = self.disease_name.trim().to_string();
        if self.disease_name.is_empty() {
            self.disease_name = UNKNOWN_DISEASE.to_string();
        }
        self.symptoms = self
            .symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for alt in &mut self.alternatives {
            alt.confidence = clamp_confidence(alt.confidence);
        }
        self
    }
}

/// Clamp a percentage into [0, 100]. NaN maps to 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Whether a label means "nothing identified".
pub fn is_unknown_label(label: &str) -> bool {
    let lower = label.trim().to_lowercase();
    lower.is_empty() || lower == "unknown" || lower == UNKNOWN_DISEASE.to_lowercase()
}

/// What a single provider attempt produced.
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    /// A definite answer. Stops the chain.
    Identified(DetectionResult),
    /// The provider answered but found nothing identifiable.
    Unidentified(DetectionResult),
    /// The provider could not produce anything (e.g. empty model list).
    NoResult,
    /// The provider failed; the reason is logged, never shown to end users.
    Failed(String),
}

impl ProviderOutcome {
    /// Classify a parsed result by its label.
    pub fn from_result(result: DetectionResult) -> Self {
        if result.is_unknown() {
            Self::Unidentified(result)
        } else {
            Self::Identified(result)
        }
    }

    /// Short outcome tag for the attempt log.
    pub fn kind(&self) -> AttemptStatus {
        match self {
            Self::Identified(_) => AttemptStatus::Identified,
            Self::Unidentified(_) => AttemptStatus::Unidentified,
            Self::NoResult => AttemptStatus::NoResult,
            Self::Failed(_) => AttemptStatus::Failed,
        }
    }
}

/// Outcome of one attempt, as recorded in the attempt log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Identified,
    Unidentified,
    NoResult,
    Failed,
    TimedOut,
    Panicked,
}

/// One entry in the diagnostic attempt log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub latency_ms: u64,
}

/// Structured treatment advice for a disease label.
///
/// After derivation `organic`, `chemical` and `prevention` are never empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub organic: Vec<String>,
    pub chemical: Vec<String>,
    pub prevention: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub immediate_actions: Vec<String>,
    pub ai_generated: bool,
}

impl TreatmentPlan {
    /// True when all three required sections are empty.
    pub fn is_blank(&self) -> bool {
        self.organic.is_empty() && self.chemical.is_empty() && self.prevention.is_empty()
    }
}

/// Detection result plus derived treatment, as handed to the response layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(flatten)]
    pub result: DetectionResult,

    /// Absent for input errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<TreatmentPlan>,

    pub attempts: Vec<ProviderAttempt>,
}
