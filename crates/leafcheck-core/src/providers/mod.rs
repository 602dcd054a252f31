//! Detection providers and their priority resolution.
//!
//! Every backend is wrapped in a [`DetectionProvider`] so the orchestrator
//! can walk them in order without knowing request or response shapes.

pub mod classifier;
pub mod heuristic;
pub mod resolver;
pub mod vision;

pub use classifier::ClassifierAdapter;
pub use heuristic::{demo_result, pixel_heuristic};
pub use resolver::{ProviderDescriptor, ProviderKind, ProviderResolver, ResolvedProviders};
pub use vision::VisionAdapter;

use crate::intake::LeafImage;
use crate::types::ProviderOutcome;
use async_trait::async_trait;
use std::time::Duration;

/// A backend that can attempt a diagnosis.
///
/// Implementations never return `Err`: transport and parse failures become
/// [`ProviderOutcome::Failed`] so the chain can move on.
#[async_trait]
pub trait DetectionProvider: Send + Sync {
    /// Short name used in logs and the attempt log (e.g. "gemini").
    fn name(&self) -> &str;

    /// Attempt a diagnosis.
    async fn detect(&self, image: &LeafImage) -> ProviderOutcome;

    /// Upper bound the orchestrator applies around `detect`.
    fn timeout(&self) -> Duration;
}
