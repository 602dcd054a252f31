//! Language-model clients.
//!
//! One trait over the Gemini, OpenAI and Anthropic HTTP APIs. The same
//! clients serve both the vision detection adapters and the text-only
//! treatment generation request.

pub(crate) mod anthropic;
pub(crate) mod gemini;
pub(crate) mod openai;
pub(crate) mod provider;

pub use provider::{resolve_env_var, ImageInput, LlmClient, LlmClientFactory, LlmRequest, LlmResponse};
