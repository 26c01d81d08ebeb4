pub mod gemini;
pub mod local;

use crate::errors::PromptError;
use crate::types::TokenUsage;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A completed generation: the model's text plus the tokens it cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// A trait for interacting with an AI provider.
///
/// This trait defines a common interface over the different Large Language
/// Models (e.g., Gemini, local OpenAI-compatible servers) used to analyse
/// articles.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    ///
    /// A rate-limit response must be reported as [`PromptError::RateLimited`]
    /// so the caller can wait and retry.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AiResponse, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<std::time::Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(crate::retry::parse_retry_delay)
}
