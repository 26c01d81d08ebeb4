use crate::types::TokenUsage;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the AI providers that back article analysis.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is rate limiting requests (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("API key is missing")]
    MissingApiKey,
    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),
}

/// A raw analysis response from which no JSON object could be recovered.
///
/// The raw text is kept so the caller can log it; the article simply produces
/// no record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("no JSON object could be extracted from the analysis response")]
pub struct InterpretationError {
    pub raw: String,
}

/// A sentiment label outside positive, negative and neutral.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sentiment label '{0}'")]
pub struct UnknownSentiment(pub String);

/// Why a single article could not be analyzed. Always a soft failure.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("AI provider failed: {0}")]
    Provider(#[from] PromptError),
    /// The provider answered, and was paid for, but the answer was unusable.
    #[error("{source}")]
    Interpretation {
        source: InterpretationError,
        usage: TokenUsage,
    },
    #[error("Still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
}

impl AnalysisError {
    /// Tokens spent before the failure.
    pub fn usage(&self) -> TokenUsage {
        match self {
            AnalysisError::Interpretation { usage, .. } => *usage,
            _ => TokenUsage::default(),
        }
    }
}

/// A failure of one geocoding provider. The resolver logs it and moves on.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Geocoding provider returned status {0}")]
    Status(u16),
    #[error("Malformed geocoding response: {0}")]
    Decode(String),
}

/// Failure to read or write the durable enrichment cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Atomic cache replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Errors that abort a whole pipeline run.
///
/// Only a failed cache flush qualifies, since losing the cache means paying for
/// the same analyses again on the next run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to persist the enrichment cache: {0}")]
    CacheFlush(#[from] CacheError),
}
