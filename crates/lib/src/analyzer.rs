//! # Article Analyzer
//!
//! Turns one [`Article`] into an [`EnrichmentRecord`] by prompting the AI
//! provider and interpreting whatever text comes back.

use crate::errors::{AnalysisError, PromptError};
use crate::interpret::interpret;
use crate::prompts::{render_user_prompt, ANALYSIS_SYSTEM_PROMPT, ANALYSIS_USER_PROMPT};
use crate::providers::ai::AiProvider;
use crate::retry::RetryPolicy;
use crate::types::{Article, EnrichmentRecord, TokenUsage};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// The outcome of a successful analysis call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub record: EnrichmentRecord,
    pub usage: TokenUsage,
}

/// Anything that can enrich an article. The cache is generic over this so
/// tests can count calls without a provider.
#[async_trait]
pub trait ArticleAnalyzer: Send + Sync {
    async fn analyze(&self, article: &Article) -> Result<Analysis, AnalysisError>;
}

/// The production analyzer: prompt, call, retry on rate limit, interpret.
#[derive(Debug, Clone)]
pub struct Analyzer {
    provider: Box<dyn AiProvider>,
    system_prompt: String,
    user_prompt_template: String,
    retry: RetryPolicy,
}

impl Analyzer {
    pub fn new(provider: Box<dyn AiProvider>) -> Self {
        Self {
            provider,
            system_prompt: ANALYSIS_SYSTEM_PROMPT.to_string(),
            user_prompt_template: ANALYSIS_USER_PROMPT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the prompts. The user template may use `{title}` and
    /// `{content}`.
    pub fn with_prompts(
        mut self,
        system_prompt: impl Into<String>,
        user_prompt_template: impl Into<String>,
    ) -> Self {
        self.system_prompt = system_prompt.into();
        self.user_prompt_template = user_prompt_template.into();
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[async_trait]
impl ArticleAnalyzer for Analyzer {
    async fn analyze(&self, article: &Article) -> Result<Analysis, AnalysisError> {
        let user_prompt =
            render_user_prompt(&self.user_prompt_template, &article.title, &article.content);

        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.provider.generate(&self.system_prompt, &user_prompt).await {
                Ok(response) => break response,
                Err(PromptError::RateLimited { retry_after }) if attempt < max_attempts => {
                    let delay = self.retry.delay_for(retry_after);
                    info!(
                        "Rate limited analysing '{}', retrying in {:.1}s",
                        article.title,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(PromptError::RateLimited { .. }) => {
                    warn!("Still rate limited after {attempt} attempts, giving up.");
                    return Err(AnalysisError::RateLimitExhausted { attempts: attempt });
                }
                Err(e) => return Err(e.into()),
            }
        };

        debug!(
            "Analysis used {} prompt and {} output tokens",
            response.usage.prompt_tokens, response.usage.output_tokens
        );

        let record = interpret(&response.text).map_err(|source| {
            warn!("Unparseable analysis response for '{}'", article.title);
            debug!("Raw response: {}", source.raw);
            AnalysisError::Interpretation {
                source,
                usage: response.usage,
            }
        })?;

        Ok(Analysis {
            record,
            usage: response.usage,
        })
    }
}
