use crate::{
    errors::PromptError,
    providers::ai::{retry_after_header, AiProvider, AiResponse},
    retry::parse_retry_delay,
    types::TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

/// The default Gemini endpoint used when none is configured.
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

// --- Gemini error payloads ---

#[derive(Deserialize, Debug)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorBody {
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiErrorDetail {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(default)]
    retry_delay: Option<String>,
}

/// Extracts the `RetryInfo.retryDelay` hint from a Gemini error body.
fn retry_delay_from_body(body: &str) -> Option<Duration> {
    let envelope: GeminiErrorEnvelope = serde_json::from_str(body).ok()?;
    envelope
        .error
        .details
        .iter()
        .filter(|d| d.kind.ends_with("RetryInfo"))
        .find_map(|d| d.retry_delay.as_deref().and_then(parse_retry_delay))
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    pub fn new(api_url: String, api_key: String) -> Result<Self, PromptError> {
        if api_key.trim().is_empty() {
            return Err(PromptError::MissingApiKey);
        }
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    /// Generates a response using the Gemini `generateContent` API.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AiResponse, PromptError> {
        let request_body = GeminiRequest {
            system_instruction: Content {
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
            contents: vec![Content {
                parts: vec![Part {
                    text: user_prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let header_delay = retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();
            let retry_after = retry_delay_from_body(&body).or(header_delay);
            debug!("Gemini rate limited, retry after {retry_after:?}");
            return Err(PromptError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = gemini_response
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                calls: 1,
            })
            .unwrap_or(TokenUsage {
                calls: 1,
                ..Default::default()
            });

        if text.trim().is_empty() {
            return Err(PromptError::AiApi(
                "Gemini response contained no text".to_string(),
            ));
        }

        Ok(AiResponse { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_from_error_body() {
        let body = r#"{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "details": [
            {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
            {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "37s"}
        ]}}"#;
        assert_eq!(retry_delay_from_body(body), Some(Duration::from_secs(37)));
    }

    #[test]
    fn test_retry_delay_absent_or_malformed() {
        assert_eq!(retry_delay_from_body("not json"), None);
        assert_eq!(retry_delay_from_body(r#"{"error": {"details": []}}"#), None);
    }
}
