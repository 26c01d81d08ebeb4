use crate::{
    errors::PromptError,
    providers::ai::{retry_after_header, AiProvider, AiResponse},
    types::TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
    #[serde(default)]
    usage: Option<LocalAiUsage>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

#[derive(Deserialize, Debug)]
struct LocalAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// --- Local Provider implementation ---

/// A provider for interacting with a local or OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    /// Generates a response using a local or OpenAI-compatible chat completions API.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AiResponse, PromptError> {
        let messages = vec![
            LocalAiMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            LocalAiMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ];

        let request_body = LocalAiRequest {
            messages,
            model: self.model.as_deref(),
            temperature: 0.0,
            max_tokens: 512,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(PromptError::RateLimited {
                retry_after: retry_after_header(response.headers()),
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let text = local_ai_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let usage = TokenUsage {
            prompt_tokens: local_ai_response
                .usage
                .as_ref()
                .map_or(0, |u| u.prompt_tokens),
            output_tokens: local_ai_response
                .usage
                .as_ref()
                .map_or(0, |u| u.completion_tokens),
            calls: 1,
        };

        Ok(AiResponse { text, usage })
    }
}
