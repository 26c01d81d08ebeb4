//! # AI Provider Factory
//!
//! Builds the configured [`AiProvider`] so that every consumer (the CLI, the
//! tests) creates providers the same way.

use crate::{
    errors::PromptError,
    providers::ai::{
        gemini::{GeminiProvider, DEFAULT_GEMINI_URL},
        local::LocalAiProvider,
        AiProvider,
    },
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

/// Which backend serves article analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Local,
}

impl FromStr for ProviderKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "local" => Ok(Self::Local),
            other => Err(PromptError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Connection settings for one AI provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Creates the provider described by `settings`.
///
/// Gemini requires an API key. When no URL is set it targets `model` on the
/// public endpoint, or the default model. A local provider requires a URL.
pub fn create_provider(settings: &ProviderSettings) -> Result<Box<dyn AiProvider>, PromptError> {
    let provider: Box<dyn AiProvider> = match settings.provider {
        ProviderKind::Gemini => {
            let api_key = settings
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or(PromptError::MissingApiKey)?;
            let api_url = match (&settings.api_url, &settings.model) {
                (Some(url), _) => url.clone(),
                (None, Some(model)) => format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                ),
                (None, None) => DEFAULT_GEMINI_URL.to_string(),
            };
            info!("Configuring Gemini provider with URL: {}", api_url);
            Box::new(GeminiProvider::new(api_url, api_key)?)
        }
        ProviderKind::Local => {
            let api_url = settings.api_url.clone().ok_or_else(|| {
                PromptError::UnsupportedProvider(
                    "local provider requires an api_url".to_string(),
                )
            })?;
            info!("Configuring Local AI provider with URL: {}", api_url);
            Box::new(LocalAiProvider::new(
                api_url,
                settings.api_key.clone(),
                settings.model.clone(),
            )?)
        }
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>().ok(), Some(ProviderKind::Gemini));
        assert_eq!(" local ".parse::<ProviderKind>().ok(), Some(ProviderKind::Local));
        assert!(matches!(
            "openai".parse::<ProviderKind>(),
            Err(PromptError::UnsupportedProvider(name)) if name == "openai"
        ));
    }

    #[test]
    fn test_gemini_requires_key() {
        let settings = ProviderSettings::default();
        assert!(matches!(
            create_provider(&settings),
            Err(PromptError::MissingApiKey)
        ));
    }

    #[test]
    fn test_local_requires_url() {
        let settings = ProviderSettings {
            provider: ProviderKind::Local,
            ..Default::default()
        };
        assert!(create_provider(&settings).is_err());

        let settings = ProviderSettings {
            provider: ProviderKind::Local,
            api_url: Some("http://localhost:8080/v1/chat/completions".to_string()),
            ..Default::default()
        };
        assert!(create_provider(&settings).is_ok());
    }
}
