//! # Test Utilities
//!
//! Scripted stand-ins for the external services the pipeline talks to, plus a
//! few builders for articles and records.

use moodmap::analyzer::{Analysis, ArticleAnalyzer};
use moodmap::errors::{AnalysisError, GeocodeError, InterpretationError, PromptError};
use moodmap::providers::ai::{AiProvider, AiResponse};
use moodmap::providers::geo::GeocodeProvider;
use moodmap::types::{Article, EnrichmentRecord, GeoPoint, Sentiment, TokenUsage};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Once, RwLock};
use std::time::Duration;

static INIT: Once = Once::new();

/// Installs a test subscriber once per process.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

// --- Mock AI Provider ---

/// One scripted provider reply.
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    RateLimited(Option<Duration>),
    ApiError(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Replays scripted replies in order and records every prompt it receives.
/// Once the script runs out it answers with an API error.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    replies: Arc<RwLock<VecDeque<MockReply>>>,
}

impl MockAiProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            replies: Arc::new(RwLock::new(replies.into())),
        }
    }

    /// A provider that answers every listed text in order.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| MockReply::Text(t.into())).collect())
    }

    pub fn calls(&self) -> usize {
        self.call_history.read().unwrap().len()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<AiResponse, PromptError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        match self.replies.write().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(AiResponse {
                usage: TokenUsage {
                    prompt_tokens: user_prompt.len() as u64,
                    output_tokens: text.len() as u64,
                    calls: 1,
                },
                text,
            }),
            Some(MockReply::RateLimited(retry_after)) => {
                Err(PromptError::RateLimited { retry_after })
            }
            Some(MockReply::ApiError(message)) => Err(PromptError::AiApi(message)),
            None => Err(PromptError::AiApi(
                "MockAiProvider: no reply scripted".to_string(),
            )),
        }
    }
}

// --- Mock Analyzer ---

/// An analyzer that returns fixed records by article title and counts calls.
/// Titles with no record fail with an interpretation error that still cost one
/// call.
#[derive(Clone, Debug, Default)]
pub struct MockAnalyzer {
    records: Arc<RwLock<HashMap<String, EnrichmentRecord>>>,
    pub call_history: Arc<RwLock<Vec<String>>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, title: &str, record: EnrichmentRecord) {
        self.records
            .write()
            .unwrap()
            .insert(title.to_string(), record);
    }

    pub fn calls(&self) -> usize {
        self.call_history.read().unwrap().len()
    }

    pub fn calls_for(&self, title: &str) -> usize {
        self.call_history
            .read()
            .unwrap()
            .iter()
            .filter(|t| *t == title)
            .count()
    }
}

#[async_trait]
impl ArticleAnalyzer for MockAnalyzer {
    async fn analyze(&self, article: &Article) -> Result<Analysis, AnalysisError> {
        self.call_history
            .write()
            .unwrap()
            .push(article.title.clone());
        match self.records.read().unwrap().get(&article.title) {
            Some(record) => Ok(Analysis {
                record: record.clone(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    output_tokens: 5,
                    calls: 1,
                },
            }),
            None => Err(AnalysisError::Interpretation {
                source: InterpretationError {
                    raw: format!("no record for '{}'", article.title),
                },
                usage: TokenUsage {
                    prompt_tokens: 10,
                    output_tokens: 0,
                    calls: 1,
                },
            }),
        }
    }
}

// --- Mock Geocode Provider ---

/// One scripted geocoder answer.
#[derive(Clone, Debug)]
pub enum MockLookup {
    Found(GeoPoint),
    Empty,
    Failed(u16),
}

/// Answers lookups from a table keyed by the exact query string. Unknown
/// queries return no result.
#[derive(Clone, Debug)]
pub struct MockGeocodeProvider {
    name: String,
    answers: Arc<RwLock<HashMap<String, MockLookup>>>,
    pub queries: Arc<RwLock<Vec<String>>>,
}

impl MockGeocodeProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            answers: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn answer(self, query: &str, lookup: MockLookup) -> Self {
        self.answers
            .write()
            .unwrap()
            .insert(query.to_string(), lookup);
        self
    }

    pub fn found(self, query: &str, lat: f64, lon: f64) -> Self {
        self.answer(query, MockLookup::Found(GeoPoint::new(lat, lon)))
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocodeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        self.queries.write().unwrap().push(query.to_string());
        match self.answers.read().unwrap().get(query) {
            Some(MockLookup::Found(point)) => Ok(Some(*point)),
            Some(MockLookup::Failed(status)) => Err(GeocodeError::Status(*status)),
            Some(MockLookup::Empty) | None => Ok(None),
        }
    }
}

// --- Builders ---

/// An article with a URL derived from its title.
pub fn article(title: &str, source: &str) -> Article {
    let slug = title.to_lowercase().replace(' ', "-");
    Article::new(title, source).with_url(format!("https://news.example.sg/{slug}"))
}

/// A record with every field a marker needs.
pub fn complete_record(place: &str, sentiment: Sentiment, emoji: &str) -> EnrichmentRecord {
    EnrichmentRecord {
        place: Some(place.to_string()),
        sentiment: Some(sentiment),
        reason: Some(format!("{sentiment} news")),
        emoji: Some(emoji.to_string()),
        is_sg_related: Some(true),
    }
}

/// The JSON a well-behaved model would return for `record`.
pub fn record_json(place: &str, sentiment: &str, emoji: &str) -> String {
    format!(
        r#"{{"is_sg_related": true, "place": "{place}", "sentiment": "{sentiment}", "reason": "because", "emoji": "{emoji}"}}"#
    )
}
