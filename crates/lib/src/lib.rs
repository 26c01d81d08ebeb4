//! # moodmap
//!
//! Enriches news articles with a place, a sentiment and an emoji using an AI
//! provider, caches the result per article, and projects the articles onto a
//! bounded map with colliding markers spread apart.
//!
//! The entry point is [`Pipeline`]; see [`pipeline`] for the run semantics.

pub mod aggregate;
pub mod analyzer;
pub mod cache;
pub mod constants;
pub mod errors;
pub mod geocode;
pub mod interpret;
pub mod pipeline;
pub mod placement;
pub mod prompts;
pub mod providers;
pub mod recency;
pub mod relevance;
pub mod retry;
pub mod types;

pub use aggregate::{aggregate, Aggregate, OutletSentimentTally, SentimentCounts};
pub use analyzer::{Analysis, Analyzer, ArticleAnalyzer};
pub use cache::{CacheOutcome, EnrichmentCache};
pub use errors::{
    AnalysisError, CacheError, GeocodeError, InterpretationError, PipelineError, PromptError,
    UnknownSentiment,
};
pub use geocode::GeocodeResolver;
pub use interpret::{interpret, interpret_bytes, normalize_emoji, sentiment_emoji};
pub use pipeline::{Diagnostic, Pipeline, PipelineOutput, PipelineReport, RunOptions};
pub use placement::{place, Placement};
pub use relevance::RelevanceRule;
pub use retry::{parse_retry_delay, RetryPolicy};
pub use types::{
    Article, ArticleIdentity, BoundingBox, EnrichmentRecord, GeoPoint, PlacedMarker, PopupInfo,
    Sentiment, TokenUsage,
};
