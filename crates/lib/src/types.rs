//! # Core Data Model
//!
//! Articles flowing into the pipeline, the enrichment records produced for
//! them, and the geographic types used to place them on the map.

use crate::errors::UnknownSentiment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

// --- Articles ---

/// A news article as delivered by source acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(
        default,
        alias = "timestamp",
        deserialize_with = "lenient_timestamp"
    )]
    pub published: Option<DateTime<Utc>>,
}

fn default_source() -> String {
    "Unknown".to_string()
}

impl Article {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// The cache key for this article, if it has one.
    pub fn identity(&self) -> Option<ArticleIdentity> {
        ArticleIdentity::from_article(self)
    }
}

/// Accepts RFC 3339 and RFC 2822 timestamps; anything else becomes `None`
/// instead of failing the whole article list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_timestamp(&s)))
}

/// Parses the timestamp formats seen in feeds and article dumps.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// The stable cache key of an article: its URL, or its title when it has no URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleIdentity(String);

impl ArticleIdentity {
    /// Builds an identity from a raw key. Blank keys are rejected.
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    pub fn from_article(article: &Article) -> Option<Self> {
        article
            .url
            .as_deref()
            .and_then(Self::new)
            .or_else(|| Self::new(&article.title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Enrichment ---

/// Sentiment label assigned by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Fixed enumeration order, also used to break ties.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(UnknownSentiment(s.to_string())),
        }
    }
}

/// The derived annotation for one article, as stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default, deserialize_with = "lenient_sentiment")]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub is_sg_related: Option<bool>,
}

fn lenient_sentiment<'de, D>(deserializer: D) -> Result<Option<Sentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

impl EnrichmentRecord {
    /// Names of the fields a marker needs but this record lacks.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.place.as_deref().map_or(true, |p| p.trim().is_empty()) {
            missing.push("place");
        }
        if self.sentiment.is_none() {
            missing.push("sentiment");
        }
        if self.emoji.as_deref().map_or(true, |e| e.is_empty()) {
            missing.push("emoji");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Token accounting for calls to the analysis service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub calls: u64,
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.output_tokens += rhs.output_tokens;
        self.calls += rhs.calls;
    }
}

// --- Geography ---

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Mainland Singapore and its nearby islands.
    pub const SINGAPORE: BoundingBox = BoundingBox {
        min_lat: 1.130,
        max_lat: 1.480,
        min_lon: 103.6,
        max_lon: 104.1,
    };

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::SINGAPORE
    }
}

/// What the renderer shows when a marker is clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupInfo {
    pub source: String,
    pub title: String,
    pub reason: Option<String>,
    pub url: Option<String>,
}

/// A marker ready for drawing. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedMarker {
    pub identity: ArticleIdentity,
    pub place: String,
    pub position: GeoPoint,
    pub sentiment: Sentiment,
    pub emoji: String,
    pub popup: PopupInfo,
}
