//! # `moodmap-rss`: RSS Acquisition
//!
//! Fetches the configured RSS 2.0 feeds and turns their items into
//! [`Article`]s for the pipeline. A feed that cannot be fetched or parsed is
//! logged and skipped so one broken outlet never empties the map.

use moodmap::types::{parse_timestamp, Article};
use reqwest::Client;
use rss::{Channel, Item};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Custom error types for feed acquisition.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to fetch RSS feed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Failed to parse RSS feed: {0}")]
    Parse(#[from] rss::Error),
}

/// One outlet's feed, as configured.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedSource {
    /// Outlet name shown in popups and tallies.
    pub name: String,
    pub url: String,
    /// Stamped on every article from this feed, e.g. `Singapore`.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            location: None,
            category: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The feeds read when none are configured.
pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "The Straits Times",
            "https://www.straitstimes.com/news/singapore/rss.xml",
        )
        .with_location("Singapore"),
        FeedSource::new(
            "Channel NewsAsia",
            "https://www.channelnewsasia.com/rssfeeds/8395986",
        )
        .with_location("Singapore"),
    ]
}

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Fetches and parses a single feed.
    pub async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>, FeedError> {
        info!("Fetching RSS feed from: {}", source.url);
        let content = self
            .client
            .get(&source.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let channel = Channel::read_from(&content[..])?;

        let articles: Vec<Article> = channel
            .items()
            .iter()
            .filter_map(|item| item_to_article(item, source))
            .collect();
        info!("Fetched {} articles from {}.", articles.len(), source.name);
        Ok(articles)
    }

    /// Fetches every feed in order, skipping failures and dropping repeats of
    /// an article already seen in an earlier feed.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<Article> {
        let mut seen = HashSet::new();
        let mut articles = Vec::new();
        for source in sources {
            match self.fetch(source).await {
                Ok(batch) => articles.extend(batch.into_iter().filter(|a| match a.identity() {
                    Some(identity) => seen.insert(identity),
                    None => true,
                })),
                Err(e) => warn!("Error fetching {}: {e}", source.name),
            }
        }
        articles
    }
}

fn item_to_article(item: &Item, source: &FeedSource) -> Option<Article> {
    let title = item.title()?.trim();
    if title.is_empty() {
        return None;
    }
    let mut article = Article::new(title, source.name.clone())
        .with_content(item.description().unwrap_or_default().trim());
    if let Some(link) = item.link().filter(|l| !l.trim().is_empty()) {
        article = article.with_url(link.trim());
    }
    if let Some(published) = item.pub_date().and_then(parse_timestamp) {
        article = article.with_published(published);
    }
    if let Some(location) = &source.location {
        article = article.with_location(location.clone());
    }
    if let Some(category) = source
        .category
        .clone()
        .or_else(|| item.categories().first().map(|c| c.name().to_string()))
    {
        article = article.with_category(category);
    }
    Some(article)
}
