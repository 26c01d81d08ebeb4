//! # RSS Crate Tests
//!
//! Feed fetching and item mapping against a mock server.

use anyhow::Result;
use moodmap_rss::{FeedError, FeedFetcher, FeedSource};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a mock RSS feed.
fn mock_rss_feed_content() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
        <channel>
            <title>Test Feed</title>
            <link>http://localhost/test</link>
            <description>A feed for testing.</description>
            <item>
                <title>Article One</title>
                <link>http://localhost/test/article1</link>
                <description>This is the first article.</description>
                <pubDate>Mon, 10 Mar 2025 08:30:00 +0800</pubDate>
                <category>Singapore</category>
            </item>
            <item>
                <title>Article Two</title>
                <link>http://localhost/test/article2</link>
                <description>This is the second article.</description>
            </item>
            <item>
                <description>An item with no title is skipped.</description>
            </item>
        </channel>
        </rss>
    "#
    .to_string()
}

async fn mount_feed(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(mock_rss_feed_content())
                .insert_header("Content-Type", "application/rss+xml"),
        )
        .mount(server)
        .await;
}

fn fetcher() -> FeedFetcher {
    FeedFetcher::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_maps_items_to_articles() -> Result<()> {
    // --- Arrange ---
    let server = MockServer::start().await;
    mount_feed(&server, "/feed.xml").await;
    let source = FeedSource::new("Test Times", server.uri() + "/feed.xml").with_location("Singapore");

    // --- Act ---
    let articles = fetcher().fetch(&source).await?;

    // --- Assert ---
    assert_eq!(articles.len(), 2);
    let first = &articles[0];
    assert_eq!(first.title, "Article One");
    assert_eq!(first.url.as_deref(), Some("http://localhost/test/article1"));
    assert_eq!(first.content, "This is the first article.");
    assert_eq!(first.source, "Test Times");
    assert_eq!(first.location.as_deref(), Some("Singapore"));
    assert_eq!(first.category.as_deref(), Some("Singapore"));
    assert_eq!(
        first.published.map(|p| p.to_rfc3339()),
        Some("2025-03-10T00:30:00+00:00".to_string())
    );
    assert_eq!(articles[1].published, None);
    Ok(())
}

#[tokio::test]
async fn test_fetch_reports_http_and_parse_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbage.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
        .mount(&server)
        .await;

    let missing = fetcher()
        .fetch(&FeedSource::new("Gone", server.uri() + "/missing.xml"))
        .await;
    let garbage = fetcher()
        .fetch(&FeedSource::new("Broken", server.uri() + "/garbage.xml"))
        .await;

    assert!(matches!(missing, Err(FeedError::Fetch(_))));
    assert!(matches!(garbage, Err(FeedError::Parse(_))));
}

#[tokio::test]
async fn test_fetch_all_skips_failures_and_duplicates() {
    // --- Arrange ---
    let server = MockServer::start().await;
    mount_feed(&server, "/a.xml").await;
    mount_feed(&server, "/b.xml").await;
    Mock::given(method("GET"))
        .and(path("/down.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let sources = vec![
        FeedSource::new("A", server.uri() + "/a.xml"),
        FeedSource::new("Down", server.uri() + "/down.xml"),
        FeedSource::new("B", server.uri() + "/b.xml"),
    ];

    // --- Act ---
    let articles = fetcher().fetch_all(&sources).await;

    // --- Assert ---
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|a| a.source == "A"));
}
