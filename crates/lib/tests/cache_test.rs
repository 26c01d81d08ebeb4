//! # Enrichment Cache Tests
//!
//! Idempotence of `analyze_or_cached`, the relevance override, and the
//! durability of `flush`.

use anyhow::Result;
use moodmap::cache::{CacheOutcome, EnrichmentCache};
use moodmap::types::{Article, ArticleIdentity, EnrichmentRecord, Sentiment};
use moodmap_test_utils::{article, complete_record, MockAnalyzer};
use tempfile::tempdir;

#[tokio::test]
async fn test_second_lookup_is_a_hit() {
    // --- Arrange ---
    let analyzer = MockAnalyzer::new();
    let news = article("MRT line opens", "CNA");
    analyzer.add_record(&news.title, complete_record("Woodlands", Sentiment::Positive, "🚆"));
    let mut cache = EnrichmentCache::in_memory();

    // --- Act ---
    let first = cache.analyze_or_cached(&news, &analyzer, false).await;
    let second = cache.analyze_or_cached(&news, &analyzer, false).await;

    // --- Assert ---
    let CacheOutcome::Analyzed { record: analyzed, usage } = first else {
        panic!("expected a miss on first lookup, got {first:?}");
    };
    assert_eq!(usage.calls, 1);
    let CacheOutcome::Hit(hit) = second else {
        panic!("expected a hit on second lookup, got {second:?}");
    };
    assert_eq!(hit, analyzed);
    assert_eq!(analyzer.calls(), 1);
}

#[tokio::test]
async fn test_article_without_identity_is_ineligible() {
    let analyzer = MockAnalyzer::new();
    let mut cache = EnrichmentCache::in_memory();
    let blank = Article::new("   ", "CNA");

    let outcome = cache.analyze_or_cached(&blank, &analyzer, true).await;

    assert!(matches!(outcome, CacheOutcome::Ineligible));
    assert_eq!(analyzer.calls(), 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_local_relevance_overrides_cached_verdict() -> Result<()> {
    // --- Arrange ---
    let analyzer = MockAnalyzer::new();
    let news = article("Hawker prices rise", "ST");
    let identity = news.identity().unwrap();
    let mut cache = EnrichmentCache::in_memory();
    let mut stored = complete_record("Maxwell Food Centre", Sentiment::Negative, "😞");
    stored.is_sg_related = Some(false);
    cache.put(identity.clone(), stored);
    cache.flush()?;

    // --- Act ---
    let outcome = cache.analyze_or_cached(&news, &analyzer, true).await;

    // --- Assert ---
    let CacheOutcome::Hit(record) = outcome else {
        panic!("expected a hit, got {outcome:?}");
    };
    assert_eq!(record.is_sg_related, Some(true));
    assert_eq!(record.place.as_deref(), Some("Maxwell Food Centre"));
    assert_eq!(cache.get(&identity).unwrap().is_sg_related, Some(true));
    assert!(cache.is_dirty());
    assert_eq!(analyzer.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_cached_record_without_verdict_is_reanalyzed() {
    let analyzer = MockAnalyzer::new();
    let news = article("Rain expected", "ST");
    analyzer.add_record(&news.title, complete_record("Bedok", Sentiment::Neutral, "🌧️"));
    let mut cache = EnrichmentCache::in_memory();
    cache.put(
        news.identity().unwrap(),
        EnrichmentRecord {
            place: Some("Bedok".to_string()),
            ..Default::default()
        },
    );

    let outcome = cache.analyze_or_cached(&news, &analyzer, false).await;

    assert!(matches!(outcome, CacheOutcome::Analyzed { .. }));
    assert_eq!(analyzer.calls(), 1);
}

#[tokio::test]
async fn test_failed_analysis_is_not_cached() {
    let analyzer = MockAnalyzer::new();
    let news = article("Unparseable", "ST");
    let mut cache = EnrichmentCache::in_memory();

    let first = cache.analyze_or_cached(&news, &analyzer, false).await;
    let second = cache.analyze_or_cached(&news, &analyzer, false).await;

    assert!(matches!(first, CacheOutcome::Failed(_)));
    assert!(matches!(second, CacheOutcome::Failed(_)));
    assert!(cache.is_empty());
    assert_eq!(analyzer.calls(), 2);
}

#[tokio::test]
async fn test_reanalyze_overwrites() {
    let analyzer = MockAnalyzer::new();
    let news = article("Port volumes", "BT");
    analyzer.add_record(&news.title, complete_record("Tuas Port", Sentiment::Positive, "🚢"));
    let mut cache = EnrichmentCache::in_memory();
    cache.put(
        news.identity().unwrap(),
        complete_record("Keppel", Sentiment::Negative, "😞"),
    );

    let outcome = cache.reanalyze(&news, &analyzer, false).await;

    assert!(matches!(outcome, CacheOutcome::Analyzed { .. }));
    let stored = cache.get(&news.identity().unwrap()).unwrap();
    assert_eq!(stored.place.as_deref(), Some("Tuas Port"));
}

#[test]
fn test_flush_round_trip() -> Result<()> {
    // --- Arrange ---
    let dir = tempdir()?;
    let path = dir.path().join("processed_articles.json");
    let mut cache = EnrichmentCache::load(&path);
    assert!(cache.is_empty());
    let identity = ArticleIdentity::new("https://news.example.sg/a").unwrap();
    cache.put(
        identity.clone(),
        complete_record("Sentosa", Sentiment::Positive, "🏖️"),
    );

    // --- Act ---
    cache.flush()?;
    let reloaded = EnrichmentCache::load(&path);

    // --- Assert ---
    assert!(!cache.is_dirty());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get(&identity), cache.get(&identity));
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(raw["https://news.example.sg/a"]["sentiment"], "positive");
    Ok(())
}

#[test]
fn test_corrupt_file_loads_empty_and_is_replaced() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("processed_articles.json");
    std::fs::write(&path, "{ not json")?;

    let mut cache = EnrichmentCache::load(&path);
    assert!(cache.is_empty());

    cache.put(
        ArticleIdentity::new("title only").unwrap(),
        EnrichmentRecord::default(),
    );
    cache.flush()?;

    assert_eq!(EnrichmentCache::load(&path).len(), 1);
    Ok(())
}
