//! # End-to-End Run Tests
//!
//! Drives `run_once` against mock Gemini and OneMap servers and checks the
//! files it leaves behind.

use anyhow::Result;
use moodmap_cli::config::get_config;
use moodmap_cli::{run_once, RunMode, SourceArgs};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}],
        "usageMetadata": {"promptTokenCount": 50, "candidatesTokenCount": 20}
    }))
}

#[tokio::test]
async fn test_run_once_writes_map_document_and_log() -> Result<()> {
    // --- Arrange ---
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini"))
        .and(body_string_contains("Changi flights resume"))
        .respond_with(gemini_reply(
            "```json\n{\"is_sg_related\": true, \"place\": \"Changi Airport\", \"sentiment\": \"positive\", \"reason\": \"travel is back\", \"emoji\": \"plane\"}\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini"))
        .and(body_string_contains("Mystery story"))
        .respond_with(gemini_reply(
            "{\"is_sg_related\": true, \"sentiment\": neutral}",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/common/elastic/search"))
        .and(query_param("searchVal", "Changi Airport"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"LATITUDE": "1.3644", "LONGITUDE": "103.9915"}]
        })))
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let articles_path = dir.path().join("articles.json");
    fs::write(
        &articles_path,
        json!([
            {"title": "Changi flights resume", "url": "https://news.example.sg/changi", "source": "CNA", "content": "Flights are back."},
            {"title": "Mystery story", "url": "https://news.example.sg/mystery", "source": "ST"}
        ])
        .to_string(),
    )?;

    let mut config_file = NamedTempFile::new()?;
    write!(
        config_file,
        r#"
cache_path: {cache}
output_path: {output}
missing_fields_log: {log}
analysis:
  provider: gemini
  api_url: {uri}/gemini
  api_key: test-key
geocoding:
  providers: [onemap]
  onemap_url: {uri}
recency:
  max_age_days: 0
"#,
        cache = dir.path().join("cache.json").display(),
        output = dir.path().join("map.json").display(),
        log = dir.path().join("missing.log").display(),
        uri = server.uri(),
    )?;
    let config = get_config(Some(config_file.path()))?;
    let source = SourceArgs {
        articles: Some(articles_path),
    };

    // --- Act ---
    let first = run_once(&config, &source, RunMode::Normal).await?;
    let second = run_once(&config, &source, RunMode::Normal).await?;

    // --- Assert ---
    assert_eq!(first.report.analyzed, 2);
    assert_eq!(first.report.placed, 1);
    assert_eq!(first.report.missing_fields, 1);
    assert_eq!(first.report.usage.calls, 2);
    assert_eq!(second.report.cache_hits, 2);
    assert_eq!(second.report.analyzed, 0);

    let document: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("map.json"))?)?;
    let markers = document["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["emoji"], "✈️");
    assert_eq!(markers[0]["sentiment"], "positive");
    assert_eq!(markers[0]["popup"]["source"], "CNA");
    assert_eq!(document["overview"]["sentiment"], "positive");
    assert_eq!(document["overview"]["emoji"], "😊");
    assert_eq!(document["overview"]["position"]["lat"], 1.285);
    assert_eq!(document["overview"]["outlets"]["CNA"]["positive"], 1);

    // Both runs log the incomplete record.
    let log = fs::read_to_string(dir.path().join("missing.log"))?;
    let lines: Vec<Value> = log
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["title"], "Mystery story");
    assert_eq!(lines[0]["missing_fields"], json!(["place", "emoji"]));
    Ok(())
}

#[tokio::test]
async fn test_unwritable_missing_fields_log_does_not_fail_the_run() -> Result<()> {
    // --- Arrange ---
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini"))
        .respond_with(gemini_reply(
            "{\"is_sg_related\": true, \"sentiment\": \"negative\"}",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let articles_path = dir.path().join("articles.json");
    fs::write(
        &articles_path,
        json!([{"title": "Vague story", "url": "https://news.example.sg/vague", "source": "ST"}])
            .to_string(),
    )?;
    // A directory cannot be opened for appending.
    let log_dir = dir.path().join("missing.log");
    fs::create_dir(&log_dir)?;

    let mut config_file = NamedTempFile::new()?;
    write!(
        config_file,
        r#"
cache_path: {cache}
output_path: {output}
missing_fields_log: {log}
analysis:
  api_url: {uri}/gemini
  api_key: test-key
geocoding:
  providers: [onemap]
  onemap_url: {uri}
recency:
  max_age_days: 0
"#,
        cache = dir.path().join("cache.json").display(),
        output = dir.path().join("map.json").display(),
        log = log_dir.display(),
        uri = server.uri(),
    )?;
    let config = get_config(Some(config_file.path()))?;
    let source = SourceArgs {
        articles: Some(articles_path),
    };

    // --- Act ---
    let output = run_once(&config, &source, RunMode::Normal).await?;

    // --- Assert ---
    assert_eq!(output.report.missing_fields, 1);
    assert!(dir.path().join("map.json").exists());
    assert!(dir.path().join("cache.json").exists());
    assert!(log_dir.is_dir());
    Ok(())
}
