//! # `moodmap` CLI Library
//!
//! Wires configuration, feed acquisition, the enrichment pipeline and the
//! output files together. `main.rs` only sets up logging and calls [`run`].

pub mod config;
pub mod output;

use crate::config::{get_config, AppConfig, RecencyConfig};
use crate::output::{append_missing_fields, write_document, MapDocument};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use clap::{Args, Parser, Subcommand};
use moodmap::analyzer::Analyzer;
use moodmap::cache::EnrichmentCache;
use moodmap::constants::OVERVIEW_POSITION;
use moodmap::geocode::GeocodeResolver;
use moodmap::pipeline::{Pipeline, PipelineOutput, RunOptions};
use moodmap::providers::factory::create_provider;
use moodmap::providers::geo::{GeocodeProvider, NominatimProvider, OneMapProvider};
use moodmap::recency::{published_on, retain_recent, singapore_offset};
use moodmap::types::Article;
use moodmap_rss::FeedFetcher;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file. Defaults to `moodmap.yml` if present.
    #[arg(long, global = true, env = "MOODMAP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, enrich and place today's articles once.
    Run(RunArgs),
    /// Run once; if nothing usable came out, reprocess every article.
    Repair(SourceArgs),
    /// Run repeatedly on a fixed interval until interrupted.
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read articles from a JSON array instead of fetching the feeds.
    #[arg(long)]
    pub articles: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Ignore cached records and analyze every article again.
    #[arg(long)]
    pub force_reprocess: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Seconds between runs.
    #[arg(long, default_value_t = 3600)]
    pub interval_secs: u64,
}

/// How a single invocation treats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    ForceReprocess,
    Repair,
}

// --- Entry Point ---

pub async fn run(cli: Cli) -> Result<()> {
    let config = get_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            let mode = if args.force_reprocess {
                RunMode::ForceReprocess
            } else {
                RunMode::Normal
            };
            run_once(&config, &args.source, mode).await?;
        }
        Commands::Repair(source) => {
            run_once(&config, &source, RunMode::Repair).await?;
        }
        Commands::Watch(args) => watch(&config, &args).await?,
    }
    Ok(())
}

/// Acquires articles, runs the pipeline and writes the output files.
pub async fn run_once(
    config: &AppConfig,
    source: &SourceArgs,
    mode: RunMode,
) -> Result<PipelineOutput> {
    let pipeline = build_pipeline(config)?;
    let articles = filter_recent(
        &config.recency,
        acquire_articles(config, source).await?,
        Utc::now(),
    );
    info!("Processing {} articles.", articles.len());

    let mut cache = EnrichmentCache::load(&config.cache_path);
    let output = match mode {
        RunMode::Normal => {
            pipeline
                .run(&mut cache, &articles, RunOptions::default())
                .await?
        }
        RunMode::ForceReprocess => {
            pipeline
                .run(
                    &mut cache,
                    &articles,
                    RunOptions {
                        force_reprocess: true,
                    },
                )
                .await?
        }
        RunMode::Repair => pipeline.repair(&mut cache, &articles).await?,
    };

    let document = MapDocument::new(&output, Utc::now(), OVERVIEW_POSITION);
    write_document(Path::new(&config.output_path), &document)?;

    if !config.missing_fields_log.is_empty() {
        match append_missing_fields(
            Path::new(&config.missing_fields_log),
            output.report.missing_fields_diagnostics(),
        ) {
            Ok(0) => {}
            Ok(logged) => info!(
                "Logged {logged} incomplete records to '{}'.",
                config.missing_fields_log
            ),
            Err(e) => warn!("Could not log incomplete records: {e:?}"),
        }
    }

    let report = &output.report;
    info!(
        "Wrote {} markers to '{}' ({} analyzed, {} cached, {} skipped: {} missing fields, {} unresolved place). Tokens: {} in, {} out over {} calls.",
        report.placed,
        config.output_path,
        report.analyzed,
        report.cache_hits,
        report.missing_fields + report.unresolved,
        report.missing_fields,
        report.unresolved,
        report.usage.prompt_tokens,
        report.usage.output_tokens,
        report.usage.calls
    );
    Ok(output)
}

async fn watch(config: &AppConfig, args: &WatchArgs) -> Result<()> {
    let interval = Duration::from_secs(args.interval_secs.max(1));
    info!("Running every {}s. Press Ctrl-C to stop.", interval.as_secs());
    loop {
        if let Err(e) = run_once(config, &args.source, RunMode::Normal).await {
            error!("Scheduled run failed: {e:?}");
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping.");
                return Ok(());
            }
        }
    }
}

// --- Wiring ---

pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let provider = create_provider(&config.analysis.provider_settings())
        .context("Failed to configure the AI provider")?;
    let mut analyzer =
        Analyzer::new(provider).with_retry_policy(config.analysis.retry_policy());
    if config.analysis.system_prompt.is_some() || config.analysis.user_prompt.is_some() {
        analyzer = analyzer.with_prompts(
            config
                .analysis
                .system_prompt
                .clone()
                .unwrap_or_else(|| moodmap::prompts::ANALYSIS_SYSTEM_PROMPT.to_string()),
            config
                .analysis
                .user_prompt
                .clone()
                .unwrap_or_else(|| moodmap::prompts::ANALYSIS_USER_PROMPT.to_string()),
        );
    }

    let resolver = GeocodeResolver::new(build_geocoders(config)?)
        .with_bounds(config.bounds)
        .with_qualifier(config.geocoding.qualifier.clone());

    Ok(Pipeline::new(Box::new(analyzer), resolver)
        .with_relevance((&config.relevance).into())
        .with_placement((&config.placement).into()))
}

fn build_geocoders(config: &AppConfig) -> Result<Vec<Box<dyn GeocodeProvider>>> {
    let geo = &config.geocoding;
    geo.providers
        .iter()
        .map(|name| -> Result<Box<dyn GeocodeProvider>> {
            match name.trim().to_ascii_lowercase().as_str() {
                "onemap" => Ok(Box::new(OneMapProvider::new(geo.onemap_url.clone())?)),
                "nominatim" => Ok(Box::new(NominatimProvider::new(
                    geo.nominatim_url.clone(),
                    &geo.user_agent,
                    geo.nominatim_suffix.clone(),
                )?)),
                other => Err(anyhow!("Unknown geocoding provider '{other}'")),
            }
        })
        .collect()
}

async fn acquire_articles(config: &AppConfig, source: &SourceArgs) -> Result<Vec<Article>> {
    if let Some(path) = &source.articles {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read articles from '{}'", path.display()))?;
        let articles: Vec<Article> = serde_json::from_str(&content)
            .with_context(|| format!("'{}' is not a JSON array of articles", path.display()))?;
        info!("Loaded {} articles from '{}'.", articles.len(), path.display());
        return Ok(articles);
    }

    let fetcher = FeedFetcher::new(Duration::from_secs(15))?;
    let articles = fetcher.fetch_all(&config.feeds).await;
    if articles.is_empty() {
        warn!("No articles fetched from {} feeds.", config.feeds.len());
    }
    Ok(articles)
}

fn filter_recent(
    recency: &RecencyConfig,
    articles: Vec<Article>,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let mut articles = articles;
    if recency.max_age_days > 0 {
        articles = retain_recent(articles, now, ChronoDuration::days(recency.max_age_days));
    }
    if recency.today_only {
        let offset = FixedOffset::east_opt(recency.utc_offset_hours.saturating_mul(3600))
            .unwrap_or_else(|| {
                warn!(
                    "Invalid UTC offset of {} hours, using Singapore time.",
                    recency.utc_offset_hours
                );
                singapore_offset()
            });
        let today = now.with_timezone(&offset).date_naive();
        articles = published_on(articles, today, offset);
    }
    articles
}
