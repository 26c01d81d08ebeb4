//! # Enrichment & Placement Pipeline
//!
//! Runs a batch of articles through the cache-backed analyzer, keeps the
//! records that can be drawn, geocodes and spreads them, and tallies the
//! result. Per-article problems are counted and reported; only a failed cache
//! flush aborts a run.

use crate::aggregate::{aggregate_markers, Aggregate};
use crate::analyzer::ArticleAnalyzer;
use crate::cache::{CacheOutcome, EnrichmentCache};
use crate::errors::PipelineError;
use crate::geocode::GeocodeResolver;
use crate::placement::Placement;
use crate::relevance::RelevanceRule;
use crate::types::{
    Article, ArticleIdentity, EnrichmentRecord, GeoPoint, PlacedMarker, PopupInfo, TokenUsage,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Re-analyze every article even when a cached record exists.
    pub force_reprocess: bool,
}

/// A relevant record the analysis service left incomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingFieldsDiagnostic {
    pub identity: ArticleIdentity,
    pub title: String,
    pub missing_fields: Vec<&'static str>,
    pub article: Article,
}

/// Why an article did not become a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingFields(MissingFieldsDiagnostic),
    GeocodeUnresolved {
        identity: ArticleIdentity,
        place: String,
    },
    AnalysisFailed {
        identity: ArticleIdentity,
        error: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub total: usize,
    /// Later copies of an identity already seen in this batch.
    pub duplicates: usize,
    pub ineligible: usize,
    pub cache_hits: usize,
    pub analyzed: usize,
    pub analysis_failures: usize,
    pub not_relevant: usize,
    pub missing_fields: usize,
    /// Records with place, sentiment and emoji, relevant or not.
    pub complete: usize,
    /// Relevant, complete records handed to the geocoder.
    pub accepted: usize,
    pub unresolved: usize,
    pub placed: usize,
    /// Set by [`Pipeline::repair`] when it had to force reprocessing.
    pub repaired: bool,
    pub usage: TokenUsage,
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineReport {
    /// Missing-field diagnostics only, in input order.
    pub fn missing_fields_diagnostics(&self) -> impl Iterator<Item = &MissingFieldsDiagnostic> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::MissingFields(m) => Some(m),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub markers: Vec<PlacedMarker>,
    pub summary: Aggregate,
    pub report: PipelineReport,
}

/// A record that passed acceptance, waiting for a coordinate.
struct Candidate<'a> {
    article: &'a Article,
    identity: ArticleIdentity,
    record: EnrichmentRecord,
}

pub struct Pipeline {
    analyzer: Box<dyn ArticleAnalyzer>,
    resolver: GeocodeResolver,
    relevance: RelevanceRule,
    placement: Placement,
}

impl Pipeline {
    pub fn new(analyzer: Box<dyn ArticleAnalyzer>, resolver: GeocodeResolver) -> Self {
        Self {
            analyzer,
            resolver,
            relevance: RelevanceRule::default(),
            placement: Placement::default(),
        }
    }

    pub fn with_relevance(mut self, relevance: RelevanceRule) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Processes `articles` once.
    pub async fn run(
        &self,
        cache: &mut EnrichmentCache,
        articles: &[Article],
        options: RunOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let mut report = PipelineReport {
            total: articles.len(),
            ..Default::default()
        };

        // --- 1. Enrich ---
        let mut enriched = Vec::with_capacity(articles.len());
        let mut seen = HashSet::new();
        for (idx, article) in articles.iter().enumerate() {
            if let Some(identity) = article.identity() {
                if !seen.insert(identity) {
                    debug!("Skipping repeated article: {}", article.title);
                    report.duplicates += 1;
                    continue;
                }
            }
            info!("[{}/{}] {}", idx + 1, articles.len(), article.title);
            let locally_relevant = self.relevance.matches(article);
            let outcome = if options.force_reprocess {
                cache
                    .reanalyze(article, self.analyzer.as_ref(), locally_relevant)
                    .await
            } else {
                cache
                    .analyze_or_cached(article, self.analyzer.as_ref(), locally_relevant)
                    .await
            };

            let record = match outcome {
                CacheOutcome::Ineligible => {
                    report.ineligible += 1;
                    continue;
                }
                CacheOutcome::Hit(record) => {
                    report.cache_hits += 1;
                    record
                }
                CacheOutcome::Analyzed { record, usage } => {
                    report.analyzed += 1;
                    report.usage += usage;
                    record
                }
                CacheOutcome::Failed(e) => {
                    report.analysis_failures += 1;
                    report.usage += e.usage();
                    if let Some(identity) = article.identity() {
                        report.diagnostics.push(Diagnostic::AnalysisFailed {
                            identity,
                            error: e.to_string(),
                        });
                    }
                    continue;
                }
            };
            enriched.push((article, record));
        }

        // --- 2. Persist ---
        if cache.is_dirty() {
            cache.flush()?;
        }

        // --- 3. Accept ---
        let mut candidates = Vec::new();
        for (article, record) in enriched {
            let Some(identity) = article.identity() else {
                continue;
            };
            if record.is_complete() {
                report.complete += 1;
            }
            if record.is_sg_related != Some(true) {
                report.not_relevant += 1;
                continue;
            }
            let missing = record.missing_fields();
            if !missing.is_empty() {
                warn!("Result missing fields {:?} for: {}", missing, article.title);
                report.missing_fields += 1;
                report
                    .diagnostics
                    .push(Diagnostic::MissingFields(MissingFieldsDiagnostic {
                        identity,
                        title: article.title.clone(),
                        missing_fields: missing,
                        article: article.clone(),
                    }));
                continue;
            }
            candidates.push(Candidate {
                article,
                identity,
                record,
            });
        }
        report.accepted = candidates.len();

        // --- 4. Geocode ---
        let mut located: Vec<(usize, GeoPoint)> = Vec::with_capacity(candidates.len());
        for (idx, candidate) in candidates.iter().enumerate() {
            let place = candidate.record.place.as_deref().unwrap_or_default();
            match self.resolver.resolve(place).await {
                Some(point) => located.push((idx, point)),
                None => {
                    report.unresolved += 1;
                    report.diagnostics.push(Diagnostic::GeocodeUnresolved {
                        identity: candidate.identity.clone(),
                        place: place.to_string(),
                    });
                }
            }
        }

        // --- 5. Place and aggregate ---
        let markers: Vec<PlacedMarker> = self
            .placement
            .place(&located)
            .into_iter()
            .filter_map(|(idx, position)| build_marker(candidates.get(idx)?, position))
            .collect();
        report.placed = markers.len();

        let summary = aggregate_markers(&markers);
        info!(
            "Placed {} of {} articles ({} not relevant, {} missing fields, {} unresolved, {} failed).",
            report.placed,
            report.total,
            report.not_relevant,
            report.missing_fields,
            report.unresolved,
            report.analysis_failures
        );

        Ok(PipelineOutput {
            markers,
            summary,
            report,
        })
    }

    /// Runs normally, then once more with forced reprocessing if a non-empty
    /// batch produced no complete record at all. Complete records that are
    /// merely not relevant do not trigger reprocessing.
    pub async fn repair(
        &self,
        cache: &mut EnrichmentCache,
        articles: &[Article],
    ) -> Result<PipelineOutput, PipelineError> {
        let output = self.run(cache, articles, RunOptions::default()).await?;
        if articles.is_empty() || output.report.complete > 0 {
            return Ok(output);
        }

        warn!("No complete records in {} articles, forcing reprocessing.", articles.len());
        let mut repaired = self
            .run(
                cache,
                articles,
                RunOptions {
                    force_reprocess: true,
                },
            )
            .await?;
        repaired.report.repaired = true;
        repaired.report.usage += output.report.usage;
        Ok(repaired)
    }
}

fn build_marker(candidate: &Candidate<'_>, position: GeoPoint) -> Option<PlacedMarker> {
    let record = &candidate.record;
    Some(PlacedMarker {
        identity: candidate.identity.clone(),
        place: record.place.clone()?,
        position,
        sentiment: record.sentiment?,
        emoji: record.emoji.clone()?,
        popup: PopupInfo {
            source: candidate.article.source.clone(),
            title: candidate.article.title.clone(),
            reason: record.reason.clone(),
            url: candidate.article.url.clone(),
        },
    })
}
