//! # Enrichment Cache
//!
//! A durable `identity -> record` table that guarantees each article is sent
//! to the analysis service at most once. The whole table is read at startup,
//! held in memory for the run, and rewritten atomically by [`EnrichmentCache::flush`].

use crate::analyzer::ArticleAnalyzer;
use crate::errors::{AnalysisError, CacheError};
use crate::types::{Article, ArticleIdentity, EnrichmentRecord, TokenUsage};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// How a single article went through [`EnrichmentCache::analyze_or_cached`].
#[derive(Debug)]
pub enum CacheOutcome {
    /// The article has neither URL nor title.
    Ineligible,
    /// A stored record was returned without calling the analyzer.
    Hit(EnrichmentRecord),
    /// The analyzer ran and its record was stored.
    Analyzed {
        record: EnrichmentRecord,
        usage: TokenUsage,
    },
    /// The analyzer failed. Nothing was stored, so a later run retries.
    Failed(AnalysisError),
}

#[derive(Debug, Default)]
pub struct EnrichmentCache {
    path: Option<PathBuf>,
    entries: BTreeMap<ArticleIdentity, EnrichmentRecord>,
    dirty: bool,
}

impl EnrichmentCache {
    /// A cache with no backing file. `flush` is a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache file at `path`.
    ///
    /// A missing file starts an empty cache. An unreadable or corrupt file also
    /// starts empty, with a warning; the next flush replaces it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Enrichment cache '{}' is corrupt, starting empty: {e}",
                        path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No enrichment cache at '{}', starting empty.",
                    path.display()
                );
                BTreeMap::new()
            }
            Err(e) => {
                warn!(
                    "Could not read enrichment cache '{}', starting empty: {e}",
                    path.display()
                );
                BTreeMap::new()
            }
        };
        info!("Loaded {} cached enrichment records.", entries.len());
        Self {
            path: Some(path),
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, identity: &ArticleIdentity) -> Option<&EnrichmentRecord> {
        self.entries.get(identity)
    }

    /// Stores `record` under `identity`, replacing any previous record.
    pub fn put(&mut self, identity: ArticleIdentity, record: EnrichmentRecord) {
        self.entries.insert(identity, record);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes every entry to the backing file.
    ///
    /// The table is written to a temporary file in the same directory and then
    /// renamed over the old file, so a failed flush leaves the previous
    /// contents intact.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| CacheError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&dir).map_err(io_err)?;
        let body = serde_json::to_string_pretty(&self.entries)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path)?;

        debug!(
            "Flushed {} enrichment records to '{}'.",
            self.entries.len(),
            path.display()
        );
        self.dirty = false;
        Ok(())
    }

    /// Returns the cached record for `article`, analyzing it only on a miss.
    ///
    /// `locally_relevant` is the result of the cheap keyword heuristic. When it
    /// is set, any cached record counts as a hit and gets `is_sg_related`
    /// forced to true. Without it, only a record that already carries a
    /// relevance verdict counts as a hit.
    pub async fn analyze_or_cached<A>(
        &mut self,
        article: &Article,
        analyzer: &A,
        locally_relevant: bool,
    ) -> CacheOutcome
    where
        A: ArticleAnalyzer + ?Sized,
    {
        let Some(identity) = article.identity() else {
            return CacheOutcome::Ineligible;
        };

        if let Some(record) = self.entries.get_mut(&identity) {
            if locally_relevant {
                if record.is_sg_related != Some(true) {
                    record.is_sg_related = Some(true);
                    self.dirty = true;
                }
                return CacheOutcome::Hit(record.clone());
            }
            if record.is_sg_related.is_some() {
                return CacheOutcome::Hit(record.clone());
            }
        }

        self.analyze_and_store(identity, article, analyzer, locally_relevant)
            .await
    }

    /// Forced reprocessing: always calls the analyzer and overwrites.
    pub async fn reanalyze<A>(
        &mut self,
        article: &Article,
        analyzer: &A,
        locally_relevant: bool,
    ) -> CacheOutcome
    where
        A: ArticleAnalyzer + ?Sized,
    {
        let Some(identity) = article.identity() else {
            return CacheOutcome::Ineligible;
        };
        self.analyze_and_store(identity, article, analyzer, locally_relevant)
            .await
    }

    async fn analyze_and_store<A>(
        &mut self,
        identity: ArticleIdentity,
        article: &Article,
        analyzer: &A,
        locally_relevant: bool,
    ) -> CacheOutcome
    where
        A: ArticleAnalyzer + ?Sized,
    {
        match analyzer.analyze(article).await {
            Ok(analysis) => {
                let mut record = analysis.record;
                if locally_relevant {
                    record.is_sg_related = Some(true);
                }
                self.put(identity, record.clone());
                CacheOutcome::Analyzed {
                    record,
                    usage: analysis.usage,
                }
            }
            Err(e) => {
                warn!("Analysis failed for '{identity}': {e}");
                CacheOutcome::Failed(e)
            }
        }
    }
}
