//! Files written after a run: the renderer hand-off document and the
//! missing-fields log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use moodmap::aggregate::{OutletSentimentTally, SentimentCounts};
use moodmap::pipeline::{MissingFieldsDiagnostic, PipelineOutput};
use moodmap::types::{GeoPoint, PlacedMarker, Sentiment};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything the map renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct MapDocument {
    pub generated_at: DateTime<Utc>,
    pub markers: Vec<PlacedMarker>,
    pub overview: Overview,
}

/// The summary marker: overall mood plus per-outlet counts.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub position: GeoPoint,
    pub sentiment: Option<Sentiment>,
    pub emoji: Option<String>,
    pub outlets: OutletSentimentTally,
    pub totals: SentimentCounts,
}

impl MapDocument {
    pub fn new(output: &PipelineOutput, generated_at: DateTime<Utc>, position: GeoPoint) -> Self {
        Self {
            generated_at,
            markers: output.markers.clone(),
            overview: Overview {
                position,
                sentiment: output.summary.overall,
                emoji: output.summary.overall_emoji().map(str::to_string),
                outlets: output.summary.per_outlet.clone(),
                totals: output.summary.totals,
            },
        }
    }
}

/// Writes `document` as pretty JSON, replacing `path` atomically.
pub fn write_document(path: &Path, document: &MapDocument) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, document)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write map document to '{}'", path.display()))?;
    Ok(())
}

/// Appends one JSON line per diagnostic. Returns how many were written.
pub fn append_missing_fields<'a, I>(path: &Path, diagnostics: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a MissingFieldsDiagnostic>,
{
    let mut lines = String::new();
    let mut count = 0;
    for diagnostic in diagnostics {
        lines.push_str(&serde_json::to_string(diagnostic)?);
        lines.push('\n');
        count += 1;
    }
    if count == 0 {
        return Ok(0);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open missing-fields log '{}'", path.display()))?;
    file.write_all(lines.as_bytes())?;
    Ok(count)
}
