//! # Sentiment Aggregation
//!
//! Per-outlet tallies and the overall mood shown on the summary marker.

use crate::interpret::sentiment_emoji;
use crate::types::{PlacedMarker, Sentiment};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentCounts {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> u32 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }

    /// The most frequent label. Ties go to the earliest of positive, negative,
    /// neutral. `None` when nothing was counted.
    pub fn mode(&self) -> Option<Sentiment> {
        if self.total() == 0 {
            return None;
        }
        // `max_by_key` keeps the last maximum, so scan in reverse.
        Sentiment::ALL
            .iter()
            .rev()
            .copied()
            .max_by_key(|s| self.get(*s))
    }
}

/// Source name to sentiment counts, ordered by name.
pub type OutletSentimentTally = BTreeMap<String, SentimentCounts>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub per_outlet: OutletSentimentTally,
    pub totals: SentimentCounts,
    pub overall: Option<Sentiment>,
}

impl Aggregate {
    /// Glyph for the overall mood, if there is one.
    pub fn overall_emoji(&self) -> Option<&'static str> {
        self.overall.map(sentiment_emoji)
    }
}

/// Tallies `(source, sentiment)` pairs.
pub fn aggregate<'a, I>(items: I) -> Aggregate
where
    I: IntoIterator<Item = (&'a str, Sentiment)>,
{
    let mut per_outlet = OutletSentimentTally::new();
    let mut totals = SentimentCounts::default();
    for (source, sentiment) in items {
        per_outlet
            .entry(source.to_string())
            .or_default()
            .record(sentiment);
        totals.record(sentiment);
    }
    Aggregate {
        per_outlet,
        overall: totals.mode(),
        totals,
    }
}

pub fn aggregate_markers(markers: &[PlacedMarker]) -> Aggregate {
    aggregate(
        markers
            .iter()
            .map(|m| (m.popup.source.as_str(), m.sentiment)),
    )
}
