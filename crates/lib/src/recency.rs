//! Date filters applied to acquired articles before enrichment.

use crate::types::Article;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// Singapore Standard Time, UTC+8.
pub const SGT_OFFSET_SECS: i32 = 8 * 3600;

/// Keeps articles published no earlier than `max_age` before `now`.
/// Undated articles are kept.
pub fn retain_recent(articles: Vec<Article>, now: DateTime<Utc>, max_age: Duration) -> Vec<Article> {
    let cutoff = now - max_age;
    articles
        .into_iter()
        .filter(|a| a.published.map_or(true, |p| p >= cutoff))
        .collect()
}

/// Keeps articles whose timestamp falls on `date` in the given local offset.
/// Undated articles are dropped.
pub fn published_on(articles: Vec<Article>, date: NaiveDate, offset: FixedOffset) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| {
            a.published
                .is_some_and(|p| p.with_timezone(&offset).date_naive() == date)
        })
        .collect()
}

/// The UTC+8 offset used for "today" when none is configured.
pub fn singapore_offset() -> FixedOffset {
    FixedOffset::east_opt(SGT_OFFSET_SECS).unwrap_or(Utc.fix())
}
