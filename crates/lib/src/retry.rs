//! Rate-limit retry policy and the retry-delay parser.

use std::time::Duration;

/// A rate-limited analysis is retried at most this many times.
pub const MAX_RETRIES: u32 = 1;

/// How long to wait before the single retry after a rate-limit response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt, capped at [`MAX_RETRIES`].
    /// Zero disables retrying.
    pub max_retries: u32,
    /// Used when the server does not say how long to wait.
    pub default_delay: Duration,
    /// Upper bound on any wait, including server-provided ones.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            default_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Total provider calls allowed for one article.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.min(MAX_RETRIES) + 1
    }

    /// The delay to sleep for, given what the server asked for.
    pub fn delay_for(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.default_delay).min(self.max_delay)
    }
}

/// Parses a unit-suffixed duration such as `"37s"`, `"1.5s"`, `"2m"`,
/// `"500ms"` or `"1h"`. A bare number is taken as seconds, which is how the
/// `Retry-After` header expresses it.
///
/// Returns `None` for empty, negative, non-finite or otherwise malformed input.
pub fn parse_retry_delay(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let amount: f64 = number.parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    let seconds = match unit.trim() {
        "" | "s" | "sec" | "secs" => amount,
        "ms" => amount / 1000.0,
        "m" | "min" | "mins" => amount * 60.0,
        "h" => amount * 3600.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}
