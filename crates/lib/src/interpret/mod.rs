//! # Response Interpretation
//!
//! Turns the free-form text returned by the analysis service into an
//! [`EnrichmentRecord`]. The service is asked for bare JSON but regularly wraps
//! it in code fences, prefixes it with chatter, leaves sentiment labels
//! unquoted, or emits broken unicode escapes. This module tolerates all of
//! that and performs no I/O.

pub mod emoji;

use crate::errors::InterpretationError;
use crate::types::{EnrichmentRecord, Sentiment};
use serde_json::{Map, Value};
use tracing::debug;

pub use emoji::{normalize_emoji, sentiment_emoji, NEUTRAL_FACE};

const BARE_LABELS: [&str; 3] = ["positive", "negative", "neutral"];

/// Interprets a raw analysis response.
///
/// Tries a direct parse of the fence-stripped text first. Failing that, the
/// first balanced `{...}` block is extracted, repaired, and parsed.
pub fn interpret(raw: &str) -> Result<EnrichmentRecord, InterpretationError> {
    let cleaned = strip_code_fence(raw);

    if let Ok(object) = serde_json::from_str::<Map<String, Value>>(cleaned) {
        return Ok(record_from_object(&object));
    }

    let mut search_from = 0;
    while let Some((start, end)) = find_balanced_object(cleaned, search_from) {
        let candidate = &cleaned[start..end];
        let repaired = repair_json(candidate);
        match serde_json::from_str::<Map<String, Value>>(&repaired) {
            Ok(object) => return Ok(record_from_object(&object)),
            Err(e) => debug!("Repaired candidate still failed to parse: {e}"),
        }
        search_from = end;
    }

    Err(InterpretationError {
        raw: raw.to_string(),
    })
}

/// Like [`interpret`], but accepts bytes that may not be valid UTF-8.
/// Invalid sequences become U+FFFD instead of failing the parse.
pub fn interpret_bytes(raw: &[u8]) -> Result<EnrichmentRecord, InterpretationError> {
    interpret(&String::from_utf8_lossy(raw))
}

/// Removes a surrounding ```` ```lang ... ``` ```` fence, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Finds the first `{...}` block at or after `from` whose braces balance,
/// ignoring braces inside string literals. Returns byte offsets.
fn find_balanced_object(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut start = from;
    while let Some(offset) = text.get(start..)?.find('{') {
        let open = start + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((open, i + 1));
                    }
                }
                _ => {}
            }
        }
        start = open + 1;
    }
    None
}

/// Applies the two repairs a near-JSON response needs:
///
/// 1. bare `positive`/`negative`/`neutral` values are quoted;
/// 2. sequences JSON cannot carry become U+FFFD. Unpaired surrogate escapes
///    are replaced, invalid escapes are kept literally, and raw control
///    characters inside strings are escaped.
pub fn repair_json(candidate: &str) -> String {
    let chars: Vec<char> = candidate.chars().collect();
    let mut out = String::with_capacity(candidate.len() + 8);
    let mut in_string = false;
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            match c {
                '"' => {
                    in_string = false;
                    out.push(c);
                    last_significant = Some('"');
                }
                '\\' => {
                    i += repair_escape(&chars, i, &mut out);
                    continue;
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
        } else if c.is_ascii_alphabetic() {
            let end = chars[i..]
                .iter()
                .position(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
                .map_or(chars.len(), |p| i + p);
            let token: String = chars[i..end].iter().collect();
            let is_value = matches!(last_significant, Some(':') | Some('[') | Some(','));
            if is_value && BARE_LABELS.contains(&token.to_ascii_lowercase().as_str()) {
                out.push('"');
                out.push_str(&token);
                out.push('"');
            } else {
                out.push_str(&token);
            }
            last_significant = token.chars().last();
            i = end;
            continue;
        } else {
            out.push(c);
            if !c.is_whitespace() {
                last_significant = Some(c);
            }
        }
        i += 1;
    }
    out
}

/// Copies one escape sequence starting at `chars[at] == '\\'`, repairing it if
/// needed. Returns the number of input chars consumed.
fn repair_escape(chars: &[char], at: usize, out: &mut String) -> usize {
    let Some(&kind) = chars.get(at + 1) else {
        out.push_str("\\\\");
        return 1;
    };

    match kind {
        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
            out.push('\\');
            out.push(kind);
            2
        }
        'u' => match hex4(chars, at + 2) {
            Some(high @ 0xD800..=0xDBFF) => {
                let low = (chars.get(at + 6) == Some(&'\\') && chars.get(at + 7) == Some(&'u'))
                    .then(|| hex4(chars, at + 8))
                    .flatten()
                    .filter(|low| (0xDC00..=0xDFFF).contains(low));
                match low {
                    Some(low) => {
                        out.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
                        12
                    }
                    None => {
                        out.push('\u{FFFD}');
                        6
                    }
                }
            }
            Some(0xDC00..=0xDFFF) => {
                out.push('\u{FFFD}');
                6
            }
            Some(code) => {
                out.push_str(&format!("\\u{code:04x}"));
                6
            }
            None => {
                out.push_str("\\\\u");
                2
            }
        },
        _ => {
            out.push_str("\\\\");
            1
        }
    }
}

fn hex4(chars: &[char], from: usize) -> Option<u32> {
    let digits: String = chars.get(from..from + 4)?.iter().collect();
    u32::from_str_radix(&digits, 16).ok()
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn flag_field(object: &Map<String, Value>, key: &str) -> Option<bool> {
    match object.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn record_from_object(object: &Map<String, Value>) -> EnrichmentRecord {
    EnrichmentRecord {
        place: text_field(object, "place"),
        sentiment: text_field(object, "sentiment").and_then(|s| s.parse::<Sentiment>().ok()),
        reason: text_field(object, "reason"),
        emoji: text_field(object, "emoji").and_then(|e| normalize_emoji(&e)),
        is_sg_related: flag_field(object, "is_sg_related"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_balanced_object_skips_braces_in_strings() {
        let text = r#"note {"reason": "a } b", "place": "X"} trailing }"#;
        let (start, end) = find_balanced_object(text, 0).unwrap();
        assert_eq!(&text[start..end], r#"{"reason": "a } b", "place": "X"}"#);
    }

    #[test]
    fn test_unclosed_object_is_not_balanced() {
        assert_eq!(find_balanced_object("{\"a\": 1", 0), None);
    }

    #[test]
    fn test_repair_quotes_bare_labels_only_as_values() {
        let repaired = repair_json(r#"{"sentiment": Neutral, "reason": "neutral: fine", "x": true}"#);
        assert_eq!(
            repaired,
            r#"{"sentiment": "Neutral", "reason": "neutral: fine", "x": true}"#
        );
    }

    #[test]
    fn test_repair_replaces_lone_surrogates() {
        let repaired = repair_json(r#"{"a": "\ud83d", "b": "\ud83d\ude0a"}"#);
        assert_eq!(repaired, "{\"a\": \"\u{FFFD}\", \"b\": \"\\ud83d\\ude0a\"}");
    }
}
