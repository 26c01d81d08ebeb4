//! # Emoji Normalization
//!
//! The analysis service is asked for "a single emoji" but frequently answers
//! with a word ("happy"), a phrase ("traffic light"), or a description that
//! embeds the glyph ("neutral face (😐)"). Everything funnels through
//! [`normalize_emoji`], which is total over non-empty input.

use crate::types::Sentiment;

/// Returned when nothing else matches.
pub const NEUTRAL_FACE: &str = "😐";

/// Keyword to glyph table. Order matters for the containment scan: the first
/// keyword found inside the value wins.
pub const EMOJI_KEYWORDS: &[(&str, &str)] = &[
    ("happy", "😊"),
    ("smile", "😊"),
    ("smiling", "😊"),
    ("positive", "😊"),
    ("joy", "😊"),
    ("good", "😊"),
    ("sad", "😞"),
    ("frown", "😞"),
    ("negative", "😞"),
    ("unhappy", "😞"),
    ("cry", "😢"),
    ("angry", "😠"),
    ("neutral", "😐"),
    ("meh", "😐"),
    ("ok", "😐"),
    ("indifferent", "😐"),
    ("traffic light", "🚦"),
    ("warning", "⚠️"),
    ("alert", "⚠️"),
    ("danger", "🚨"),
    ("fire", "🔥"),
    ("money", "💰"),
    ("love", "❤️"),
    ("hospital", "🏥"),
    ("police", "👮"),
    ("school", "🏫"),
    ("rain", "🌧️"),
    ("sun", "☀️"),
    ("cloud", "☁️"),
    ("storm", "🌩️"),
    ("flood", "🌊"),
    ("accident", "💥"),
    ("virus", "🦠"),
    ("health", "🩺"),
    ("crime", "🚔"),
    ("protest", "✊"),
    ("celebration", "🎉"),
    ("party", "🥳"),
    ("confused", "😕"),
    ("shocked", "😲"),
    ("surprised", "😮"),
    ("disappointed", "😞"),
    ("success", "🏆"),
    ("failure", "❌"),
    ("question", "❓"),
    ("exclamation", "❗"),
    ("star", "⭐"),
    ("earth", "🌏"),
    ("singapore", "🦁"),
    ("lion", "🦁"),
    ("government", "🏛️"),
    ("airport", "🛫"),
    ("train", "🚆"),
    ("bus", "🚌"),
    ("car", "🚗"),
    ("plane", "✈️"),
    ("food", "🍲"),
    ("restaurant", "🍽️"),
    ("shopping", "🛍️"),
    ("market", "🛒"),
    ("sports", "🏟️"),
    ("music", "🎵"),
    ("art", "🎨"),
    ("technology", "💻"),
    ("science", "🔬"),
    ("education", "🎓"),
    ("environment", "🌳"),
    ("nature", "🌿"),
    ("energy", "⚡"),
    ("water", "💧"),
    ("fireworks", "🎆"),
    ("award", "🏅"),
    ("medal", "🏅"),
    ("trophy", "🏆"),
    ("winner", "🏆"),
    ("loser", "😞"),
];

const PICTOGRAPHIC_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F1E0, 0x1F1FF), // regional indicators
    (0x2700, 0x27BF),   // dingbats
    (0x1F900, 0x1F9FF), // supplemental symbols & pictographs
    (0x2600, 0x26FF),   // misc symbols
    (0x1FA70, 0x1FAFF), // symbols & pictographs extended-A
];

const ZWJ: char = '\u{200D}';

pub fn is_pictographic(c: char) -> bool {
    let cp = c as u32;
    PICTOGRAPHIC_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Characters that decorate the glyph before them without starting a new one.
fn is_modifier(c: char) -> bool {
    matches!(c, '\u{FE0E}' | '\u{FE0F}' | '\u{20E3}') || ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

/// True when `value` is one pictographic glyph: a pictograph with optional
/// modifiers and ZWJ-joined pictographs, or a pair of regional indicators.
pub fn is_single_glyph(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if is_regional_indicator(first) {
        return matches!(chars.next(), Some(c) if is_regional_indicator(c)) && chars.next().is_none();
    }
    if !is_pictographic(first) || is_modifier(first) {
        return false;
    }

    let mut awaiting_joined = false;
    for c in chars {
        if awaiting_joined {
            if !is_pictographic(c) || is_regional_indicator(c) || is_modifier(c) {
                return false;
            }
            awaiting_joined = false;
        } else if c == ZWJ {
            awaiting_joined = true;
        } else if !is_modifier(c) {
            return false;
        }
    }
    !awaiting_joined
}

/// Pulls the first complete glyph out of free text.
fn first_embedded_glyph(value: &str) -> Option<String> {
    let chars: Vec<char> = value.chars().collect();
    let start = chars
        .iter()
        .position(|&c| is_pictographic(c) && !is_modifier(c))?;

    let mut glyph = String::new();
    glyph.push(chars[start]);
    let mut i = start + 1;

    if is_regional_indicator(chars[start]) {
        if let Some(&next) = chars.get(i).filter(|c| is_regional_indicator(**c)) {
            glyph.push(next);
        }
        return Some(glyph);
    }

    while i < chars.len() {
        let c = chars[i];
        if is_modifier(c) {
            glyph.push(c);
            i += 1;
        } else if c == ZWJ
            && chars
                .get(i + 1)
                .is_some_and(|&n| is_pictographic(n) && !is_regional_indicator(n))
        {
            glyph.push(c);
            glyph.push(chars[i + 1]);
            i += 2;
        } else {
            break;
        }
    }
    Some(glyph)
}

/// Maps whatever the service put in the `emoji` field to a single glyph.
///
/// Precedence: already a single glyph, exact keyword, keyword containment,
/// embedded glyph, then [`NEUTRAL_FACE`]. Blank input yields `None`.
pub fn normalize_emoji(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_single_glyph(trimmed) {
        return Some(trimmed.to_string());
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, glyph)) = EMOJI_KEYWORDS.iter().find(|(key, _)| *key == lowered) {
        return Some(glyph.to_string());
    }
    if let Some((_, glyph)) = EMOJI_KEYWORDS
        .iter()
        .find(|(key, _)| lowered.contains(key))
    {
        return Some(glyph.to_string());
    }
    if let Some(glyph) = first_embedded_glyph(trimmed) {
        return Some(glyph);
    }
    Some(NEUTRAL_FACE.to_string())
}

/// The glyph used for the overall sentiment summary.
pub fn sentiment_emoji(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "😊",
        Sentiment::Negative => "😞",
        Sentiment::Neutral => NEUTRAL_FACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_glyph_detection() {
        assert!(is_single_glyph("😊"));
        assert!(is_single_glyph("⚠️"));
        assert!(is_single_glyph("👮🏽"));
        assert!(is_single_glyph("🇸🇬"));
        assert!(!is_single_glyph("😊😊"));
        assert!(!is_single_glyph("happy"));
        assert!(!is_single_glyph("🇸"));
    }

    #[test]
    fn test_every_keyword_maps_to_its_own_glyph() {
        for (key, glyph) in EMOJI_KEYWORDS {
            assert_eq!(normalize_emoji(key).as_deref(), Some(*glyph), "keyword '{key}'");
        }
    }

    #[test]
    fn test_embedded_glyph_keeps_modifiers() {
        assert_eq!(first_embedded_glyph("warning sign ⚠️ here"), Some("⚠️".to_string()));
        assert_eq!(first_embedded_glyph("no glyph"), None);
    }
}
