//! # Aggregation Tests

use moodmap::aggregate::{aggregate, aggregate_markers};
use moodmap::types::{ArticleIdentity, GeoPoint, PlacedMarker, PopupInfo, Sentiment};

#[test]
fn test_mode_and_counts() {
    let result = aggregate([
        ("CNA", Sentiment::Positive),
        ("ST", Sentiment::Positive),
        ("CNA", Sentiment::Negative),
    ]);

    assert_eq!(result.overall, Some(Sentiment::Positive));
    assert_eq!(result.totals.total(), 3);
    assert_eq!(result.per_outlet["CNA"].positive, 1);
    assert_eq!(result.per_outlet["CNA"].negative, 1);
    assert_eq!(result.per_outlet["ST"].positive, 1);
    assert_eq!(result.overall_emoji(), Some("😊"));
}

#[test]
fn test_ties_follow_enumeration_order() {
    let neg_neu = aggregate([("A", Sentiment::Neutral), ("A", Sentiment::Negative)]);
    assert_eq!(neg_neu.overall, Some(Sentiment::Negative));

    let all_three = aggregate([
        ("A", Sentiment::Neutral),
        ("A", Sentiment::Negative),
        ("A", Sentiment::Positive),
    ]);
    assert_eq!(all_three.overall, Some(Sentiment::Positive));
}

#[test]
fn test_empty_input() {
    let result = aggregate(std::iter::empty());

    assert_eq!(result.overall, None);
    assert!(result.per_outlet.is_empty());
    assert_eq!(result.overall_emoji(), None);
}

#[test]
fn test_aggregates_markers_by_popup_source() {
    let marker = |source: &str, sentiment| PlacedMarker {
        identity: ArticleIdentity::new(format!("{source}-{sentiment}")).unwrap(),
        place: "Somewhere".to_string(),
        position: GeoPoint::new(1.3, 103.8),
        sentiment,
        emoji: "😐".to_string(),
        popup: PopupInfo {
            source: source.to_string(),
            title: "t".to_string(),
            reason: None,
            url: None,
        },
    };

    let result = aggregate_markers(&[
        marker("Mothership", Sentiment::Neutral),
        marker("Mothership", Sentiment::Neutral),
        marker("CNA", Sentiment::Negative),
    ]);

    assert_eq!(result.overall, Some(Sentiment::Neutral));
    assert_eq!(result.per_outlet.len(), 2);
    assert_eq!(result.per_outlet["Mothership"].neutral, 2);
}
