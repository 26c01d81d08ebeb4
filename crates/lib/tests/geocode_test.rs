//! # Geocode Resolver Tests
//!
//! Provider fallback, the bounding-box constraint and the qualifier retry.

use moodmap::geocode::GeocodeResolver;
use moodmap::types::{BoundingBox, GeoPoint};
use moodmap_test_utils::{setup_tracing, MockGeocodeProvider, MockLookup};

#[tokio::test]
async fn test_first_provider_with_a_candidate_wins() {
    setup_tracing();
    let onemap = MockGeocodeProvider::new("onemap").found("Changi Airport", 1.3644, 103.9915);
    let nominatim = MockGeocodeProvider::new("nominatim").found("Changi Airport", 1.35, 103.98);
    let resolver = GeocodeResolver::new(vec![Box::new(onemap), Box::new(nominatim.clone())]);

    let point = resolver.resolve("Changi Airport").await;

    assert_eq!(point, Some(GeoPoint::new(1.3644, 103.9915)));
    assert!(nominatim.queries().is_empty());
}

#[tokio::test]
async fn test_failure_falls_through_to_next_provider() {
    let onemap = MockGeocodeProvider::new("onemap").answer("Esplanade", MockLookup::Failed(500));
    let nominatim = MockGeocodeProvider::new("nominatim").found("Esplanade", 1.2897, 103.8555);
    let resolver = GeocodeResolver::new(vec![Box::new(onemap), Box::new(nominatim)]);

    assert_eq!(
        resolver.resolve("Esplanade").await,
        Some(GeoPoint::new(1.2897, 103.8555))
    );
}

#[tokio::test]
async fn test_out_of_bounds_retries_with_qualifier() {
    // "Orchard" alone lands in the United States; qualified it lands locally.
    let provider = MockGeocodeProvider::new("nominatim")
        .found("Orchard", 40.7, -74.0)
        .found("Orchard Singapore", 1.3048, 103.8318);
    let resolver = GeocodeResolver::new(vec![Box::new(provider.clone())]);

    let point = resolver.resolve("Orchard").await;

    assert_eq!(point, Some(GeoPoint::new(1.3048, 103.8318)));
    assert_eq!(provider.queries(), vec!["Orchard", "Orchard Singapore"]);
}

#[tokio::test]
async fn test_never_returns_out_of_bounds_point() {
    let provider = MockGeocodeProvider::new("nominatim")
        .found("Johor", 1.49, 103.74)
        .found("Johor Singapore", 1.50, 103.75);
    let resolver = GeocodeResolver::new(vec![Box::new(provider)]);

    assert_eq!(resolver.resolve("Johor").await, None);
}

#[tokio::test]
async fn test_nothing_found_does_not_retry() {
    let provider = MockGeocodeProvider::new("onemap").answer("Atlantis", MockLookup::Empty);
    let resolver = GeocodeResolver::new(vec![Box::new(provider.clone())]);

    assert_eq!(resolver.resolve("Atlantis").await, None);
    assert_eq!(provider.queries(), vec!["Atlantis"]);
}

#[tokio::test]
async fn test_results_are_memoized() {
    let provider = MockGeocodeProvider::new("onemap").found("Bishan", 1.3508, 103.8485);
    let resolver = GeocodeResolver::new(vec![Box::new(provider.clone())]);

    let first = resolver.resolve("Bishan").await;
    let second = resolver.resolve(" Bishan ").await;
    let missing_first = resolver.resolve("Nowhere").await;
    let missing_second = resolver.resolve("Nowhere").await;

    assert_eq!(first, second);
    assert_eq!(missing_first, None);
    assert_eq!(missing_second, None);
    assert_eq!(provider.queries(), vec!["Bishan", "Nowhere"]);
}

#[tokio::test]
async fn test_custom_bounds_and_qualifier() {
    let bounds = BoundingBox {
        min_lat: 3.0,
        max_lat: 3.3,
        min_lon: 101.5,
        max_lon: 101.8,
    };
    let provider = MockGeocodeProvider::new("nominatim")
        .found("KLCC", 1.3, 103.8)
        .found("KLCC Kuala Lumpur", 3.1579, 101.7123);
    let resolver = GeocodeResolver::new(vec![Box::new(provider)])
        .with_bounds(bounds)
        .with_qualifier("Kuala Lumpur");

    assert_eq!(
        resolver.resolve("KLCC").await,
        Some(GeoPoint::new(3.1579, 101.7123))
    );
}

#[test]
fn test_bounding_box_is_inclusive() {
    let sg = BoundingBox::SINGAPORE;
    assert!(sg.contains(GeoPoint::new(1.130, 103.6)));
    assert!(sg.contains(GeoPoint::new(1.480, 104.1)));
    assert!(!sg.contains(GeoPoint::new(1.481, 103.8)));
    assert!(!sg.contains(GeoPoint::new(1.3, 104.2)));
}
