//! # Geocoding Providers
//!
//! Place-name lookups against external gazetteers. Each provider reports the
//! first usable coordinate it finds, or `None` when it has nothing. Bounds
//! checking and fallback ordering live in [`crate::geocode`].

pub mod nominatim;
pub mod onemap;

use crate::errors::GeocodeError;
use crate::types::GeoPoint;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;
use std::time::Duration;

pub use nominatim::NominatimProvider;
pub use onemap::OneMapProvider;

/// Request timeout applied by the built-in providers.
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait GeocodeProvider: Send + Sync + Debug + DynClone {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Looks up `query` and returns the first candidate that has both
    /// coordinates.
    async fn lookup(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

dyn_clone::clone_trait_object!(GeocodeProvider);

/// Parses a coordinate pair that the service encodes as strings.
pub(crate) fn parse_coordinates(lat: &str, lon: &str) -> Result<GeoPoint, GeocodeError> {
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| GeocodeError::Decode(format!("invalid coordinate '{v}'")))
    };
    Ok(GeoPoint::new(parse(lat)?, parse(lon)?))
}
