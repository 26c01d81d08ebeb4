//! # Geocode Resolver
//!
//! Resolves a place name to a point inside the configured bounding box by
//! asking each provider in order. A provider failure is logged and the next
//! provider is tried. The resolver never returns a point outside the box.

use crate::providers::geo::GeocodeProvider;
use crate::types::{BoundingBox, GeoPoint};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_QUALIFIER: &str = "Singapore";

#[derive(Debug)]
pub struct GeocodeResolver {
    providers: Vec<Box<dyn GeocodeProvider>>,
    bounds: BoundingBox,
    qualifier: String,
    memo: Mutex<HashMap<String, Option<GeoPoint>>>,
}

impl GeocodeResolver {
    pub fn new(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self {
            providers,
            bounds: BoundingBox::default(),
            qualifier: DEFAULT_QUALIFIER.to_string(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// The word appended to a place name when the first lookup lands outside
    /// the box.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Resolves `place` to an in-bounds point, or `None`.
    ///
    /// Results, including misses, are remembered for the life of the resolver.
    pub async fn resolve(&self, place: &str) -> Option<GeoPoint> {
        let place = place.trim();
        if place.is_empty() {
            return None;
        }
        if let Some(hit) = self.memoized(place) {
            return hit;
        }

        let resolved = self.resolve_uncached(place).await;
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(place.to_string(), resolved);
        }
        resolved
    }

    fn memoized(&self, place: &str) -> Option<Option<GeoPoint>> {
        self.memo.lock().ok()?.get(place).copied()
    }

    async fn resolve_uncached(&self, place: &str) -> Option<GeoPoint> {
        let point = self.first_candidate(place).await?;
        if self.bounds.contains(point) {
            return Some(point);
        }

        info!(
            "'{place}' resolved outside bounds ({}, {}), retrying with qualifier",
            point.lat, point.lon
        );
        let qualified = format!("{place} {}", self.qualifier);
        match self.first_candidate(&qualified).await {
            Some(point) if self.bounds.contains(point) => Some(point),
            Some(point) => {
                warn!(
                    "'{qualified}' still outside bounds ({}, {}), dropping",
                    point.lat, point.lon
                );
                None
            }
            None => None,
        }
    }

    /// The first provider with any candidate wins.
    async fn first_candidate(&self, query: &str) -> Option<GeoPoint> {
        for provider in &self.providers {
            match provider.lookup(query).await {
                Ok(Some(point)) => return Some(point),
                Ok(None) => debug!("{} has no result for '{query}'", provider.name()),
                Err(e) => warn!("{} geocoding error for '{query}': {e}", provider.name()),
            }
        }
        info!("Could not geocode place: {query}");
        None
    }
}
