//! Deterministic separation of markers that share a coordinate.
//!
//! The Nth point at a rounded coordinate is pushed `OFFSET_RADIUS` degrees out
//! at an angle of `N * 45` degrees, so eight markers fit around a spot before
//! angles repeat.

use crate::types::GeoPoint;
use std::collections::HashMap;

/// About 15 metres at Singapore's latitude.
pub const OFFSET_RADIUS: f64 = 0.00015;
pub const ANGLE_STEP_DEGREES: u32 = 45;
/// Coordinates agreeing to this many decimals (~0.1 m) share a slot.
pub const KEY_DECIMALS: i32 = 6;

#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub radius: f64,
    pub angle_step_degrees: u32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            radius: OFFSET_RADIUS,
            angle_step_degrees: ANGLE_STEP_DEGREES,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> i64 {
    (value * 10f64.powi(decimals)).round() as i64
}

impl Placement {
    /// Offsets every point by its arrival order at its rounded coordinate.
    /// Output order matches input order.
    pub fn place<K: Clone>(&self, points: &[(K, GeoPoint)]) -> Vec<(K, GeoPoint)> {
        let mut seen: HashMap<(i64, i64), u64> = HashMap::new();
        points
            .iter()
            .map(|(key, point)| {
                let slot = (round_to(point.lat, KEY_DECIMALS), round_to(point.lon, KEY_DECIMALS));
                let count = seen.entry(slot).or_insert(0);
                let angle = ((*count * u64::from(self.angle_step_degrees)) % 360) as f64;
                *count += 1;
                let radians = angle.to_radians();
                let moved = GeoPoint::new(
                    point.lat + self.radius * radians.cos(),
                    point.lon + self.radius * radians.sin(),
                );
                (key.clone(), moved)
            })
            .collect()
    }
}

/// [`Placement::place`] with the default radius and angle step.
pub fn place<K: Clone>(points: &[(K, GeoPoint)]) -> Vec<(K, GeoPoint)> {
    Placement::default().place(points)
}
