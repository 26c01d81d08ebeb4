//! External services: AI analysis backends and geocoding backends.

pub mod ai;
pub mod factory;
pub mod geo;
