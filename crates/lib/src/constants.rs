//! # Shared Constants
//!
//! Default file locations and map anchors shared by the library and the CLI.

use crate::types::GeoPoint;

/// The default location of the durable enrichment cache.
pub const DEFAULT_CACHE_FILE: &str = "processed_articles.json";

/// The default location of the renderer hand-off document.
pub const DEFAULT_OUTPUT_FILE: &str = "moodmap.json";

/// JSON lines describing records that came back without a needed field.
pub const DEFAULT_MISSING_FIELDS_LOG: &str = "missing_fields.log";

/// Where the overall-sentiment marker sits: offshore east of the city, clear
/// of article markers.
pub const OVERVIEW_POSITION: GeoPoint = GeoPoint {
    lat: 1.285,
    lon: 103.905,
};

/// Articles older than this many days are dropped before enrichment.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 3;
