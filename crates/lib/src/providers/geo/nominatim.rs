use super::{parse_coordinates, GeocodeProvider, GEOCODE_TIMEOUT};
use crate::errors::GeocodeError;
use crate::types::GeoPoint;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "moodmap/1.0";

#[derive(Deserialize, Debug)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// OpenStreetMap's search service. Requires an identifying User-Agent.
#[derive(Clone, Debug)]
pub struct NominatimProvider {
    client: Client,
    base_url: String,
    query_suffix: String,
}

impl NominatimProvider {
    /// `query_suffix` is appended to every query, e.g. `", Singapore"`.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        query_suffix: impl Into<String>,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            query_suffix: query_suffix.into(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn lookup(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let q = format!("{query}{}", self.query_suffix);
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", q.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "0"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;

        let Some(first) = results.into_iter().next() else {
            return Ok(None);
        };
        let point = parse_coordinates(&first.lat, &first.lon)?;
        debug!("Nominatim found {}, {} for '{}'", point.lat, point.lon, q);
        Ok(Some(point))
    }
}
