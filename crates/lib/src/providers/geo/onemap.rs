use super::{parse_coordinates, GeocodeProvider, GEOCODE_TIMEOUT};
use crate::errors::GeocodeError;
use crate::types::GeoPoint;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const ONEMAP_BASE_URL: &str = "https://www.onemap.gov.sg";

#[derive(Deserialize, Debug)]
struct OneMapResponse {
    #[serde(default)]
    results: Vec<OneMapResult>,
}

#[derive(Deserialize, Debug)]
struct OneMapResult {
    #[serde(rename = "LATITUDE", default)]
    latitude: Option<String>,
    #[serde(rename = "LONGITUDE", default)]
    longitude: Option<String>,
}

/// Singapore's national gazetteer. Good at buildings and postal addresses.
#[derive(Clone, Debug)]
pub struct OneMapProvider {
    client: Client,
    base_url: String,
}

impl OneMapProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(GEOCODE_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for OneMapProvider {
    fn name(&self) -> &str {
        "onemap"
    }

    async fn lookup(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = format!("{}/api/common/elastic/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("searchVal", query),
                ("returnGeom", "Y"),
                ("getAddrDetails", "Y"),
                ("pageNum", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: OneMapResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;

        // OneMap returns empty strings for results without geometry.
        let candidate = body.results.into_iter().find_map(|r| {
            match (r.latitude, r.longitude) {
                (Some(lat), Some(lon)) if !lat.trim().is_empty() && !lon.trim().is_empty() => {
                    Some((lat, lon))
                }
                _ => None,
            }
        });

        match candidate {
            Some((lat, lon)) => {
                let point = parse_coordinates(&lat, &lon)?;
                debug!("OneMap found {}, {} for '{}'", point.lat, point.lon, query);
                Ok(Some(point))
            }
            None => Ok(None),
        }
    }
}
