use crate::domain::LatLng;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Port for the external free-text → coordinates lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a query to coordinates, or `None` when the service has no
    /// result. Transport failures are errors; "no result" is not.
    async fn lookup(&self, query: &str) -> Result<Option<LatLng>>;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Nominatim-style HTTP geocoder. The client follows redirects itself so
/// shortened map links extracted from descriptions resolve without help.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("deckhand/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<Option<LatLng>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "geocoder returned non-success");
            return Ok(None);
        }

        let hits: Vec<SearchHit> = resp.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            debug!("geocoder had no result for query");
            return Ok(None);
        };

        match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => Ok(Some(LatLng { lat, lng })),
            _ => {
                warn!("geocoder returned unparseable coordinates");
                Ok(None)
            }
        }
    }
}
