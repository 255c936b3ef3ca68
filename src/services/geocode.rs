use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

/// Delay between consecutive geocoding calls. The provider rate-limits
/// aggressively, so calls are paced sequentially rather than parallelized.
const PACING: Duration = Duration::from_millis(100);

/// Errors that can occur when geocoding
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

/// Forward-geocoding client (Mapbox-style API)
///
/// Resolves a free-text location to coordinates. Callers treat a `None`
/// result or any error as "no coordinates available"; the scorer then
/// falls back to ZIP-only or neutral location scoring.
pub struct GeocodeClient {
    endpoint: String,
    access_token: String,
    client: Client,
}

impl GeocodeClient {
    pub fn new(endpoint: String, access_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            access_token,
            client,
        }
    }

    /// Geocode one location string. Sleeps for the pacing interval before
    /// issuing the request, which keeps any sequence of calls inside the
    /// provider's rate limit.
    pub async fn forward(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        tokio::time::sleep(PACING).await;

        let url = format!(
            "{}/{}.json?access_token={}&limit=1",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(query),
            urlencoding::encode(&self.access_token)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(format!(
                "geocoding failed: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        // Feature centers come back as [lng, lat]
        let center = body
            .get("features")
            .and_then(|f| f.as_array())
            .and_then(|f| f.first())
            .and_then(|f| f.get("center"))
            .and_then(|c| c.as_array());

        let coords = match center {
            Some(pair) if pair.len() == 2 => {
                let lng = pair[0].as_f64();
                let lat = pair[1].as_f64();
                match (lat, lng) {
                    (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                        Some(Coordinates { lat, lng })
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        Ok(coords)
    }
}
