//! HTTP client for the Open-Elevation lookup API.
//!
//! One GET per recorded fix. Failures are returned as errors and absorbed by
//! [`ElevationResolver`](crate::elevation::ElevationResolver); nothing here
//! retries.

use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::Client;

use crate::config::ElevationConfig;
use crate::elevation::{parse_lookup_response, ElevationSource};
use crate::error::{Result, RideError};
use crate::Coordinate;

/// Elevation source backed by an Open-Elevation compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenElevationClient {
    client: Client,
    endpoint: String,
}

impl OpenElevationClient {
    /// Create a client with the configured endpoint and request timeout.
    pub fn new(config: &ElevationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RideError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Full lookup URL for a coordinate.
    pub fn lookup_url(&self, coord: Coordinate) -> String {
        format!(
            "{}?locations={},{}",
            self.endpoint, coord.latitude, coord.longitude
        )
    }

    async fn fetch(&self, coord: Coordinate) -> Result<f64> {
        let url = self.lookup_url(coord);
        let start = Instant::now();

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("[OpenElevation] HTTP {} for {}", status, url);
            return Err(RideError::Http {
                message: format!("HTTP {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        let body = resp.text().await?;
        let elevation = parse_lookup_response(&body)?;
        debug!(
            "[OpenElevation] {:.1} m at {},{} ({} ms)",
            elevation,
            coord.latitude,
            coord.longitude,
            start.elapsed().as_millis()
        );
        Ok(elevation)
    }
}

impl ElevationSource for OpenElevationClient {
    async fn lookup(&self, coord: Coordinate) -> Result<f64> {
        self.fetch(coord).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url() {
        let client = OpenElevationClient::new(&ElevationConfig::default()).unwrap();
        assert_eq!(
            client.lookup_url(Coordinate::new(22.432, 87.322)),
            "https://api.open-elevation.com/api/v1/lookup?locations=22.432,87.322"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let config = ElevationConfig {
            endpoint: "http://127.0.0.1:9/lookup".to_string(),
            timeout_ms: 500,
        };
        let client = OpenElevationClient::new(&config).unwrap();
        let result = client.lookup(Coordinate::new(22.0, 87.0)).await;
        assert!(matches!(result, Err(RideError::Http { .. })));
    }
}
