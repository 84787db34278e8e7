//! Elevation lookup for recorded coordinates.
//!
//! Lookups are best effort: the recorder asks [`ElevationResolver::resolve`]
//! for every fix and gets 0 m back whenever the underlying source fails.

use std::future::Future;

use serde::Deserialize;

use crate::error::{OptionExt, Result, ResultExt};
use crate::Coordinate;

/// Elevation reported when a lookup fails.
pub const FALLBACK_ELEVATION_M: f64 = 0.0;

/// A fallible source of terrain elevation.
pub trait ElevationSource {
    /// Look up the elevation (meters) at `coord`. One outbound request per call.
    fn lookup(&self, coord: Coordinate) -> impl Future<Output = Result<f64>> + Send;
}

/// Source that answers every lookup with the same elevation.
///
/// Useful when the elevation service is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedElevation(pub f64);

impl ElevationSource for FixedElevation {
    async fn lookup(&self, _coord: Coordinate) -> Result<f64> {
        Ok(self.0)
    }
}

/// Wraps an [`ElevationSource`] so lookups never fail.
#[derive(Debug, Clone)]
pub struct ElevationResolver<E> {
    source: E,
}

impl<E: ElevationSource> ElevationResolver<E> {
    pub fn new(source: E) -> Self {
        Self { source }
    }

    /// Resolve elevation at `coord`, or [`FALLBACK_ELEVATION_M`] on any failure.
    pub async fn resolve(&self, coord: Coordinate) -> f64 {
        self.source
            .lookup(coord)
            .await
            .or_fallback(FALLBACK_ELEVATION_M, "ElevationResolver")
    }

    pub fn source(&self) -> &E {
        &self.source
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

/// Parse an Open-Elevation style response: `{"results":[{"elevation":12.0}]}`.
///
/// A null elevation counts as 0 m; a missing `results` entry is an error.
pub fn parse_lookup_response(body: &str) -> Result<f64> {
    let response: LookupResponse = serde_json::from_str(body)?;
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or_parse("elevation lookup", "empty results")?;
    Ok(first.elevation.unwrap_or(FALLBACK_ELEVATION_M))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RideError;

    struct FailingSource;

    impl ElevationSource for FailingSource {
        async fn lookup(&self, _coord: Coordinate) -> Result<f64> {
            Err(RideError::Http {
                message: "connection refused".to_string(),
                status_code: None,
            })
        }
    }

    #[test]
    fn test_parse_lookup_response() {
        let body = r#"{"results":[{"latitude":22.0,"longitude":87.0,"elevation":43.5}]}"#;
        assert_eq!(parse_lookup_response(body).unwrap(), 43.5);
    }

    #[test]
    fn test_parse_null_elevation() {
        let body = r#"{"results":[{"elevation":null}]}"#;
        assert_eq!(parse_lookup_response(body).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_malformed_responses() {
        assert!(parse_lookup_response(r#"{"results":[]}"#).is_err());
        assert!(parse_lookup_response(r#"{"error":"rate limited"}"#).is_err());
        assert!(parse_lookup_response("<html>502</html>").is_err());
    }

    #[tokio::test]
    async fn test_resolver_absorbs_failures() {
        let resolver = ElevationResolver::new(FailingSource);
        let elevation = resolver.resolve(Coordinate::new(22.0, 87.0)).await;
        assert_eq!(elevation, FALLBACK_ELEVATION_M);
    }

    #[tokio::test]
    async fn test_resolver_passes_values_through() {
        let resolver = ElevationResolver::new(FixedElevation(120.0));
        assert_eq!(resolver.resolve(Coordinate::new(0.0, 0.0)).await, 120.0);
    }
}
