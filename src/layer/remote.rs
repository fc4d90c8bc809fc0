//! Polygon oracle reached over HTTP.
//!
//! The remote service answers
//! `GET {endpoint}/{dataset}?lat={lat}&lng={lng}&radius={degrees}` with a JSON
//! array of `{"index": usize, "distance": f64}`, the same shape a local
//! oracle returns. Network calls go through the [`HttpClient`] trait so tests
//! can substitute a mock.

use super::backend::Intersection;
use crate::error::{GeocodeError, Result};
use std::sync::Arc;

/// Trait for synchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or a [`GeocodeError::Remote`].
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Real HTTP client implementation using reqwest.
#[cfg(feature = "remote")]
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl ReqwestClient {
    /// Creates a new ReqwestClient with the given request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(concat!("geocode/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| GeocodeError::Remote(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Remote(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| GeocodeError::Remote(format!("Failed to read response: {}", e)))
    }
}

/// Remote polygon oracle for one dataset.
#[derive(Clone)]
pub struct RemoteOracle {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    dataset: String,
}

impl RemoteOracle {
    pub fn new(
        client: Arc<dyn HttpClient>,
        endpoint: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            dataset: dataset.into(),
        }
    }

    pub fn url(&self, lng: f64, lat: f64, radius_degrees: f64) -> String {
        format!(
            "{}/{}?lat={}&lng={}&radius={}",
            self.endpoint.trim_end_matches('/'),
            self.dataset,
            lat,
            lng,
            radius_degrees
        )
    }

    pub fn intersect(&self, lng: f64, lat: f64, radius_degrees: f64) -> Result<Vec<Intersection>> {
        let url = self.url(lng, lat, radius_degrees);
        let body = self.client.get(&url)?;
        serde_json::from_slice(&body)
            .map_err(|e| GeocodeError::Remote(format!("Malformed response from {}: {}", url, e)))
    }
}

impl std::fmt::Debug for RemoteOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteOracle")
            .field("endpoint", &self.endpoint)
            .field("dataset", &self.dataset)
            .finish_non_exhaustive()
    }
}
