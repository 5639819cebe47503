//! Overpass API adapter.
//!
//! See: <https://wiki.openstreetmap.org/wiki/Overpass_API>

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use livability_core::Coordinate;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::{TagQueryTransport, TaggedElement};
use crate::DEFAULT_USER_AGENT;
use crate::error::{ClientBuildError, TransportError, convert_reqwest_error};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`OverpassTransport`].
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Request timeout per attempt.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OverpassConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`TagQueryTransport`] posting Overpass QL to an interpreter endpoint.
#[derive(Debug, Clone)]
pub struct OverpassTransport {
    client: Client,
    timeout: Duration,
}

impl OverpassTransport {
    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::HttpClient`] when the HTTP client cannot
    /// be built.
    pub fn new(config: &OverpassConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl TagQueryTransport for OverpassTransport {
    async fn query(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<Vec<TaggedElement>, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(query.to_owned())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, endpoint, self.timeout))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, endpoint, self.timeout))?;
        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|err| convert_reqwest_error(&err, endpoint, self.timeout))?;
        Ok(body.elements.into_iter().map(TaggedElement::from).collect())
    }
}

/// Overpass `[out:json]` response.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl From<OverpassElement> for TaggedElement {
    fn from(element: OverpassElement) -> Self {
        let location = element
            .lat
            .zip(element.lon)
            .and_then(|(lat, lon)| Coordinate::try_from(Coord { x: lon, y: lat }).ok());
        Self {
            location,
            tags: element.tags,
        }
    }
}
