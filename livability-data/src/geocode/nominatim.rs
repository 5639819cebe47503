//! Nominatim search adapter.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{GeocodeCandidate, GeocodeTransport};
use crate::error::{ClientBuildError, TransportError, convert_reqwest_error, parse_url};
use crate::DEFAULT_USER_AGENT;

/// Public Nominatim search endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`NominatimTransport`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Search endpoint URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent; Nominatim's usage policy requires an identifying one.
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration for the given search endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

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

/// [`GeocodeTransport`] backed by a Nominatim `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimTransport {
    client: Client,
    search_url: Url,
    timeout: Duration,
}

impl NominatimTransport {
    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &NominatimConfig) -> Result<Self, ClientBuildError> {
        let search_url = parse_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        Ok(Self {
            client,
            search_url,
            timeout: config.timeout,
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("limit", "1")
            .append_pair("addressdetails", "1");
        url
    }
}

#[async_trait]
impl GeocodeTransport for NominatimTransport {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, TransportError> {
        let url = self.search_url(query);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?;
        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?;
        Ok(places.into_iter().map(GeocodeCandidate::from).collect())
    }
}

/// One entry of a Nominatim `format=json` search response.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: BTreeMap<String, String>,
}

impl From<NominatimPlace> for GeocodeCandidate {
    fn from(place: NominatimPlace) -> Self {
        Self {
            lat: place.lat,
            lon: place.lon,
            display_name: place.display_name,
            address: place.address,
        }
    }
}
