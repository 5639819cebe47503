//! Foursquare Places search adapter.
//!
//! See: <https://docs.foursquare.com/fsq-developers-places/reference/place-search>

use std::time::Duration;

use async_trait::async_trait;
use livability_core::{Coordinate, SearchRadius};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use url::Url;

use super::{PlaceRecord, PlaceSearchTransport};
use crate::DEFAULT_USER_AGENT;
use crate::error::{ClientBuildError, TransportError, convert_reqwest_error, parse_url};

/// Foursquare Places API base URL.
pub const DEFAULT_FOURSQUARE_URL: &str = "https://places-api.foursquare.com";

/// API version sent in the `X-Places-Api-Version` header.
pub const DEFAULT_FOURSQUARE_API_VERSION: &str = "2025-06-17";

const API_VERSION_HEADER: &str = "X-Places-Api-Version";
const SERVICE_NAME: &str = "foursquare";
const DEFAULT_RESULT_LIMIT: u32 = 20;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`FoursquareTransport`].
#[derive(Clone)]
pub struct FoursquareConfig {
    /// API base URL.
    pub base_url: String,
    /// Service API key. Searches fail with
    /// [`TransportError::MissingCredentials`] when absent.
    pub api_key: Option<String>,
    /// Value of the API version header.
    pub api_version: String,
    /// Maximum places requested per search.
    pub result_limit: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl std::fmt::Debug for FoursquareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoursquareConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("result_limit", &self.result_limit)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for FoursquareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FOURSQUARE_URL.to_owned(),
            api_key: None,
            api_version: DEFAULT_FOURSQUARE_API_VERSION.to_owned(),
            result_limit: DEFAULT_RESULT_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl FoursquareConfig {
    /// Create a configuration using `api_key`, if any.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            ..Default::default()
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the maximum places per search.
    #[must_use]
    pub const fn with_result_limit(mut self, result_limit: u32) -> Self {
        self.result_limit = result_limit;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`PlaceSearchTransport`] backed by the Foursquare `/places/search` API.
#[derive(Clone)]
pub struct FoursquareTransport {
    client: Client,
    search_url: Url,
    api_key: Option<String>,
    api_version: String,
    result_limit: u32,
    timeout: Duration,
}

impl std::fmt::Debug for FoursquareTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoursquareTransport")
            .field("search_url", &self.search_url.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl FoursquareTransport {
    /// Build the transport.
    ///
    /// A missing API key is not an error here; searches report it instead
    /// so the provider can skip gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &FoursquareConfig) -> Result<Self, ClientBuildError> {
        let search_url = parse_url(&format!(
            "{}/places/search",
            config.base_url.trim_end_matches('/')
        ))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        Ok(Self {
            client,
            search_url,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            result_limit: config.result_limit,
            timeout: config.timeout,
        })
    }

    fn search_url(&self, centre: Coordinate, radius: SearchRadius) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("ll", &format!("{},{}", centre.lat(), centre.lon()))
            .append_pair("radius", &radius.to_string())
            .append_pair("limit", &self.result_limit.to_string());
        url
    }
}

#[async_trait]
impl PlaceSearchTransport for FoursquareTransport {
    fn endpoint(&self) -> &str {
        self.search_url.as_str()
    }

    async fn search(
        &self,
        centre: Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<PlaceRecord>, TransportError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TransportError::MissingCredentials {
                service: SERVICE_NAME,
            });
        };
        let url = self.search_url(centre, radius);
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(API_VERSION_HEADER, self.api_version.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| convert_reqwest_error(&err, url.as_str(), self.timeout))?;
        Ok(body.results.into_iter().map(PlaceRecord::from).collect())
    }
}

/// Foursquare place search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<FoursquarePlace>,
}

#[derive(Debug, Deserialize)]
struct FoursquarePlace {
    name: Option<String>,
    distance: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    categories: Vec<FoursquareCategory>,
}

#[derive(Debug, Deserialize)]
struct FoursquareCategory {
    #[serde(alias = "id")]
    fsq_category_id: Option<serde_json::Value>,
    name: Option<String>,
}

impl From<FoursquarePlace> for PlaceRecord {
    fn from(place: FoursquarePlace) -> Self {
        let location = place
            .latitude
            .zip(place.longitude)
            .and_then(|(lat, lon)| Coordinate::new(lat, lon).ok());
        let primary = place.categories.into_iter().next();
        let (category_id, category_name) = primary.map_or((None, None), |category| {
            (category.fsq_category_id.and_then(id_text), category.name)
        });
        Self {
            name: place.name,
            distance_meters: place.distance,
            location,
            category_id,
            category_name,
        }
    }
}

/// Category identifiers arrive as strings or, in older API versions, numbers.
fn id_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
