//! POI provider B: open-data tag query with endpoint failover.
//!
//! [`TagQueryProvider`] sends one query selecting transit stops and schools
//! around a coordinate. Interchangeable endpoints are tried in order; each
//! gets a [`RetryPolicy`] budget spent only on transient failures. A
//! permanent failure or an exhausted budget moves on to the next endpoint.
//! When every endpoint fails the provider falls back to an empty fragment.

mod overpass;
mod retry;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use livability_core::{
    Coordinate, PoiCategory, PoiItem, PoiSource, SearchRadius, TagQueryFragment,
    rounded_distance_meters,
};
use log::{debug, info, warn};

use crate::cache::cache_key;
use crate::{FailureClass, ProviderOutcome, TransportError, TtlCache, classify_failure};

pub use overpass::{OverpassConfig, OverpassTransport};
pub use retry::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

/// Public Overpass API interpreters, tried in this order.
pub const DEFAULT_OVERPASS_ENDPOINTS: [&str; 3] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
];

/// Nearest items kept per category.
pub const DEFAULT_TAG_LIMIT: usize = 10;

/// Upper bound on one attempt against one endpoint.
pub const DEFAULT_TAG_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side query budget, kept below the client timeout.
const SERVER_TIMEOUT_SECS: u32 = 8;

/// Tag pairs marking a public transport stop.
pub const TRANSPORT_TAGS: [(&str, &str); 4] = [
    ("public_transport", "stop_position"),
    ("highway", "bus_stop"),
    ("railway", "tram_stop"),
    ("railway", "station"),
];

/// `amenity` values marking an educational facility.
pub const SCHOOL_AMENITIES: [&str; 3] = ["school", "kindergarten", "university"];

/// One element returned by a tag query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedElement {
    /// Element position; elements without one are ignored.
    pub location: Option<Coordinate>,
    /// Raw key/value tags.
    pub tags: HashMap<String, String>,
}

/// Tag query backend addressed per endpoint.
#[async_trait]
pub trait TagQueryTransport: Send + Sync {
    /// Run `query` against `endpoint`.
    async fn query(&self, endpoint: &str, query: &str)
    -> Result<Vec<TaggedElement>, TransportError>;
}

/// Build the query selecting transport stops and schools around `centre`.
///
/// # Examples
///
/// ```
/// use livability_core::{Coordinate, SearchRadius};
/// use livability_data::tags::build_query;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let query = build_query(Coordinate::new(50.088, 14.4208)?, SearchRadius::new(500)?);
/// assert!(query.contains(r#"node["highway"="bus_stop"](around:500,50.088,14.4208);"#));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn build_query(centre: Coordinate, radius: SearchRadius) -> String {
    let around = format!("(around:{radius},{},{})", centre.lat(), centre.lon());
    let transport = TRANSPORT_TAGS
        .iter()
        .map(|(key, value)| format!(r#"node["{key}"="{value}"]{around};"#));
    let schools = SCHOOL_AMENITIES
        .iter()
        .map(|value| format!(r#"node["amenity"="{value}"]{around};"#));
    let selectors: String = transport.chain(schools).collect();
    format!("[out:json][timeout:{SERVER_TIMEOUT_SECS}];({selectors});out body;")
}

/// Assign a tagged element to transport or schools.
///
/// Transport is matched on key and value; schools on the `amenity` value.
#[must_use]
pub fn classify_element<S: std::hash::BuildHasher>(
    tags: &HashMap<String, String, S>,
) -> Option<PoiCategory> {
    let has = |key: &str, value: &str| tags.get(key).is_some_and(|found| found == value);
    if TRANSPORT_TAGS.iter().any(|(key, value)| has(key, value)) {
        return Some(PoiCategory::Transport);
    }
    if SCHOOL_AMENITIES.iter().any(|value| has("amenity", value)) {
        return Some(PoiCategory::Schools);
    }
    None
}

/// Cached tag query with multi-endpoint failover.
#[derive(Debug)]
pub struct TagQueryProvider<T> {
    transport: T,
    endpoints: Vec<String>,
    retry: RetryPolicy,
    cache: TtlCache<TagQueryFragment>,
    limit: usize,
    timeout: Duration,
}

impl<T: TagQueryTransport> TagQueryProvider<T> {
    /// Wrap `transport` with the public endpoints and default policy.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            endpoints: DEFAULT_OVERPASS_ENDPOINTS
                .iter()
                .map(|&endpoint| endpoint.to_owned())
                .collect(),
            retry: RetryPolicy::default(),
            cache: TtlCache::new(),
            limit: DEFAULT_TAG_LIMIT,
            timeout: DEFAULT_TAG_TIMEOUT,
        }
    }

    /// Replace the endpoint list; order is failover order.
    #[must_use]
    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-endpoint retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Keep `limit` items per category.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Bound each attempt by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the cache with one using `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::with_ttl(ttl);
        self
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Configured endpoints in failover order.
    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Fetch transport stops and schools around `centre`.
    pub async fn fetch(
        &self,
        centre: Coordinate,
        radius: SearchRadius,
    ) -> ProviderOutcome<TagQueryFragment> {
        let key = cache_key(PoiSource::Overpass.cache_namespace(), centre, radius);
        if let Some(fragment) = self.cache.get(&key) {
            debug!("tag query cache hit {key}");
            return ProviderOutcome::Cached(fragment);
        }
        debug!("tag query cache miss {key}");

        let query = build_query(centre, radius);
        let elements = match self.query_with_failover(&query).await {
            Ok(elements) => elements,
            Err(reason) => {
                warn!(
                    "tag query around {centre} failed on every endpoint, using empty result: {reason}"
                );
                return ProviderOutcome::Fallback { reason };
            }
        };

        let fetched = elements.len();
        let items: Vec<PoiItem> = elements
            .into_iter()
            .filter_map(|element| to_item(centre, element))
            .collect();
        info!(
            "tag query around {centre} fetched {fetched} elements, classified {}",
            items.len()
        );

        let fragment = TagQueryFragment::from_items(items, self.limit);
        self.cache.put(key.as_str(), fragment.clone());
        debug!("tag query cache set {key}");
        ProviderOutcome::Fresh(fragment)
    }

    /// Outer loop over endpoints, inner loop over retries.
    async fn query_with_failover(&self, query: &str) -> Result<Vec<TaggedElement>, TransportError> {
        let total = self.endpoints.len();
        let mut last_error = None;
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            info!("tag query trying endpoint {}/{total}: {endpoint}", index + 1);
            match self.query_endpoint(endpoint, query).await {
                Ok(elements) => return Ok(elements),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or(TransportError::NoEndpoints))
    }

    async fn query_endpoint(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<Vec<TaggedElement>, TransportError> {
        let attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            let err = match self.attempt(endpoint, query).await {
                Ok(elements) => {
                    info!("tag query succeeded on {endpoint}, attempt {attempt}");
                    return Ok(elements);
                }
                Err(err) => err,
            };
            warn!("tag query attempt {attempt}/{attempts} on {endpoint} failed: {err}");
            if classify_failure(&err) == FailureClass::Permanent || attempt >= attempts {
                return Err(err);
            }
            let delay = self.retry.backoff(attempt);
            info!("tag query retrying {endpoint} in {delay:?}");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<Vec<TaggedElement>, TransportError> {
        tokio::time::timeout(self.timeout, self.transport.query(endpoint, query))
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Timeout {
                    url: endpoint.to_owned(),
                    timeout_secs: self.timeout.as_secs(),
                })
            })
    }
}

fn to_item(centre: Coordinate, element: TaggedElement) -> Option<PoiItem> {
    let category = classify_element(&element.tags)?;
    let location = element.location?;
    let mut tags = element.tags;
    let name = tags.remove("name").or_else(|| tags.remove("ref"));
    Some(PoiItem::new(
        name,
        rounded_distance_meters(centre, location),
        category,
        PoiSource::Overpass,
    ))
}
