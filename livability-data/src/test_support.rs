//! Test utilities for the provider adapters.
//!
//! The stubs here stand in for the HTTP transports so providers,
//! the aggregator and the batch processor can be exercised without a
//! network. Each stub counts its calls, and the optional delay is applied
//! after counting so timeouts can be observed on paused time.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use livability_core::{Coordinate, SearchRadius};
use tokio::time::Instant;

use crate::TransportError;
use crate::geocode::{GeocodeCandidate, GeocodeTransport};
use crate::places::{PlaceRecord, PlaceSearchTransport};
use crate::tags::{TagQueryTransport, TaggedElement};

/// Endpoint label reported by [`StubPlaceSearchTransport`].
pub const STUB_PLACES_ENDPOINT: &str = "stub://places";

/// Stub [`GeocodeTransport`] answering from a per-address table.
///
/// Addresses without an entry resolve to no candidates.
///
/// # Example
///
/// ```
/// use livability_data::geocode::GeocodeProvider;
/// use livability_data::test_support::{StubGeocodeTransport, candidate};
///
/// let transport = StubGeocodeTransport::new()
///     .with_candidates("Karlova 1", vec![candidate("50.086", "14.415", "Karlova 1")]);
/// let provider = GeocodeProvider::new(transport);
/// assert!(provider.transport().call_instants().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct StubGeocodeTransport {
    responses: HashMap<String, Result<Vec<GeocodeCandidate>, TransportError>>,
    calls: Mutex<Vec<Instant>>,
}

impl StubGeocodeTransport {
    /// Create a stub that finds nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `address` with `candidates`.
    #[must_use]
    pub fn with_candidates(
        mut self,
        address: impl Into<String>,
        candidates: Vec<GeocodeCandidate>,
    ) -> Self {
        self.responses.insert(address.into(), Ok(candidates));
        self
    }

    /// Fail `address` with `error`.
    #[must_use]
    pub fn with_error(mut self, address: impl Into<String>, error: TransportError) -> Self {
        self.responses.insert(address.into(), Err(error));
        self
    }

    /// Instants at which searches started, in call order.
    #[must_use]
    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GeocodeTransport for StubGeocodeTransport {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
        self.responses.get(query).cloned().unwrap_or(Ok(Vec::new()))
    }
}

/// Build a geocoder candidate with no address details.
#[must_use]
pub fn candidate(lat: &str, lon: &str, display_name: &str) -> GeocodeCandidate {
    GeocodeCandidate {
        lat: lat.to_owned(),
        lon: lon.to_owned(),
        display_name: display_name.to_owned(),
        address: BTreeMap::new(),
    }
}

/// Stub [`PlaceSearchTransport`] returning the same response for every
/// search.
#[derive(Debug)]
pub struct StubPlaceSearchTransport {
    response: Result<Vec<PlaceRecord>, TransportError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubPlaceSearchTransport {
    /// Create a stub returning `records`.
    #[must_use]
    pub const fn with_records(records: Vec<PlaceRecord>) -> Self {
        Self {
            response: Ok(records),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a stub failing with `error`.
    #[must_use]
    pub const fn with_error(error: TransportError) -> Self {
        Self {
            response: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of searches issued.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceSearchTransport for StubPlaceSearchTransport {
    fn endpoint(&self) -> &str {
        STUB_PLACES_ENDPOINT
    }

    async fn search(
        &self,
        _centre: Coordinate,
        _radius: SearchRadius,
    ) -> Result<Vec<PlaceRecord>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone()
    }
}

/// Build a categorised place record with a reported distance.
#[must_use]
pub fn place(name: &str, distance: f64, category_id: &str, category_name: &str) -> PlaceRecord {
    PlaceRecord {
        name: Some(name.to_owned()),
        distance_meters: Some(distance),
        location: None,
        category_id: Some(category_id.to_owned()),
        category_name: Some(category_name.to_owned()),
    }
}

/// Stub [`TagQueryTransport`] answering from a per-endpoint table.
///
/// Endpoints without an entry return no elements.
#[derive(Debug, Default)]
pub struct StubTagQueryTransport {
    responses: HashMap<String, Result<Vec<TaggedElement>, TransportError>>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubTagQueryTransport {
    /// Create a stub with no configured endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries to `endpoint` with `elements`.
    #[must_use]
    pub fn with_elements(
        mut self,
        endpoint: impl Into<String>,
        elements: Vec<TaggedElement>,
    ) -> Self {
        self.responses.insert(endpoint.into(), Ok(elements));
        self
    }

    /// Fail queries to `endpoint` with `error`.
    #[must_use]
    pub fn with_error(mut self, endpoint: impl Into<String>, error: TransportError) -> Self {
        self.responses.insert(endpoint.into(), Err(error));
        self
    }

    /// Sleep for `delay` before answering any query.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of queries sent to `endpoint`.
    #[must_use]
    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Number of queries sent to any endpoint.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl TagQueryTransport for StubTagQueryTransport {
    async fn query(
        &self,
        endpoint: &str,
        _query: &str,
    ) -> Result<Vec<TaggedElement>, TransportError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint.to_owned())
            .or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .get(endpoint)
            .cloned()
            .unwrap_or(Ok(Vec::new()))
    }
}

/// Build a tagged node at `lat`, `lon`. Out-of-range positions yield a
/// node without a location.
#[must_use]
pub fn node(lat: f64, lon: f64, tags: &[(&str, &str)]) -> TaggedElement {
    TaggedElement {
        location: Coordinate::new(lat, lon).ok(),
        tags: tags
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
    }
}
