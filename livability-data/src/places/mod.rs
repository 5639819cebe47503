//! POI provider A: one categorised area search per coordinate.
//!
//! [`PlaceSearchProvider`] issues a single bounded search, classifies each
//! place into shops, hospitals or services and keeps the five nearest of
//! each. Results are cached per rounded coordinate and radius. Any upstream
//! failure yields an empty fragment; the provider never retries.

mod foursquare;

use std::time::Duration;

use async_trait::async_trait;
use livability_core::{
    Coordinate, PlaceSearchFragment, PoiCategory, PoiItem, PoiSource, SearchRadius, round_meters,
    rounded_distance_meters,
};
use log::{debug, info, warn};

use crate::cache::cache_key;
use crate::{ProviderOutcome, TransportError, TtlCache};

pub use foursquare::{
    DEFAULT_FOURSQUARE_API_VERSION, DEFAULT_FOURSQUARE_URL, FoursquareConfig, FoursquareTransport,
};

/// Nearest items kept per category.
pub const DEFAULT_PLACE_LIMIT: usize = 5;

/// Upper bound on one search, including connection setup.
pub const DEFAULT_PLACE_TIMEOUT: Duration = Duration::from_secs(10);

/// Category identifiers treated as shops.
pub const SHOP_CATEGORY_IDS: [&str; 5] = ["17069", "17145", "17001", "17002", "17114"];
/// Category identifiers treated as hospitals.
pub const HOSPITAL_CATEGORY_IDS: [&str; 3] = ["15014", "15015", "15016"];
/// Category identifiers treated as services.
pub const SERVICE_CATEGORY_IDS: [&str; 3] = ["17114", "17029", "17143"];

const SHOP_NAME_HINTS: [&str; 4] = ["shop", "store", "market", "pharmacy"];
const HOSPITAL_NAME_HINTS: [&str; 4] = ["hospital", "clinic", "medical", "doctor"];
const SERVICE_NAME_HINTS: [&str; 2] = ["bank", "atm"];

/// One place returned by a categorised search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceRecord {
    /// Place name, if any.
    pub name: Option<String>,
    /// Distance from the search centre reported upstream, in metres.
    pub distance_meters: Option<f64>,
    /// Position of the place, used when no distance is reported.
    pub location: Option<Coordinate>,
    /// Identifier of the primary category.
    pub category_id: Option<String>,
    /// Name of the primary category.
    pub category_name: Option<String>,
}

/// Categorised area search backend.
#[async_trait]
pub trait PlaceSearchTransport: Send + Sync {
    /// Label used in logs and timeout errors.
    fn endpoint(&self) -> &str;

    /// Search for places within `radius` of `centre`.
    async fn search(
        &self,
        centre: Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<PlaceRecord>, TransportError>;
}

/// Assign a place to a category.
///
/// The identifier table wins over the name hints, and shops are checked
/// before hospitals and services, so an identifier listed under both shops
/// and services is a shop. Places matching nothing are dropped.
///
/// # Examples
///
/// ```
/// use livability_core::PoiCategory;
/// use livability_data::places::{PlaceRecord, classify_place};
///
/// let atm = PlaceRecord {
///     category_name: Some("ATM".into()),
///     ..PlaceRecord::default()
/// };
/// assert_eq!(classify_place(&atm), Some(PoiCategory::Services));
/// ```
#[must_use]
pub fn classify_place(record: &PlaceRecord) -> Option<PoiCategory> {
    classify_by_id(record.category_id.as_deref())
        .or_else(|| classify_by_name(record.category_name.as_deref()))
}

fn classify_by_id(id: Option<&str>) -> Option<PoiCategory> {
    let id = id?;
    [
        (PoiCategory::Shops, SHOP_CATEGORY_IDS.as_slice()),
        (PoiCategory::Hospitals, HOSPITAL_CATEGORY_IDS.as_slice()),
        (PoiCategory::Services, SERVICE_CATEGORY_IDS.as_slice()),
    ]
    .into_iter()
    .find(|(_, ids)| ids.contains(&id))
    .map(|(category, _)| category)
}

fn classify_by_name(name: Option<&str>) -> Option<PoiCategory> {
    let name = name?.to_lowercase();
    [
        (PoiCategory::Shops, SHOP_NAME_HINTS.as_slice()),
        (PoiCategory::Hospitals, HOSPITAL_NAME_HINTS.as_slice()),
        (PoiCategory::Services, SERVICE_NAME_HINTS.as_slice()),
    ]
    .into_iter()
    .find(|(_, hints)| hints.iter().any(|hint| name.contains(hint)))
    .map(|(category, _)| category)
}

/// Cached, best-effort categorised place search.
#[derive(Debug)]
pub struct PlaceSearchProvider<T> {
    transport: T,
    cache: TtlCache<PlaceSearchFragment>,
    limit: usize,
    timeout: Duration,
}

impl<T: PlaceSearchTransport> PlaceSearchProvider<T> {
    /// Wrap `transport` with the default limit, timeout and cache TTL.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: TtlCache::new(),
            limit: DEFAULT_PLACE_LIMIT,
            timeout: DEFAULT_PLACE_TIMEOUT,
        }
    }

    /// Keep `limit` items per category.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Bound each search by `timeout`.
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

    /// Fetch shops, hospitals and services around `centre`.
    pub async fn fetch(
        &self,
        centre: Coordinate,
        radius: SearchRadius,
    ) -> ProviderOutcome<PlaceSearchFragment> {
        let key = cache_key(PoiSource::Foursquare.cache_namespace(), centre, radius);
        if let Some(fragment) = self.cache.get(&key) {
            debug!("place search cache hit {key}");
            return ProviderOutcome::Cached(fragment);
        }
        debug!("place search cache miss {key}");

        let records = match self.search(centre, radius).await {
            Ok(records) => records,
            Err(reason) => {
                warn!("place search around {centre} failed, using empty result: {reason}");
                return ProviderOutcome::Fallback { reason };
            }
        };

        let fetched = records.len();
        let items: Vec<PoiItem> = records
            .into_iter()
            .filter_map(|record| to_item(centre, record))
            .collect();
        info!(
            "place search around {centre} fetched {fetched} places, classified {}",
            items.len()
        );

        let fragment = PlaceSearchFragment::from_items(items, self.limit);
        self.cache.put(key.as_str(), fragment.clone());
        debug!("place search cache set {key}");
        ProviderOutcome::Fresh(fragment)
    }

    async fn search(
        &self,
        centre: Coordinate,
        radius: SearchRadius,
    ) -> Result<Vec<PlaceRecord>, TransportError> {
        tokio::time::timeout(self.timeout, self.transport.search(centre, radius))
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Timeout {
                    url: self.transport.endpoint().to_owned(),
                    timeout_secs: self.timeout.as_secs(),
                })
            })
    }
}

fn to_item(centre: Coordinate, record: PlaceRecord) -> Option<PoiItem> {
    let category = classify_place(&record)?;
    let distance = record
        .distance_meters
        .map(round_meters)
        .or_else(|| record.location.map(|at| rounded_distance_meters(centre, at)))
        .unwrap_or(0);
    Some(PoiItem::new(
        record.name,
        distance,
        category,
        PoiSource::Foursquare,
    ))
}
