//! In-memory cache with lazy time-to-live expiry.
//!
//! Entries are checked against the TTL when read and are never swept, so
//! memory grows with the number of distinct keys for the life of the
//! process. Each provider owns one cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use livability_core::{Coordinate, SearchRadius};
use tokio::time::Instant;

/// Default entry lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Thread-safe string-keyed cache whose entries expire after a fixed TTL.
///
/// # Examples
///
/// ```
/// use livability_data::TtlCache;
///
/// let cache = TtlCache::new();
/// cache.put("fsq_50.0880,14.4208,1000", 3_u32);
/// assert_eq!(cache.get("fsq_50.0880,14.4208,1000"), Some(3));
/// assert_eq!(cache.get("osm_50.0880,14.4208,1000"), None);
/// ```
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the default 24 hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value stored under `key` unless it is missing or older
    /// than the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() <= self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the cache key `"<namespace>_<lat:4dp>,<lon:4dp>,<radius>"`.
///
/// # Examples
///
/// ```
/// use livability_core::{Coordinate, SearchRadius};
/// use livability_data::cache::cache_key;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = cache_key("fsq", Coordinate::new(50.088_04, 14.420_76)?, SearchRadius::new(500)?);
/// assert_eq!(key, "fsq_50.0880,14.4208,500");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn cache_key(namespace: &str, centre: Coordinate, radius: SearchRadius) -> String {
    format!("{namespace}_{},{radius}", centre.cache_fragment())
}
