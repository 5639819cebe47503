//! Upstream access for the livability pipeline.
//!
//! Responsibilities:
//! - Geocode free-text addresses through a rate-limited provider.
//! - Fetch nearby POIs from a categorised place search and an OSM tag query.
//! - Cache provider results and isolate provider failures.
//! - Orchestrate batches of addresses into per-address results.
//!
//! Boundaries:
//! - Do not encode rating rules (live in `livability-core`).
//! - Keep HTTP behind transport traits so providers are testable offline.
//!
//! Invariants:
//! - Providers never fail a batch; upstream errors become outcomes.
//! - No global mutable state.

pub mod cache;
pub mod geocode;
pub mod places;
pub mod tags;

mod aggregate;
mod batch;
mod error;
mod outcome;
mod rate_limit;

#[doc(hidden)]
pub mod test_support;

pub use aggregate::PoiAggregator;
pub use batch::BatchProcessor;
pub use cache::{DEFAULT_TTL, TtlCache};
pub use error::{ClientBuildError, FailureClass, TransportError, classify_failure};
pub use geocode::{GeocodeProvider, GeocodeTransport};
pub use outcome::ProviderOutcome;
pub use places::{PlaceSearchProvider, PlaceSearchTransport};
pub use rate_limit::{DEFAULT_MIN_INTERVAL, RateLimiter};
pub use tags::{TagQueryProvider, TagQueryTransport};

/// User agent sent to every upstream service.
pub const DEFAULT_USER_AGENT: &str = concat!("livability/", env!("CARGO_PKG_VERSION"));
