//! Facade crate for the livability engine.
//!
//! This crate re-exports the core domain types and exposes the networked
//! providers, aggregator and batch orchestrator behind the `data` feature.

#![forbid(unsafe_code)]

pub use livability_core::{
    BatchError, Coordinate, CoordinateError, GeocodeOutcome, GeocodedAddress, LocationOutcome,
    LocationResult, PlaceSearchFragment, PoiBundle, PoiCategory, PoiItem, PoiSource, PoiStatus,
    Rating, RatingBand, RatingWeights, ResolvedLocation, SearchRadius, SearchRadiusError,
    TagQueryFragment, distance_meters, rate,
};

#[cfg(feature = "data")]
pub use livability_data::{
    BatchProcessor, GeocodeProvider, PlaceSearchProvider, PoiAggregator, RateLimiter,
    TagQueryProvider, TransportError, TtlCache,
};
