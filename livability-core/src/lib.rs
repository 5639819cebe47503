//! Core domain types for the livability engine.
//!
//! The crate holds everything that is pure: coordinates and search radii,
//! point-of-interest categories and bundles, geocoding outcomes, the
//! per-address result record, the great-circle distance utility and the
//! rating engine. Nothing here performs I/O; the networked providers live in
//! `livability-data` and only produce values of these types.
//!
//! Constructors return `Result` to surface invalid input early, so a
//! [`Coordinate`] or [`SearchRadius`] in hand is always within range.
//!
//! # Examples
//!
//! ```
//! use livability_core::{PoiBundle, PlaceSearchFragment, TagQueryFragment, rate};
//!
//! let bundle = PoiBundle::merge(PlaceSearchFragment::default(), TagQueryFragment::default());
//! assert!(bundle.is_empty());
//! assert_eq!(rate(&bundle).value(), 0.0);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod batch;
pub mod coordinate;
pub mod distance;
pub mod location;
pub mod poi;
pub mod rating;

pub use batch::{BatchError, DEFAULT_MAX_BATCH_SIZE, validate_batch};
pub use coordinate::{
    Coordinate, CoordinateError, DEFAULT_RADIUS_METERS, SearchRadius, SearchRadiusError,
};
pub use distance::{EARTH_RADIUS_METERS, distance_meters, round_meters, rounded_distance_meters};
pub use location::{
    GeocodeOutcome, GeocodedAddress, LocationOutcome, LocationResult, NOT_FOUND_MESSAGE, PoiStatus,
    ResolvedLocation,
};
pub use poi::{
    PlaceSearchFragment, PoiBundle, PoiCategory, PoiItem, PoiSource, TagQueryFragment, UNNAMED_POI,
    rank_nearest,
};
pub use rating::{MAX_RATING, Rating, RatingBand, RatingWeights, rate};
