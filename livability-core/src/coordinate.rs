//! Validated geographic coordinates and search radii.

use std::fmt;
use std::num::NonZeroU32;

use geo::Coord;
use thiserror::Error;

/// Default search radius in metres.
pub const DEFAULT_RADIUS_METERS: u32 = 1000;

/// A WGS84 position with latitude in `[-90, 90]` and longitude in
/// `[-180, 180]`.
///
/// Values are immutable once constructed. Conversions to and from
/// [`geo::Coord`] follow the `x = longitude`, `y = latitude` convention.
///
/// # Examples
///
/// ```
/// use livability_core::Coordinate;
///
/// # fn main() -> Result<(), livability_core::CoordinateError> {
/// let wenceslas = Coordinate::new(50.0880, 14.4208)?;
/// assert_eq!(wenceslas.cache_fragment(), "50.0880,14.4208");
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawCoordinate")
)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

/// Errors returned by [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude was not finite or fell outside `[-90, 90]`.
    #[error("latitude {lat} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Rejected latitude.
        lat: f64,
    },
    /// Longitude was not finite or fell outside `[-180, 180]`.
    #[error("longitude {lon} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Rejected longitude.
        lon: f64,
    },
}

impl Coordinate {
    /// Validates and constructs a [`Coordinate`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when either component is non-finite or
    /// out of range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange { lat });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange { lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Render the coordinate quantised to four decimal places.
    ///
    /// Four decimals is roughly 11 m at the equator; nearby queries share a
    /// cache entry. Values that round to zero render unsigned.
    #[must_use]
    pub fn cache_fragment(&self) -> String {
        format!("{:.4},{:.4}", quantise(self.lat), quantise(self.lon))
    }
}

/// Round to four decimal places; adding `0.0` turns `-0.0` into `0.0`.
fn quantise(degrees: f64) -> f64 {
    (degrees * 10_000.0).round() / 10_000.0 + 0.0
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Self {
            x: value.lon,
            y: value.lat,
        }
    }
}

impl TryFrom<Coord<f64>> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: Coord<f64>) -> Result<Self, Self::Error> {
        Self::new(value.y, value.x)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lon)
    }
}

/// Radius of a POI search in whole metres; never zero.
///
/// # Examples
///
/// ```
/// use livability_core::SearchRadius;
///
/// assert_eq!(SearchRadius::default().meters(), 1000);
/// assert!(SearchRadius::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u32", into = "u32")
)]
pub struct SearchRadius(NonZeroU32);

/// Errors returned by [`SearchRadius::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchRadiusError {
    /// A zero radius was supplied.
    #[error("search radius must be a positive number of metres")]
    Zero,
}

impl SearchRadius {
    /// Validates and constructs a [`SearchRadius`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchRadiusError::Zero`] for a zero radius.
    pub fn new(meters: u32) -> Result<Self, SearchRadiusError> {
        NonZeroU32::new(meters)
            .map(Self)
            .ok_or(SearchRadiusError::Zero)
    }

    /// Radius in metres.
    #[must_use]
    pub const fn meters(self) -> u32 {
        self.0.get()
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(DEFAULT_RADIUS_METERS - 1))
    }
}

impl fmt::Display for SearchRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for SearchRadius {
    type Error = SearchRadiusError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SearchRadius> for u32 {
    fn from(value: SearchRadius) -> Self {
        value.meters()
    }
}
