//! Geocoding outcomes and the per-address result record.

use std::collections::BTreeMap;

use crate::{Coordinate, PoiBundle, SearchRadius};

/// A successfully geocoded address.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeocodedAddress {
    /// Resolved position.
    pub coordinate: Coordinate,
    /// Human-readable name chosen by the geocoder.
    pub display_name: String,
    /// Structured address breakdown, e.g. `road`, `city`, `postcode`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address_details: BTreeMap<String, String>,
}

/// Result of resolving exactly one address.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// The geocoder returned at least one candidate; the first is kept.
    Success(GeocodedAddress),
    /// The geocoder returned no candidates.
    NotFound,
    /// The request failed or the response could not be used.
    ProviderError {
        /// Description of the failure.
        message: String,
    },
}

impl GeocodeOutcome {
    /// Wire status string: `success`, `not_found` or `error`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound => "not_found",
            Self::ProviderError { .. } => "error",
        }
    }
}

/// Whether any POIs were found around a resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PoiStatus {
    /// At least one category is non-empty.
    Available,
    /// Every category is empty.
    Unavailable,
}

/// A geocoded address together with the POIs found around it.
///
/// The POI bundle is dropped when every category is empty, so
/// [`ResolvedLocation::poi_nearby`] is `None` exactly when
/// [`ResolvedLocation::poi_status`] is [`PoiStatus::Unavailable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    geocoded: GeocodedAddress,
    search_radius: SearchRadius,
    poi_nearby: Option<PoiBundle>,
}

impl ResolvedLocation {
    /// Attach a merged bundle to a geocoded address.
    #[must_use]
    pub fn new(geocoded: GeocodedAddress, search_radius: SearchRadius, bundle: PoiBundle) -> Self {
        let poi_nearby = (!bundle.is_empty()).then_some(bundle);
        Self {
            geocoded,
            search_radius,
            poi_nearby,
        }
    }

    /// The geocoder's answer.
    #[must_use]
    pub const fn geocoded(&self) -> &GeocodedAddress {
        &self.geocoded
    }

    /// Resolved position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.geocoded.coordinate
    }

    /// Radius the POI search used.
    #[must_use]
    pub const fn search_radius(&self) -> SearchRadius {
        self.search_radius
    }

    /// Nearby POIs, absent when none were found.
    #[must_use]
    pub const fn poi_nearby(&self) -> Option<&PoiBundle> {
        self.poi_nearby.as_ref()
    }

    /// Derived availability flag.
    #[must_use]
    pub const fn poi_status(&self) -> PoiStatus {
        if self.poi_nearby.is_some() {
            PoiStatus::Available
        } else {
            PoiStatus::Unavailable
        }
    }
}

/// What happened to one input address.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// Geocoded and enriched with POIs.
    Resolved(ResolvedLocation),
    /// The geocoder found no match.
    NotFound {
        /// Explanation suitable for display.
        message: String,
    },
    /// Geocoding failed.
    Failed {
        /// Explanation suitable for display.
        message: String,
    },
}

/// Externally visible record for one input address.
///
/// With the `serde` feature this serialises as
/// `{"address", "status": "success", "data": {...}}` for resolved addresses
/// and `{"address", "status": "not_found" | "error", "message"}` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationResult {
    /// The address exactly as supplied.
    pub address: String,
    /// Outcome for this address.
    pub outcome: LocationOutcome,
}

/// Message attached to addresses the geocoder could not find.
pub const NOT_FOUND_MESSAGE: &str = "address not found";

impl LocationResult {
    /// Record a resolved address.
    #[must_use]
    pub fn resolved(address: impl Into<String>, location: ResolvedLocation) -> Self {
        Self {
            address: address.into(),
            outcome: LocationOutcome::Resolved(location),
        }
    }

    /// Record an address the geocoder could not find.
    #[must_use]
    pub fn not_found(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: LocationOutcome::NotFound {
                message: NOT_FOUND_MESSAGE.to_owned(),
            },
        }
    }

    /// Record a geocoding failure.
    #[must_use]
    pub fn failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            outcome: LocationOutcome::Failed {
                message: message.into(),
            },
        }
    }

    /// Wire status string: `success`, `not_found` or `error`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self.outcome {
            LocationOutcome::Resolved(_) => "success",
            LocationOutcome::NotFound { .. } => "not_found",
            LocationOutcome::Failed { .. } => "error",
        }
    }

    /// The resolved location, if geocoding succeeded.
    #[must_use]
    pub const fn location(&self) -> Option<&ResolvedLocation> {
        match &self.outcome {
            LocationOutcome::Resolved(location) => Some(location),
            LocationOutcome::NotFound { .. } | LocationOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(feature = "serde")]
mod wire {
    use serde::ser::{Serialize, SerializeStruct, Serializer};

    use super::{LocationOutcome, LocationResult, ResolvedLocation};

    #[derive(serde::Serialize)]
    struct Data<'a> {
        lat: f64,
        lon: f64,
        display_name: &'a str,
        address_details: &'a std::collections::BTreeMap<String, String>,
        search_radius: u32,
        poi_nearby: Option<&'a crate::PoiBundle>,
        poi_status: crate::PoiStatus,
    }

    impl<'a> From<&'a ResolvedLocation> for Data<'a> {
        fn from(location: &'a ResolvedLocation) -> Self {
            let geocoded = location.geocoded();
            Self {
                lat: geocoded.coordinate.lat(),
                lon: geocoded.coordinate.lon(),
                display_name: &geocoded.display_name,
                address_details: &geocoded.address_details,
                search_radius: location.search_radius().meters(),
                poi_nearby: location.poi_nearby(),
                poi_status: location.poi_status(),
            }
        }
    }

    impl Serialize for LocationResult {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("LocationResult", 3)?;
            state.serialize_field("address", &self.address)?;
            state.serialize_field("status", self.status())?;
            match &self.outcome {
                LocationOutcome::Resolved(location) => {
                    state.serialize_field("data", &Data::from(location))?;
                }
                LocationOutcome::NotFound { message } | LocationOutcome::Failed { message } => {
                    state.serialize_field("message", message)?;
                }
            }
            state.end()
        }
    }
}
