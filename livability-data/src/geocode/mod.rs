//! Address geocoding behind a shared rate limiter.
//!
//! [`GeocodeProvider`] turns one free-text address into exactly one
//! [`GeocodeOutcome`]. Every upstream call goes through a [`RateLimiter`]
//! because public geocoders enforce a per-client request cadence.
//! [`NominatimTransport`] is the production adapter.

mod nominatim;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use livability_core::{Coordinate, GeocodeOutcome, GeocodedAddress};
use log::{debug, warn};

use crate::{RateLimiter, TransportError};

pub use nominatim::{DEFAULT_NOMINATIM_URL, NominatimConfig, NominatimTransport};

/// Message reported when the geocoder does not answer in time.
pub const GEOCODE_TIMEOUT_MESSAGE: &str = "geocoding request timed out";

/// One raw candidate returned by a geocoder, most relevant first.
///
/// Coordinates stay textual until [`GeocodeProvider`] validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeCandidate {
    /// Latitude as returned upstream.
    pub lat: String,
    /// Longitude as returned upstream.
    pub lon: String,
    /// Upstream display name.
    pub display_name: String,
    /// Structured address parts.
    pub address: BTreeMap<String, String>,
}

/// Free-text geocoding backend.
#[async_trait]
pub trait GeocodeTransport: Send + Sync {
    /// Search for `query`, returning candidates in upstream relevance order.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, TransportError>;
}

/// Resolves addresses through a rate-limited [`GeocodeTransport`].
#[derive(Debug)]
pub struct GeocodeProvider<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
}

impl<T: GeocodeTransport> GeocodeProvider<T> {
    /// Wrap `transport` with a private limiter using the default spacing.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_limiter(transport, Arc::new(RateLimiter::default()))
    }

    /// Wrap `transport` with a limiter shared with other callers.
    #[must_use]
    pub const fn with_limiter(transport: T, limiter: Arc<RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The limiter guarding upstream calls.
    #[must_use]
    pub const fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Resolve `address`. Never fails; every failure is an outcome.
    pub async fn resolve(&self, address: &str) -> GeocodeOutcome {
        let response = self
            .limiter
            .submit(|| self.transport.search(address))
            .await;
        let outcome = match response {
            Ok(candidates) => interpret(candidates),
            Err(TransportError::Timeout { .. }) => GeocodeOutcome::ProviderError {
                message: GEOCODE_TIMEOUT_MESSAGE.to_owned(),
            },
            Err(err) => GeocodeOutcome::ProviderError {
                message: err.to_string(),
            },
        };
        match &outcome {
            GeocodeOutcome::Success(found) => {
                debug!("geocoded {address:?} to {}", found.coordinate);
            }
            GeocodeOutcome::NotFound => debug!("no geocoding match for {address:?}"),
            GeocodeOutcome::ProviderError { message } => {
                warn!("geocoding {address:?} failed: {message}");
            }
        }
        outcome
    }
}

/// Keep only the first candidate and validate its coordinates.
fn interpret(candidates: Vec<GeocodeCandidate>) -> GeocodeOutcome {
    let Some(first) = candidates.into_iter().next() else {
        return GeocodeOutcome::NotFound;
    };
    match parse_coordinate(&first.lat, &first.lon) {
        Ok(coordinate) => GeocodeOutcome::Success(GeocodedAddress {
            coordinate,
            display_name: first.display_name,
            address_details: first.address,
        }),
        Err(message) => GeocodeOutcome::ProviderError { message },
    }
}

fn parse_coordinate(lat: &str, lon: &str) -> Result<Coordinate, String> {
    let lat_value: f64 = lat
        .trim()
        .parse()
        .map_err(|err| format!("geocoder returned invalid latitude {lat:?}: {err}"))?;
    let lon_value: f64 = lon
        .trim()
        .parse()
        .map_err(|err| format!("geocoder returned invalid longitude {lon:?}: {err}"))?;
    Coordinate::new(lat_value, lon_value).map_err(|err| format!("geocoder returned {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubGeocodeTransport, candidate};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(Duration::from_millis(1000)))
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn first_candidate_wins(limiter: Arc<RateLimiter>) {
        let transport = StubGeocodeTransport::new().with_candidates(
            "Karlova 1, Praha",
            vec![
                candidate("50.0860", "14.4150", "Karlova 1"),
                candidate("49.0", "16.0", "Elsewhere"),
            ],
        );
        let provider = GeocodeProvider::with_limiter(transport, limiter);

        let outcome = provider.resolve("Karlova 1, Praha").await;

        let GeocodeOutcome::Success(found) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(found.display_name, "Karlova 1");
        assert_eq!(found.coordinate.lat(), 50.086);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn empty_answer_is_not_found(limiter: Arc<RateLimiter>) {
        let provider = GeocodeProvider::with_limiter(StubGeocodeTransport::new(), limiter);
        assert_eq!(provider.resolve("Atlantis").await, GeocodeOutcome::NotFound);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn timeout_has_a_dedicated_message(limiter: Arc<RateLimiter>) {
        let transport = StubGeocodeTransport::new().with_error(
            "Slow Street",
            TransportError::Timeout {
                url: "https://nominatim.example".into(),
                timeout_secs: 30,
            },
        );
        let provider = GeocodeProvider::with_limiter(transport, limiter);
        assert_eq!(
            provider.resolve("Slow Street").await,
            GeocodeOutcome::ProviderError {
                message: GEOCODE_TIMEOUT_MESSAGE.to_owned()
            }
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn other_failures_carry_the_error_text(limiter: Arc<RateLimiter>) {
        let error = TransportError::Http {
            url: "https://nominatim.example".into(),
            status: 403,
            message: "forbidden".into(),
        };
        let transport = StubGeocodeTransport::new().with_error("Blocked", error.clone());
        let provider = GeocodeProvider::with_limiter(transport, limiter);
        assert_eq!(
            provider.resolve("Blocked").await,
            GeocodeOutcome::ProviderError {
                message: error.to_string()
            }
        );
    }

    #[rstest]
    #[case("abc", "14.0")]
    #[case("50.0", "")]
    #[case("95.0", "14.0")]
    #[tokio::test(start_paused = true)]
    async fn unusable_coordinates_become_provider_errors(
        limiter: Arc<RateLimiter>,
        #[case] lat: &str,
        #[case] lon: &str,
    ) {
        let transport = StubGeocodeTransport::new()
            .with_candidates("Odd", vec![candidate(lat, lon, "Odd place")]);
        let provider = GeocodeProvider::with_limiter(transport, limiter);
        assert!(matches!(
            provider.resolve("Odd").await,
            GeocodeOutcome::ProviderError { .. }
        ));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn calls_are_spaced_by_the_limiter(limiter: Arc<RateLimiter>) {
        let provider = GeocodeProvider::with_limiter(StubGeocodeTransport::new(), limiter);
        provider.resolve("one").await;
        provider.resolve("two").await;
        let starts = provider.transport().call_instants();
        assert_eq!(starts.len(), 2);
        assert!(starts[1] - starts[0] >= Duration::from_millis(1000));
    }
}
