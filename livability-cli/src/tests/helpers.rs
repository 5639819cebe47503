//! Stub backends for driving the analyse command without a network.

use super::*;
use crate::analyse::{AnalyseBackend, AnalyseBackendBuilder, AnalyseConfig};
use livability_data::test_support::{
    StubGeocodeTransport, StubPlaceSearchTransport, StubTagQueryTransport, candidate, node, place,
};
use livability_data::{
    BatchProcessor, GeocodeProvider, PlaceSearchProvider, PoiAggregator, RateLimiter,
    TagQueryProvider,
};
use std::sync::Arc;

pub(super) const PRAGUE: &str = "Václavské náměstí, Praha";
pub(super) const ENDPOINT: &str = "https://overpass.test/api/interpreter";

/// Builds a processor answering [`PRAGUE`] with three shops, two stops and
/// one school; every other address is not found.
pub(super) struct StubBackendBuilder;

impl AnalyseBackendBuilder for StubBackendBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Box<dyn AnalyseBackend>, CliError> {
        let geocoder = StubGeocodeTransport::new().with_candidates(
            PRAGUE,
            vec![candidate("50.0880", "14.4208", "Václavské náměstí, Praha")],
        );
        let places = StubPlaceSearchTransport::with_records(vec![
            place("Albert", 90.0, "17069", "Supermarket"),
            place("Billa", 210.0, "17069", "Supermarket"),
            place("Tesco", 480.0, "17069", "Supermarket"),
        ]);
        let tags = StubTagQueryTransport::new().with_elements(
            ENDPOINT,
            vec![
                node(50.0812, 14.4281, &[("railway", "station"), ("name", "Muzeum")]),
                node(50.0869, 14.4213, &[("railway", "tram_stop"), ("name", "Můstek")]),
                node(50.0858, 14.4247, &[("amenity", "school"), ("name", "ZŠ Vodičkova")]),
            ],
        );
        let limiter = Arc::new(RateLimiter::new(config.geocode_interval));
        Ok(Box::new(BatchProcessor::new(
            GeocodeProvider::with_limiter(geocoder, limiter),
            PoiAggregator::new(
                PlaceSearchProvider::new(places),
                TagQueryProvider::new(tags).with_endpoints(config.overpass_endpoints.clone()),
            ),
        )))
    }
}
