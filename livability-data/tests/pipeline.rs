//! End-to-end batch processing against stubbed upstream services.

use std::sync::Arc;
use std::time::Duration;

use livability_core::{
    BatchError, Coordinate, LocationResult, PoiCategory, PoiStatus, SearchRadius, rate,
};
use livability_data::test_support::{
    StubGeocodeTransport, StubPlaceSearchTransport, StubTagQueryTransport, candidate, node, place,
};
use livability_data::{
    BatchProcessor, DEFAULT_TTL, GeocodeProvider, PlaceSearchProvider, PoiAggregator,
    RateLimiter, TagQueryProvider, TransportError,
};
use rstest::{fixture, rstest};

const PRAGUE: &str = "Václavské náměstí, Praha";
const PRIMARY: &str = "https://primary.test/api/interpreter";
const SECONDARY: &str = "https://secondary.test/api/interpreter";

type Processor =
    BatchProcessor<StubGeocodeTransport, StubPlaceSearchTransport, StubTagQueryTransport>;

#[fixture]
fn geocoder() -> StubGeocodeTransport {
    StubGeocodeTransport::new().with_candidates(
        PRAGUE,
        vec![candidate("50.0880", "14.4208", "Václavské náměstí, Nové Město, Praha")],
    )
}

#[fixture]
fn places() -> StubPlaceSearchTransport {
    StubPlaceSearchTransport::with_records(vec![
        place("Albert", 90.0, "17069", "Supermarket"),
        place("Billa", 210.0, "17069", "Supermarket"),
        place("Tesco", 480.0, "17069", "Supermarket"),
    ])
}

#[fixture]
fn tags() -> StubTagQueryTransport {
    StubTagQueryTransport::new()
        .with_error(
            PRIMARY,
            TransportError::Http {
                url: PRIMARY.into(),
                status: 504,
                message: "Gateway Timeout".into(),
            },
        )
        .with_elements(
            SECONDARY,
            vec![
                node(50.0812, 14.4281, &[("railway", "station"), ("name", "Muzeum")]),
                node(50.0869, 14.4213, &[("railway", "tram_stop"), ("name", "Václavské náměstí")]),
                node(50.0858, 14.4247, &[("amenity", "school"), ("name", "ZŠ Vodičkova")]),
            ],
        )
}

fn processor(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) -> Processor {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1000)));
    BatchProcessor::new(
        GeocodeProvider::with_limiter(geocoder, limiter),
        PoiAggregator::new(
            PlaceSearchProvider::new(places),
            TagQueryProvider::new(tags).with_endpoints([PRIMARY, SECONDARY]),
        ),
    )
}

fn resolved_counts(result: &LocationResult) -> Vec<usize> {
    let bundle = result
        .location()
        .and_then(|location| location.poi_nearby())
        .expect("POIs found");
    PoiCategory::ALL
        .iter()
        .map(|&category| bundle.count(category))
        .collect()
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn prague_batch_is_enriched_and_rated(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) {
    let processor = processor(geocoder, places, tags);
    let radius = SearchRadius::new(1000).expect("non-zero");

    let results = processor.process(&[PRAGUE], radius).await.expect("valid batch");

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.status(), "success");
    // transport, schools, shops, hospitals, services
    assert_eq!(resolved_counts(result), [2, 1, 3, 0, 0]);
    let location = result.location().expect("resolved");
    assert_eq!(location.coordinate(), Coordinate::new(50.088, 14.4208).expect("valid"));
    let rating = rate(location.poi_nearby().expect("POIs found"));
    assert_eq!(format!("{rating}"), "1.3");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failover_reaches_the_secondary_endpoint(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) {
    let processor = processor(geocoder, places, tags);

    processor
        .process(&[PRAGUE], SearchRadius::default())
        .await
        .expect("valid batch");

    let transport = processor.aggregator().tags().transport();
    assert_eq!(transport.calls_to(PRIMARY), 3);
    assert_eq!(transport.calls_to(SECONDARY), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_addresses_are_served_from_cache_until_expiry(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) {
    let processor = processor(geocoder, places, tags);

    let first = processor
        .process(&[PRAGUE, PRAGUE], SearchRadius::default())
        .await
        .expect("valid batch");
    assert_eq!(first[0], first[1]);
    assert_eq!(processor.aggregator().places().transport().calls(), 1);
    assert_eq!(processor.aggregator().tags().transport().calls_to(SECONDARY), 1);

    tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;
    processor
        .process(&[PRAGUE], SearchRadius::default())
        .await
        .expect("valid batch");
    assert_eq!(processor.aggregator().places().transport().calls(), 2);
    assert_eq!(processor.aggregator().tags().transport().calls_to(SECONDARY), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn a_blank_entry_rejects_the_whole_batch(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) {
    let processor = processor(geocoder, places, tags);

    let outcome = processor.process(&[PRAGUE, ""], SearchRadius::default()).await;

    assert_eq!(outcome, Err(BatchError::BlankAddress { index: 1 }));
    assert!(processor.geocoder().transport().call_instants().is_empty());
    assert_eq!(processor.aggregator().places().transport().calls(), 0);
    assert_eq!(processor.aggregator().tags().transport().total_calls(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn mixed_outcomes_keep_input_order(
    geocoder: StubGeocodeTransport,
    places: StubPlaceSearchTransport,
    tags: StubTagQueryTransport,
) {
    let geocoder = geocoder.with_error(
        "Timeout Street",
        TransportError::Timeout {
            url: "https://nominatim.test".into(),
            timeout_secs: 30,
        },
    );
    let processor = processor(geocoder, places, tags);

    let results = processor
        .process(&["Nowhere 0", PRAGUE, "Timeout Street"], SearchRadius::default())
        .await
        .expect("valid batch");

    let statuses: Vec<_> = results.iter().map(LocationResult::status).collect();
    assert_eq!(statuses, ["not_found", "success", "error"]);
    assert!(results[0].location().is_none());
    assert!(results[2].location().is_none());
    assert_eq!(processor.aggregator().places().transport().calls(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn geocoder_calls_are_spaced(places: StubPlaceSearchTransport, tags: StubTagQueryTransport) {
    let processor = processor(StubGeocodeTransport::new(), places, tags);

    processor
        .process(&["a", "b", "c"], SearchRadius::default())
        .await
        .expect("valid batch");

    let starts = processor.geocoder().transport().call_instants();
    assert_eq!(starts.len(), 3);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(1000));
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn both_providers_failing_still_resolves_the_address(geocoder: StubGeocodeTransport) {
    let places = StubPlaceSearchTransport::with_error(TransportError::MissingCredentials {
        service: "foursquare",
    });
    let tags = StubTagQueryTransport::new()
        .with_error(
            PRIMARY,
            TransportError::Network {
                url: PRIMARY.into(),
                message: "connection refused".into(),
            },
        )
        .with_error(
            SECONDARY,
            TransportError::Network {
                url: SECONDARY.into(),
                message: "connection refused".into(),
            },
        );
    let processor = processor(geocoder, places, tags);

    let results = processor
        .process(&[PRAGUE], SearchRadius::default())
        .await
        .expect("valid batch");

    let location = results[0].location().expect("resolved");
    assert_eq!(location.poi_status(), PoiStatus::Unavailable);
    assert!(location.poi_nearby().is_none());
    let json = serde_json::to_value(&results[0]).expect("serialises");
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["poi_status"], "unavailable");
    assert!(json["data"]["poi_nearby"].is_null());
}
