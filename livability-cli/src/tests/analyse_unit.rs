//! Unit tests for running the analyse command against stub upstreams.

use super::helpers::{ENDPOINT, PRAGUE, StubBackendBuilder};
use super::*;
use crate::analyse::{AnalyseArgs, AnalyseConfig, execute_analyse, write_report};
use livability_core::{BatchError, LocationResult};
use rstest::{fixture, rstest};
use serde_json::Value;

#[fixture]
fn config() -> AnalyseConfig {
    AnalyseConfig::try_from(AnalyseArgs {
        addresses: vec![PRAGUE.to_owned(), "Atlantis".to_owned()],
        overpass_endpoints: vec![ENDPOINT.to_owned()],
        geocode_interval_ms: Some(0),
        ..AnalyseArgs::default()
    })
    .expect("config should build")
}

fn report_json(results: &[LocationResult]) -> Value {
    let mut buffer = Vec::new();
    write_report(&mut buffer, results).expect("report should write");
    serde_json::from_slice(&buffer).expect("report is JSON")
}

#[rstest]
fn resolved_addresses_are_rated(config: AnalyseConfig) {
    let results = execute_analyse(&config, &StubBackendBuilder).expect("batch should run");

    let json = report_json(&results);
    let entries = json["results"].as_array().expect("results array");
    assert_eq!(entries.len(), 2);

    let prague = &entries[0];
    assert_eq!(prague["address"], PRAGUE);
    assert_eq!(prague["status"], "success");
    assert_eq!(prague["data"]["poi_status"], "available");
    let rating = prague["rating"].as_f64().expect("numeric rating");
    assert!((rating - 1.3).abs() < 1e-9, "rating {rating}");
    assert_eq!(prague["rating_band"], "weak");
}

#[rstest]
fn unresolved_addresses_carry_no_rating(config: AnalyseConfig) {
    let results = execute_analyse(&config, &StubBackendBuilder).expect("batch should run");

    let json = report_json(&results);
    let missing = &json["results"][1];
    assert_eq!(missing["status"], "not_found");
    assert_eq!(missing["message"], "address not found");
    assert!(missing.get("rating").is_none());
    assert!(missing.get("rating_band").is_none());
    assert!(missing.get("data").is_none());
}

#[rstest]
fn blank_addresses_reject_the_batch(mut config: AnalyseConfig) {
    config.addresses.push("   ".to_owned());

    let err = execute_analyse(&config, &StubBackendBuilder).expect_err("blank address");
    match err {
        CliError::InvalidBatch(BatchError::BlankAddress { index }) => assert_eq!(index, 2),
        other => panic!("expected InvalidBatch, found {other:?}"),
    }
}

#[rstest]
fn report_ends_with_a_newline(config: AnalyseConfig) {
    let results = execute_analyse(&config, &StubBackendBuilder).expect("batch should run");
    let mut buffer = Vec::new();

    write_report(&mut buffer, &results).expect("report should write");

    assert_eq!(buffer.last(), Some(&b'\n'));
    assert!(buffer.starts_with(b"{\n  \"results\""));
}
