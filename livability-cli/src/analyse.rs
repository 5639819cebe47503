//! Analyse command implementation for the livability CLI.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use livability_core::{LocationResult, PoiBundle, Rating, RatingBand, SearchRadius, rate};
use livability_data::geocode::{DEFAULT_NOMINATIM_URL, NominatimConfig, NominatimTransport};
use livability_data::places::{FoursquareConfig, FoursquareTransport};
use livability_data::tags::{DEFAULT_OVERPASS_ENDPOINTS, OverpassConfig, OverpassTransport};
use livability_data::{
    BatchProcessor, DEFAULT_MIN_INTERVAL, GeocodeProvider, GeocodeTransport, PlaceSearchProvider,
    PlaceSearchTransport, PoiAggregator, RateLimiter, TagQueryProvider, TagQueryTransport,
};
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ADDRESS, ARG_ADDRESSES_FILE, ARG_FOURSQUARE_API_KEY, ARG_GEOCODE_INTERVAL_MS,
    ARG_NOMINATIM_URL, ARG_OVERPASS_ENDPOINT, ARG_RADIUS, CliError, ENV_ADDRESSES,
};

/// CLI arguments for the `analyse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Geocode each address, gather nearby transport, schools, \
                 shops, hospitals and services, and print one JSON result per \
                 address with its livability rating. Options can come from \
                 CLI flags, configuration files, or environment variables.",
    about = "Analyse a batch of addresses",
    name = "analyse"
)]
#[ortho_config(prefix = "LIVABILITY_")]
pub(crate) struct AnalyseArgs {
    /// Free-text addresses to analyse.
    #[arg(value_name = ARG_ADDRESS)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) addresses: Vec<String>,
    /// File with one address per line; blank lines are skipped.
    #[arg(long = ARG_ADDRESSES_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) addresses_file: Option<PathBuf>,
    /// Search radius around each address, in metres.
    #[arg(long = ARG_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Foursquare Places API key; shops, hospitals and services are skipped
    /// without one.
    #[arg(long = ARG_FOURSQUARE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) foursquare_api_key: Option<String>,
    /// Nominatim search URL.
    #[arg(long = ARG_NOMINATIM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// Overpass interpreter URL, tried in the order given. Repeatable.
    #[arg(long = ARG_OVERPASS_ENDPOINT, value_name = "url")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) overpass_endpoints: Vec<String>,
    /// Minimum spacing between geocoder requests, in milliseconds.
    #[arg(long = ARG_GEOCODE_INTERVAL_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) geocode_interval_ms: Option<u64>,
}

impl AnalyseArgs {
    pub(crate) fn into_config(self) -> Result<AnalyseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AnalyseConfig::try_from(merged)
    }
}

/// Resolved `analyse` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalyseConfig {
    /// Addresses given directly, in order.
    pub(crate) addresses: Vec<String>,
    /// Optional file of further addresses, appended after `addresses`.
    pub(crate) addresses_file: Option<PathBuf>,
    /// Search radius around each address.
    pub(crate) radius: SearchRadius,
    /// Foursquare API key, if any.
    pub(crate) foursquare_api_key: Option<String>,
    /// Nominatim search URL.
    pub(crate) nominatim_url: String,
    /// Overpass endpoints in failover order.
    pub(crate) overpass_endpoints: Vec<String>,
    /// Minimum spacing between geocoder requests.
    pub(crate) geocode_interval: Duration,
}

impl AnalyseConfig {
    /// Collect every address to analyse, direct arguments first.
    pub(crate) fn collect_addresses(&self) -> Result<Vec<String>, CliError> {
        let mut addresses = self.addresses.clone();
        if let Some(path) = &self.addresses_file {
            addresses.extend(read_addresses(path)?);
        }
        Ok(addresses)
    }
}

impl TryFrom<AnalyseArgs> for AnalyseConfig {
    type Error = CliError;

    fn try_from(args: AnalyseArgs) -> Result<Self, Self::Error> {
        if args.addresses.is_empty() && args.addresses_file.is_none() {
            return Err(CliError::MissingArgument {
                field: ARG_ADDRESS,
                env: ENV_ADDRESSES,
            });
        }
        let radius = args
            .radius
            .map(SearchRadius::new)
            .transpose()?
            .unwrap_or_default();
        let overpass_endpoints = if args.overpass_endpoints.is_empty() {
            DEFAULT_OVERPASS_ENDPOINTS
                .iter()
                .map(|&endpoint| endpoint.to_owned())
                .collect()
        } else {
            args.overpass_endpoints
        };
        let geocode_interval = args
            .geocode_interval_ms
            .map_or(DEFAULT_MIN_INTERVAL, Duration::from_millis);

        Ok(Self {
            addresses: args.addresses,
            addresses_file: args.addresses_file,
            radius,
            foursquare_api_key: args.foursquare_api_key,
            nominatim_url: args
                .nominatim_url
                .unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_owned()),
            overpass_endpoints,
            geocode_interval,
        })
    }
}

/// Read one address per line, skipping blank lines.
pub(crate) fn read_addresses(path: &Path) -> Result<Vec<String>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadAddresses {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Runs a validated batch to completion.
pub(crate) trait AnalyseBackend {
    fn analyse(
        &self,
        addresses: &[String],
        radius: SearchRadius,
    ) -> Result<Vec<LocationResult>, CliError>;
}

impl<G, A, B> AnalyseBackend for BatchProcessor<G, A, B>
where
    G: GeocodeTransport,
    A: PlaceSearchTransport,
    B: TagQueryTransport,
{
    fn analyse(
        &self,
        addresses: &[String],
        radius: SearchRadius,
    ) -> Result<Vec<LocationResult>, CliError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;
        let results = runtime.block_on(self.process(addresses, radius))?;
        Ok(results)
    }
}

/// Builds the backend for the current analyse invocation.
pub(crate) trait AnalyseBackendBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Box<dyn AnalyseBackend>, CliError>;
}

pub(crate) struct DefaultAnalyseBackendBuilder;

impl AnalyseBackendBuilder for DefaultAnalyseBackendBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Box<dyn AnalyseBackend>, CliError> {
        if config.foursquare_api_key.is_none() {
            warn!("no Foursquare API key; shops, hospitals and services will be empty");
        }
        let geocoder = NominatimTransport::new(&NominatimConfig::new(config.nominatim_url.clone()))
            .map_err(|source| CliError::BuildClient {
                service: "nominatim",
                source,
            })?;
        let places =
            FoursquareTransport::new(&FoursquareConfig::new(config.foursquare_api_key.clone()))
                .map_err(|source| CliError::BuildClient {
                    service: "foursquare",
                    source,
                })?;
        let tags = OverpassTransport::new(&OverpassConfig::default()).map_err(|source| {
            CliError::BuildClient {
                service: "overpass",
                source,
            }
        })?;
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

pub(crate) fn run_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultAnalyseBackendBuilder;
    run_analyse_with(args, &builder, &mut stdout)
}

pub(crate) fn run_analyse_with(
    args: AnalyseArgs,
    builder: &dyn AnalyseBackendBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let results = execute_analyse(&config, builder)?;
    write_report(writer, &results)
}

pub(crate) fn execute_analyse(
    config: &AnalyseConfig,
    builder: &dyn AnalyseBackendBuilder,
) -> Result<Vec<LocationResult>, CliError> {
    let addresses = config.collect_addresses()?;
    let backend = builder.build(config)?;
    backend.analyse(&addresses, config.radius)
}

/// Printed payload: `{"results": [...]}`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    results: Vec<ReportEntry<'a>>,
}

/// One result, plus its rating when the address resolved.
#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    #[serde(flatten)]
    result: &'a LocationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating_band: Option<RatingBand>,
}

impl<'a> From<&'a LocationResult> for ReportEntry<'a> {
    fn from(result: &'a LocationResult) -> Self {
        let rating = result.location().map(|location| {
            location
                .poi_nearby()
                .map_or_else(|| rate(&PoiBundle::default()), rate)
        });
        Self {
            result,
            rating,
            rating_band: rating.map(Rating::band),
        }
    }
}

pub(crate) fn write_report(
    writer: &mut dyn Write,
    results: &[LocationResult],
) -> Result<(), CliError> {
    let report = Report {
        results: results.iter().map(ReportEntry::from).collect(),
    };
    let payload = serde_json::to_string_pretty(&report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AnalyseConfig, CliError> {
    let merged = AnalyseArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AnalyseConfig::try_from(merged)
}
