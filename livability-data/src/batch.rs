//! Sequential batch orchestration.

use livability_core::{
    BatchError, DEFAULT_MAX_BATCH_SIZE, GeocodeOutcome, LocationResult, ResolvedLocation,
    SearchRadius, validate_batch,
};
use log::info;

use crate::aggregate::PoiAggregator;
use crate::geocode::{GeocodeProvider, GeocodeTransport};
use crate::places::PlaceSearchTransport;
use crate::tags::TagQueryTransport;

/// Resolves a batch of addresses one at a time.
///
/// Each address is geocoded and, when found, enriched with POIs before the
/// next address starts. Results come back in input order, one per address.
#[derive(Debug)]
pub struct BatchProcessor<G, A, B> {
    geocoder: GeocodeProvider<G>,
    aggregator: PoiAggregator<A, B>,
    max_batch_size: usize,
}

impl<G, A, B> BatchProcessor<G, A, B>
where
    G: GeocodeTransport,
    A: PlaceSearchTransport,
    B: TagQueryTransport,
{
    /// Combine a geocoder and an aggregator, accepting batches of up to
    /// [`DEFAULT_MAX_BATCH_SIZE`] addresses.
    #[must_use]
    pub const fn new(geocoder: GeocodeProvider<G>, aggregator: PoiAggregator<A, B>) -> Self {
        Self {
            geocoder,
            aggregator,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Accept batches of up to `max_batch_size` addresses.
    #[must_use]
    pub const fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// The geocoding provider.
    #[must_use]
    pub const fn geocoder(&self) -> &GeocodeProvider<G> {
        &self.geocoder
    }

    /// The POI aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &PoiAggregator<A, B> {
        &self.aggregator
    }

    /// Largest accepted batch.
    #[must_use]
    pub const fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Resolve every address in `addresses`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the batch is empty, too large or contains
    /// a blank address. No upstream call is made in that case. Per-address
    /// failures are reported in the results instead.
    pub async fn process<S: AsRef<str>>(
        &self,
        addresses: &[S],
        radius: SearchRadius,
    ) -> Result<Vec<LocationResult>, BatchError> {
        validate_batch(addresses, self.max_batch_size)?;
        info!("processing {} addresses within {radius} m", addresses.len());

        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            results.push(self.process_one(address.as_ref(), radius).await);
        }
        Ok(results)
    }

    async fn process_one(&self, address: &str, radius: SearchRadius) -> LocationResult {
        match self.geocoder.resolve(address).await {
            GeocodeOutcome::Success(geocoded) => {
                let bundle = self.aggregator.aggregate(geocoded.coordinate, radius).await;
                LocationResult::resolved(address, ResolvedLocation::new(geocoded, radius, bundle))
            }
            GeocodeOutcome::NotFound => LocationResult::not_found(address),
            GeocodeOutcome::ProviderError { message } => LocationResult::failed(address, message),
        }
    }
}
