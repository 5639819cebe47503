//! Concurrent fan-out to both POI providers.

use livability_core::{Coordinate, PoiBundle, SearchRadius};
use log::info;

use crate::places::{PlaceSearchProvider, PlaceSearchTransport};
use crate::tags::{TagQueryProvider, TagQueryTransport};

/// Queries both POI providers at once and merges their fragments.
///
/// A failing provider contributes an empty fragment; the other's results
/// are kept.
#[derive(Debug)]
pub struct PoiAggregator<A, B> {
    places: PlaceSearchProvider<A>,
    tags: TagQueryProvider<B>,
}

impl<A, B> PoiAggregator<A, B>
where
    A: PlaceSearchTransport,
    B: TagQueryTransport,
{
    /// Combine the two providers.
    #[must_use]
    pub const fn new(places: PlaceSearchProvider<A>, tags: TagQueryProvider<B>) -> Self {
        Self { places, tags }
    }

    /// The categorised search provider.
    #[must_use]
    pub const fn places(&self) -> &PlaceSearchProvider<A> {
        &self.places
    }

    /// The tag query provider.
    #[must_use]
    pub const fn tags(&self) -> &TagQueryProvider<B> {
        &self.tags
    }

    /// Gather every category around `centre`.
    ///
    /// Both lookups run concurrently, so the wall time is that of the
    /// slower one.
    pub async fn aggregate(&self, centre: Coordinate, radius: SearchRadius) -> PoiBundle {
        let (places, tags) = tokio::join!(
            self.places.fetch(centre, radius),
            self.tags.fetch(centre, radius)
        );
        let bundle = PoiBundle::merge(places.into_fragment(), tags.into_fragment());
        let counts: Vec<String> = bundle
            .counts()
            .iter()
            .map(|(category, count)| format!("{category}={count}"))
            .collect();
        info!("POIs around {centre}: {}", counts.join(", "));
        bundle
    }
}
