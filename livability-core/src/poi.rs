//! Points of interest, provider fragments and the merged POI bundle.
//!
//! Each provider contributes a fragment covering only the categories it
//! reports: the categorised place search yields shops, hospitals and
//! services; the tag query yields transport and schools. [`PoiBundle::merge`]
//! combines one of each into the five-category view consumers read.

use std::collections::HashSet;
use std::fmt;

/// Name given to places that carry no usable name.
pub const UNNAMED_POI: &str = "Unnamed";

/// The five POI categories a bundle reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PoiCategory {
    /// Public transport stops and stations.
    Transport,
    /// Schools, kindergartens and universities.
    Schools,
    /// Shops, supermarkets and pharmacies.
    Shops,
    /// Hospitals, clinics and medical centres.
    Hospitals,
    /// Banks, ATMs and similar services.
    Services,
}

impl PoiCategory {
    /// Every category in bundle order.
    pub const ALL: [Self; 5] = [
        Self::Transport,
        Self::Schools,
        Self::Shops,
        Self::Hospitals,
        Self::Services,
    ];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Schools => "schools",
            Self::Shops => "shops",
            Self::Hospitals => "hospitals",
            Self::Services => "services",
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider a POI was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PoiSource {
    /// Categorised commercial place search.
    Foursquare,
    /// Open-data tag query.
    Overpass,
}

impl PoiSource {
    /// Short prefix used to namespace cache keys.
    #[must_use]
    pub const fn cache_namespace(self) -> &'static str {
        match self {
            Self::Foursquare => "fsq",
            Self::Overpass => "osm",
        }
    }
}

/// A single point of interest near a query coordinate.
///
/// `distance_meters` is always measured from the query coordinate.
///
/// # Examples
///
/// ```
/// use livability_core::{PoiCategory, PoiItem, PoiSource, UNNAMED_POI};
///
/// let poi = PoiItem::new(None, 120, PoiCategory::Shops, PoiSource::Foursquare);
/// assert_eq!(poi.name, UNNAMED_POI);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoiItem {
    /// Display name, or [`UNNAMED_POI`] when the provider had none.
    pub name: String,
    /// Distance from the query coordinate in whole metres.
    #[cfg_attr(feature = "serde", serde(rename = "distance"))]
    pub distance_meters: u32,
    /// Category the item was classified into.
    pub category: PoiCategory,
    /// Provider that reported the item.
    pub source: PoiSource,
}

impl PoiItem {
    /// Construct an item, substituting [`UNNAMED_POI`] for a missing or
    /// blank name.
    #[must_use]
    pub fn new(
        name: Option<String>,
        distance_meters: u32,
        category: PoiCategory,
        source: PoiSource,
    ) -> Self {
        let resolved = name
            .filter(|candidate| !candidate.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_POI.to_owned());
        Self {
            name: resolved,
            distance_meters,
            category,
            source,
        }
    }

    /// Items from the same provider with equal names (ignoring case) in the
    /// same 10 m distance bucket are considered duplicates.
    fn duplicate_key(&self) -> (PoiSource, String, u32) {
        #[expect(
            clippy::integer_division,
            reason = "bucketing into whole 10 m steps, rounding half up"
        )]
        let bucket = self.distance_meters.saturating_add(5) / 10;
        (self.source, self.name.to_lowercase(), bucket)
    }
}

/// Sort `items` by ascending distance, drop duplicates and keep at most
/// `limit` of them.
///
/// Sorting is stable, so items at equal distance keep their provider order.
/// De-duplication runs before truncation so duplicates never use up slots.
///
/// # Examples
///
/// ```
/// use livability_core::{PoiCategory, PoiItem, PoiSource, rank_nearest};
///
/// let item = |name: &str, d| {
///     PoiItem::new(Some(name.into()), d, PoiCategory::Shops, PoiSource::Foursquare)
/// };
/// let ranked = rank_nearest(vec![item("B", 300), item("A", 100), item("a", 102)], 5);
/// let names: Vec<_> = ranked.iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, ["A", "B"]);
/// ```
#[must_use]
pub fn rank_nearest(mut items: Vec<PoiItem>, limit: usize) -> Vec<PoiItem> {
    items.sort_by_key(|item| item.distance_meters);
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.duplicate_key()));
    items.truncate(limit);
    items
}

fn nearest_first(mut items: Vec<PoiItem>) -> Vec<PoiItem> {
    items.sort_by_key(|item| item.distance_meters);
    items
}

/// Shops, hospitals and services reported by the categorised place search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceSearchFragment {
    /// Nearby shops.
    pub shops: Vec<PoiItem>,
    /// Nearby hospitals and clinics.
    pub hospitals: Vec<PoiItem>,
    /// Nearby banks and other services.
    pub services: Vec<PoiItem>,
}

impl PlaceSearchFragment {
    /// Bucket classified items and rank each bucket, keeping `limit` per
    /// category. Items in categories this fragment does not cover are
    /// ignored.
    #[must_use]
    pub fn from_items<I>(items: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = PoiItem>,
    {
        let mut fragment = Self::default();
        for item in items {
            match item.category {
                PoiCategory::Shops => fragment.shops.push(item),
                PoiCategory::Hospitals => fragment.hospitals.push(item),
                PoiCategory::Services => fragment.services.push(item),
                PoiCategory::Transport | PoiCategory::Schools => {}
            }
        }
        Self {
            shops: rank_nearest(fragment.shops, limit),
            hospitals: rank_nearest(fragment.hospitals, limit),
            services: rank_nearest(fragment.services, limit),
        }
    }

    /// Whether every category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty() && self.hospitals.is_empty() && self.services.is_empty()
    }
}

/// Transport stops and schools reported by the tag query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagQueryFragment {
    /// Nearby public transport stops.
    pub transport: Vec<PoiItem>,
    /// Nearby schools.
    pub schools: Vec<PoiItem>,
}

impl TagQueryFragment {
    /// Bucket classified items and rank each bucket, keeping `limit` per
    /// category. Items in categories this fragment does not cover are
    /// ignored.
    #[must_use]
    pub fn from_items<I>(items: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = PoiItem>,
    {
        let (transport, schools): (Vec<_>, Vec<_>) = items
            .into_iter()
            .filter(|item| matches!(item.category, PoiCategory::Transport | PoiCategory::Schools))
            .partition(|item| item.category == PoiCategory::Transport);
        Self {
            transport: rank_nearest(transport, limit),
            schools: rank_nearest(schools, limit),
        }
    }

    /// Whether every category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transport.is_empty() && self.schools.is_empty()
    }
}

/// POIs around one coordinate, grouped by category.
///
/// Every category is always present, possibly empty. Sequences are sorted
/// by ascending distance. A bundle is read-only once merged.
///
/// # Examples
///
/// ```
/// use livability_core::{PlaceSearchFragment, PoiBundle, PoiCategory, TagQueryFragment};
///
/// let bundle = PoiBundle::merge(PlaceSearchFragment::default(), TagQueryFragment::default());
/// assert_eq!(bundle.count(PoiCategory::Transport), 0);
/// assert_eq!(bundle.total(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoiBundle {
    transport: Vec<PoiItem>,
    schools: Vec<PoiItem>,
    shops: Vec<PoiItem>,
    hospitals: Vec<PoiItem>,
    services: Vec<PoiItem>,
}

impl PoiBundle {
    /// Combine the two provider fragments.
    ///
    /// Transport and schools come only from `tags`; shops, hospitals and
    /// services come only from `places`. Each category is re-sorted nearest
    /// first, keeping the fragment's order among equal distances.
    #[must_use]
    pub fn merge(places: PlaceSearchFragment, tags: TagQueryFragment) -> Self {
        Self {
            transport: nearest_first(tags.transport),
            schools: nearest_first(tags.schools),
            shops: nearest_first(places.shops),
            hospitals: nearest_first(places.hospitals),
            services: nearest_first(places.services),
        }
    }

    /// Items in `category`, nearest first.
    #[must_use]
    pub fn get(&self, category: PoiCategory) -> &[PoiItem] {
        match category {
            PoiCategory::Transport => &self.transport,
            PoiCategory::Schools => &self.schools,
            PoiCategory::Shops => &self.shops,
            PoiCategory::Hospitals => &self.hospitals,
            PoiCategory::Services => &self.services,
        }
    }

    /// Number of items in `category`.
    #[must_use]
    pub fn count(&self, category: PoiCategory) -> usize {
        self.get(category).len()
    }

    /// Per-category item counts in bundle order.
    #[must_use]
    pub fn counts(&self) -> [(PoiCategory, usize); 5] {
        PoiCategory::ALL.map(|category| (category, self.count(category)))
    }

    /// Total number of items across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        PoiCategory::ALL
            .iter()
            .map(|category| self.count(*category))
            .sum()
    }

    /// Whether every category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate over `(category, items)` pairs in bundle order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (PoiCategory, &[PoiItem])> + '_ {
        PoiCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn shop(name: &str, distance: u32) -> PoiItem {
        PoiItem::new(
            Some(name.to_owned()),
            distance,
            PoiCategory::Shops,
            PoiSource::Foursquare,
        )
    }

    fn stop(name: &str, distance: u32) -> PoiItem {
        PoiItem::new(
            Some(name.to_owned()),
            distance,
            PoiCategory::Transport,
            PoiSource::Overpass,
        )
    }

    #[fixture]
    fn places() -> PlaceSearchFragment {
        PlaceSearchFragment {
            shops: vec![shop("Albert", 80), shop("Billa", 150), shop("Lidl", 400)],
            hospitals: Vec::new(),
            services: Vec::new(),
        }
    }

    #[fixture]
    fn tags() -> TagQueryFragment {
        TagQueryFragment {
            transport: vec![stop("Muzeum", 120), stop("Můstek", 300)],
            schools: vec![PoiItem::new(
                Some("ZŠ Vodičkova".to_owned()),
                450,
                PoiCategory::Schools,
                PoiSource::Overpass,
            )],
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_owned()))]
    fn missing_names_become_unnamed(#[case] name: Option<String>) {
        let item = PoiItem::new(name, 10, PoiCategory::Shops, PoiSource::Foursquare);
        assert_eq!(item.name, UNNAMED_POI);
    }

    #[rstest]
    fn rank_sorts_ascending_and_truncates() {
        let items = vec![shop("C", 300), shop("A", 100), shop("B", 200)];
        let ranked = rank_nearest(items, 2);
        let distances: Vec<_> = ranked.iter().map(|p| p.distance_meters).collect();
        assert_eq!(distances, [100, 200]);
    }

    #[rstest]
    #[case(100, 104, 1)]
    #[case(100, 105, 2)]
    #[case(94, 96, 2)]
    fn rank_drops_duplicates_in_the_same_ten_metre_bucket(
        #[case] first: u32,
        #[case] second: u32,
        #[case] expected: usize,
    ) {
        let ranked = rank_nearest(vec![shop("Billa", first), shop("BILLA", second)], 5);
        assert_eq!(ranked.len(), expected);
    }

    #[rstest]
    fn rank_keeps_same_name_from_different_sources() {
        let mut other = shop("Muzeum", 100);
        other.source = PoiSource::Overpass;
        let ranked = rank_nearest(vec![shop("Muzeum", 100), other], 5);
        assert_eq!(ranked.len(), 2);
    }

    #[rstest]
    fn rank_deduplicates_before_truncating() {
        let items = vec![shop("A", 10), shop("a", 11), shop("B", 50)];
        let ranked = rank_nearest(items, 2);
        let names: Vec<_> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[rstest]
    fn place_fragment_buckets_and_ignores_foreign_categories() {
        let mut hospital = shop("Nemocnice", 900);
        hospital.category = PoiCategory::Hospitals;
        let fragment =
            PlaceSearchFragment::from_items(vec![shop("A", 20), hospital, stop("Tram", 5)], 5);
        assert_eq!(fragment.shops.len(), 1);
        assert_eq!(fragment.hospitals.len(), 1);
        assert!(fragment.services.is_empty());
    }

    #[rstest]
    fn tag_fragment_limits_each_category() {
        let stops = (0..15).map(|i| stop(&format!("Stop {i}"), i * 100));
        let fragment = TagQueryFragment::from_items(stops, 10);
        assert_eq!(fragment.transport.len(), 10);
        assert_eq!(fragment.transport[0].distance_meters, 0);
        assert!(fragment.schools.is_empty());
    }

    #[rstest]
    fn merge_takes_each_category_from_its_provider(
        places: PlaceSearchFragment,
        tags: TagQueryFragment,
    ) {
        let bundle = PoiBundle::merge(places, tags);
        assert_eq!(
            bundle.counts(),
            [
                (PoiCategory::Transport, 2),
                (PoiCategory::Schools, 1),
                (PoiCategory::Shops, 3),
                (PoiCategory::Hospitals, 0),
                (PoiCategory::Services, 0),
            ]
        );
        assert_eq!(bundle.total(), 6);
        assert!(!bundle.is_empty());
        assert!(
            bundle
                .get(PoiCategory::Transport)
                .iter()
                .all(|p| p.source == PoiSource::Overpass)
        );
    }

    #[rstest]
    fn empty_fragments_merge_into_an_empty_bundle() {
        let bundle = PoiBundle::merge(PlaceSearchFragment::default(), TagQueryFragment::default());
        assert!(bundle.is_empty());
        assert_eq!(bundle.iter().count(), 5);
    }

    #[rstest]
    fn merge_orders_hand_built_fragments_nearest_first() {
        let places = PlaceSearchFragment {
            shops: vec![shop("Far", 400), shop("Near", 50), shop("Middle", 200)],
            ..PlaceSearchFragment::default()
        };
        let tags = TagQueryFragment {
            transport: vec![stop("Second", 90), stop("First", 30), stop("Tie", 90)],
            schools: Vec::new(),
        };

        let bundle = PoiBundle::merge(places, tags);

        let shops: Vec<_> = bundle.shops.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(shops, ["Near", "Middle", "Far"]);
        let stops: Vec<_> = bundle.transport.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(stops, ["First", "Second", "Tie"]);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn bundle_serialises_every_category(places: PlaceSearchFragment, tags: TagQueryFragment) {
        let bundle = PoiBundle::merge(places, tags);
        let json = serde_json::to_value(&bundle).expect("bundle serialises");
        for category in PoiCategory::ALL {
            assert!(json.get(category.as_str()).is_some(), "missing {category}");
        }
        assert_eq!(json["shops"][0]["distance"], 80);
        assert_eq!(json["shops"][0]["source"], "foursquare");
    }
}
