//! Livability rating derived from a POI bundle.
//!
//! Each category scores `min(count, saturation) / saturation * 10`, so a
//! category reaches its maximum at `saturation` POIs and grows linearly
//! below that. The rating is the weighted mean of the five category scores.
//! Ratings are recomputed on demand and never stored.

use std::fmt;

use crate::{PoiBundle, PoiCategory};

/// Highest possible rating.
pub const MAX_RATING: f64 = 10.0;

/// Category weights and the per-category saturation count.
///
/// The defaults are transport 2.5, schools 2.0, shops 2.0, hospitals 1.5,
/// services 2.0 with saturation at 10 POIs.
///
/// # Examples
///
/// ```
/// use livability_core::{PoiBundle, RatingWeights};
///
/// let weights = RatingWeights {
///     transport: 5.0,
///     ..RatingWeights::default()
/// };
/// assert_eq!(weights.rate(&PoiBundle::default()).value(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingWeights {
    /// Weight of public transport.
    pub transport: f64,
    /// Weight of schools.
    pub schools: f64,
    /// Weight of shops.
    pub shops: f64,
    /// Weight of hospitals.
    pub hospitals: f64,
    /// Weight of services.
    pub services: f64,
    /// POI count at which a category reaches its maximum score.
    pub saturation: u32,
}

impl Default for RatingWeights {
    fn default() -> Self {
        Self {
            transport: 2.5,
            schools: 2.0,
            shops: 2.0,
            hospitals: 1.5,
            services: 2.0,
            saturation: 10,
        }
    }
}

impl RatingWeights {
    /// Weight applied to `category`.
    #[must_use]
    pub const fn weight(&self, category: PoiCategory) -> f64 {
        match category {
            PoiCategory::Transport => self.transport,
            PoiCategory::Schools => self.schools,
            PoiCategory::Shops => self.shops,
            PoiCategory::Hospitals => self.hospitals,
            PoiCategory::Services => self.services,
        }
    }

    /// Score a single category from its POI count, in `0.0..=10.0`.
    #[must_use]
    pub fn category_score(&self, count: usize) -> f64 {
        let saturation = self.saturation.max(1);
        let capped = u32::try_from(count).map_or(saturation, |n| n.min(saturation));
        f64::from(capped) * MAX_RATING / f64::from(saturation)
    }

    /// Rate `bundle` with these weights.
    ///
    /// Categories are summed in a fixed order, so identical bundles yield
    /// bit-identical ratings. Negative or non-finite weights count as zero;
    /// when every weight is zero the rating is zero.
    #[must_use]
    pub fn rate(&self, bundle: &PoiBundle) -> Rating {
        let (weighted, total_weight) = PoiCategory::ALL.iter().fold(
            (0.0_f64, 0.0_f64),
            |(sum, weights), category| {
                let weight = sanitise_weight(self.weight(*category));
                let score = self.category_score(bundle.count(*category));
                (sum + score * weight, weights + weight)
            },
        );
        if total_weight <= 0.0 {
            return Rating(0.0);
        }
        Rating::clamped(weighted / total_weight)
    }
}

const fn sanitise_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Rate `bundle` with the default weights.
///
/// # Examples
///
/// ```
/// use livability_core::{PoiBundle, rate};
///
/// assert_eq!(rate(&PoiBundle::default()).value(), 0.0);
/// ```
#[must_use]
pub fn rate(bundle: &PoiBundle) -> Rating {
    RatingWeights::default().rate(bundle)
}

/// A livability rating in `0.0..=10.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Rating(f64);

impl Rating {
    const fn clamped(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, MAX_RATING))
        } else {
            Self(0.0)
        }
    }

    /// The numeric rating.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Qualitative band for display.
    #[must_use]
    pub const fn band(self) -> RatingBand {
        match self.0 {
            v if v >= 8.0 => RatingBand::Excellent,
            v if v >= 6.0 => RatingBand::Good,
            v if v >= 4.0 => RatingBand::Average,
            _ => RatingBand::Weak,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Coarse grouping of ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum RatingBand {
    /// 8 and above.
    Excellent,
    /// From 6 up to 8.
    Good,
    /// From 4 up to 6.
    Average,
    /// Below 4.
    Weak,
}

impl RatingBand {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::Weak => "weak",
        }
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlaceSearchFragment, PoiItem, PoiSource, TagQueryFragment};
    use rstest::rstest;

    fn items(category: PoiCategory, source: PoiSource, count: u32) -> Vec<PoiItem> {
        (0..count)
            .map(|i| PoiItem::new(Some(format!("{category} {i}")), i * 25, category, source))
            .collect()
    }

    fn bundle(counts: [u32; 5]) -> PoiBundle {
        let [transport, schools, shops, hospitals, services] = counts;
        PoiBundle::merge(
            PlaceSearchFragment {
                shops: items(PoiCategory::Shops, PoiSource::Foursquare, shops),
                hospitals: items(PoiCategory::Hospitals, PoiSource::Foursquare, hospitals),
                services: items(PoiCategory::Services, PoiSource::Foursquare, services),
            },
            TagQueryFragment {
                transport: items(PoiCategory::Transport, PoiSource::Overpass, transport),
                schools: items(PoiCategory::Schools, PoiSource::Overpass, schools),
            },
        )
    }

    #[rstest]
    fn empty_bundle_rates_zero() {
        assert_eq!(rate(&PoiBundle::default()).value(), 0.0);
    }

    #[rstest]
    #[case([10, 10, 10, 10, 10])]
    #[case([25, 12, 10, 40, 11])]
    fn saturated_bundle_rates_ten(#[case] counts: [u32; 5]) {
        assert_eq!(rate(&bundle(counts)).value(), MAX_RATING);
    }

    #[rstest]
    fn mixed_bundle_matches_weighted_mean() {
        let rating = rate(&bundle([2, 1, 3, 0, 0]));
        assert!((rating.value() - 1.3).abs() < 1e-9, "got {rating}");
    }

    #[rstest]
    fn identical_bundles_rate_identically() {
        let a = rate(&bundle([3, 7, 1, 2, 9])).value();
        let b = rate(&bundle([3, 7, 1, 2, 9])).value();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(4, 4.0)]
    #[case(10, 10.0)]
    #[case(usize::MAX, 10.0)]
    fn category_score_is_linear_then_flat(#[case] count: usize, #[case] expected: f64) {
        assert_eq!(RatingWeights::default().category_score(count), expected);
    }

    #[rstest]
    fn zero_weights_rate_zero() {
        let weights = RatingWeights {
            transport: 0.0,
            schools: 0.0,
            shops: 0.0,
            hospitals: 0.0,
            services: 0.0,
            saturation: 10,
        };
        assert_eq!(weights.rate(&bundle([5, 5, 5, 5, 5])).value(), 0.0);
    }

    #[rstest]
    fn zero_saturation_is_treated_as_one() {
        let weights = RatingWeights {
            saturation: 0,
            ..RatingWeights::default()
        };
        assert_eq!(weights.rate(&bundle([1, 1, 1, 1, 1])).value(), MAX_RATING);
    }

    #[rstest]
    #[case(9.1, RatingBand::Excellent)]
    #[case(8.0, RatingBand::Excellent)]
    #[case(6.5, RatingBand::Good)]
    #[case(4.0, RatingBand::Average)]
    #[case(1.3, RatingBand::Weak)]
    fn bands_follow_thresholds(#[case] value: f64, #[case] band: RatingBand) {
        assert_eq!(Rating::clamped(value).band(), band);
    }
}
