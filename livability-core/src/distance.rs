//! Great-circle distance between two coordinates.

use geo::Coord;

use crate::Coordinate;

/// Mean Earth radius used by the haversine formula, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between `a` and `b` in metres.
///
/// The result is finite and non-negative for any pair of valid coordinates.
///
/// # Examples
///
/// ```
/// use livability_core::{Coordinate, distance_meters};
///
/// # fn main() -> Result<(), livability_core::CoordinateError> {
/// let here = Coordinate::new(50.0880, 14.4208)?;
/// assert_eq!(distance_meters(here, here), 0.0);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    haversine(a.into(), b.into())
}

/// Haversine over `geo` coordinates, `x` being longitude and `y` latitude.
fn haversine(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let phi_a = a.y.to_radians();
    let phi_b = b.y.to_radians();
    let delta_phi = (b.y - a.y).to_radians();
    let delta_lambda = (b.x - a.x).to_radians();

    // Rounding can push the chord term marginally past 1 for antipodal points.
    let half_chord = ((delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_METERS * angle
}

/// Distance rounded to whole metres, saturating at `u32::MAX`.
#[must_use]
pub fn rounded_distance_meters(a: Coordinate, b: Coordinate) -> u32 {
    round_meters(distance_meters(a, b))
}

/// Round a distance to whole metres.
///
/// Negative and non-finite inputs become zero; values beyond `u32::MAX`
/// saturate.
#[must_use]
pub fn round_meters(meters: f64) -> u32 {
    if !meters.is_finite() || meters <= 0.0 {
        return 0;
    }
    let rounded = meters.round();
    if rounded >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is rounded, positive and below u32::MAX"
    )]
    let whole = rounded as u32;
    whole
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_2;

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("test coordinates are valid")
    }

    #[rstest]
    fn identical_points_are_zero_apart() {
        let point = coordinate(50.0880, 14.4208);
        assert_eq!(distance_meters(point, point), 0.0);
    }

    #[rstest]
    fn equator_to_pole_is_a_quarter_circumference() {
        let distance = distance_meters(coordinate(0.0, 0.0), coordinate(90.0, 0.0));
        let expected = EARTH_RADIUS_METERS * FRAC_PI_2;
        assert!((distance - expected).abs() < 1e-6, "got {distance}");
    }

    #[rstest]
    fn prague_to_brno_is_roughly_185_km() {
        let prague = coordinate(50.0755, 14.4378);
        let brno = coordinate(49.1951, 16.6068);
        let distance = distance_meters(prague, brno);
        assert!((184_000.0..186_000.0).contains(&distance), "got {distance}");
    }

    #[rstest]
    fn distance_is_symmetric() {
        let a = coordinate(50.0880, 14.4208);
        let b = coordinate(50.0912, 14.4150);
        assert_eq!(distance_meters(a, b), distance_meters(b, a));
    }

    #[rstest]
    fn antipodal_points_stay_finite() {
        let distance = distance_meters(coordinate(0.0, 0.0), coordinate(0.0, 180.0));
        assert!(distance.is_finite());
        assert!(distance > 0.0);
    }

    #[rstest]
    fn rounding_produces_whole_metres() {
        let a = coordinate(50.0880, 14.4208);
        let b = coordinate(50.0890, 14.4208);
        let rounded = rounded_distance_meters(a, b);
        assert_eq!(f64::from(rounded), distance_meters(a, b).round());
    }

    #[rstest]
    #[case(-3.0, 0)]
    #[case(f64::NAN, 0)]
    #[case(12.5, 13)]
    #[case(1e12, u32::MAX)]
    fn round_meters_saturates(#[case] meters: f64, #[case] expected: u32) {
        assert_eq!(round_meters(meters), expected);
    }
}
