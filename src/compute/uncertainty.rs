//! Uncertainty resolution and per-layer adjustment.
//!
//! A query may carry its positional uncertainty in degrees, in metres, or not
//! at all. [`resolve_uncertainty`] turns that into a single search radius in
//! degrees, clamped to bounds that keep backend queries affordable. Layers may
//! then tighten the radius further with an [`UncertaintyPolicy`].

use geocode_types::units::meters_to_degrees;

pub use geocode_types::point::POLAR_LATITUDE;

/// Queries at or below this uncertainty may be answered from a layer raster.
pub const BITMAP_UNCERTAINTY_THRESHOLD: f64 = 0.05;

/// Smallest search radius, about 5.5 km at the equator. Absorbs the gaps
/// between land and sea in simplified layer data.
pub const MINIMUM_UNCERTAINTY_DEGREES: f64 = 0.05;

pub const MAXIMUM_UNCERTAINTY_DEGREES: f64 = 10.0;

/// Upper bound above [`POLAR_LATITUDE`], where a degree of longitude is short.
pub const MAXIMUM_POLAR_UNCERTAINTY_DEGREES: f64 = 60.0;

/// Resolve a query's uncertainty to a clamped radius in degrees.
///
/// Metres take precedence over degrees when both are given, and are converted
/// at the query latitude. With neither, [`MINIMUM_UNCERTAINTY_DEGREES`] is used.
///
/// # Examples
///
/// ```
/// use geocode::compute::uncertainty::resolve_uncertainty;
///
/// assert_eq!(resolve_uncertainty(10.0, None, None), 0.05);
/// assert_eq!(resolve_uncertainty(10.0, Some(15.0), None), 10.0);
/// assert_eq!(resolve_uncertainty(87.0, Some(45.0), None), 45.0);
/// assert_eq!(resolve_uncertainty(87.0, Some(75.0), None), 60.0);
/// ```
pub fn resolve_uncertainty(lat: f64, degrees: Option<f64>, meters: Option<f64>) -> f64 {
    let mut uncertainty = match (meters, degrees) {
        (Some(meters), _) => {
            let converted = meters_to_degrees(meters, lat);
            log::debug!("{}m uncertainty converted to {}°", meters, converted);
            converted
        }
        (None, Some(degrees)) => degrees,
        (None, None) => MINIMUM_UNCERTAINTY_DEGREES,
    };

    if uncertainty > MAXIMUM_UNCERTAINTY_DEGREES {
        if lat.abs() > POLAR_LATITUDE {
            if uncertainty > MAXIMUM_POLAR_UNCERTAINTY_DEGREES {
                log::debug!(
                    "Excessive polar uncertainty {}° clamped to {}°",
                    uncertainty,
                    MAXIMUM_POLAR_UNCERTAINTY_DEGREES
                );
                uncertainty = MAXIMUM_POLAR_UNCERTAINTY_DEGREES;
            }
        } else {
            log::debug!(
                "Excessive uncertainty {}° clamped to {}°",
                uncertainty,
                MAXIMUM_UNCERTAINTY_DEGREES
            );
            uncertainty = MAXIMUM_UNCERTAINTY_DEGREES;
        }
    }

    uncertainty.max(MINIMUM_UNCERTAINTY_DEGREES)
}

/// Step table for administrative hierarchies: `(minimum |latitude|, cap)`,
/// checked in order. Approximates a 250 km cap on the backend search radius.
pub const ADMINISTRATIVE_LATITUDE_STEPS: &[(f64, f64)] = &[
    (78.0, 10.0),
    (74.0, 8.0),
    (68.0, 6.0),
    (64.0, 5.0),
    (56.0, 4.0),
    (42.0, 3.0),
    (0.0, 2.5),
];

/// How a layer adjusts the search radius before querying its backend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UncertaintyPolicy {
    /// Use the radius as given
    #[default]
    Identity,
    /// Cap the radius by the first step whose latitude `|lat|` reaches
    LatitudeSteps(&'static [(f64, f64)]),
    /// Cap the radius at a fixed number of degrees
    Fixed(f64),
}

impl UncertaintyPolicy {
    /// Policy used by the administrative hierarchy layers.
    pub const fn administrative() -> Self {
        Self::LatitudeSteps(ADMINISTRATIVE_LATITUDE_STEPS)
    }

    pub fn adjust(&self, degrees: f64, latitude: f64) -> f64 {
        match self {
            Self::Identity => degrees,
            Self::LatitudeSteps(steps) => {
                let lat = latitude.abs();
                steps
                    .iter()
                    .find(|(from, _)| lat >= *from)
                    .map_or(degrees, |(_, cap)| degrees.min(*cap))
            }
            Self::Fixed(cap) => degrees.min(*cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uncertainty() {
        assert_eq!(resolve_uncertainty(10.0, None, None), MINIMUM_UNCERTAINTY_DEGREES);
    }

    #[test]
    fn test_raised_to_minimum() {
        assert_eq!(resolve_uncertainty(10.0, Some(0.0), None), 0.05);
        assert_eq!(resolve_uncertainty(10.0, Some(0.01), None), 0.05);
        assert_eq!(resolve_uncertainty(10.0, Some(0.2), None), 0.2);
    }

    #[test]
    fn test_clamped_to_maximum() {
        assert_eq!(resolve_uncertainty(10.0, Some(15.0), None), 10.0);
        assert_eq!(resolve_uncertainty(-85.0, Some(15.0), None), 10.0);
    }

    #[test]
    fn test_polar_clamp() {
        assert_eq!(resolve_uncertainty(87.0, Some(15.0), None), 15.0);
        assert_eq!(resolve_uncertainty(87.0, Some(60.0), None), 60.0);
        assert_eq!(resolve_uncertainty(87.0, Some(61.0), None), 60.0);
        assert_eq!(resolve_uncertainty(-89.0, Some(100.0), None), 60.0);
    }

    #[test]
    fn test_meters_take_precedence() {
        let degrees = resolve_uncertainty(0.0, Some(5.0), Some(111_319.491));
        assert!((degrees - 1.0).abs() < 1e-9);

        // 1 km at 60° is twice as many degrees as at the equator.
        let equator = resolve_uncertainty(0.0, None, Some(10_000.0));
        let north = resolve_uncertainty(60.0, None, Some(10_000.0));
        assert!((north / equator - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_meters_at_pole_are_clamped() {
        assert_eq!(resolve_uncertainty(90.0, None, Some(1000.0)), 60.0);
    }

    #[test]
    fn test_identity_policy() {
        assert_eq!(UncertaintyPolicy::Identity.adjust(7.5, 80.0), 7.5);
    }

    #[test]
    fn test_fixed_policy() {
        let policy = UncertaintyPolicy::Fixed(1.0);
        assert_eq!(policy.adjust(7.5, 0.0), 1.0);
        assert_eq!(policy.adjust(0.5, 0.0), 0.5);
    }

    #[test]
    fn test_administrative_steps() {
        let policy = UncertaintyPolicy::administrative();

        assert_eq!(policy.adjust(20.0, 80.0), 10.0);
        assert_eq!(policy.adjust(20.0, 75.0), 8.0);
        assert_eq!(policy.adjust(20.0, 70.0), 6.0);
        assert_eq!(policy.adjust(20.0, 65.0), 5.0);
        assert_eq!(policy.adjust(20.0, 60.0), 4.0);
        assert_eq!(policy.adjust(20.0, 50.0), 3.0);
        assert_eq!(policy.adjust(20.0, 10.0), 2.5);

        // Southern hemisphere uses the same bands.
        assert_eq!(policy.adjust(20.0, -70.0), 6.0);

        // Never raises the radius.
        assert_eq!(policy.adjust(0.1, 80.0), 0.1);
    }
}
