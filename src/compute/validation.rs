//! Validation for query coordinates and uncertainty.
//!
//! The geocoder core assumes valid input; callers at the edge (an HTTP
//! handler, a batch loader) run these checks first, or go through
//! [`Geocoder::try_get`](crate::geocoder::Geocoder::try_get).

use crate::error::{GeocodeError, Result};

/// Validates a query coordinate.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geocode::compute::validation::validate_coordinate;
///
/// assert!(validate_coordinate(55.68, 12.57).is_ok());
///
/// // Off world
/// assert!(validate_coordinate(95.0, 0.0).is_err());
/// assert!(validate_coordinate(0.0, -180.5).is_err());
/// ```
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() {
        return Err(GeocodeError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(GeocodeError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeocodeError::InvalidInput(format!(
            "Latitude off world, outside [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeocodeError::InvalidInput(format!(
            "Longitude off world, outside [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates optional uncertainty values: each must be finite and not negative.
///
/// # Examples
///
/// ```
/// use geocode::compute::validation::validate_uncertainty;
///
/// assert!(validate_uncertainty(None, Some(1000.0)).is_ok());
/// assert!(validate_uncertainty(Some(-1.0), None).is_err());
/// ```
pub fn validate_uncertainty(degrees: Option<f64>, meters: Option<f64>) -> Result<()> {
    for (value, unit) in [(degrees, "degrees"), (meters, "meters")] {
        if let Some(value) = value
            && !(value.is_finite() && value >= 0.0)
        {
            return Err(GeocodeError::InvalidInput(format!(
                "Uncertainty in {} must be finite and non-negative, got: {}",
                unit, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(validate_coordinate(40.7128, -74.0060).is_ok());
        assert!(validate_coordinate(-1.0, -1.0).is_ok());

        // Edge cases
        assert!(validate_coordinate(90.0, 0.0).is_ok());
        assert!(validate_coordinate(-90.0, 0.0).is_ok());
        assert!(validate_coordinate(0.0, 180.0).is_ok());
        assert!(validate_coordinate(0.0, -180.0).is_ok());
    }

    #[test]
    fn test_off_world() {
        assert!(validate_coordinate(95.0, 0.0).is_err());
        assert!(validate_coordinate(-90.1, 0.0).is_err());
        assert!(validate_coordinate(0.0, 180.1).is_err());
        assert!(validate_coordinate(0.0, -200.0).is_err());
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert!(validate_coordinate(f64::NAN, 0.0).is_err());
        assert!(validate_coordinate(0.0, f64::NAN).is_err());
        assert!(validate_coordinate(f64::INFINITY, 0.0).is_err());
        assert!(validate_coordinate(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_uncertainty() {
        assert!(validate_uncertainty(None, None).is_ok());
        assert!(validate_uncertainty(Some(0.0), Some(0.0)).is_ok());
        assert!(validate_uncertainty(Some(80.0), None).is_ok());

        assert!(validate_uncertainty(Some(f64::NAN), None).is_err());
        assert!(validate_uncertainty(None, Some(-5.0)).is_err());
        assert!(validate_uncertainty(None, Some(f64::INFINITY)).is_err());
    }
}
