//! Degree/metre conversions using a spherical approximation of the Earth.

/// Metres per degree of longitude at the equator.
pub const METERS_PER_DEGREE: f64 = 111_319.491;

/// Metres spanned by one degree of longitude at `latitude`.
#[inline]
pub fn meters_per_degree_at(latitude: f64) -> f64 {
    METERS_PER_DEGREE * latitude.to_radians().cos()
}

/// Converts a distance in degrees to metres at `latitude`.
///
/// # Examples
///
/// ```
/// use geocode_types::units::{degrees_to_meters, METERS_PER_DEGREE};
///
/// assert_eq!(degrees_to_meters(1.0, 0.0), METERS_PER_DEGREE);
/// ```
#[inline]
pub fn degrees_to_meters(degrees: f64, latitude: f64) -> f64 {
    degrees * meters_per_degree_at(latitude)
}

/// Converts a distance in metres to degrees at `latitude`.
///
/// Diverges towards the poles, where a degree of longitude shrinks to nothing.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    meters / meters_per_degree_at(latitude)
}
