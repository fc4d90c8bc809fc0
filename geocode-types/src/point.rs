use serde::{Deserialize, Serialize};

/// A named point loaded into a point layer, such as a country or province centroid.
///
/// # Examples
///
/// ```
/// use geocode_types::point::PointRecord;
///
/// let copenhagen = PointRecord::new("DK-84", "Capital Region", "centroids", Some("DK"), 55.68, 12.57);
/// assert!(!copenhagen.is_polar());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRecord {
    pub id: String,
    pub title: String,
    pub source: String,
    #[serde(rename = "isoCountryCode2Digit", default)]
    pub iso_country_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Latitude beyond which degree-based indexing stops being trustworthy.
pub const POLAR_LATITUDE: f64 = 85.0;

impl PointRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        iso_country_code: Option<&str>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
            iso_country_code: iso_country_code.map(str::to_string),
            latitude,
            longitude,
        }
    }

    /// Whether the point lies above [`POLAR_LATITUDE`] in either hemisphere.
    pub fn is_polar(&self) -> bool {
        self.latitude.abs() > POLAR_LATITUDE
    }
}
