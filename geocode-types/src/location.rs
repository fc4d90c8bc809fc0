use crate::units::{degrees_to_meters, meters_to_degrees};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A region or point that matched a reverse geocoding query.
///
/// Locations are value objects built at query time. The only mutation allowed
/// after construction is [`Location::backfill_iso_country_code`], which fills a
/// missing country code and never overwrites an existing one.
///
/// # Examples
///
/// ```
/// use geocode_types::location::Location;
///
/// let nearer = Location::new("EC", "EEZ", "EEZ", "EC", Some("EC"));
/// let further = Location::new("EC", "Political", "Political", "EC", Some("EC"))
///     .at_distance_degrees(0.0158, 0.0);
///
/// assert!(nearer.ranking_cmp(&further).is_lt());
/// assert!(nearer.same_place(&further));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    source: String,
    title: String,
    iso_country_code_2_digit: Option<String>,
    #[serde(rename = "distance")]
    distance_degrees: f64,
    distance_meters: f64,
}

/// Deduplication key of a [`Location`]: its id and ISO country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceKey {
    pub id: String,
    pub iso_country_code: Option<String>,
}

impl Location {
    /// Create a location at zero distance from the query point.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of the region within its source
    /// * `kind` - Name of the layer (or hierarchy level) that produced it
    /// * `source` - Provenance of the data, usually a URL
    /// * `title` - Human-readable name
    /// * `iso_country_code` - ISO 3166-1 alpha-2 code, if known
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        source: impl Into<String>,
        title: impl Into<String>,
        iso_country_code: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            source: source.into(),
            title: title.into(),
            iso_country_code_2_digit: iso_country_code.map(str::to_string),
            distance_degrees: 0.0,
            distance_meters: 0.0,
        }
    }

    /// Return this location placed `degrees` from the query point, deriving the
    /// distance in metres at the query `latitude`.
    pub fn at_distance_degrees(mut self, degrees: f64, latitude: f64) -> Self {
        self.distance_degrees = degrees;
        self.distance_meters = degrees_to_meters(degrees, latitude);
        self
    }

    /// Return this location placed `meters` from the query point, deriving the
    /// distance in degrees at the query `latitude`.
    pub fn at_distance_meters(mut self, meters: f64, latitude: f64) -> Self {
        self.distance_meters = meters;
        self.distance_degrees = meters_to_degrees(meters, latitude);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Layer name (or hierarchy level) that produced this location.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn iso_country_code(&self) -> Option<&str> {
        self.iso_country_code_2_digit.as_deref()
    }

    pub fn distance_degrees(&self) -> f64 {
        self.distance_degrees
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    /// Fill in a missing ISO country code. Returns `true` if the code was set.
    pub fn backfill_iso_country_code(&mut self, iso_country_code: &str) -> bool {
        if self.iso_country_code_2_digit.is_some() {
            return false;
        }
        self.iso_country_code_2_digit = Some(iso_country_code.to_string());
        true
    }

    pub fn place_key(&self) -> PlaceKey {
        PlaceKey {
            id: self.id.clone(),
            iso_country_code: self.iso_country_code_2_digit.clone(),
        }
    }

    /// Two locations are the same place when their id and ISO code match.
    pub fn same_place(&self, other: &Location) -> bool {
        self.id == other.id && self.iso_country_code_2_digit == other.iso_country_code_2_digit
    }

    /// Compare by distance in metres only.
    pub fn distance_cmp(&self, other: &Location) -> Ordering {
        self.distance_meters.total_cmp(&other.distance_meters)
    }

    /// Ranking order: distance in metres, then layer name, then id.
    pub fn ranking_cmp(&self, other: &Location) -> Ordering {
        self.distance_cmp(other)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Split a space-separated multi-value ISO code string into its codes.
///
/// ```
/// use geocode_types::location::split_iso_codes;
///
/// assert_eq!(split_iso_codes("SD SS"), vec!["SD", "SS"]);
/// assert!(split_iso_codes("  ").is_empty());
/// ```
pub fn split_iso_codes(codes: &str) -> Vec<&str> {
    codes.split_whitespace().collect()
}
