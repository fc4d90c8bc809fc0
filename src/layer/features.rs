//! Attribute tables of polygon layers and their mapping to locations.
//!
//! A polygon oracle only knows candidate indices. The [`FeatureTable`] turns
//! an index into the feature's attributes, and a [`LocationMapper`] turns the
//! feature into one or more [`Location`]s according to the layer's
//! [`FeatureMapping`].

use super::LayerSpec;
use crate::error::{GeocodeError, Result};
use geocode_types::location::{Location, PlaceKey, split_iso_codes};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One level of an administrative hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureLevel {
    /// Empty when the feature has no subdivision at this level
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Attributes of one polygon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "isoCountryCode2Digit")]
    pub iso_country_code: Option<String>,
    /// Hierarchy levels, coarsest first
    #[serde(default)]
    pub levels: Vec<FeatureLevel>,
}

impl Feature {
    pub fn new(id: impl Into<String>, title: impl Into<String>, iso_country_code: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            iso_country_code: iso_country_code.map(str::to_string),
            levels: Vec::new(),
        }
    }

    pub fn with_level(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.levels.push(FeatureLevel {
            id: id.into(),
            title: title.into(),
        });
        self
    }
}

/// Candidate index to feature lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    features: Vec<Feature>,
}

impl FeatureTable {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Read a JSON array of features; array position is the candidate index.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(serde_json::from_reader(reader)?))
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl From<Vec<Feature>> for FeatureTable {
    fn from(features: Vec<Feature>) -> Self {
        Self::new(features)
    }
}

/// How a feature becomes locations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeatureMapping {
    /// One location carrying the feature's own attributes
    #[default]
    Plain,
    /// One location per space-separated ISO code, with `id_prefix`
    /// prepended to the id
    MultiIso { id_prefix: String },
    /// One location per non-empty hierarchy level, typed by `level_types`
    Hierarchy { level_types: Vec<String> },
}

/// Maps features of one layer to locations.
#[derive(Debug, Clone, Default)]
pub struct LocationMapper {
    mapping: FeatureMapping,
    iso_backfill: FxHashMap<String, String>,
}

impl LocationMapper {
    pub fn new(mapping: FeatureMapping) -> Self {
        Self {
            mapping,
            iso_backfill: FxHashMap::default(),
        }
    }

    /// Fill in `iso_country_code` for locations of feature `feature_id`
    /// that arrive without one. Used to patch known gaps in source data.
    pub fn with_iso_backfill(
        mut self,
        feature_id: impl Into<String>,
        iso_country_code: impl Into<String>,
    ) -> Self {
        self.iso_backfill
            .insert(feature_id.into(), iso_country_code.into());
        self
    }

    pub fn mapping(&self) -> &FeatureMapping {
        &self.mapping
    }

    /// Locations for `feature`, `distance` degrees from a query at `latitude`.
    pub fn map(
        &self,
        spec: &LayerSpec,
        feature: &Feature,
        distance: f64,
        latitude: f64,
    ) -> Vec<Location> {
        let iso = feature
            .iso_country_code
            .as_deref()
            .filter(|code| !code.trim().is_empty());

        let locations: Vec<Location> = match &self.mapping {
            FeatureMapping::Plain => vec![Location::new(
                feature.id.as_str(),
                spec.name.as_str(),
                spec.source.as_str(),
                feature.title.as_str(),
                iso,
            )],
            FeatureMapping::MultiIso { id_prefix } => {
                let id = format!("{}{}", id_prefix, feature.id);
                let codes = iso.map(split_iso_codes).unwrap_or_default();
                if codes.is_empty() {
                    vec![Location::new(
                        id.as_str(),
                        spec.name.as_str(),
                        spec.source.as_str(),
                        feature.title.as_str(),
                        None,
                    )]
                } else {
                    codes
                        .into_iter()
                        .map(|code| {
                            Location::new(
                                id.as_str(),
                                spec.name.as_str(),
                                spec.source.as_str(),
                                feature.title.as_str(),
                                Some(code),
                            )
                        })
                        .collect()
                }
            }
            FeatureMapping::Hierarchy { level_types } => feature
                .levels
                .iter()
                .zip(level_types)
                .filter(|(level, _)| !level.id.is_empty())
                .map(|(level, kind)| {
                    Location::new(
                        level.id.as_str(),
                        kind.as_str(),
                        spec.source.as_str(),
                        level.title.as_str(),
                        iso,
                    )
                })
                .collect(),
        };

        let backfill = self.iso_backfill.get(&feature.id);
        locations
            .into_iter()
            .map(|mut location| {
                if let Some(code) = backfill {
                    location.backfill_iso_country_code(code);
                }
                location.at_distance_degrees(distance, latitude)
            })
            .collect()
    }

    /// Map oracle candidates through `features`, then keep the nearest hit
    /// per place.
    pub(crate) fn resolve(
        &self,
        spec: &LayerSpec,
        features: &FeatureTable,
        candidates: &[super::backend::Intersection],
        latitude: f64,
        locations: &mut Vec<Location>,
    ) -> Result<()> {
        for candidate in candidates {
            let feature = features.get(candidate.index).ok_or_else(|| GeocodeError::Backend {
                layer: spec.name.clone(),
                message: format!(
                    "Candidate {} outside feature table of {} rows",
                    candidate.index,
                    features.len()
                ),
            })?;
            locations.extend(self.map(spec, feature, candidate.distance, latitude));
        }
        Ok(())
    }
}

/// Collapse locations for the same place to the nearest one, keeping the
/// order in which places were first seen.
///
/// A query circle can clip one multi-part polygon several times, and a
/// layer split over several files can report the same region from each.
pub fn dedup_nearest(locations: Vec<Location>) -> Vec<Location> {
    let mut positions: FxHashMap<PlaceKey, usize> = FxHashMap::default();
    let mut nearest: Vec<Location> = Vec::with_capacity(locations.len());

    for location in locations {
        match positions.get(&location.place_key()) {
            Some(&i) => {
                if location.distance_cmp(&nearest[i]).is_lt() {
                    nearest[i] = location;
                }
            }
            None => {
                positions.insert(location.place_key(), nearest.len());
                nearest.push(location);
            }
        }
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::uncertainty::UncertaintyPolicy;

    fn spec(name: &str) -> LayerSpec {
        LayerSpec::new(name, "https://example.org/", 4)
            .with_uncertainty(UncertaintyPolicy::Identity)
    }

    #[test]
    fn test_plain_mapping() {
        let mapper = LocationMapper::new(FeatureMapping::Plain);
        let feature = Feature::new("1", "North Sea", None);

        let locations = mapper.map(&spec("IHO"), &feature, 0.5, 0.0);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].id(), "1");
        assert_eq!(locations[0].kind(), "IHO");
        assert_eq!(locations[0].source(), "https://example.org/");
        assert_eq!(locations[0].distance_degrees(), 0.5);
    }

    #[test]
    fn test_multi_iso_mapping() {
        let mapper = LocationMapper::new(FeatureMapping::MultiIso {
            id_prefix: "http://marineregions.org/mrgid/".to_string(),
        });
        let feature = Feature::new("48961", "Joint regime area", Some("SD SS"));

        let locations = mapper.map(&spec("Political"), &feature, 0.0, 10.0);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id(), "http://marineregions.org/mrgid/48961");
        assert_eq!(locations[0].iso_country_code(), Some("SD"));
        assert_eq!(locations[1].iso_country_code(), Some("SS"));
    }

    #[test]
    fn test_multi_iso_without_code() {
        let mapper = LocationMapper::new(FeatureMapping::MultiIso {
            id_prefix: String::new(),
        });
        let feature = Feature::new("1", "High seas", None);

        let locations = mapper.map(&spec("Political"), &feature, 0.0, 0.0);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].iso_country_code(), None);
    }

    #[test]
    fn test_hierarchy_mapping_skips_empty_levels() {
        let mapper = LocationMapper::new(FeatureMapping::Hierarchy {
            level_types: vec!["GADM0".into(), "GADM1".into(), "GADM2".into(), "GADM3".into()],
        });
        let feature = Feature::new("DNK.1.1_1", "", Some("DK"))
            .with_level("DNK", "Denmark")
            .with_level("DNK.1_1", "Hovedstaden")
            .with_level("DNK.1.1_1", "Copenhagen")
            .with_level("", "");

        let locations = mapper.map(&spec("GADM"), &feature, 0.0, 55.0);
        let kinds: Vec<_> = locations.iter().map(Location::kind).collect();
        assert_eq!(kinds, vec!["GADM0", "GADM1", "GADM2"]);
        assert_eq!(locations[1].title(), "Hovedstaden");
        assert!(locations.iter().all(|l| l.iso_country_code() == Some("DK")));
    }

    #[test]
    fn test_iso_backfill_fills_only_missing() {
        let mapper = LocationMapper::new(FeatureMapping::Plain).with_iso_backfill("8363", "SJ");

        let missing = Feature::new("8363", "Jan Mayen", None);
        let present = Feature::new("8363", "Jan Mayen", Some("NO"));

        assert_eq!(
            mapper.map(&spec("Political"), &missing, 0.0, 0.0)[0].iso_country_code(),
            Some("SJ")
        );
        assert_eq!(
            mapper.map(&spec("Political"), &present, 0.0, 0.0)[0].iso_country_code(),
            Some("NO")
        );
    }

    #[test]
    fn test_iso_backfill_applies_to_every_level() {
        let mapper = LocationMapper::new(FeatureMapping::Hierarchy {
            level_types: vec!["GADM0".into(), "GADM1".into()],
        })
        .with_iso_backfill("XKO.1_1", "XK");
        let feature = Feature::new("XKO.1_1", "", Some(" "))
            .with_level("XKO", "Kosovo")
            .with_level("XKO.1_1", "Ferizaj");

        let locations = mapper.map(&spec("GADM"), &feature, 0.0, 42.0);
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.iso_country_code() == Some("XK")));
    }

    #[test]
    fn test_dedup_keeps_minimum_distance() {
        let far = Location::new("KE", "Political", "s", "Kenya", Some("KE")).at_distance_degrees(3.0, 0.0);
        let near = Location::new("KE", "Political", "s", "Kenya", Some("KE")).at_distance_degrees(1.2, 0.0);
        let other = Location::new("TZ", "Political", "s", "Tanzania", Some("TZ")).at_distance_degrees(2.0, 0.0);

        let result = dedup_nearest(vec![far, other, near]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id(), "KE");
        assert_eq!(result[0].distance_degrees(), 1.2);
        assert_eq!(result[1].id(), "TZ");
    }

    #[test]
    fn test_dedup_distinguishes_iso_codes() {
        let one = Location::new("1", "Political", "s", "Area", Some("SD"));
        let two = Location::new("1", "Political", "s", "Area", Some("SS"));
        assert_eq!(dedup_nearest(vec![one, two]).len(), 2);
    }

    #[test]
    fn test_feature_table_from_json() {
        let json = br#"[
            {"id": "1", "title": "Africa", "isoCountryCode2Digit": null},
            {"id": "DNK", "title": "Denmark", "isoCountryCode2Digit": "DK",
             "levels": [{"id": "DNK", "title": "Denmark"}]}
        ]"#;
        let table = FeatureTable::from_reader(&json[..]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().levels.len(), 1);
        assert!(table.get(2).is_none());
    }
}
