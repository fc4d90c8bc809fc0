//! Geocoder builder
//!
//! This module provides a builder pattern for assembling a geocoder from a
//! configuration, a layer registry and the resources its layers load from.

use crate::config::Config;
use crate::error::Result;
use crate::geocoder::Geocoder;
use crate::layer::{LayerRegistry, LayerResources, StaticResources};
use std::path::PathBuf;

/// Builder for a [`Geocoder`].
///
/// Defaults to the built-in layers, the default configuration and no
/// registered resources, so rasters are looked up under the raster root.
pub struct GeocoderBuilder {
    config: Config,
    registry: LayerRegistry,
    resources: Option<Box<dyn LayerResources>>,
}

impl GeocoderBuilder {
    /// Create a new builder with the built-in layers.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            registry: LayerRegistry::builtin(),
            resources: None,
        }
    }

    /// Set the geocoder configuration (enabled and default layers, etc.).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Directory holding the layer rasters.
    pub fn raster_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config = self.config.with_raster_root(root);
        self
    }

    /// Replace the layer registry.
    pub fn registry(mut self, registry: LayerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the provider of polygon datasets, point records and rasters.
    pub fn resources<R: LayerResources + 'static>(mut self, resources: R) -> Self {
        self.resources = Some(Box::new(resources));
        self
    }

    /// Build the geocoder, loading every enabled layer.
    pub fn build(self) -> Result<Geocoder> {
        match self.resources {
            Some(resources) => Geocoder::new(self.config, &self.registry, resources.as_ref()),
            None => Geocoder::new(self.config, &self.registry, &StaticResources::new()),
        }
    }
}

impl Default for GeocoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GeocoderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("resources", &self.resources.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::raster::{EMPTY, Raster};
    use crate::error::GeocodeError;
    use crate::layer::backend::{Intersection, PolygonDataset, PolygonOracle};
    use crate::layer::features::FeatureTable;
    use std::sync::Arc;

    struct Nowhere;

    impl PolygonOracle for Nowhere {
        fn intersect(&self, _: f64, _: f64, _: f64) -> Result<Vec<Intersection>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_builder_default() {
        let builder = GeocoderBuilder::new();
        assert!(builder.resources.is_none());
        assert_eq!(builder.registry.len(), 8);
    }

    #[test]
    fn test_builder_without_resources_fails() {
        let result = GeocoderBuilder::new()
            .config(Config::default().with_enabled_layers(["Continent"]))
            .build();
        assert!(matches!(result, Err(GeocodeError::Config(_))));
    }

    #[test]
    fn test_builder_with_resources() {
        let resources = StaticResources::new()
            .with_raster("Continent", Raster::uniform(8, 4, EMPTY).unwrap())
            .with_dataset(
                "Continent",
                0,
                PolygonDataset::new(Arc::new(Nowhere), FeatureTable::default()),
            );

        let geocoder = GeocoderBuilder::new()
            .config(
                Config::default()
                    .with_enabled_layers(["Continent"])
                    .with_default_layers(["Continent"]),
            )
            .resources(resources)
            .build()
            .unwrap();

        assert_eq!(geocoder.layer_names(), vec!["Continent"]);
        assert!(geocoder.get_default(0.0, 0.0, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_builder_raster_root() {
        let builder = GeocoderBuilder::new().raster_root("/srv/geocode/rasters");
        assert_eq!(
            builder.config.raster_root,
            Some(PathBuf::from("/srv/geocode/rasters"))
        );
    }
}
