//! The geocoder: a fixed set of layers queried together.

use crate::cache::front::GeocodeService;
use crate::compute::spatial::CalculatorPool;
use crate::compute::uncertainty::resolve_uncertainty;
use crate::compute::validation::{validate_coordinate, validate_uncertainty};
use crate::config::{Config, LayerFailurePolicy};
use crate::error::{GeocodeError, Result};
use crate::layer::{Layer, LayerContext, LayerRegistry, LayerResources};
use geocode_types::location::Location;
use geocode_types::stats::CacheStats;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reverse geocoder over the enabled layers.
///
/// Layers are built once by [`Geocoder::new`] and never change afterwards,
/// so a `Geocoder` can be shared between request threads behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use geocode::cache::Raster;
/// use geocode::layer::backend::{Intersection, IntersectionBackend, PolygonDataset, PolygonOracle};
/// use geocode::layer::features::{Feature, FeatureTable, LocationMapper};
/// use geocode::layer::{Layer, LayerRegistry, LayerSpec, StaticResources};
/// use geocode::{Config, Geocoder};
/// use std::sync::Arc;
///
/// struct Land;
///
/// impl PolygonOracle for Land {
///     fn intersect(&self, _: f64, _: f64, _: f64) -> geocode::Result<Vec<Intersection>> {
///         Ok(vec![Intersection::new(0, 0.0)])
///     }
/// }
///
/// let registry = LayerRegistry::new().register("Land", |_| {
///     let features = FeatureTable::new(vec![Feature::new("1", "Pangaea", None)]);
///     let backend = IntersectionBackend::new(
///         vec![PolygonDataset::new(Arc::new(Land), features)],
///         LocationMapper::default(),
///     );
///     Ok(Layer::new(
///         LayerSpec::new("Land", "https://example.org/", 1),
///         Raster::uniform(360, 180, 0x00AA00)?,
///         backend.into(),
///     ))
/// });
///
/// let config = Config::default().with_default_layers(["Land"]);
/// let geocoder = Geocoder::new(config, &registry, &StaticResources::new())?;
///
/// let locations = geocoder.get_default(10.0, 20.0, None, None)?;
/// assert_eq!(locations[0].title(), "Pangaea");
/// # Ok::<(), geocode::GeocodeError>(())
/// ```
#[derive(Debug)]
pub struct Geocoder {
    config: Config,
    layers: BTreeMap<String, Layer>,
    default_layers: Vec<String>,
    pool: Arc<CalculatorPool>,
}

impl Geocoder {
    /// Build every enabled layer of `registry`.
    ///
    /// Fails when the configuration is invalid, an enabled layer is not
    /// registered or cannot be built, nothing was loaded, or a default layer
    /// is not among the loaded ones.
    pub fn new(
        config: Config,
        registry: &LayerRegistry,
        resources: &dyn LayerResources,
    ) -> Result<Self> {
        config.validate().map_err(GeocodeError::Config)?;

        log::info!("Enabled layers: {:?}", config.enabled_layers);

        if let Some(unknown) = config
            .enabled_layers
            .iter()
            .find(|name| !registry.contains(name))
        {
            return Err(GeocodeError::Config(format!(
                "Layer {} is enabled, but no such layer is registered",
                unknown
            )));
        }

        let pool = Arc::new(CalculatorPool::new(config.calculator_pool_capacity));
        let ctx = LayerContext::new(&config, resources, Arc::clone(&pool));

        let mut layers = BTreeMap::new();
        for name in registry.names() {
            if !config.enabled_layers.is_empty() && !config.enabled_layers.iter().any(|n| n == name) {
                log::info!(
                    "Not loading {}, because it is not enabled in the configuration.",
                    name
                );
                continue;
            }

            let layer = registry.build(name, &ctx).inspect_err(|e| {
                log::error!("Error loading layer {}: {}", name, e);
            })?;
            layers.insert(layer.name().to_string(), layer);
        }

        if layers.is_empty() {
            return Err(GeocodeError::Config("No layers loaded!".to_string()));
        }

        log::info!("Available layers are {:?}", layers.keys().collect::<Vec<_>>());

        for name in &config.default_layers {
            if !layers.contains_key(name) {
                return Err(GeocodeError::Config(format!(
                    "Default layer {} is configured, but the layer doesn't exist",
                    name
                )));
            }
        }
        let default_layers = config.default_layers.clone();
        log::info!("Default layers are {:?}", default_layers);

        Ok(Self {
            config,
            layers,
            default_layers,
            pool,
        })
    }

    /// Locations near `(lat, lng)` from the requested layers, nearest first.
    ///
    /// The coordinate is assumed valid; see [`Geocoder::try_get`].
    ///
    /// # Arguments
    ///
    /// * `uncertainty_degrees` - search radius in degrees
    /// * `uncertainty_meters` - search radius in metres; wins over degrees
    /// * `layers` - layer names; empty means the default layers. Unknown
    ///   names are ignored and repeated names are queried once.
    pub fn get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>> {
        let uncertainty = resolve_uncertainty(lat, uncertainty_degrees, uncertainty_meters);
        let requested = if layers.is_empty() {
            self.default_layers.as_slice()
        } else {
            layers
        };

        for name in requested {
            if !self.layers.contains_key(name) {
                log::debug!("Ignoring unknown layer {}", name);
            }
        }

        let mut locations = Vec::new();
        for (name, layer) in &self.layers {
            if !requested.contains(name) {
                continue;
            }

            match layer.query(lat, lng, uncertainty) {
                Ok(found) => locations.extend(found),
                Err(e) => match self.config.layer_failure_policy {
                    LayerFailurePolicy::Propagate => return Err(e),
                    LayerFailurePolicy::Skip => {
                        log::warn!("Skipping layer {} for ({}, {}): {}", name, lat, lng, e);
                    }
                },
            }
        }

        locations.sort_by(Location::ranking_cmp);
        Ok(locations)
    }

    /// [`Geocoder::get`] after validating the coordinate and uncertainty.
    pub fn try_get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>> {
        validate_coordinate(lat, lng)?;
        validate_uncertainty(uncertainty_degrees, uncertainty_meters)?;
        self.get(lat, lng, uncertainty_degrees, uncertainty_meters, layers)
    }

    /// [`Geocoder::get`] against the default layers.
    pub fn get_default(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
    ) -> Result<Vec<Location>> {
        self.get(lat, lng, uncertainty_degrees, uncertainty_meters, &[])
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }

    pub fn default_layers(&self) -> &[String] {
        &self.default_layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calculator_pool(&self) -> &CalculatorPool {
        &self.pool
    }

    /// Cache counters of every layer.
    pub fn cache_stats(&self) -> BTreeMap<String, CacheStats> {
        self.layers
            .iter()
            .map(|(name, layer)| (name.clone(), layer.cache_stats()))
            .collect()
    }
}

impl GeocodeService for Geocoder {
    fn get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>> {
        Geocoder::get(self, lat, lng, uncertainty_degrees, uncertainty_meters, layers)
    }
}
