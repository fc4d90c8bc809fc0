//! Layers: named region sources combining a raster cache with a backend.
//!
//! ```rust
//! use geocode::cache::Raster;
//! use geocode::layer::{Layer, LayerSpec};
//! use geocode::layer::backend::{Intersection, IntersectionBackend, PolygonDataset, PolygonOracle};
//! use geocode::layer::features::{Feature, FeatureTable, LocationMapper};
//! use std::sync::Arc;
//!
//! struct Everywhere;
//!
//! impl PolygonOracle for Everywhere {
//!     fn intersect(&self, _: f64, _: f64, _: f64) -> geocode::Result<Vec<Intersection>> {
//!         Ok(vec![Intersection::new(0, 0.0)])
//!     }
//! }
//!
//! let features = FeatureTable::new(vec![Feature::new("1", "Earth", None)]);
//! let backend = IntersectionBackend::new(
//!     vec![PolygonDataset::new(Arc::new(Everywhere), features)],
//!     LocationMapper::default(),
//! );
//! let layer = Layer::new(
//!     LayerSpec::new("Planet", "https://example.org/", 1),
//!     Raster::uniform(360, 180, 0x123456)?,
//!     backend.into(),
//! );
//!
//! let locations = layer.query(10.0, 10.0, 0.05)?;
//! assert_eq!(locations[0].title(), "Earth");
//! # Ok::<(), geocode::GeocodeError>(())
//! ```

pub mod backend;
pub mod features;
pub mod registry;
pub mod remote;
pub mod resources;

use crate::cache::pixel::{Outcome, PixelCache};
use crate::cache::raster::Raster;
use crate::compute::uncertainty::{BITMAP_UNCERTAINTY_THRESHOLD, UncertaintyPolicy};
use crate::error::Result;
use backend::Backend;
use geocode_types::location::Location;
use geocode_types::stats::CacheStats;

pub use registry::{LayerContext, LayerRegistry};
pub use resources::{LayerResources, StaticResources};

/// Fixed configuration of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Layer name, also the `type` of its locations
    pub name: String,
    /// Provenance given to its locations
    pub source: String,
    /// Largest result a raster colour may be bound to
    pub max_locations: usize,
    /// Smallest search radius of point layers
    pub minimum_distance_cutoff_meters: f64,
    pub uncertainty: UncertaintyPolicy,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, source: impl Into<String>, max_locations: usize) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            max_locations,
            minimum_distance_cutoff_meters: 0.0,
            uncertainty: UncertaintyPolicy::Identity,
        }
    }

    pub fn with_minimum_distance_cutoff_meters(mut self, meters: f64) -> Self {
        self.minimum_distance_cutoff_meters = meters;
        self
    }

    pub fn with_uncertainty(mut self, policy: UncertaintyPolicy) -> Self {
        self.uncertainty = policy;
        self
    }
}

/// A named region source.
///
/// Layers are built once at startup and shared by every request thread.
#[derive(Debug)]
pub struct Layer {
    spec: LayerSpec,
    cache: PixelCache,
    backend: Backend,
}

impl Layer {
    pub fn new(spec: LayerSpec, raster: Raster, backend: Backend) -> Self {
        let cache = PixelCache::new(spec.name.clone(), raster, spec.max_locations);
        Self {
            spec,
            cache,
            backend,
        }
    }

    /// Log cache and backend counters every `interval` queries.
    pub fn with_log_interval(self, interval: u64) -> Self {
        let Self {
            spec,
            cache,
            mut backend,
        } = self;
        backend.set_log_interval(interval);
        Self {
            spec,
            cache: cache.with_log_interval(interval),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn source(&self) -> &str {
        &self.spec.source
    }

    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Layer-specific search radius for a query at `latitude`.
    pub fn adjust_uncertainty(&self, degrees: f64, latitude: f64) -> f64 {
        self.spec.uncertainty.adjust(degrees, latitude)
    }

    /// Regions of this layer within `uncertainty` degrees of `(lat, lng)`.
    ///
    /// Queries at or below [`BITMAP_UNCERTAINTY_THRESHOLD`] try the raster
    /// first: a bound colour or an empty pixel answers without touching the
    /// backend, and a backend answer for an unbound colour is stored.
    pub fn query(&self, lat: f64, lng: f64, uncertainty: f64) -> Result<Vec<Location>> {
        let use_cache = uncertainty <= BITMAP_UNCERTAINTY_THRESHOLD;

        if use_cache {
            match self.cache.lookup(lat, lng) {
                Outcome::Hit(locations) => return Ok(locations),
                Outcome::Empty => return Ok(Vec::new()),
                Outcome::Border | Outcome::Miss => {}
            }
        }

        let locations = self.query_backend(lat, lng, self.adjust_uncertainty(uncertainty, lat))?;

        if use_cache {
            self.cache.store(lat, lng, &locations);
        }

        Ok(locations)
    }

    /// Ask the backend directly, bypassing the cache.
    pub fn query_backend(&self, lat: f64, lng: f64, uncertainty: f64) -> Result<Vec<Location>> {
        self.backend.query(&self.spec, lat, lng, uncertainty)
    }
}
