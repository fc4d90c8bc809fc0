//! Raster-cached reverse geocoding against administrative, marine and
//! biogeographic layers.
//!
//! A [`Geocoder`] holds a set of named layers. Each layer answers "which
//! regions lie within this uncertainty of a coordinate" first from a colour
//! raster cache and otherwise from its backend: a polygon oracle, a point
//! index, or a remote service.
//!
//! ```rust
//! use geocode::cache::Raster;
//! use geocode::layer::backend::{Intersection, IntersectionBackend, PolygonDataset, PolygonOracle};
//! use geocode::layer::features::{Feature, FeatureTable, LocationMapper};
//! use geocode::layer::{Layer, LayerRegistry, LayerSpec};
//! use geocode::prelude::*;
//! use std::sync::Arc;
//!
//! struct Ocean;
//!
//! impl PolygonOracle for Ocean {
//!     fn intersect(&self, _: f64, _: f64, _: f64) -> geocode::Result<Vec<Intersection>> {
//!         Ok(vec![Intersection::new(0, 0.0)])
//!     }
//! }
//!
//! let registry = LayerRegistry::new().register("Ocean", |_| {
//!     let features = FeatureTable::new(vec![Feature::new("1904", "Atlantic Ocean", None)]);
//!     let backend = IntersectionBackend::new(
//!         vec![PolygonDataset::new(Arc::new(Ocean), features)],
//!         LocationMapper::default(),
//!     );
//!     Ok(Layer::new(
//!         LayerSpec::new("Ocean", "http://marineregions.org/", 1),
//!         Raster::uniform(360, 180, 0x0000AA)?,
//!         backend.into(),
//!     ))
//! });
//!
//! let geocoder = GeocoderBuilder::new()
//!     .config(Config::default().with_default_layers(["Ocean"]))
//!     .registry(registry)
//!     .build()?;
//!
//! let locations = geocoder.get_default(-1.0, -1.0, Some(0.1), None)?;
//! assert_eq!(locations.len(), 1);
//! assert_eq!(locations[0].title(), "Atlantic Ocean");
//! # Ok::<(), geocode::GeocodeError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod compute;
pub mod config;
pub mod error;
pub mod geocoder;
pub mod layer;
pub mod storage;

pub use builder::GeocoderBuilder;
pub use config::{Config, LayerFailurePolicy, RemoteConfig};
pub use error::{GeocodeError, Result};
pub use geocoder::Geocoder;

pub use cache::{GeocodeService, PixelCache, Raster, ServiceCache};

pub use layer::{Layer, LayerRegistry, LayerResources, LayerSpec, StaticResources};

pub use storage::{JsonPointSource, MemoryPointSource, PointSource};

pub use geocode_types::location::Location;
pub use geocode_types::point::PointRecord;
pub use geocode_types::stats::CacheStats;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, GeocodeError, Geocoder, GeocoderBuilder, Result};

    pub use crate::{GeocodeService, ServiceCache};

    pub use crate::{LayerRegistry, StaticResources};

    pub use crate::{CacheStats, Location, PointRecord};
}
