//! Static table of the layers the geocoder knows how to build.
//!
//! Each entry maps a layer name to a constructor closure. The geocoder picks
//! entries by name from the `enabled_layers` configuration at startup; there
//! is no runtime discovery.

use super::backend::{Backend, IntersectionBackend, PointIndexBackend, RemoteBackend};
use super::features::{FeatureMapping, LocationMapper};
use super::remote::{HttpClient, RemoteOracle};
use super::resources::LayerResources;
use super::{Layer, LayerSpec};
use crate::cache::raster::{BORDER, Raster};
use crate::compute::spatial::{CalculatorPool, PointIndex};
use crate::compute::uncertainty::UncertaintyPolicy;
use crate::config::Config;
use crate::error::{GeocodeError, Result};
use std::sync::Arc;

/// Prefix of Marine Regions identifiers given to political locations
pub const MRGID_PREFIX: &str = "http://marineregions.org/mrgid/";

/// Search radius floor of the centroid layer
pub const CENTROID_CUTOFF_METERS: f64 = 5_050.0;

/// Everything a layer constructor may need.
pub struct LayerContext<'a> {
    pub config: &'a Config,
    pub resources: &'a dyn LayerResources,
    pub pool: Arc<CalculatorPool>,
}

impl<'a> LayerContext<'a> {
    pub fn new(config: &'a Config, resources: &'a dyn LayerResources, pool: Arc<CalculatorPool>) -> Self {
        Self {
            config,
            resources,
            pool,
        }
    }

    /// Raster of `layer`, from the resources or else `file` under the
    /// configured raster root.
    pub fn raster(&self, layer: &str, file: &str) -> Result<Raster> {
        if let Some(raster) = self.resources.raster(layer)? {
            return Ok(raster);
        }

        match &self.config.raster_root {
            Some(root) => Raster::open(root.join(file)),
            None => Err(GeocodeError::Config(format!(
                "No raster for layer {} and no raster root configured",
                layer
            ))),
        }
    }

    /// HTTP client from the resources, or a reqwest client with the
    /// configured timeout.
    pub fn http_client(&self) -> Result<Arc<dyn HttpClient>> {
        match self.resources.http_client() {
            Some(client) => Ok(client),
            None => default_http_client(self.config),
        }
    }

    pub fn remote_endpoint(&self, layer: &str) -> Result<&str> {
        self.config.remote.endpoint.as_deref().ok_or_else(|| {
            GeocodeError::Config(format!("Layer {} needs a remote endpoint", layer))
        })
    }

    fn intersection_layer(
        &self,
        spec: LayerSpec,
        raster_file: &str,
        parts: usize,
        mapper: LocationMapper,
    ) -> Result<Layer> {
        let raster = self.raster(&spec.name, raster_file)?;
        let datasets = (0..parts)
            .map(|part| self.resources.polygon_dataset(&spec.name, part))
            .collect::<Result<Vec<_>>>()?;
        let backend = IntersectionBackend::new(datasets, mapper);
        Ok(Layer::new(spec, raster, backend.into()))
    }
}

#[cfg(feature = "remote")]
fn default_http_client(config: &Config) -> Result<Arc<dyn HttpClient>> {
    let client = super::remote::ReqwestClient::with_timeout(config.remote.timeout_secs)?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "remote"))]
fn default_http_client(_config: &Config) -> Result<Arc<dyn HttpClient>> {
    Err(GeocodeError::Config(
        "No HTTP client available; enable the 'remote' feature".to_string(),
    ))
}

pub type LayerConstructor = Box<dyn Fn(&LayerContext<'_>) -> Result<Layer> + Send + Sync>;

/// Ordered table of layer constructors.
pub struct LayerRegistry {
    entries: Vec<(String, LayerConstructor)>,
}

impl LayerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `constructor` under `name`, replacing an earlier entry of
    /// the same name.
    pub fn register<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&LayerContext<'_>) -> Result<Layer> + Send + Sync + 'static,
    {
        let name = name.into();
        let constructor: LayerConstructor = Box::new(constructor);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name, constructor)),
        }
        self
    }

    /// The layers shipped with the geocoder.
    pub fn builtin() -> Self {
        Self::new()
            .register("Political", political)
            .register("Continent", continent)
            .register("GADM", gadm)
            .register("IHO", iho)
            .register("WGSRPD", wgsrpd)
            .register("WDPA", wdpa)
            .register("Centroids", centroids)
            .register("IUCN", iucn)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Construct layer `name`.
    pub fn build(&self, name: &str, ctx: &LayerContext<'_>) -> Result<Layer> {
        let (_, constructor) = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| GeocodeError::Config(format!("Unknown layer {}", name)))?;

        let layer = constructor(ctx)?;
        Ok(layer.with_log_interval(ctx.config.log_interval))
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layers", &self.names())
            .finish()
    }
}

fn political(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("Political", "https://www.marineregions.org/", 3);
    let mapper = LocationMapper::new(FeatureMapping::MultiIso {
        id_prefix: MRGID_PREFIX.to_string(),
    });
    ctx.intersection_layer(spec, "political.png", 1, mapper)
}

fn continent(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("Continent", "https://github.com/gbif/continents", 1);
    ctx.intersection_layer(spec, "continent.png", 1, LocationMapper::default())
}

fn gadm(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("GADM", "http://gadm.org/", 4)
        .with_uncertainty(UncertaintyPolicy::administrative());
    let mapper = LocationMapper::new(FeatureMapping::Hierarchy {
        level_types: ["GADM0", "GADM1", "GADM2", "GADM3"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
    });
    ctx.intersection_layer(spec, "gadm3210.png", 1, mapper)
}

fn iho(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("IHO", "http://marineregions.org/", 1);
    ctx.intersection_layer(spec, "iho.png", 1, LocationMapper::default())
}

fn wgsrpd(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("WGSRPD", "http://www.tdwg.org/standards/109", 1);
    ctx.intersection_layer(spec, "wgsrpd.png", 1, LocationMapper::default())
}

fn wdpa(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("WDPA", "https://www.protectedplanet.net/", 100);
    ctx.intersection_layer(spec, "wdpa.png", 3, LocationMapper::default())
}

fn centroids(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new(
        "Centroids",
        "http://geo-locate.org/webservices/geolocatesvcv2/ / https://github.com/ropensci/CoordinateCleaner",
        1,
    )
    .with_minimum_distance_cutoff_meters(CENTROID_CUTOFF_METERS);

    let raster = ctx.raster(&spec.name, "centroids.png")?;
    let index = PointIndex::build(ctx.resources.point_records(&spec.name)?);
    log::info!(
        "Loaded {} centroids ({} polar) into the point index",
        index.len(),
        index.polar_len()
    );
    let backend = PointIndexBackend::new(index, Arc::clone(&ctx.pool));
    Ok(Layer::new(spec, raster, backend.into()))
}

fn iucn(ctx: &LayerContext<'_>) -> Result<Layer> {
    let spec = LayerSpec::new("IUCN", "https://www.iucnredlist.org/", 500_000);

    // Ranges overlap everywhere, so every pixel is a border.
    let raster = Raster::uniform(2, 2, BORDER)?;
    let oracle = RemoteOracle::new(ctx.http_client()?, ctx.remote_endpoint(&spec.name)?, "iucn");
    let features = ctx.resources.feature_table(&spec.name)?;
    let backend = RemoteBackend::new(oracle, features, LocationMapper::default());
    Ok(Layer::new(spec, raster, Backend::Remote(backend)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::raster::EMPTY;
    use crate::layer::backend::{Intersection, PolygonDataset, PolygonOracle};
    use crate::layer::features::{Feature, FeatureTable};
    use crate::layer::resources::StaticResources;
    use crate::storage::MemoryPointSource;
    use geocode_types::point::PointRecord;

    struct Nowhere;

    impl PolygonOracle for Nowhere {
        fn intersect(&self, _: f64, _: f64, _: f64) -> Result<Vec<Intersection>> {
            Ok(Vec::new())
        }
    }

    struct Fixed(&'static str);

    impl HttpClient for Fixed {
        fn get(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn dataset() -> PolygonDataset {
        PolygonDataset::new(Arc::new(Nowhere), FeatureTable::default())
    }

    fn context<'a>(config: &'a Config, resources: &'a StaticResources) -> LayerContext<'a> {
        LayerContext::new(config, resources, Arc::new(CalculatorPool::default()))
    }

    #[test]
    fn test_builtin_names() {
        let registry = LayerRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["Political", "Continent", "GADM", "IHO", "WGSRPD", "WDPA", "Centroids", "IUCN"]
        );
        assert!(registry.contains("GADM"));
        assert!(!registry.contains("PG_GADM"));
    }

    #[test]
    fn test_register_replaces() {
        let registry = LayerRegistry::new()
            .register("A", |_| Err(GeocodeError::Other("first".into())))
            .register("A", |_| Err(GeocodeError::Other("second".into())));
        assert_eq!(registry.len(), 1);

        let config = Config::default();
        let resources = StaticResources::new();
        match registry.build("A", &context(&config, &resources)) {
            Err(GeocodeError::Other(message)) => assert_eq!(message, "second"),
            other => panic!("unexpected {:?}", other.map(|l| l.name().to_string())),
        }
    }

    #[test]
    fn test_unknown_layer() {
        let config = Config::default();
        let resources = StaticResources::new();
        assert!(matches!(
            LayerRegistry::builtin().build("Atlantis", &context(&config, &resources)),
            Err(GeocodeError::Config(_))
        ));
    }

    #[test]
    fn test_build_political() {
        let config = Config::default();
        let resources = StaticResources::new()
            .with_raster("Political", Raster::uniform(8, 4, EMPTY).unwrap())
            .with_dataset("Political", 0, dataset());

        let layer = LayerRegistry::builtin()
            .build("Political", &context(&config, &resources))
            .unwrap();
        assert_eq!(layer.name(), "Political");
        assert_eq!(layer.spec().max_locations, 3);
        assert_eq!(layer.backend().kind(), "intersection");
    }

    #[test]
    fn test_wdpa_needs_three_parts() {
        let config = Config::default();
        let resources = StaticResources::new()
            .with_raster("WDPA", Raster::uniform(8, 4, EMPTY).unwrap())
            .with_dataset("WDPA", 0, dataset())
            .with_dataset("WDPA", 1, dataset());
        let registry = LayerRegistry::builtin();

        assert!(registry.build("WDPA", &context(&config, &resources)).is_err());

        let resources = resources.with_dataset("WDPA", 2, dataset());
        let layer = registry.build("WDPA", &context(&config, &resources)).unwrap();
        match layer.backend() {
            Backend::Intersection(backend) => assert_eq!(backend.parts(), 3),
            other => panic!("unexpected backend {}", other.kind()),
        }
    }

    #[test]
    fn test_raster_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let image = image::RgbImage::from_pixel(8, 4, image::Rgb([1, 2, 3]));
        image.save(dir.path().join("iho.png")).unwrap();

        let config = Config::default().with_raster_root(dir.path());
        let resources = StaticResources::new().with_dataset("IHO", 0, dataset());

        let layer = LayerRegistry::builtin()
            .build("IHO", &context(&config, &resources))
            .unwrap();
        assert_eq!(layer.cache().raster().colour_at(0, 0), 0x010203);
    }

    #[test]
    fn test_missing_raster() {
        let config = Config::default();
        let resources = StaticResources::new().with_dataset("IHO", 0, dataset());
        assert!(matches!(
            LayerRegistry::builtin().build("IHO", &context(&config, &resources)),
            Err(GeocodeError::Config(_))
        ));
    }

    #[test]
    fn test_build_centroids() {
        let config = Config::default();
        let resources = StaticResources::new()
            .with_raster("Centroids", Raster::uniform(8, 4, BORDER).unwrap())
            .with_points(
                "Centroids",
                MemoryPointSource::new(vec![
                    PointRecord::new("DK", "Denmark", "c", Some("DK"), 56.0, 10.0),
                    PointRecord::new("AQ", "Antarctica", "c", Some("AQ"), -89.0, 0.0),
                ]),
            );

        let layer = LayerRegistry::builtin()
            .build("Centroids", &context(&config, &resources))
            .unwrap();
        assert_eq!(layer.spec().minimum_distance_cutoff_meters, CENTROID_CUTOFF_METERS);
        match layer.backend() {
            Backend::PointIndex(backend) => {
                assert_eq!(backend.index().len(), 2);
                assert_eq!(backend.index().polar_len(), 1);
            }
            other => panic!("unexpected backend {}", other.kind()),
        }
    }

    #[test]
    fn test_build_iucn() {
        let config = Config::default().with_remote_endpoint("http://localhost:8080/intersect");
        let resources = StaticResources::new()
            .with_http_client(Arc::new(Fixed(r#"[{"index": 0, "distance": 0.0}]"#)))
            .with_feature_table(
                "IUCN",
                FeatureTable::new(vec![Feature::new("22694927", "Passer domesticus", None)]),
            );

        let layer = LayerRegistry::builtin()
            .build("IUCN", &context(&config, &resources))
            .unwrap();
        assert_eq!(layer.cache().raster().colour_for(10.0, 10.0), BORDER);

        let locations = layer.query(10.0, 10.0, 0.05).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].title(), "Passer domesticus");
    }

    #[test]
    fn test_iucn_needs_endpoint() {
        let config = Config::default();
        let resources = StaticResources::new()
            .with_http_client(Arc::new(Fixed("[]")))
            .with_feature_table("IUCN", FeatureTable::default());

        assert!(matches!(
            LayerRegistry::builtin().build("IUCN", &context(&config, &resources)),
            Err(GeocodeError::Config(_))
        ));
    }
}
