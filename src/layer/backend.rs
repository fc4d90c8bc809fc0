//! Backend strategies answering the queries a layer's cache cannot.

use super::LayerSpec;
use super::features::{FeatureTable, LocationMapper, dedup_nearest};
use super::remote::RemoteOracle;
use crate::compute::spatial::{CalculatorPool, PointIndex};
use crate::error::{GeocodeError, Result};
use geocode_types::location::Location;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A polygon clipped by a query circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// Row of the polygon in its dataset's feature table
    pub index: usize,
    /// Distance from the query point in degrees; zero when it contains it
    pub distance: f64,
}

impl Intersection {
    pub fn new(index: usize, distance: f64) -> Self {
        Self { index, distance }
    }
}

/// External point-in-polygon / nearest-polygon service.
pub trait PolygonOracle: Send + Sync {
    /// Every polygon intersecting the circle of `radius_degrees` around
    /// `(lng, lat)`. Argument order follows x, y.
    fn intersect(&self, lng: f64, lat: f64, radius_degrees: f64) -> Result<Vec<Intersection>>;
}

/// One part of a polygon layer: an oracle and its attribute table.
#[derive(Clone)]
pub struct PolygonDataset {
    oracle: Arc<dyn PolygonOracle>,
    features: Arc<FeatureTable>,
}

impl PolygonDataset {
    pub fn new(oracle: Arc<dyn PolygonOracle>, features: impl Into<Arc<FeatureTable>>) -> Self {
        Self {
            oracle,
            features: features.into(),
        }
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    fn intersect(&self, lng: f64, lat: f64, radius_degrees: f64) -> Result<Vec<Intersection>> {
        self.oracle.intersect(lng, lat, radius_degrees)
    }
}

impl std::fmt::Debug for PolygonDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonDataset")
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}

/// Query counter logging a line every `interval` queries.
#[derive(Debug)]
pub struct QueryCounter {
    count: AtomicU64,
    interval: u64,
}

impl QueryCounter {
    pub fn new(interval: u64) -> Self {
        Self {
            count: AtomicU64::new(0),
            interval: interval.max(1),
        }
    }

    pub(crate) fn set_interval(&mut self, interval: u64) {
        self.interval = interval.max(1);
    }

    fn tick(&self, layer: &str, what: &str) {
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.interval == 0 {
            log::info!("{} did {} {} queries.", layer, count, what);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for QueryCounter {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Polygon layer answered by local oracles, possibly split over several parts.
#[derive(Debug)]
pub struct IntersectionBackend {
    parts: Vec<PolygonDataset>,
    mapper: LocationMapper,
    queries: QueryCounter,
}

impl IntersectionBackend {
    pub fn new(parts: Vec<PolygonDataset>, mapper: LocationMapper) -> Self {
        Self {
            parts,
            mapper,
            queries: QueryCounter::default(),
        }
    }

    pub fn parts(&self) -> usize {
        self.parts.len()
    }

    fn query(&self, spec: &LayerSpec, lat: f64, lng: f64, uncertainty: f64) -> Result<Vec<Location>> {
        let mut locations = Vec::new();
        for part in &self.parts {
            let candidates = part
                .intersect(lng, lat, uncertainty)
                .map_err(|e| backend_error(spec, e))?;
            self.mapper
                .resolve(spec, part.features(), &candidates, lat, &mut locations)?;
        }
        self.queries.tick(&spec.name, "polygon");
        Ok(dedup_nearest(locations))
    }
}

/// Point layer answered by a nearest-point index.
#[derive(Debug)]
pub struct PointIndexBackend {
    index: PointIndex,
    pool: Arc<CalculatorPool>,
    queries: QueryCounter,
}

impl PointIndexBackend {
    pub fn new(index: PointIndex, pool: Arc<CalculatorPool>) -> Self {
        Self {
            index,
            pool,
            queries: QueryCounter::default(),
        }
    }

    pub fn index(&self) -> &PointIndex {
        &self.index
    }

    fn query(&self, spec: &LayerSpec, lat: f64, lng: f64, uncertainty: f64) -> Vec<Location> {
        let locations = self.index.query(
            lat,
            lng,
            uncertainty,
            spec.minimum_distance_cutoff_meters,
            &spec.name,
            &self.pool,
        );
        self.queries.tick(&spec.name, "point");
        locations
    }
}

/// Polygon layer answered by a service over the network.
#[derive(Debug)]
pub struct RemoteBackend {
    oracle: RemoteOracle,
    features: FeatureTable,
    mapper: LocationMapper,
    queries: QueryCounter,
}

impl RemoteBackend {
    pub fn new(oracle: RemoteOracle, features: FeatureTable, mapper: LocationMapper) -> Self {
        Self {
            oracle,
            features,
            mapper,
            queries: QueryCounter::default(),
        }
    }

    fn query(&self, spec: &LayerSpec, lat: f64, lng: f64, uncertainty: f64) -> Result<Vec<Location>> {
        let started = Instant::now();
        let candidates = self.oracle.intersect(lng, lat, uncertainty)?;
        log::debug!(
            "{} remote query at {},{} took {:?} for {} candidates",
            spec.name,
            lat,
            lng,
            started.elapsed(),
            candidates.len()
        );

        let mut locations = Vec::new();
        self.mapper
            .resolve(spec, &self.features, &candidates, lat, &mut locations)?;
        self.queries.tick(&spec.name, "remote");
        Ok(dedup_nearest(locations))
    }
}

/// How a layer resolves the queries its cache cannot answer.
#[derive(Debug)]
pub enum Backend {
    Intersection(IntersectionBackend),
    PointIndex(PointIndexBackend),
    Remote(RemoteBackend),
}

impl Backend {
    /// Resolve `(lat, lng)` with a search radius of `uncertainty` degrees.
    pub fn query(
        &self,
        spec: &LayerSpec,
        lat: f64,
        lng: f64,
        uncertainty: f64,
    ) -> Result<Vec<Location>> {
        match self {
            Backend::Intersection(backend) => backend.query(spec, lat, lng, uncertainty),
            Backend::PointIndex(backend) => Ok(backend.query(spec, lat, lng, uncertainty)),
            Backend::Remote(backend) => backend.query(spec, lat, lng, uncertainty),
        }
    }

    /// Backend queries issued so far.
    pub fn queries(&self) -> u64 {
        self.counter().count()
    }

    pub(crate) fn set_log_interval(&mut self, interval: u64) {
        match self {
            Backend::Intersection(backend) => backend.queries.set_interval(interval),
            Backend::PointIndex(backend) => backend.queries.set_interval(interval),
            Backend::Remote(backend) => backend.queries.set_interval(interval),
        }
    }

    fn counter(&self) -> &QueryCounter {
        match self {
            Backend::Intersection(backend) => &backend.queries,
            Backend::PointIndex(backend) => &backend.queries,
            Backend::Remote(backend) => &backend.queries,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Intersection(_) => "intersection",
            Backend::PointIndex(_) => "point index",
            Backend::Remote(_) => "remote",
        }
    }
}

impl From<IntersectionBackend> for Backend {
    fn from(backend: IntersectionBackend) -> Self {
        Backend::Intersection(backend)
    }
}

impl From<PointIndexBackend> for Backend {
    fn from(backend: PointIndexBackend) -> Self {
        Backend::PointIndex(backend)
    }
}

impl From<RemoteBackend> for Backend {
    fn from(backend: RemoteBackend) -> Self {
        Backend::Remote(backend)
    }
}

fn backend_error(spec: &LayerSpec, err: GeocodeError) -> GeocodeError {
    match err {
        GeocodeError::Backend { .. } => err,
        other => GeocodeError::Backend {
            layer: spec.name.clone(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::features::{Feature, FeatureMapping};
    use geocode_types::point::PointRecord;

    struct FixedOracle(Vec<Intersection>);

    impl PolygonOracle for FixedOracle {
        fn intersect(&self, _lng: f64, _lat: f64, _radius: f64) -> Result<Vec<Intersection>> {
            Ok(self.0.clone())
        }
    }

    struct FailingOracle;

    impl PolygonOracle for FailingOracle {
        fn intersect(&self, _lng: f64, _lat: f64, _radius: f64) -> Result<Vec<Intersection>> {
            Err(GeocodeError::Other("shapefile unreadable".to_string()))
        }
    }

    fn kenya() -> FeatureTable {
        FeatureTable::new(vec![
            Feature::new("KE", "Kenya", Some("KE")),
            Feature::new("KE", "Kenya", Some("KE")),
            Feature::new("TZ", "Tanzania", Some("TZ")),
        ])
    }

    #[test]
    fn test_intersection_dedups_multi_polygon_hits() {
        let oracle = FixedOracle(vec![Intersection::new(0, 3.0), Intersection::new(1, 1.2)]);
        let backend = Backend::from(IntersectionBackend::new(
            vec![PolygonDataset::new(Arc::new(oracle), kenya())],
            LocationMapper::new(FeatureMapping::Plain),
        ));

        let spec = LayerSpec::new("Political", "s", 3);
        let locations = backend.query(&spec, 0.0, 38.0, 5.0).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].distance_degrees(), 1.2);
        assert_eq!(backend.queries(), 1);
    }

    #[test]
    fn test_intersection_merges_parts() {
        let first = FixedOracle(vec![Intersection::new(0, 0.0)]);
        let second = FixedOracle(vec![Intersection::new(2, 0.4), Intersection::new(0, 0.1)]);
        let backend = Backend::from(IntersectionBackend::new(
            vec![
                PolygonDataset::new(Arc::new(first), kenya()),
                PolygonDataset::new(Arc::new(second), kenya()),
            ],
            LocationMapper::default(),
        ));

        let spec = LayerSpec::new("WDPA", "s", 100);
        let locations = backend.query(&spec, 0.0, 38.0, 1.0).unwrap();
        let ids: Vec<_> = locations.iter().map(Location::id).collect();
        assert_eq!(ids, vec!["KE", "TZ"]);
        assert_eq!(locations[0].distance_degrees(), 0.0);
    }

    #[test]
    fn test_intersection_failure_names_layer() {
        let backend = Backend::from(IntersectionBackend::new(
            vec![PolygonDataset::new(Arc::new(FailingOracle), kenya())],
            LocationMapper::default(),
        ));

        let spec = LayerSpec::new("IHO", "s", 1);
        match backend.query(&spec, 0.0, 0.0, 0.05) {
            Err(GeocodeError::Backend { layer, message }) => {
                assert_eq!(layer, "IHO");
                assert!(message.contains("shapefile unreadable"));
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[test]
    fn test_candidate_outside_table() {
        let oracle = FixedOracle(vec![Intersection::new(7, 0.0)]);
        let backend = Backend::from(IntersectionBackend::new(
            vec![PolygonDataset::new(Arc::new(oracle), kenya())],
            LocationMapper::default(),
        ));

        let spec = LayerSpec::new("Political", "s", 3);
        assert!(matches!(
            backend.query(&spec, 0.0, 0.0, 0.05),
            Err(GeocodeError::Backend { .. })
        ));
    }

    #[test]
    fn test_point_index_backend() {
        let index = PointIndex::build(vec![PointRecord::new("DK", "Denmark", "c", Some("DK"), 56.0, 10.0)]);
        let backend = Backend::from(PointIndexBackend::new(index, Arc::new(CalculatorPool::new(2))));

        let spec = LayerSpec::new("Centroids", "c", 1).with_minimum_distance_cutoff_meters(5_050.0);
        let locations = backend.query(&spec, 56.01, 10.0, 0.05).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].kind(), "Centroids");
        assert_eq!(backend.kind(), "point index");
    }
}
