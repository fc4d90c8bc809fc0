//! Data a layer needs at construction time.
//!
//! Layer constructors ask a [`LayerResources`] for rasters, polygon
//! datasets, point records and an HTTP client by layer name. How those are
//! produced is up to the embedding application. Rasters and HTTP clients
//! are optional; the [`LayerContext`](super::LayerContext) falls back to the
//! configured raster root and to the reqwest client.

use super::backend::PolygonDataset;
use super::features::FeatureTable;
use super::remote::HttpClient;
use crate::cache::raster::Raster;
use crate::error::{GeocodeError, Result};
use crate::storage::PointSource;
use geocode_types::point::PointRecord;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Trait for layer resource providers
pub trait LayerResources: Send + Sync {
    /// Raster for `layer`, if this provider has one.
    fn raster(&self, layer: &str) -> Result<Option<Raster>>;

    /// Part `part` (zero-based) of a polygon layer.
    fn polygon_dataset(&self, layer: &str, part: usize) -> Result<PolygonDataset>;

    /// Attribute table of a layer answered by a remote oracle.
    fn feature_table(&self, layer: &str) -> Result<FeatureTable>;

    /// Records of a point layer.
    fn point_records(&self, layer: &str) -> Result<Vec<PointRecord>>;

    /// Client used by remote layers, if this provider has one.
    fn http_client(&self) -> Option<Arc<dyn HttpClient>>;
}

/// Resources registered up front.
#[derive(Default)]
pub struct StaticResources {
    rasters: FxHashMap<String, Raster>,
    datasets: FxHashMap<(String, usize), PolygonDataset>,
    feature_tables: FxHashMap<String, FeatureTable>,
    points: FxHashMap<String, Box<dyn PointSource>>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raster(mut self, layer: impl Into<String>, raster: Raster) -> Self {
        self.rasters.insert(layer.into(), raster);
        self
    }

    pub fn with_dataset(
        mut self,
        layer: impl Into<String>,
        part: usize,
        dataset: PolygonDataset,
    ) -> Self {
        self.datasets.insert((layer.into(), part), dataset);
        self
    }

    pub fn with_feature_table(mut self, layer: impl Into<String>, table: FeatureTable) -> Self {
        self.feature_tables.insert(layer.into(), table);
        self
    }

    pub fn with_points<S: PointSource + 'static>(mut self, layer: impl Into<String>, source: S) -> Self {
        self.points.insert(layer.into(), Box::new(source));
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl LayerResources for StaticResources {
    fn raster(&self, layer: &str) -> Result<Option<Raster>> {
        Ok(self.rasters.get(layer).cloned())
    }

    fn polygon_dataset(&self, layer: &str, part: usize) -> Result<PolygonDataset> {
        self.datasets
            .get(&(layer.to_string(), part))
            .cloned()
            .ok_or_else(|| {
                GeocodeError::Config(format!("No polygon dataset part {} for layer {}", part, layer))
            })
    }

    fn feature_table(&self, layer: &str) -> Result<FeatureTable> {
        self.feature_tables
            .get(layer)
            .cloned()
            .ok_or_else(|| GeocodeError::Config(format!("No feature table for layer {}", layer)))
    }

    fn point_records(&self, layer: &str) -> Result<Vec<PointRecord>> {
        match self.points.get(layer) {
            Some(source) => source.fetch_points(),
            None => Err(GeocodeError::Config(format!(
                "No point source for layer {}",
                layer
            ))),
        }
    }

    fn http_client(&self) -> Option<Arc<dyn HttpClient>> {
        self.http_client.clone()
    }
}

impl std::fmt::Debug for StaticResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticResources")
            .field("rasters", &self.rasters.keys().collect::<Vec<_>>())
            .field("datasets", &self.datasets.keys().collect::<Vec<_>>())
            .field("points", &self.points.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::raster::EMPTY;
    use crate::storage::MemoryPointSource;

    #[test]
    fn test_registered_raster() {
        let resources =
            StaticResources::new().with_raster("Political", Raster::uniform(4, 2, EMPTY).unwrap());
        assert_eq!(resources.raster("Political").unwrap().unwrap().width(), 4);
        assert!(resources.raster("IHO").unwrap().is_none());
    }

    #[test]
    fn test_missing_resources_are_config_errors() {
        let resources = StaticResources::new();
        assert!(resources.http_client().is_none());
        assert!(matches!(resources.polygon_dataset("X", 0), Err(GeocodeError::Config(_))));
        assert!(matches!(resources.point_records("X"), Err(GeocodeError::Config(_))));
        assert!(matches!(resources.feature_table("X"), Err(GeocodeError::Config(_))));
    }

    #[test]
    fn test_point_records() {
        let resources = StaticResources::new().with_points(
            "Centroids",
            MemoryPointSource::new(vec![PointRecord::new("DK", "Denmark", "c", Some("DK"), 56.0, 10.0)]),
        );
        assert_eq!(resources.point_records("Centroids").unwrap().len(), 1);
    }
}
