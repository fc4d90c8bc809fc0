//! Nearest-point search over point layers.
//!
//! Points are indexed in an R-tree by their raw degree coordinates. A query
//! works in two regimes:
//!
//! 1. **Envelope pruning**: the cutoff radius is converted to degrees at the
//!    query latitude, widened by 1.5 to absorb the error of treating the
//!    ellipsoid as a plane, and the R-tree returns every point inside the
//!    resulting bounding box via `locate_in_envelope_intersecting`.
//!
//! 2. **Exact filtering**: each candidate's geodesic distance is computed
//!    with a pooled calculator and compared against the cutoff in metres.
//!
//! Near the poles a degree of longitude covers almost no ground and the
//! degree-space bounding box stops meaning anything, so queries above 85°
//! also scan every point recorded above 85° in either hemisphere. That list
//! is small by construction.
//!
//! ## Example
//!
//! ```rust
//! use geocode::compute::spatial::{CalculatorPool, PointIndex};
//! use geocode_types::point::PointRecord;
//!
//! let index = PointIndex::build(vec![
//!     PointRecord::new("DK", "Denmark", "centroids", Some("DK"), 56.0, 10.0),
//!     PointRecord::new("SE", "Sweden", "centroids", Some("SE"), 62.0, 15.0),
//! ]);
//! let pool = CalculatorPool::default();
//!
//! let nearby = index.query(56.01, 10.01, 0.05, 5_050.0, "Centroids", &pool);
//! assert_eq!(nearby.len(), 1);
//! assert_eq!(nearby[0].id(), "DK");
//! ```

use super::geodesic::CalculatorPool;
use geocode_types::location::Location;
use geocode_types::point::{POLAR_LATITUDE, PointRecord};
use geocode_types::units::meters_per_degree_at;
use rstar::{AABB, Point as RstarPoint, RTree};
use rustc_hash::FxHashSet;

/// Widening applied to the degree-space search box.
pub const ENVELOPE_SLACK: f64 = 1.5;

/// 2D point for R-tree indexing, pointing back at its record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Position of the record in the index's record list
    pub slot: usize,
}

impl IndexedPoint {
    pub fn new(x: f64, y: f64, slot: usize) -> Self {
        Self { x, y, slot }
    }
}

impl RstarPoint for IndexedPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            slot: 0,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// Search radii derived for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub degrees: f64,
    pub meters: f64,
}

impl Cutoff {
    /// Combine the query uncertainty with a layer's minimum cutoff, each
    /// converted to the other unit at `lat`.
    pub fn at(lat: f64, uncertainty_degrees: f64, minimum_cutoff_meters: f64) -> Self {
        let factor = meters_per_degree_at(lat);
        Self {
            degrees: (minimum_cutoff_meters / factor).max(uncertainty_degrees),
            meters: minimum_cutoff_meters.max(uncertainty_degrees * factor),
        }
    }
}

/// Read-only nearest-point index, built once per point layer.
#[derive(Debug)]
pub struct PointIndex {
    records: Vec<PointRecord>,
    tree: RTree<IndexedPoint>,
    polar: Vec<usize>,
}

impl PointIndex {
    /// Index `records`. Records whose coordinates are not finite and on the
    /// globe are logged and left out.
    pub fn build(records: Vec<PointRecord>) -> Self {
        let mut points = Vec::with_capacity(records.len());
        let mut polar = Vec::new();

        for (slot, record) in records.iter().enumerate() {
            let (lat, lng) = (record.latitude, record.longitude);
            if !(lat.is_finite() && lng.is_finite())
                || !(-90.0..=90.0).contains(&lat)
                || !(-180.0..=180.0).contains(&lng)
            {
                log::warn!(
                    "Point {} has coordinates off world ({}, {}); not indexed",
                    record.id,
                    lat,
                    lng
                );
                continue;
            }

            points.push(IndexedPoint::new(lng, lat, slot));
            if record.is_polar() {
                polar.push(slot);
            }
        }

        log::debug!(
            "Indexed {} of {} points, {} polar",
            points.len(),
            records.len(),
            polar.len()
        );

        Self {
            records,
            tree: RTree::bulk_load(points),
            polar,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn polar_len(&self) -> usize {
        self.polar.len()
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    /// Find every point within the search radius of `(lat, lng)`.
    ///
    /// # Arguments
    ///
    /// * `lat`, `lng` - Query coordinate
    /// * `uncertainty_degrees` - Query uncertainty, already adjusted for the layer
    /// * `minimum_cutoff_meters` - Layer's smallest search radius
    /// * `kind` - Layer name given to the resulting locations
    /// * `pool` - Source of geodesic calculators
    ///
    /// # Returns
    ///
    /// One location per matching point, unordered, with distances in metres
    /// and in degrees at `lat`. Points whose distance cannot be computed are
    /// left out.
    pub fn query(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: f64,
        minimum_cutoff_meters: f64,
        kind: &str,
        pool: &CalculatorPool,
    ) -> Vec<Location> {
        let cutoff = Cutoff::at(lat, uncertainty_degrees, minimum_cutoff_meters);
        let radius = ENVELOPE_SLACK * cutoff.degrees;
        let envelope = AABB::from_corners(
            IndexedPoint::new(lng - radius, lat - radius, 0),
            IndexedPoint::new(lng + radius, lat + radius, 0),
        );

        let mut calculator = pool.acquire();
        if let Err(e) = calculator.set_origin(lat, lng) {
            log::error!("Error calculating distance: {}", e);
            return Vec::new();
        }

        let mut seen = FxHashSet::default();
        let mut matches = Vec::new();
        let mut consider = |slot: usize| {
            if !seen.insert(slot) {
                return;
            }
            let record = &self.records[slot];
            let meters = match calculator.distance_to(record.latitude, record.longitude) {
                Ok(meters) => meters,
                Err(e) => {
                    log::error!("Error calculating distance to {}: {}", record.id, e);
                    return;
                }
            };
            if meters <= cutoff.meters {
                matches.push(
                    Location::new(
                        record.id.as_str(),
                        kind,
                        record.source.as_str(),
                        record.title.as_str(),
                        record.iso_country_code.as_deref(),
                    )
                    .at_distance_meters(meters, lat),
                );
            }
        };

        for point in self.tree.locate_in_envelope_intersecting(&envelope) {
            consider(point.slot);
        }

        if lat.abs() > POLAR_LATITUDE {
            for &slot in &self.polar {
                consider(slot);
            }
        }

        matches
    }
}
