pub mod geodesic;
pub use geodesic::{CalculatorPool, GeodesicCalculator, PooledCalculator};

pub mod rtree;
pub use rtree::{Cutoff, IndexedPoint, PointIndex};
