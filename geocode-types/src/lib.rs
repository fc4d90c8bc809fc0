//! # geocode-types
//!
//! Result and record types shared by the `geocode` reverse geocoder.
//!
//! - **Results**: [`location::Location`], one candidate region or point per hit
//! - **Records**: [`point::PointRecord`], the rows loaded into point layers
//! - **Statistics**: [`stats::CacheStats`], raster cache counters
//! - **Units**: [`units`], conversions between degrees and metres at a latitude
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use geocode_types::location::Location;
//!
//! let denmark = Location::new("DK", "Political", "https://www.marineregions.org/", "Denmark", Some("DK"))
//!     .at_distance_degrees(0.01, 55.0);
//! assert!(denmark.distance_meters() > 600.0);
//! ```

pub mod location;
pub mod point;
pub mod stats;
pub mod units;
