//! Raster-backed result caching.
//!
//! - [`raster`]: the read-only colour rasters shipped with each layer
//! - [`pixel`]: the per-layer colour to locations memo table
//! - [`front`]: a whole-service cache placed in front of a geocoder

pub mod front;
pub mod pixel;
pub mod raster;

pub use front::{GeocodeService, ServiceCache};
pub use pixel::{Outcome, PixelCache, StoreOutcome};
pub use raster::{BORDER, EMPTY, Raster};
