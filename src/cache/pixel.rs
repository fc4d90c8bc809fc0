//! Raster-keyed memo table of resolved locations.
//!
//! The first time a coloured pixel is resolved by a layer's backend, the
//! answer is bound to the colour; every later query landing on a pixel of the
//! same colour is answered from memory. The raster for a layer is fixed, so a
//! colour always denotes the same region and the first answer is final.

use super::raster::{BORDER, EMPTY, Raster};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use geocode_types::location::Location;
use geocode_types::stats::CacheStats;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Border pixel; always ask the backend
    Border,
    /// The layer has nothing here
    Empty,
    /// Colour already resolved
    Hit(Vec<Location>),
    /// Colour not resolved yet
    Miss,
}

/// What [`PixelCache::store`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    AlreadyBound,
    /// Border or empty pixel; never cached
    Sentinel,
    /// Empty or oversized result; the colour stays unbound
    Rejected,
}

#[derive(Debug, Default)]
struct Counters {
    queries: AtomicU64,
    border: AtomicU64,
    empty: AtomicU64,
    hit: AtomicU64,
    miss: AtomicU64,
    stored: AtomicU64,
    rejected: AtomicU64,
}

/// Per-layer raster cache.
///
/// Lookups and stores may run concurrently from any number of threads. The
/// colour map is a [`DashMap`]; a store races only with other stores of the
/// same answer, and the first one wins.
#[derive(Debug)]
pub struct PixelCache {
    name: String,
    raster: Raster,
    max_locations: usize,
    colours: DashMap<u32, Arc<[Location]>>,
    counters: Counters,
    log_interval: u64,
}

impl PixelCache {
    /// Create a cache over `raster`.
    ///
    /// # Arguments
    ///
    /// * `name` - Layer name, used in log messages
    /// * `raster` - The layer's colour raster
    /// * `max_locations` - Largest result that may be bound to one colour
    pub fn new(name: impl Into<String>, raster: Raster, max_locations: usize) -> Self {
        Self {
            name: name.into(),
            raster,
            max_locations,
            colours: DashMap::new(),
            counters: Counters::default(),
            log_interval: 10_000,
        }
    }

    /// Log the counters every `interval` lookups instead of every 10 000.
    pub fn with_log_interval(mut self, interval: u64) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn max_locations(&self) -> usize {
        self.max_locations
    }

    /// Pixel covering a coordinate; see [`Raster::pixel_for`].
    pub fn pixel_for(&self, lat: f64, lng: f64) -> (u32, u32) {
        self.raster.pixel_for(lat, lng)
    }

    /// Look up the pixel covering `(lat, lng)`.
    pub fn lookup(&self, lat: f64, lng: f64) -> Outcome {
        let (x, y) = self.pixel_for(lat, lng);
        let colour = self.raster.colour_at(x, y);

        let outcome = match colour {
            BORDER => {
                self.counters.border.fetch_add(1, Ordering::Relaxed);
                log::trace!(
                    "LatLong {},{} has pixel {},{} with colour #{:06x} (BORDER)",
                    lat, lng, x, y, colour
                );
                Outcome::Border
            }
            EMPTY => {
                self.counters.empty.fetch_add(1, Ordering::Relaxed);
                log::trace!(
                    "LatLong {},{} has pixel {},{} with colour #{:06x} (EMPTY)",
                    lat, lng, x, y, colour
                );
                Outcome::Empty
            }
            _ => match self.colours.get(&colour) {
                Some(bound) => {
                    self.counters.hit.fetch_add(1, Ordering::Relaxed);
                    log::trace!(
                        "LatLong {},{} has pixel {},{} with colour #{:06x} (HIT)",
                        lat, lng, x, y, colour
                    );
                    Outcome::Hit(bound.to_vec())
                }
                None => {
                    self.counters.miss.fetch_add(1, Ordering::Relaxed);
                    log::trace!(
                        "LatLong {},{} has pixel {},{} with colour #{:06x} (MISS)",
                        lat, lng, x, y, colour
                    );
                    Outcome::Miss
                }
            },
        };

        let queries = self.counters.queries.fetch_add(1, Ordering::Relaxed) + 1;
        if queries % self.log_interval == 0 {
            let stats = self.stats();
            log::info!(
                "{} did {} cache lookups: {} border, {} empty, {} hit, {} miss.",
                self.name, stats.queries, stats.border, stats.empty, stats.hit, stats.miss
            );
        }

        outcome
    }

    /// Bind the colour under `(lat, lng)` to `locations`.
    ///
    /// Border and empty pixels are never bound, and a colour already bound
    /// keeps its first answer. An empty result, or one larger than
    /// `max_locations`, means the raster and the backend disagree about this
    /// region; it is logged and the colour stays unbound.
    pub fn store(&self, lat: f64, lng: f64, locations: &[Location]) -> StoreOutcome {
        let (x, y) = self.pixel_for(lat, lng);
        let colour = self.raster.colour_at(x, y);

        if colour == BORDER || colour == EMPTY {
            return StoreOutcome::Sentinel;
        }

        if self.colours.contains_key(&colour) {
            return StoreOutcome::AlreadyBound;
        }

        if locations.is_empty() || locations.len() > self.max_locations {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            log::error!(
                "{}: {} (max {}) locations for a colour! #{:06x} (LL {},{}; pixel {},{}); locations {}",
                self.name,
                locations.len(),
                self.max_locations,
                colour,
                lat,
                lng,
                x,
                y,
                join_locations(locations)
            );
            return StoreOutcome::Rejected;
        }

        match self.colours.entry(colour) {
            Entry::Occupied(_) => StoreOutcome::AlreadyBound,
            Entry::Vacant(slot) => {
                log::trace!(
                    "LatLong {},{} has pixel {},{} with colour #{:06x} (STORE) {}",
                    lat,
                    lng,
                    x,
                    y,
                    colour,
                    join_locations(locations)
                );
                slot.insert(Arc::from(locations));
                self.counters.stored.fetch_add(1, Ordering::Relaxed);
                StoreOutcome::Stored
            }
        }
    }

    /// Number of colours bound so far.
    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            queries: self.counters.queries.load(Ordering::Relaxed),
            border: self.counters.border.load(Ordering::Relaxed),
            empty: self.counters.empty.load(Ordering::Relaxed),
            hit: self.counters.hit.load(Ordering::Relaxed),
            miss: self.counters.miss.load(Ordering::Relaxed),
            stored: self.counters.stored.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}

fn join_locations(locations: &[Location]) -> String {
    let ids: Vec<&str> = locations.iter().map(Location::id).collect();
    let distances: Vec<String> = locations
        .iter()
        .map(|l| l.distance_degrees().to_string())
        .collect();
    format!("{} {}", ids.join(", "), distances.join(", "))
}
