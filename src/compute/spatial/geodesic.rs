//! Pooled geodesic distance calculators.
//!
//! A [`GeodesicCalculator`] measures ellipsoidal (WGS84, Karney 2013)
//! distances from a fixed origin. It carries per-query state, so one
//! calculator serves one thread at a time; [`CalculatorPool`] hands them out
//! and takes them back through the [`PooledCalculator`] guard, which returns
//! its calculator when dropped on any exit path.

use crate::error::{GeocodeError, Result};
use geo::{Distance, Geodesic, Point};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Geodesic distance from a settable origin.
#[derive(Debug, Default)]
pub struct GeodesicCalculator {
    origin: Option<Point<f64>>,
    calculations: u64,
}

impl GeodesicCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the point distances are measured from.
    pub fn set_origin(&mut self, lat: f64, lng: f64) -> Result<()> {
        self.origin = Some(to_point(lat, lng)?);
        Ok(())
    }

    /// Distance in metres from the origin to `(lat, lng)`.
    ///
    /// Fails when no origin is set, the destination is not a valid
    /// coordinate, or the computation does not produce a finite distance.
    pub fn distance_to(&mut self, lat: f64, lng: f64) -> Result<f64> {
        let Some(origin) = self.origin else {
            return Err(GeocodeError::Distance(
                "No origin set on geodesic calculator".to_string(),
            ));
        };
        let destination = to_point(lat, lng)?;

        self.calculations += 1;
        let meters = Geodesic.distance(origin, destination);
        if !meters.is_finite() {
            return Err(GeocodeError::Distance(format!(
                "Non-finite distance from ({}, {}) to ({}, {})",
                origin.y(),
                origin.x(),
                lat,
                lng
            )));
        }
        Ok(meters)
    }

    /// Distances computed over this calculator's lifetime.
    pub fn calculations(&self) -> u64 {
        self.calculations
    }

    fn reset(&mut self) {
        self.origin = None;
    }
}

fn to_point(lat: f64, lng: f64) -> Result<Point<f64>> {
    if !(lat.is_finite() && lng.is_finite())
        || !(-90.0..=90.0).contains(&lat)
        || !(-180.0..=180.0).contains(&lng)
    {
        return Err(GeocodeError::Distance(format!(
            "Cannot measure from or to ({}, {})",
            lat, lng
        )));
    }
    Ok(Point::new(lng, lat))
}

/// Bounded pool of idle [`GeodesicCalculator`]s.
///
/// Acquiring never blocks: an empty pool builds a new calculator. At most
/// `capacity` idle calculators are kept; extras are dropped on release.
#[derive(Debug)]
pub struct CalculatorPool {
    idle: Mutex<Vec<GeodesicCalculator>>,
    capacity: usize,
    created: AtomicUsize,
}

impl CalculatorPool {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            created: AtomicUsize::new(0),
        }
    }

    /// Take a calculator from the pool, building one if none is idle.
    pub fn acquire(&self) -> PooledCalculator<'_> {
        let pooled = self.idle.lock().pop();
        let calculator = match pooled {
            Some(calculator) => calculator,
            None => {
                let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
                if created > self.capacity {
                    log::warn!(
                        "No idle geodesic calculator, creating one beyond capacity {} ({} created so far)",
                        self.capacity,
                        created
                    );
                } else {
                    log::debug!("Creating geodesic calculator {} of {}", created, self.capacity);
                }
                GeodesicCalculator::new()
            }
        };

        PooledCalculator {
            calculator,
            pool: self,
        }
    }

    fn release(&self, mut calculator: GeodesicCalculator) {
        calculator.reset();
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(calculator);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Calculators currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Calculators built since the pool was created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Calculators built beyond capacity, a sign of more concurrent
    /// queries than the pool was sized for.
    pub fn overflow(&self) -> usize {
        self.created().saturating_sub(self.capacity)
    }
}

impl Default for CalculatorPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// A calculator on loan from a [`CalculatorPool`].
pub struct PooledCalculator<'a> {
    calculator: GeodesicCalculator,
    pool: &'a CalculatorPool,
}

impl Deref for PooledCalculator<'_> {
    type Target = GeodesicCalculator;

    fn deref(&self) -> &Self::Target {
        &self.calculator
    }
}

impl DerefMut for PooledCalculator<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.calculator
    }
}

impl Drop for PooledCalculator<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.calculator));
    }
}
