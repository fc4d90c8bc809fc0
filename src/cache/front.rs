//! Whole-service cache for clients of a geocoder.
//!
//! A [`ServiceCache`] sits in front of any [`GeocodeService`] and answers
//! default-layer queries from a single combined raster, so that a client
//! resolving millions of coordinates only reaches the service once per
//! region.

use super::pixel::{Outcome, PixelCache};
use super::raster::Raster;
use crate::compute::uncertainty::BITMAP_UNCERTAINTY_THRESHOLD;
use crate::error::Result;
use geocode_types::location::Location;
use geocode_types::stats::CacheStats;
use geocode_types::units::meters_to_degrees;

/// Anything answering reverse geocoding queries.
pub trait GeocodeService: Send + Sync {
    /// Locations near `(lat, lng)`.
    ///
    /// # Arguments
    ///
    /// * `uncertainty_degrees` - search radius in degrees
    /// * `uncertainty_meters` - search radius in metres; wins over degrees
    /// * `layers` - layers to query; empty means the service's defaults
    fn get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>>;
}

impl<S: GeocodeService + ?Sized> GeocodeService for std::sync::Arc<S> {
    fn get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>> {
        (**self).get(lat, lng, uncertainty_degrees, uncertainty_meters, layers)
    }
}

/// A [`GeocodeService`] behind a raster cache.
///
/// Only queries for the default layers with a small or absent uncertainty
/// touch the cache; everything else goes straight to the service.
#[derive(Debug)]
pub struct ServiceCache<S> {
    service: S,
    cache: PixelCache,
}

impl<S: GeocodeService> ServiceCache<S> {
    pub const MAX_LOCATIONS: usize = 500;

    pub fn new(service: S, raster: Raster) -> Self {
        Self {
            service,
            cache: PixelCache::new("Service-backed cache", raster, Self::MAX_LOCATIONS),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<S: GeocodeService> GeocodeService for ServiceCache<S> {
    fn get(
        &self,
        lat: f64,
        lng: f64,
        uncertainty_degrees: Option<f64>,
        uncertainty_meters: Option<f64>,
        layers: &[String],
    ) -> Result<Vec<Location>> {
        if !layers.is_empty() {
            return self
                .service
                .get(lat, lng, uncertainty_degrees, uncertainty_meters, layers);
        }

        let degrees = match uncertainty_meters {
            Some(meters) => {
                let degrees = meters_to_degrees(meters, lat);
                log::debug!("{}m uncertainty converted to {}°", meters, degrees);
                Some(degrees)
            }
            None => uncertainty_degrees,
        };

        let use_cache = degrees.is_none_or(|d| d <= BITMAP_UNCERTAINTY_THRESHOLD);
        if use_cache {
            match self.cache.lookup(lat, lng) {
                Outcome::Hit(locations) => return Ok(locations),
                Outcome::Empty => return Ok(Vec::new()),
                Outcome::Border | Outcome::Miss => {}
            }
        }

        let locations = self
            .service
            .get(lat, lng, degrees, uncertainty_meters, layers)?;

        if use_cache {
            self.cache.store(lat, lng, &locations);
        }

        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::raster::{BORDER, EMPTY};
    use parking_lot::Mutex;

    type Call = (Option<f64>, Option<f64>, Vec<String>);

    #[derive(Default)]
    struct RecordingService {
        calls: Mutex<Vec<Call>>,
    }

    impl GeocodeService for RecordingService {
        fn get(
            &self,
            _lat: f64,
            _lng: f64,
            uncertainty_degrees: Option<f64>,
            uncertainty_meters: Option<f64>,
            layers: &[String],
        ) -> Result<Vec<Location>> {
            self.calls
                .lock()
                .push((uncertainty_degrees, uncertainty_meters, layers.to_vec()));
            Ok(vec![Location::new("DK", "Political", "source", "Denmark", Some("DK"))])
        }
    }

    fn cache(colour: u32) -> ServiceCache<RecordingService> {
        ServiceCache::new(RecordingService::default(), Raster::uniform(361, 181, colour).unwrap())
    }

    #[test]
    fn test_default_layers_hit_cache() {
        let front = cache(0x224466);

        let first = front.get(56.0, 10.0, None, None, &[]).unwrap();
        let second = front.get(56.1, 10.1, Some(0.01), None, &[]).unwrap();

        assert_eq!(first, second);
        assert_eq!(front.service().calls.lock().len(), 1);
        assert_eq!(front.stats().hit, 1);
    }

    #[test]
    fn test_named_layers_bypass_cache() {
        let front = cache(0x224466);
        let layers = vec!["GADM".to_string()];

        front.get(56.0, 10.0, None, None, &layers).unwrap();
        front.get(56.0, 10.0, None, None, &layers).unwrap();

        assert_eq!(front.service().calls.lock().len(), 2);
        assert_eq!(front.stats().queries, 0);
    }

    #[test]
    fn test_large_uncertainty_bypasses_cache() {
        let front = cache(0x224466);

        front.get(56.0, 10.0, Some(1.0), None, &[]).unwrap();
        front.get(56.0, 10.0, Some(1.0), None, &[]).unwrap();

        assert_eq!(front.service().calls.lock().len(), 2);
        assert!(front.cache().is_empty());
    }

    #[test]
    fn test_meters_converted_before_threshold() {
        let front = cache(0x224466);

        // 100 km is roughly 0.9 degrees at the equator
        front.get(0.0, 10.0, None, Some(100_000.0), &[]).unwrap();
        front.get(0.0, 10.0, None, Some(100_000.0), &[]).unwrap();
        assert_eq!(front.service().calls.lock().len(), 2);

        let (degrees, meters, _) = front.service().calls.lock()[0].clone();
        assert!((degrees.unwrap() - 0.898).abs() < 0.001);
        assert_eq!(meters, Some(100_000.0));

        // 1 km is well under the threshold
        front.get(0.0, 10.0, None, Some(1_000.0), &[]).unwrap();
        front.get(0.0, 10.0, None, Some(1_000.0), &[]).unwrap();
        assert_eq!(front.service().calls.lock().len(), 3);
    }

    #[test]
    fn test_empty_pixel() {
        let front = cache(EMPTY);
        assert!(front.get(0.0, 0.0, None, None, &[]).unwrap().is_empty());
        assert!(front.service().calls.lock().is_empty());
    }

    #[test]
    fn test_border_pixel() {
        let front = cache(BORDER);
        front.get(0.0, 0.0, None, None, &[]).unwrap();
        front.get(0.0, 0.0, None, None, &[]).unwrap();
        assert_eq!(front.service().calls.lock().len(), 2);
    }
}
