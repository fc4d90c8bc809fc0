use serde::{Deserialize, Serialize};

/// Snapshot of a raster cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total lookups
    pub queries: u64,
    /// Lookups that landed on a border pixel
    pub border: u64,
    /// Lookups that landed on an empty pixel
    pub empty: u64,
    /// Lookups answered from a bound colour
    pub hit: u64,
    /// Lookups on a colour not yet bound
    pub miss: u64,
    /// Colours bound to a result
    pub stored: u64,
    /// Stores refused because the result was empty or too large
    pub rejected: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of lookups answered without a backend call.
    pub fn answered_ratio(&self) -> f64 {
        if self.queries == 0 {
            return 0.0;
        }
        (self.hit + self.empty) as f64 / self.queries as f64
    }
}
