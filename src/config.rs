//! Geocoder configuration.
//!
//! Configuration is read once at startup. Layer selection is by name against
//! the static [`LayerRegistry`](crate::layer::registry::LayerRegistry).
use serde::de::Error;
use std::path::PathBuf;

/// What to do when a single layer's backend fails during a multi-layer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFailurePolicy {
    /// Fail the whole query with the layer's error
    #[default]
    Propagate,
    /// Log a warning and return the other layers' results
    Skip,
}

/// Geocoder configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Layers to load; empty loads every registered layer
    #[serde(default)]
    pub enabled_layers: Vec<String>,

    /// Layers queried when a request names none
    #[serde(default)]
    pub default_layers: Vec<String>,

    /// Directory holding the layer rasters
    #[serde(default)]
    pub raster_root: Option<PathBuf>,

    /// Idle geodesic calculators kept for reuse
    #[serde(default = "Config::default_calculator_pool_capacity")]
    pub calculator_pool_capacity: usize,

    /// Cache and backend counters are logged every this many queries
    #[serde(default = "Config::default_log_interval")]
    pub log_interval: u64,

    #[serde(default)]
    pub layer_failure_policy: LayerFailurePolicy,

    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Settings for layers answered by a remote polygon service
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL, e.g. `http://geocode-db.internal:8080/intersect`
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "RemoteConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl Config {
    const fn default_calculator_pool_capacity() -> usize {
        50
    }

    const fn default_log_interval() -> u64 {
        10_000
    }

    pub fn with_enabled_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_raster_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.raster_root = Some(root.into());
        self
    }

    pub fn with_calculator_pool_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Calculator pool capacity must be greater than zero");
        self.calculator_pool_capacity = capacity;
        self
    }

    pub fn with_log_interval(mut self, interval: u64) -> Self {
        assert!(interval > 0, "Log interval must be greater than zero");
        self.log_interval = interval;
        self
    }

    pub fn with_layer_failure_policy(mut self, policy: LayerFailurePolicy) -> Self {
        self.layer_failure_policy = policy;
        self
    }

    pub fn with_remote_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.remote.endpoint = Some(endpoint.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.calculator_pool_capacity == 0 {
            return Err("Calculator pool capacity must be greater than zero".to_string());
        }

        if self.log_interval == 0 {
            return Err("Log interval must be greater than zero".to_string());
        }

        if self.remote.timeout_secs == 0 {
            return Err("Remote timeout must be greater than zero".to_string());
        }

        if let Some(endpoint) = &self.remote.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(format!("Remote endpoint must be an http(s) URL: {}", endpoint));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_layers: Vec::new(),
            default_layers: Vec::new(),
            raster_root: None,
            calculator_pool_capacity: Self::default_calculator_pool_capacity(),
            log_interval: Self::default_log_interval(),
            layer_failure_policy: LayerFailurePolicy::default(),
            remote: RemoteConfig::default(),
        }
    }
}
