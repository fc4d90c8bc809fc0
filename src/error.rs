//! Error types for the geocoder.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodeError>;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Coordinates or uncertainty outside the accepted range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A layer raster could not be read or decoded
    #[error("Raster error: {0}")]
    Raster(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Startup configuration is inconsistent; the geocoder must not start
    #[error("Configuration error: {0}")]
    Config(String),

    /// A polygon oracle failed to answer
    #[error("Backend error in layer {layer}: {message}")]
    Backend { layer: String, message: String },

    /// The remote polygon oracle could not be reached or answered badly
    #[error("Remote backend error: {0}")]
    Remote(String),

    /// Geodesic distance could not be computed
    #[error("Distance calculation failed: {0}")]
    Distance(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for GeocodeError {
    fn from(err: image::ImageError) -> Self {
        GeocodeError::Raster(err.to_string())
    }
}
