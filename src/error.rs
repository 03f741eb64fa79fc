//! Error types for geotap

use thiserror::Error;

/// Main error type for geotap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoding error: {0}")]
    Geocoding(String),
}

/// Result type alias for geotap operations
pub type Result<T> = std::result::Result<T, Error>;
