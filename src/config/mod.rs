//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geotap/config.toml

pub mod defaults;

use crate::constants::api::{MAPBOX_URL, NOMINATIM_URL};
use crate::coord::projection::Projection;
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use crate::flow::StalePolicy;
use crate::geo::ResultType;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Geocoding service settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Viewport used to turn screen taps into coordinates
    #[serde(default)]
    pub map: MapConfig,

    /// Request flow behaviour
    #[serde(default)]
    pub flow: FlowConfig,

    /// API keys for geocoding services
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Backend name ("mapbox" or "nominatim")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Result type filter (poi, address, place, ...)
    #[serde(default = "default_result_type")]
    pub result_type: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Mapbox API base URL
    #[serde(default = "default_mapbox_url")]
    pub mapbox_url: String,

    /// Nominatim API base URL
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
}

/// Viewport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lng")]
    pub center_lng: f64,

    #[serde(default = "default_zoom")]
    pub zoom: f64,

    /// Viewport width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Viewport height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Height of the drop pin drawn over the map centre
    #[serde(default = "default_pin_height")]
    pub pin_height: u32,
}

/// Request flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// "discard" drops responses to superseded taps, "apply" shows them
    #[serde(default = "default_stale_policy")]
    pub stale_policy: String,

    /// Label text shown before the first tap
    #[serde(default = "default_instructions")]
    pub instructions: String,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeysConfig {
    /// Mapbox access token
    #[serde(default)]
    pub mapbox: String,
}

// Default value functions for serde
fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}
fn default_result_type() -> String {
    DEFAULT_RESULT_TYPE.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_mapbox_url() -> String {
    MAPBOX_URL.to_string()
}
fn default_nominatim_url() -> String {
    NOMINATIM_URL.to_string()
}
fn default_center_lat() -> f64 {
    DEFAULT_CENTER_LAT
}
fn default_center_lng() -> f64 {
    DEFAULT_CENTER_LNG
}
fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}
fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_pin_height() -> u32 {
    DEFAULT_PIN_HEIGHT
}
fn default_stale_policy() -> String {
    DEFAULT_STALE_POLICY.to_string()
}
fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            result_type: default_result_type(),
            timeout_secs: default_timeout(),
            mapbox_url: default_mapbox_url(),
            nominatim_url: default_nominatim_url(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom: default_zoom(),
            width: default_width(),
            height: default_height(),
            pin_height: default_pin_height(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            stale_policy: default_stale_policy(),
            instructions: default_instructions(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "backend"] => Some(self.geocoder.backend.clone()),
            ["geocoder", "result_type"] => Some(self.geocoder.result_type.clone()),
            ["geocoder", "timeout_secs"] => Some(self.geocoder.timeout_secs.to_string()),
            ["geocoder", "mapbox_url"] => Some(self.geocoder.mapbox_url.clone()),
            ["geocoder", "nominatim_url"] => Some(self.geocoder.nominatim_url.clone()),

            ["map", "center_lat"] => Some(self.map.center_lat.to_string()),
            ["map", "center_lng"] => Some(self.map.center_lng.to_string()),
            ["map", "zoom"] => Some(self.map.zoom.to_string()),
            ["map", "width"] => Some(self.map.width.to_string()),
            ["map", "height"] => Some(self.map.height.to_string()),
            ["map", "pin_height"] => Some(self.map.pin_height.to_string()),

            ["flow", "stale_policy"] => Some(self.flow.stale_policy.clone()),
            ["flow", "instructions"] => Some(self.flow.instructions.clone()),

            ["api_keys", "mapbox"] => Some(self.api_keys.mapbox.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Values are checked against their type (and, for enumerated keys,
    /// against the accepted names) before being stored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "backend"] => {
                let name = value.to_lowercase();
                if !crate::geo::available_backends().contains(&name.as_str()) {
                    return Err(Error::Config(format!("Unknown backend: {}", value)));
                }
                self.geocoder.backend = name;
            }
            ["geocoder", "result_type"] => {
                let parsed: ResultType = value.parse().map_err(Error::Config)?;
                self.geocoder.result_type = parsed.to_string();
            }
            ["geocoder", "timeout_secs"] => {
                self.geocoder.timeout_secs = value
                    .parse()
                    .ok()
                    .filter(|secs: &u64| *secs > 0)
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "Invalid timeout value: {} (expected whole seconds > 0)",
                            value
                        ))
                    })?;
            }
            ["geocoder", "mapbox_url"] => {
                self.geocoder.mapbox_url = value.trim_end_matches('/').to_string();
            }
            ["geocoder", "nominatim_url"] => {
                self.geocoder.nominatim_url = value.trim_end_matches('/').to_string();
            }

            ["map", "center_lat"] => {
                self.map.center_lat = parse_f64(key, value)?;
            }
            ["map", "center_lng"] => {
                self.map.center_lng = parse_f64(key, value)?;
            }
            ["map", "zoom"] => {
                self.map.zoom = parse_f64(key, value)?;
            }
            ["map", "width"] => {
                self.map.width = parse_u32(key, value)?;
            }
            ["map", "height"] => {
                self.map.height = parse_u32(key, value)?;
            }
            ["map", "pin_height"] => {
                self.map.pin_height = parse_u32(key, value)?;
            }

            ["flow", "stale_policy"] => {
                let parsed: StalePolicy = value.parse().map_err(Error::Config)?;
                self.flow.stale_policy = parsed.to_string();
            }
            ["flow", "instructions"] => {
                self.flow.instructions = value.to_string();
            }

            ["api_keys", "mapbox"] => {
                self.api_keys.mapbox = value.to_string();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "geocoder.backend",
            "geocoder.result_type",
            "geocoder.timeout_secs",
            "geocoder.mapbox_url",
            "geocoder.nominatim_url",
            "map.center_lat",
            "map.center_lng",
            "map.zoom",
            "map.width",
            "map.height",
            "map.pin_height",
            "flow.stale_policy",
            "flow.instructions",
            "api_keys.mapbox",
        ]
    }

    /// Mapbox access token, falling back to the MAPBOX_ACCESS_TOKEN variable
    pub fn mapbox_token(&self) -> Option<String> {
        if !self.api_keys.mapbox.is_empty() {
            return Some(self.api_keys.mapbox.clone());
        }
        std::env::var(MAPBOX_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
    }

    /// Parsed result type filter
    pub fn result_type(&self) -> Result<ResultType> {
        self.geocoder.result_type.parse().map_err(Error::Config)
    }

    /// Parsed stale response policy
    pub fn stale_policy(&self) -> Result<StalePolicy> {
        self.flow.stale_policy.parse().map_err(Error::Config)
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }

    /// Build the viewport projection described by the [map] section
    pub fn projection(&self) -> Result<Projection> {
        let center = Coordinate::new(self.map.center_lat, self.map.center_lng);
        center.validate()?;
        Projection::new(
            center,
            self.map.zoom,
            f64::from(self.map.width),
            f64::from(self.map.height),
        )
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid number for {}: {}", key, value)))
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid integer for {}: {}", key, value)))
}
