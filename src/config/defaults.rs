//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default geocoding backend
pub const DEFAULT_BACKEND: &str = "mapbox";

/// Default result type filter
pub const DEFAULT_RESULT_TYPE: &str = "poi";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default map centre latitude (Washington, DC)
pub const DEFAULT_CENTER_LAT: f64 = 38.907298;

/// Default map centre longitude (Washington, DC)
pub const DEFAULT_CENTER_LNG: f64 = -77.043478;

/// Default map zoom level
pub const DEFAULT_ZOOM: f64 = 15.0;

/// Default viewport width in pixels
pub const DEFAULT_WIDTH: u32 = 1080;

/// Default viewport height in pixels
pub const DEFAULT_HEIGHT: u32 = 1920;

/// Default drop pin height in pixels
pub const DEFAULT_PIN_HEIGHT: u32 = 48;

/// Default handling of responses that arrive after a newer tap
pub const DEFAULT_STALE_POLICY: &str = "discard";

/// Label text before the first tap
pub const DEFAULT_INSTRUCTIONS: &str = "Tap the map to geocode the location under the pin.";

/// Environment variable consulted when no Mapbox token is configured
pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geotap";
