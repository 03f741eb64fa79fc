//! Centralized constants for the geotap crate
//!
//! Values shared by several modules live here so they stay consistent.

/// Geographic constants
pub mod geo {
    /// Web-Mercator tile size in pixels (vector tile convention)
    pub const TILE_SIZE: f64 = 512.0;

    /// Latitude limit of the Web-Mercator projection
    pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

    /// Highest zoom level a viewport accepts
    pub const MAX_ZOOM: f64 = 25.5;
}

/// External API endpoints
pub mod api {
    /// Mapbox API base URL (geocoding lives under /geocoding/v5)
    pub const MAPBOX_URL: &str = "https://api.mapbox.com";

    /// Mapbox places dataset
    pub const MAPBOX_DATASET: &str = "mapbox.places";

    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// User agent sent with every geocoding request
    pub const USER_AGENT: &str = concat!("geotap/", env!("CARGO_PKG_VERSION"));
}

/// Label texts shown by the request flow
pub mod messages {
    /// Shown while a request is in flight
    pub const IN_PROGRESS: &str = "Geocoding...";

    /// Shown when the geocoder returned no candidates
    pub const NO_RESULTS: &str = "No results.";

    /// Shown after the in-flight request was cancelled
    pub const CANCELLED: &str = "Cancelled.";

    /// Failure reason when a lookup ends without reporting (e.g. it panicked)
    pub const LOOKUP_LOST: &str = "Geocoding task ended without a result";

    /// Prefix for failure messages
    pub const ERROR_PREFIX: &str = "Error: ";
}
