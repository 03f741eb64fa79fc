//! Geocoding module
//!
//! The outbound boundary of the request flow: a query keyed by
//! (longitude, latitude, result type) goes out, zero or more place
//! features come back.

pub mod mapbox;
pub mod nominatim;

use crate::config::Config;
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A place candidate returned by a geocoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceFeature {
    /// Human readable place name
    pub place_name: String,

    /// Where the geocoder located the feature, when it says so
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,
}

impl PlaceFeature {
    pub fn new(place_name: impl Into<String>) -> Self {
        Self {
            place_name: place_name.into(),
            center: None,
        }
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = Some(center);
        self
    }
}

/// Kind of feature the geocoder should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Points of interest
    #[default]
    Poi,
    Address,
    Neighborhood,
    Locality,
    Place,
    Postcode,
    District,
    Region,
    Country,
}

impl ResultType {
    /// All result types, most specific first
    pub fn all() -> [ResultType; 9] {
        [
            Self::Poi,
            Self::Address,
            Self::Neighborhood,
            Self::Locality,
            Self::Place,
            Self::Postcode,
            Self::District,
            Self::Region,
            Self::Country,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poi => "poi",
            Self::Address => "address",
            Self::Neighborhood => "neighborhood",
            Self::Locality => "locality",
            Self::Place => "place",
            Self::Postcode => "postcode",
            Self::District => "district",
            Self::Region => "region",
            Self::Country => "country",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("Unknown result type: {}", s))
    }
}

/// One reverse geocoding request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeQuery {
    pub coordinate: Coordinate,
    pub result_type: ResultType,
}

impl GeocodeQuery {
    pub fn new(coordinate: Coordinate, result_type: ResultType) -> Self {
        Self {
            coordinate,
            result_type,
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.lng
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.lat
    }
}

/// Trait for geocoding backends
pub trait GeoBackend: Send + Sync {
    /// Backend name as used in configuration
    fn name(&self) -> &str;

    /// Look up the places at a coordinate
    ///
    /// Returns candidates ordered best first; an empty list means the
    /// service answered but knows nothing there.
    fn reverse_geocode(
        &self,
        query: &GeocodeQuery,
    ) -> impl std::future::Future<Output = Result<Vec<PlaceFeature>>> + Send;
}

/// Backend selected at runtime from configuration
#[derive(Debug, Clone)]
pub enum Backend {
    Mapbox(mapbox::MapboxBackend),
    Nominatim(nominatim::NominatimBackend),
}

impl GeoBackend for Backend {
    fn name(&self) -> &str {
        match self {
            Self::Mapbox(backend) => backend.name(),
            Self::Nominatim(backend) => backend.name(),
        }
    }

    async fn reverse_geocode(&self, query: &GeocodeQuery) -> Result<Vec<PlaceFeature>> {
        match self {
            Self::Mapbox(backend) => backend.reverse_geocode(query).await,
            Self::Nominatim(backend) => backend.reverse_geocode(query).await,
        }
    }
}

/// Names accepted by `get_backend`
pub fn available_backends() -> Vec<&'static str> {
    vec!["mapbox", "nominatim"]
}

/// Build the backend named in the configuration
///
/// A missing Mapbox token is not an error here: the backend reports it on
/// each request so the flow can show it on the label.
pub fn get_backend(config: &Config) -> Result<Backend> {
    let timeout = config.timeout();

    match config.geocoder.backend.to_lowercase().as_str() {
        "mapbox" => Ok(Backend::Mapbox(mapbox::MapboxBackend::new(
            &config.geocoder.mapbox_url,
            config.mapbox_token(),
            timeout,
        )?)),
        "nominatim" => Ok(Backend::Nominatim(nominatim::NominatimBackend::new(
            &config.geocoder.nominatim_url,
            timeout,
        )?)),
        other => Err(Error::Config(format!("Unknown backend: {}", other))),
    }
}
