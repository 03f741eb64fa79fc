//! Nominatim reverse geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim API. No key needed, but the usage policy asks for
//! an identifying User-Agent and at most one request per second.

use crate::constants::api::USER_AGENT;
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use crate::geo::{GeoBackend, GeocodeQuery, PlaceFeature, ResultType};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim reverse response
///
/// Places that cannot be resolved come back as 200 with only `error` set.
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: Option<String>,
    lon: Option<String>,
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimBackend {
    /// Create a new Nominatim backend
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Nominatim detail level for a result type
    fn zoom_for(result_type: ResultType) -> u8 {
        match result_type {
            ResultType::Poi | ResultType::Address => 18,
            ResultType::Neighborhood => 14,
            ResultType::Locality | ResultType::Place => 10,
            ResultType::Postcode | ResultType::District => 8,
            ResultType::Region => 5,
            ResultType::Country => 3,
        }
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<Coordinate> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid longitude: {}", lng)))?;
        Ok(Coordinate::new(lat, lng))
    }

    /// Turn a response body into zero or one place features
    fn parse_features(body: &str) -> Result<Vec<PlaceFeature>> {
        let result: NominatimResult = serde_json::from_str(body).map_err(|e| {
            Error::Geocoding(format!("Failed to parse Nominatim response: {}", e))
        })?;

        if let Some(reason) = result.error {
            debug!(reason = %reason, "Nominatim found nothing");
            return Ok(Vec::new());
        }

        let Some(display_name) = result.display_name else {
            return Ok(Vec::new());
        };

        let center = match (result.lat, result.lon) {
            (Some(lat), Some(lon)) => Some(Self::parse_coords(&lat, &lon)?),
            _ => None,
        };

        Ok(vec![PlaceFeature {
            place_name: display_name,
            center,
        }])
    }
}

impl GeoBackend for NominatimBackend {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn reverse_geocode(&self, query: &GeocodeQuery) -> Result<Vec<PlaceFeature>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&zoom={}",
            self.base_url,
            query.latitude(),
            query.longitude(),
            Self::zoom_for(query.result_type)
        );

        debug!(url = %url, "Nominatim reverse geocode");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(Vec::new());
            }
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to read Nominatim response: {}", e)))?;

        Self::parse_features(&body)
    }
}
