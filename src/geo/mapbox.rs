//! Mapbox reverse geocoding backend
//!
//! Uses the Mapbox Geocoding v5 "mapbox.places" dataset. Requires an access
//! token; without one every request fails with a configuration error.

use crate::constants::api::{MAPBOX_DATASET, USER_AGENT};
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use crate::geo::{GeoBackend, GeocodeQuery, PlaceFeature};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Mapbox geocoding backend
#[derive(Debug, Clone)]
pub struct MapboxBackend {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

/// Geocoding response (a GeoJSON feature collection)
#[derive(Debug, Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    place_name: String,
    /// [longitude, latitude]
    center: Option<[f64; 2]>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct MapboxError {
    message: String,
}

impl MapboxBackend {
    /// Create a new Mapbox backend
    ///
    /// # Arguments
    /// * `base_url` - API root, normally https://api.mapbox.com
    /// * `access_token` - Mapbox token; `None` makes every request fail
    /// * `timeout` - whole-request timeout
    pub fn new(base_url: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Build the request URL for a query
    fn request_url(&self, query: &GeocodeQuery, token: &str) -> String {
        format!(
            "{}/geocoding/v5/{}/{},{}.json?types={}&access_token={}",
            self.base_url,
            MAPBOX_DATASET,
            query.longitude(),
            query.latitude(),
            query.result_type,
            urlencoding::encode(token)
        )
    }

    /// Parse a successful response body into place features
    fn parse_features(body: &str) -> Result<Vec<PlaceFeature>> {
        let response: MapboxResponse = serde_json::from_str(body)
            .map_err(|e| Error::Geocoding(format!("Failed to parse Mapbox response: {}", e)))?;

        Ok(response
            .features
            .into_iter()
            .map(|feature| PlaceFeature {
                place_name: feature.place_name,
                center: feature.center.map(|[lng, lat]| Coordinate::new(lat, lng)),
            })
            .collect())
    }
}

impl GeoBackend for MapboxBackend {
    fn name(&self) -> &str {
        "mapbox"
    }

    async fn reverse_geocode(&self, query: &GeocodeQuery) -> Result<Vec<PlaceFeature>> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            Error::Config("Mapbox access token is not configured".to_string())
        })?;

        debug!(
            lng = query.longitude(),
            lat = query.latitude(),
            types = %query.result_type,
            "Mapbox reverse geocode"
        );

        let response = self
            .client
            .get(self.request_url(query, token))
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Mapbox request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to read Mapbox response: {}", e)))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<MapboxError>(&body) {
                Ok(err) => Error::Geocoding(format!(
                    "Mapbox returned status {}: {}",
                    status, err.message
                )),
                Err(_) => Error::Geocoding(format!("Mapbox returned status: {}", status)),
            });
        }

        Self::parse_features(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::test_support::{dead_url, spawn_server};
    use crate::geo::ResultType;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn query() -> GeocodeQuery {
        GeocodeQuery::new(Coordinate::new(38.907298, -77.043478), ResultType::Poi)
    }

    #[test]
    fn test_request_url() {
        let backend = MapboxBackend::new("https://api.mapbox.com/", None, TIMEOUT).unwrap();
        let url = backend.request_url(&query(), "pk.a b");
        assert_eq!(
            url,
            "https://api.mapbox.com/geocoding/v5/mapbox.places/-77.043478,38.907298.json?types=poi&access_token=pk.a%20b"
        );
    }

    #[test]
    fn test_parse_features() {
        let body = r#"{
            "type": "FeatureCollection",
            "query": [-77.043478, 38.907298],
            "features": [
                {"id": "poi.1", "place_name": "Dupont Circle, Washington, DC", "center": [-77.0434, 38.9096]},
                {"id": "poi.2", "place_name": "Embassy Row, Washington, DC"}
            ]
        }"#;

        let features = MapboxBackend::parse_features(body).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].place_name, "Dupont Circle, Washington, DC");
        assert_eq!(features[0].center, Some(Coordinate::new(38.9096, -77.0434)));
        assert_eq!(features[1].center, None);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(MapboxBackend::parse_features(r#"{"features": []}"#).unwrap().is_empty());
        assert!(MapboxBackend::parse_features(r#"{"type": "FeatureCollection"}"#)
            .unwrap()
            .is_empty());
        assert!(MapboxBackend::parse_features("not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_token() {
        let backend = MapboxBackend::new("http://127.0.0.1:1", None, TIMEOUT).unwrap();
        let err = backend.reverse_geocode(&query()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_reverse_geocode_against_server() {
        async fn places(
            Path(coords): Path<String>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<serde_json::Value> {
            assert_eq!(coords, "-77.043478,38.907298.json");
            assert_eq!(params.get("types").map(String::as_str), Some("poi"));
            assert_eq!(params.get("access_token").map(String::as_str), Some("pk.test"));
            Json(serde_json::json!({
                "features": [{"place_name": "Dupont Circle", "center": [-77.0434, 38.9096]}]
            }))
        }

        let base = spawn_server(
            Router::new().route("/geocoding/v5/mapbox.places/:coords", get(places)),
        )
        .await;

        let backend = MapboxBackend::new(&base, Some("pk.test".to_string()), TIMEOUT).unwrap();
        let features = backend.reverse_geocode(&query()).await.unwrap();
        assert_eq!(features, vec![
            PlaceFeature::new("Dupont Circle").with_center(Coordinate::new(38.9096, -77.0434))
        ]);
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let base = spawn_server(Router::new().route(
            "/geocoding/v5/mapbox.places/:coords",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Not Authorized - Invalid Token"})),
                )
            }),
        ))
        .await;

        let backend = MapboxBackend::new(&base, Some("bad".to_string()), TIMEOUT).unwrap();
        let err = backend.reverse_geocode(&query()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("401"), "{}", message);
        assert!(message.contains("Not Authorized - Invalid Token"), "{}", message);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let backend =
            MapboxBackend::new(&dead_url().await, Some("pk.test".to_string()), TIMEOUT).unwrap();
        let err = backend.reverse_geocode(&query()).await.unwrap_err();
        assert!(err.to_string().contains("Mapbox request failed"));
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let base = spawn_server(Router::new().route(
            "/geocoding/v5/mapbox.places/:coords",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({"features": []}))
            }),
        ))
        .await;

        let backend =
            MapboxBackend::new(&base, Some("pk.test".to_string()), Duration::from_millis(100))
                .unwrap();
        assert!(backend.reverse_geocode(&query()).await.is_err());
    }
}
