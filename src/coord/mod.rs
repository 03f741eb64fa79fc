//! Geographic coordinates and screen projection
//!
//! A `Coordinate` is created per tap and handed to the request flow; the
//! `projection` submodule turns screen points into coordinates.

pub mod projection;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create coordinates, rejecting values outside the valid ranges
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        let coordinate = Self::new(lat, lng);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || self.lat < -90.0 || self.lat > 90.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || self.lng < -180.0 || self.lng > 180.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Parses "lat,lng" (whitespace around either part is ignored)
impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lng) = s.split_once(',').ok_or_else(|| {
            Error::InvalidCoordinates(format!("Expected \"lat,lng\", got \"{}\"", s))
        })?;

        let lat: f64 = lat.trim().parse().map_err(|_| {
            Error::InvalidCoordinates(format!("Invalid latitude: {}", lat.trim()))
        })?;
        let lng: f64 = lng.trim().parse().map_err(|_| {
            Error::InvalidCoordinates(format!("Invalid longitude: {}", lng.trim()))
        })?;

        Self::checked(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Coordinate::new(38.9, -77.0).validate().is_ok());
        assert!(Coordinate::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinate::new(90.1, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -180.5).validate().is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_parse() {
        let coordinate: Coordinate = " 38.907298 , -77.043478 ".parse().unwrap();
        assert_eq!(coordinate, Coordinate::new(38.907298, -77.043478));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("38.9".parse::<Coordinate>().is_err());
        assert!("north,-77".parse::<Coordinate>().is_err());
        assert!("38.9,east".parse::<Coordinate>().is_err());
        assert!("95,10".parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_display() {
        let coordinate = Coordinate::new(38.907298, -77.043478);
        assert_eq!(coordinate.to_string(), "38.907298, -77.043478");
    }

    #[test]
    fn test_serialization() {
        let coordinate = Coordinate::new(40.7128, -74.0060);
        let json = serde_json::to_string(&coordinate).unwrap();
        assert_eq!(json, r#"{"lat":40.7128,"lng":-74.006}"#);
    }
}
