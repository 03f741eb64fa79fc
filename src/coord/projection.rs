//! Web-Mercator viewport projection
//!
//! Converts between screen pixels of a map viewport and geographic
//! coordinates. The viewport is described by its centre, zoom level and
//! pixel size; screen origin is the top-left corner with y growing down.

use crate::constants::geo::{MAX_MERCATOR_LAT, MAX_ZOOM, TILE_SIZE};
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A point on screen, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Projection for a fixed viewport
#[derive(Debug, Clone)]
pub struct Projection {
    center: Coordinate,
    zoom: f64,
    width: f64,
    height: f64,
    /// Centre in world pixels, cached
    center_px: (f64, f64),
}

impl Projection {
    /// Create a projection for a viewport
    ///
    /// # Arguments
    /// * `center` - coordinate shown in the middle of the viewport
    /// * `zoom` - zoom level, 0 shows the whole world in one tile
    /// * `width`, `height` - viewport size in pixels
    pub fn new(center: Coordinate, zoom: f64, width: f64, height: f64) -> Result<Self> {
        if !(0.0..=MAX_ZOOM).contains(&zoom) {
            return Err(Error::InvalidViewport(format!(
                "Zoom {} is out of range [0, {}]",
                zoom, MAX_ZOOM
            )));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::InvalidViewport(format!(
                "Viewport size {}x{} must be positive",
                width, height
            )));
        }

        let world = world_size(zoom);
        Ok(Self {
            center,
            zoom,
            width,
            height,
            center_px: project(center, world),
        })
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Coordinate under a screen point
    pub fn from_screen_location(&self, point: ScreenPoint) -> Coordinate {
        let world = world_size(self.zoom);
        let px = self.center_px.0 + (point.x - self.width / 2.0);
        let py = self.center_px.1 + (point.y - self.height / 2.0);
        unproject(px, py, world)
    }

    /// Screen point of a coordinate (may fall outside the viewport)
    pub fn to_screen_location(&self, coordinate: Coordinate) -> ScreenPoint {
        let world = world_size(self.zoom);
        let (px, py) = project(coordinate, world);
        ScreenPoint::new(
            px - self.center_px.0 + self.width / 2.0,
            py - self.center_px.1 + self.height / 2.0,
        )
    }

    /// Screen point under the tip of a drop pin drawn centred on the map
    ///
    /// The pin image is centred on the viewport, so its tip sits half the
    /// pin height below the centre.
    pub fn drop_pin_location(&self, pin_height: f64) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, (self.height + pin_height) / 2.0)
    }

    /// Coordinate under the tip of the drop pin
    pub fn pin_coordinate(&self, pin_height: f64) -> Coordinate {
        self.from_screen_location(self.drop_pin_location(pin_height))
    }

    /// Whether a screen point lies inside the viewport
    pub fn contains(&self, point: ScreenPoint) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

fn project(coordinate: Coordinate, world: f64) -> (f64, f64) {
    let lat = coordinate.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = (coordinate.lng + 180.0) / 360.0 * world;
    let y = (1.0 - (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() / PI) / 2.0 * world;
    (x, y)
}

fn unproject(x: f64, y: f64, world: f64) -> Coordinate {
    let lng = wrap_longitude(x / world * 360.0 - 180.0);
    let n = PI * (1.0 - 2.0 * y / world);
    let lat = n.sinh().atan().to_degrees();
    Coordinate::new(lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT), lng)
}

/// Wrap a longitude into [-180, 180)
fn wrap_longitude(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
