// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geographic primitives: coordinates, bounding boxes and Web Mercator math.

use std::f64::consts::PI;

/// Pixel size of one slippy map tile.
pub const TILE_SIZE: f64 = 256.0;

/// A WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The rectangular region currently visible on the map.
///
/// Containment is inclusive on every edge. A box whose `west` edge is east
/// of its `east` edge spans the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Build a box from the screen's top-left and bottom-right corners.
    #[must_use]
    pub fn from_corners(top_left: LatLon, bottom_right: LatLon) -> Self {
        Self {
            south: top_left.lat.min(bottom_right.lat),
            north: top_left.lat.max(bottom_right.lat),
            west: top_left.lon,
            east: bottom_right.lon,
        }
    }

    /// Check whether a coordinate lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: LatLon) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }

        if self.west <= self.east {
            point.lon >= self.west && point.lon <= self.east
        } else {
            point.lon >= self.west || point.lon <= self.east
        }
    }
}

/// Screen-space insets, in pixels, that the camera should keep clear.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgePadding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl EdgePadding {
    #[must_use]
    pub const fn top(top: f32) -> Self {
        Self {
            top,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
        }
    }
}

/// Web Mercator projection utilities.
///
/// Coordinates are expressed in tile units at a fractional zoom level, the
/// same convention slippy map tile servers use.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to a Web Mercator Y coordinate in tile units.
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
        let lat_rad = lat.to_radians();
        let n = 2_f64.powf(zoom);
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        y * n
    }

    /// Convert longitude to a Web Mercator X coordinate in tile units.
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
        let n = 2_f64.powf(zoom);
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert a tile-unit Y coordinate back to latitude.
    #[must_use]
    pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
        let n = 2_f64.powf(zoom);
        let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
        lat_rad.to_degrees()
    }

    /// Convert a tile-unit X coordinate back to longitude.
    #[must_use]
    pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
        let n = 2_f64.powf(zoom);
        x / n * 360.0 - 180.0
    }

    /// Camera center that puts `target` in the middle of the padded viewport.
    ///
    /// With a top padding of 300 px the target lands 150 px below the true
    /// viewport center, so the camera itself sits 150 px north of it.
    #[must_use]
    pub fn padded_center(target: LatLon, zoom: f64, padding: EdgePadding) -> LatLon {
        let dx = f64::from(padding.left - padding.right) / 2.0;
        let dy = f64::from(padding.top - padding.bottom) / 2.0;

        let x = Self::lon_to_x(target.lon, zoom) - dx / TILE_SIZE;
        let y = Self::lat_to_y(target.lat, zoom) - dy / TILE_SIZE;

        LatLon::new(Self::y_to_lat(y, zoom), Self::x_to_lon(x, zoom))
    }
}
