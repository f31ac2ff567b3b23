//! XYZ tile geometry for the Web Mercator tile pyramid.
//!
//! Implements the standard slippy-map scheme: tile (x, y, z) addresses a
//! square region of the EPSG:3857 plane, with zoom-doubling columns/rows and
//! a top-left origin.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Half the Web Mercator extent in meters (EPSG:3857).
pub const MERCATOR_EXTENT: f64 = 20037508.342789244;

/// Highest zoom level the resolution table covers.
pub const MAX_ZOOM: u32 = 20;

/// Ground sampling distance (meters per pixel) for each zoom level,
/// starting at zoom 0. Strictly decreasing.
pub const TILE_RESOLUTION: [f64; 21] = [
    156412.0, 78206.0, 39103.0, 19551.0, 9776.0, 4888.0, 2444.0, 1222.0, 610.984, 305.492,
    152.746, 76.373, 38.187, 19.093, 9.547, 4.773, 2.387, 1.193, 0.596, 0.298, 0.149,
];

/// Meters per pixel at the given zoom level, or `None` above [`MAX_ZOOM`].
pub fn ground_resolution(zoom: u32) -> Option<f64> {
    TILE_RESOLUTION.get(zoom as usize).copied()
}

/// A tile coordinate (x/y/z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
    /// Zoom level
    pub z: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Projected (EPSG:3857) bounds of a tile.
pub fn mercator_tile_bounds(coord: &TileCoord) -> BoundingBox {
    let n = (1u64 << coord.z) as f64;
    let span = 2.0 * MERCATOR_EXTENT / n;

    let min_x = -MERCATOR_EXTENT + coord.x as f64 * span;
    let max_y = MERCATOR_EXTENT - coord.y as f64 * span;

    BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
}

/// Convert a Web Mercator coordinate to (lon, lat) degrees.
pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = x / MERCATOR_EXTENT * 180.0;
    let lat = ((y / MERCATOR_EXTENT * std::f64::consts::PI).exp().atan() * 2.0
        - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    (lon, lat)
}

/// Convert lat/lon to the tile containing it at the given zoom.
///
/// Indices are clamped into the valid range, so poles and the antimeridian
/// map onto edge tiles instead of overflowing the grid.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let n = (1u64 << zoom) as f64;
    let max_index = (1u64 << zoom) - 1;

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

    TileCoord {
        x: x.clamp(0.0, max_index as f64) as u32,
        y: y.clamp(0.0, max_index as f64) as u32,
        z: zoom,
    }
}

/// Check if a tile is inside the given WGS84 dataset bounds.
///
/// Computes the min/max tile index covering the bounds at the tile's zoom;
/// the tile exists iff its x and y both fall within the inclusive range, so
/// boundary tiles count as inside.
pub fn tile_exists(wgs_bounds: &BoundingBox, coord: &TileCoord) -> bool {
    let min_tile = latlon_to_tile(wgs_bounds.max_y, wgs_bounds.min_x, coord.z);
    let max_tile = latlon_to_tile(wgs_bounds.min_y, wgs_bounds.max_x, coord.z);

    min_tile.x <= coord.x && coord.x <= max_tile.x && min_tile.y <= coord.y && coord.y <= max_tile.y
}

/// Expand projected tile bounds by a pixel buffer.
///
/// The buffer distance is `TILE_RESOLUTION[zoom] * buffer_px` on each side;
/// a zero buffer returns the bounds unchanged.
pub fn buffered_bounds(bounds: &BoundingBox, zoom: u32, buffer_px: u32) -> BoundingBox {
    if buffer_px == 0 {
        return *bounds;
    }
    let resolution = TILE_RESOLUTION[(zoom as usize).min(MAX_ZOOM as usize)];
    bounds.expand(resolution * buffer_px as f64)
}
