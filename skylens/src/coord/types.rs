//! Core coordinate types shared across the projection functions.

use thiserror::Error;

/// Maximum latitude handled by the Web Mercator projection (degrees).
///
/// Latitudes beyond this are clamped to the projection's range value
/// rather than wrapped; see [`crate::coord::project_web_mercator`].
pub const MAX_LAT: f64 = 86.0;

/// Minimum latitude handled by the Web Mercator projection (degrees).
pub const MIN_LAT: f64 = -86.0;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Maximum slippy-map zoom level supported.
pub const MAX_ZOOM: u8 = 19;

/// Spherical Earth radius used by all projections, in meters.
///
/// The exact value is load-bearing: map frames, sky frames and tile
/// mosaics must agree on it or plane overlays drift off the basemap.
pub const EARTH_RADIUS_METERS: f64 = 6_378_136.98;

/// Spherical Earth radius in kilometers.
pub const EARTH_RADIUS_KILOMETERS: f64 = EARTH_RADIUS_METERS / 1000.0;

/// A slippy-map tile index at a given zoom level.
///
/// `col` increases eastward from longitude -180, `row` increases
/// southward from the projection's north edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Tile column (X index).
    pub col: u32,
    /// Tile row (Y index).
    pub row: u32,
    /// Zoom level.
    pub zoom: u8,
}

/// An inclusive rectangular range of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_col: u32,
    pub max_col: u32,
    pub min_row: u32,
    pub max_row: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Number of tile columns in the range.
    pub fn columns(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    /// Number of tile rows in the range.
    pub fn rows(&self) -> u32 {
        self.max_row - self.min_row + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> u32 {
        self.columns() * self.rows()
    }

    /// Iterate the range in row-major order (west-to-east, north-to-south).
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom;
        let cols = self.min_col..=self.max_col;
        (self.min_row..=self.max_row)
            .flat_map(move |row| cols.clone().map(move |col| TileCoord { col, row, zoom }))
    }
}

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("latitude {0} outside valid range [{MIN_LAT}, {MAX_LAT}]")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("longitude {0} outside valid range [{MIN_LON}, {MAX_LON}]")]
    InvalidLongitude(f64),

    /// Zoom level beyond the supported maximum.
    #[error("zoom level {0} exceeds maximum {MAX_ZOOM}")]
    InvalidZoom(u8),
}
