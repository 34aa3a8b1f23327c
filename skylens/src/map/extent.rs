//! Geographic extents and tile-boundary snapping.

use crate::coord::{tile_for_coordinate, tile_nw_corner, TileCoord, TileRange};

use super::MapError;

/// A validated WGS84 lat/lon bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl MapExtent {
    /// Creates an extent, rejecting inverted or collapsed bounds.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, MapError> {
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(MapError::InvalidExtent {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            });
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Center latitude of the box.
    pub fn center_lat(&self) -> f64 {
        0.5 * (self.min_lat + self.max_lat)
    }

    /// Center longitude of the box.
    pub fn center_lon(&self) -> f64 {
        0.5 * (self.min_lon + self.max_lon)
    }

    /// Whether a coordinate lies inside the box (inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Snaps a requested extent outward to slippy-tile boundaries.
///
/// Returns the minimal tile range covering the requested box and the
/// box back-projected from that range's outer corners. Rows are sampled
/// along the box's center longitude and columns along its center
/// latitude, so the Mercator distortion of the box corners cannot shrink
/// the range.
///
/// The snapped extent always contains the requested one, and a mosaic
/// assembled from the range is exactly
/// `range.columns() * TILE_SIZE` by `range.rows() * TILE_SIZE` pixels.
pub fn covering_extent(
    requested: &MapExtent,
    zoom: u8,
) -> Result<(MapExtent, TileRange), MapError> {
    let mid_lat = requested.center_lat();
    let mid_lon = requested.center_lon();

    // Southern edge has the larger row index.
    let max_row = tile_for_coordinate(requested.min_lat, mid_lon, zoom)?.row;
    let min_row = tile_for_coordinate(requested.max_lat, mid_lon, zoom)?.row;
    let min_col = tile_for_coordinate(mid_lat, requested.min_lon, zoom)?.col;
    let max_col = tile_for_coordinate(mid_lat, requested.max_lon, zoom)?.col;

    let range = TileRange {
        min_col,
        max_col,
        min_row,
        max_row,
        zoom,
    };

    let (snap_max_lat, snap_min_lon) = tile_nw_corner(&TileCoord {
        col: min_col,
        row: min_row,
        zoom,
    });
    let (snap_min_lat, snap_max_lon) = tile_nw_corner(&TileCoord {
        col: max_col + 1,
        row: max_row + 1,
        zoom,
    });

    let snapped = MapExtent {
        min_lat: snap_min_lat,
        max_lat: snap_max_lat,
        min_lon: snap_min_lon,
        max_lon: snap_max_lon,
    };

    Ok((snapped, range))
}
