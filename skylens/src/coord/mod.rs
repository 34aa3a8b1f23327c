//! Coordinate conversion module
//!
//! Provides the projections everything else is built on: spherical Web
//! Mercator (EPSG:4326 -> EPSG:3857), slippy-map tile indexing, and the
//! observer-centric sky-frame transform.
//!
//! All functions here are pure; map- and observer-relative state lives
//! in [`crate::map`] and [`crate::track`].

mod sky;
mod types;

pub use sky::{sky_frame_position, ObserverPoint, EYE_HEIGHT_METERS};
pub use types::{
    CoordError, TileCoord, TileRange, EARTH_RADIUS_KILOMETERS, EARTH_RADIUS_METERS, MAX_LAT,
    MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
};

use std::f64::consts::PI;

/// Full Web Mercator meter range, used as the clamp value for latitudes
/// beyond the projection's validity.
const MERCATOR_RANGE: f64 = EARTH_RADIUS_METERS * PI * 2.0;

/// Projects WGS84 coordinates to Web Mercator meters.
///
/// Uses the spherical formula with [`EARTH_RADIUS_METERS`]. Latitudes
/// beyond ±86° are clamped to the projection's range value rather than
/// wrapped, so callers never see NaN/infinite Y near the poles.
///
/// Distances in X are only accurate near the equator; this is a
/// cylindrical projection and map frames correct for it per-map.
#[inline]
pub fn project_web_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon * (MERCATOR_RANGE / 360.0);

    let y = if lat > MAX_LAT {
        MERCATOR_RANGE
    } else if lat < MIN_LAT {
        -MERCATOR_RANGE
    } else {
        let phi = lat.to_radians();
        (phi.tan() + 1.0 / phi.cos()).ln() * EARTH_RADIUS_METERS
    };

    (x, y)
}

/// Returns the tile containing the given coordinate.
///
/// Standard slippy-map formula: `col = floor((lon+180)/360 * 2^zoom)`,
/// `row` via the inverse Gudermannian of latitude.
///
/// # Errors
///
/// Returns a `CoordError` for out-of-range latitude, longitude or zoom.
#[inline]
pub fn tile_for_coordinate(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (n as u32) - 1;

    let col = ((lon + 180.0) / 360.0 * n) as u32;

    let lat_rad = lat.to_radians();
    let row = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    // lon = 180 / lat = -86 land exactly on the far edge; keep them in
    // the last tile instead of one past it.
    Ok(TileCoord {
        col: col.min(max_index),
        row: row.min(max_index),
        zoom,
    })
}

/// Returns the latitude/longitude of a tile's northwest corner.
///
/// Call with `col+1` and/or `row+1` to obtain the other corners.
#[inline]
pub fn tile_nw_corner(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    let y = tile.row as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Approximate ground size of a lat/lon box, in kilometers.
///
/// Width is measured along the box's center latitude, height along a
/// meridian. Used for map scale display and the map frame's km axes.
pub fn ground_size_km(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> (f64, f64) {
    let center_lat = 0.5 * (min_lat + max_lat);
    let r = EARTH_RADIUS_KILOMETERS * center_lat.to_radians().cos();
    let width = (max_lon - min_lon) / 360.0 * 2.0 * PI * r;
    let height = (max_lat - min_lat) / 360.0 * 2.0 * PI * EARTH_RADIUS_KILOMETERS;
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_equator_origin() {
        let (x, y) = project_web_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_mercator_known_point() {
        // lon 5, lat 52 (central Netherlands); reference values from the
        // spherical formula with R = 6378136.98.
        let (x, y) = project_web_mercator(5.0, 52.0);
        assert!((x - 556_596.5).abs() < 100.0, "x = {x}");
        assert!((y - 6_800_125.0).abs() < 100.0, "y = {y}");
    }

    #[test]
    fn test_mercator_clamps_beyond_valid_latitude() {
        let (_, y_north) = project_web_mercator(0.0, 89.0);
        let (_, y_south) = project_web_mercator(0.0, -89.0);
        assert_eq!(y_north, MERCATOR_RANGE);
        assert_eq!(y_south, -MERCATOR_RANGE);
    }

    #[test]
    fn test_mercator_x_is_linear_in_longitude() {
        let (x1, _) = project_web_mercator(-90.0, 10.0);
        let (x2, _) = project_web_mercator(90.0, 10.0);
        assert!((x1 + x2).abs() < 1e-6);
        assert!((x2 - MERCATOR_RANGE / 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_tile_for_amsterdam_at_zoom_10() {
        // Amsterdam: 52.37°N, 4.90°E
        let tile = tile_for_coordinate(52.37, 4.90, 10).unwrap();
        assert_eq!(tile.col, 525);
        assert_eq!(tile.row, 336);
    }

    #[test]
    fn test_tile_rejects_invalid_inputs() {
        assert!(matches!(
            tile_for_coordinate(90.0, 0.0, 10),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            tile_for_coordinate(0.0, 200.0, 10),
            Err(CoordError::InvalidLongitude(_))
        ));
        assert!(matches!(
            tile_for_coordinate(0.0, 0.0, 25),
            Err(CoordError::InvalidZoom(_))
        ));
    }

    #[test]
    fn test_tile_edge_longitude_stays_in_range() {
        let tile = tile_for_coordinate(0.0, 180.0, 4).unwrap();
        assert_eq!(tile.col, 15);
    }

    #[test]
    fn test_nw_corner_of_origin_tile() {
        let (lat, lon) = tile_nw_corner(&TileCoord { col: 0, row: 0, zoom: 0 });
        assert!((lon - (-180.0)).abs() < 1e-9);
        assert!(lat > 85.0);
    }

    #[test]
    fn test_ground_size_netherlands() {
        // Roughly the Netherlands box; ~360 km wide, ~380 km tall.
        let (w, h) = ground_size_km(50.51, 53.96, 2.81, 8.09);
        assert!((w - 360.0).abs() < 20.0, "width = {w}");
        assert!((h - 383.0).abs() < 20.0, "height = {h}");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_roundtrip_within_one_tile(
                lat in -85.05..85.05_f64,
                lon in -179.99..179.99_f64,
                zoom in 0u8..=18
            ) {
                let tile = tile_for_coordinate(lat, lon, zoom)?;
                let (corner_lat, corner_lon) = tile_nw_corner(&tile);
                let (south_lat, east_lon) = tile_nw_corner(&TileCoord {
                    col: tile.col + 1,
                    row: tile.row + 1,
                    zoom,
                });

                // The coordinate must lie inside the tile it mapped to.
                prop_assert!(corner_lon <= lon && lon <= east_lon,
                    "lon {} outside tile [{}, {}]", lon, corner_lon, east_lon);
                prop_assert!(south_lat <= lat && lat <= corner_lat,
                    "lat {} outside tile [{}, {}]", lat, south_lat, corner_lat);
            }

            #[test]
            fn test_tile_indices_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = tile_for_coordinate(lat, lon, zoom)?;
                let max_tile = 2u32.pow(zoom as u32);
                prop_assert!(tile.col < max_tile);
                prop_assert!(tile.row < max_tile);
            }

            #[test]
            fn test_mercator_y_monotonic_in_latitude(
                lat1 in -80.0..0.0_f64,
                lat2 in 0.1..80.0_f64,
                lon in -180.0..180.0_f64
            ) {
                let (_, y1) = project_web_mercator(lon, lat1);
                let (_, y2) = project_web_mercator(lon, lat2);
                prop_assert!(y1 < y2);
            }
        }
    }
}
