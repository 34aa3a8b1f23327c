//! Per-map planar projection frame.

use crate::coord::{ground_size_km, project_web_mercator};

use super::{MapError, MapExtent};

/// A named map with its precomputed projection frame.
///
/// The frame normalizes Web Mercator coordinates into kilometer offsets
/// from the map center. The Mercator bounding box is sampled along the
/// extent's center lines, which keeps the planar frame honest at the
/// map's own latitude despite the cylindrical projection's stretch.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFrame {
    name: String,
    extent: MapExtent,
    zoom: u8,

    // EPSG:3857 extents, meters.
    min_x: f64,
    min_y: f64,
    x_extent: f64,
    y_extent: f64,

    // Approximate ground size, kilometers.
    width_km: f64,
    height_km: f64,
}

impl MapFrame {
    /// Builds a frame for the given extent and tile zoom level.
    pub fn new(name: impl Into<String>, extent: MapExtent, zoom: u8) -> Result<Self, MapError> {
        let center_lat = extent.center_lat();
        let center_lon = extent.center_lon();

        let (min_x, _) = project_web_mercator(extent.min_lon, center_lat);
        let (max_x, _) = project_web_mercator(extent.max_lon, center_lat);
        let (_, min_y) = project_web_mercator(center_lon, extent.min_lat);
        let (_, max_y) = project_web_mercator(center_lon, extent.max_lat);

        let (width_km, height_km) = ground_size_km(
            extent.min_lat,
            extent.max_lat,
            extent.min_lon,
            extent.max_lon,
        );

        Ok(Self {
            name: name.into(),
            extent,
            zoom,
            min_x,
            min_y,
            x_extent: max_x - min_x,
            y_extent: max_y - min_y,
            width_km,
            height_km,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extent(&self) -> &MapExtent {
        &self.extent
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Approximate map width in kilometers at the center latitude.
    pub fn width_km(&self) -> f64 {
        self.width_km
    }

    /// Approximate map height in kilometers.
    pub fn height_km(&self) -> f64 {
        self.height_km
    }

    /// Whether a coordinate falls inside the map's extent.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.extent.contains(lat, lon)
    }

    /// Projects a WGS84 coordinate into the map frame.
    ///
    /// Output is kilometer offsets from the map center; east and north
    /// positive. Coordinates outside the extent project to offsets
    /// beyond the map edges, they are not clamped.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (mx, my) = project_web_mercator(lon, lat);
        let x = ((mx - self.min_x) / self.x_extent - 0.5) * self.width_km;
        let y = ((my - self.min_y) / self.y_extent - 0.5) * self.height_km;
        (x, y)
    }
}
