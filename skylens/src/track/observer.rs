//! Observer and landmark reference points.

use nalgebra::Vector3;
use tracing::debug;

use crate::coord::{sky_frame_position, ObserverPoint};
use crate::map::MapFrame;

/// The observing position both coordinate frames are anchored to.
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Floor altitude in meters above the spherical Earth surface.
    pub floor_altitude: f64,

    /// Map-frame position (km), valid for the map last passed to
    /// [`Observer::update_map_position`].
    map_position: Vector3<f64>,
    /// Whether the observer falls inside that map's extent.
    on_map: bool,
}

impl Observer {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, floor_altitude: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            floor_altitude,
            map_position: Vector3::zeros(),
            on_map: false,
        }
    }

    /// The observer as a bare projection input.
    pub fn as_point(&self) -> ObserverPoint {
        ObserverPoint {
            lat: self.lat,
            lon: self.lon,
            floor_altitude: self.floor_altitude,
        }
    }

    /// Recomputes the observer's map-frame position.
    pub fn update_map_position(&mut self, map: &MapFrame) {
        self.on_map = map.contains(self.lat, self.lon);
        let (x, y) = map.project(self.lon, self.lat);
        self.map_position = Vector3::new(x, y, self.floor_altitude / 1000.0);
        debug!(
            observer = %self.id,
            x_km = x,
            y_km = y,
            on_map = self.on_map,
            "observer map position updated"
        );
    }

    pub fn map_position(&self) -> Vector3<f64> {
        self.map_position
    }

    pub fn on_map(&self) -> bool {
        self.on_map
    }
}

/// A fixed, visually identifiable reference point used for sky-frame
/// alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Altitude of the landmark's top, meters.
    pub top_altitude: f64,
    /// Altitude of the landmark's base, meters.
    pub bottom_altitude: f64,

    map_position: Vector3<f64>,
    sky_position: Vector3<f64>,
}

impl Landmark {
    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lon: f64,
        top_altitude: f64,
        bottom_altitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            top_altitude,
            bottom_altitude,
            map_position: Vector3::zeros(),
            sky_position: Vector3::zeros(),
        }
    }

    /// Height of the landmark itself, meters.
    pub fn height(&self) -> f64 {
        self.top_altitude - self.bottom_altitude
    }

    /// Recomputes the derived positions for a (possibly new) map and
    /// observer. The sky position uses the landmark's top, which is the
    /// part an observer actually sights.
    pub fn update_positions(&mut self, map: Option<&MapFrame>, observer: &ObserverPoint) {
        if let Some(map) = map {
            let (x, y) = map.project(self.lon, self.lat);
            self.map_position = Vector3::new(x, y, self.top_altitude / 1000.0);
        }
        self.sky_position = sky_frame_position(observer, self.lat, self.lon, self.top_altitude);
    }

    /// Map-frame position (km), top of the landmark.
    pub fn map_position(&self) -> Vector3<f64> {
        self.map_position
    }

    /// Sky-frame position (m), top of the landmark.
    pub fn sky_position(&self) -> Vector3<f64> {
        self.sky_position
    }
}
