//! Per-aircraft state and dead-reckoning extrapolation.

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::coord::{sky_frame_position, ObserverPoint};
use crate::map::MapFrame;

use super::sample::StateVector;

/// Seconds without a new sample before a track is considered late.
pub const LATE_AFTER_SECS: f64 = 60.0;

/// Seconds without a new sample before a late track goes missing.
pub const MISSING_AFTER_SECS: f64 = 120.0;

/// Ground speed below which the climb angle is forced to zero (m/s).
const MIN_SPEED_FOR_CLIMB_ANGLE: f64 = 1.0e-6;

/// Data-freshness classification of a track.
///
/// Monotone non-decreasing between samples: Fresh -> Late -> Missing,
/// never skipping Late; any new sample resets to Fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Late,
    Missing,
}

/// Everything known about one aircraft.
///
/// Positions are kept in both frames: map frame in kilometers
/// (x east, y north, z altitude) and sky frame in meters. The
/// `computed_*` values are the dead-reckoned positions refreshed every
/// update tick; the `previous_*` values are the pre-overwrite positions
/// consumers use for trail interpolation.
#[derive(Debug, Clone)]
pub struct AircraftTrack {
    address: String,
    callsign: Option<String>,
    freshness: Freshness,
    last: Option<StateVector>,

    climb_angle_deg: f64,
    /// Map-frame velocity, km/s.
    velocity_km_s: Vector3<f64>,

    last_map_position: Vector3<f64>,
    last_sky_position: Vector3<f64>,
    previous_map_position: Vector3<f64>,
    previous_sky_position: Vector3<f64>,

    computed_map_position: Vector3<f64>,
    computed_sky_position: Vector3<f64>,
    computed_altitude: f64,
    observer_distance_km: f64,

    /// Airborne track history as geographic points (lat, lon, alt km);
    /// the map-frame cache below is rebuilt from these on map changes.
    geo_trail: Vec<(f64, f64, f64)>,
    map_trail: Vec<Vector3<f64>>,

    first_sample: bool,
}

impl AircraftTrack {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            callsign: None,
            freshness: Freshness::Fresh,
            last: None,
            climb_angle_deg: 0.0,
            velocity_km_s: Vector3::zeros(),
            last_map_position: Vector3::zeros(),
            last_sky_position: Vector3::zeros(),
            previous_map_position: Vector3::zeros(),
            previous_sky_position: Vector3::zeros(),
            computed_map_position: Vector3::zeros(),
            computed_sky_position: Vector3::zeros(),
            computed_altitude: 0.0,
            observer_distance_km: 0.0,
            geo_trail: Vec::new(),
            map_trail: Vec::new(),
            first_sample: true,
        }
    }

    /// Applies a new telemetry sample.
    ///
    /// A sample with the same timestamp as the last applied one is a
    /// no-op, which makes repeated polls idempotent. Returns whether
    /// the sample was applied.
    pub fn process_sample(
        &mut self,
        sample: &StateVector,
        map: Option<&MapFrame>,
        observer: &ObserverPoint,
    ) -> bool {
        if let Some(last) = &self.last {
            if last.timestamp == sample.timestamp {
                return false;
            }
        }

        if !self.first_sample {
            self.previous_map_position = self.last_map_position;
            self.previous_sky_position = self.last_sky_position;
        }

        // A callsign can arrive later than the rest of the data; adopt
        // the first non-blank one and never revert.
        if self.callsign.is_none() {
            if let Some(callsign) = &sample.callsign {
                info!(address = %self.address, callsign = %callsign, "callsign adopted");
                self.callsign = Some(callsign.clone());
            }
        }

        if self.freshness != Freshness::Fresh {
            info!(address = %self.address, "track came back alive");
        }
        self.freshness = Freshness::Fresh;

        // Positive vertical rate (climb) maps to a negative pitch.
        self.climb_angle_deg = if sample.ground_speed > MIN_SPEED_FOR_CLIMB_ANGLE {
            -sample.vertical_rate.atan2(sample.ground_speed).to_degrees()
        } else {
            0.0
        };

        let heading_rad = sample.heading.to_radians();
        let speed_km_s = sample.ground_speed / 1000.0;
        self.velocity_km_s = Vector3::new(
            heading_rad.sin() * speed_km_s,
            heading_rad.cos() * speed_km_s,
            sample.vertical_rate / 1000.0,
        );

        // Projection falls back to ground level when the feed carried
        // no altitude; the sample itself keeps the absence.
        let altitude_m = sample.altitude.map(|(m, _)| m).unwrap_or(0.0);
        let altitude_km = altitude_m / 1000.0;

        let (map_x, map_y) = match map {
            Some(map) => map.project(sample.lon, sample.lat),
            None => (0.0, 0.0),
        };
        self.last_map_position = Vector3::new(map_x, map_y, altitude_km);
        self.computed_map_position = self.last_map_position;

        self.last_sky_position = sky_frame_position(observer, sample.lat, sample.lon, altitude_m);
        self.computed_sky_position = self.last_sky_position;
        self.observer_distance_km = self.last_sky_position.norm() / 1000.0;

        self.computed_altitude = altitude_m;

        if sample.on_ground {
            self.clear_track();
        } else {
            self.geo_trail.push((sample.lat, sample.lon, altitude_km));
            self.map_trail.push(self.last_map_position);
        }

        if self.first_sample {
            self.previous_map_position = self.last_map_position;
            self.previous_sky_position = self.last_sky_position;
            self.first_sample = false;
        }

        self.last = Some(sample.clone());
        true
    }

    /// Extrapolates the track to `now` (unix seconds) and evaluates the
    /// staleness transitions.
    ///
    /// Missing tracks are frozen until a new sample revives them. The
    /// extrapolation is pure dead reckoning: elapsed time times the
    /// last known rates, no smoothing.
    pub fn update(&mut self, now: f64) {
        let Some(last) = &self.last else {
            return;
        };
        if self.freshness == Freshness::Missing {
            return;
        }

        let elapsed = now - last.timestamp as f64;

        let altitude_m = last.altitude.map(|(m, _)| m).unwrap_or(0.0);
        self.computed_altitude = altitude_m + elapsed * last.vertical_rate;
        self.computed_map_position = self.last_map_position + elapsed * self.velocity_km_s;
        self.computed_sky_position = self.last_sky_position + elapsed * self.velocity_km_s * 1000.0;

        if self.freshness == Freshness::Fresh && elapsed > LATE_AFTER_SECS {
            info!(
                address = %self.address,
                elapsed_secs = elapsed,
                "marking track late"
            );
            self.freshness = Freshness::Late;
        } else if self.freshness == Freshness::Late && elapsed > MISSING_AFTER_SECS {
            info!(
                address = %self.address,
                elapsed_secs = elapsed,
                "marking track missing"
            );
            self.freshness = Freshness::Missing;
        }
    }

    /// Reprojects all cached map-frame state into a new map.
    pub fn map_changed(&mut self, map: &MapFrame) {
        let Some(last) = &self.last else {
            return;
        };

        let altitude_km = last.altitude.map(|(m, _)| m).unwrap_or(0.0) / 1000.0;
        let (x, y) = map.project(last.lon, last.lat);
        self.last_map_position = Vector3::new(x, y, altitude_km);
        self.computed_map_position = self.last_map_position;
        // The previous position belongs to the old frame; collapse it
        // onto the new one rather than mixing frames.
        self.previous_map_position = self.last_map_position;

        self.map_trail = self
            .geo_trail
            .iter()
            .map(|&(lat, lon, alt_km)| {
                let (x, y) = map.project(lon, lat);
                Vector3::new(x, y, alt_km)
            })
            .collect();

        debug!(address = %self.address, "map frame reprojected");
    }

    /// Recomputes all cached sky-frame state for a new observer.
    pub fn observer_changed(&mut self, observer: &ObserverPoint) {
        let Some(last) = &self.last else {
            return;
        };

        let altitude_m = last.altitude.map(|(m, _)| m).unwrap_or(0.0);
        self.last_sky_position = sky_frame_position(observer, last.lat, last.lon, altitude_m);
        self.computed_sky_position = self.last_sky_position;
        self.previous_sky_position = self.last_sky_position;
        self.observer_distance_km = self.last_sky_position.norm() / 1000.0;
    }

    /// Clears the historical track polyline.
    pub fn clear_track(&mut self) {
        self.geo_trail.clear();
        self.map_trail.clear();
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn callsign(&self) -> Option<&str> {
        self.callsign.as_deref()
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// The last applied sample, if any has arrived yet.
    pub fn last_sample(&self) -> Option<&StateVector> {
        self.last.as_ref()
    }

    pub fn on_ground(&self) -> bool {
        self.last.as_ref().is_some_and(|s| s.on_ground)
    }

    /// Dead-reckoned map-frame position, km.
    pub fn map_position(&self) -> Vector3<f64> {
        self.computed_map_position
    }

    /// Dead-reckoned sky-frame position, m.
    pub fn sky_position(&self) -> Vector3<f64> {
        self.computed_sky_position
    }

    /// Map-frame position before the latest sample, for interpolation.
    pub fn previous_map_position(&self) -> Vector3<f64> {
        self.previous_map_position
    }

    /// Sky-frame position before the latest sample, for interpolation.
    pub fn previous_sky_position(&self) -> Vector3<f64> {
        self.previous_sky_position
    }

    /// Dead-reckoned altitude, m.
    pub fn altitude(&self) -> f64 {
        self.computed_altitude
    }

    /// Pitch of the aircraft model, degrees; climbing is negative.
    pub fn climb_angle_deg(&self) -> f64 {
        self.climb_angle_deg
    }

    /// Straight-line distance from the observer, km.
    pub fn observer_distance_km(&self) -> f64 {
        self.observer_distance_km
    }

    /// Map-frame track polyline, oldest point first.
    pub fn map_trail(&self) -> &[Vector3<f64>] {
        &self.map_trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapExtent;

    const OBSERVER: ObserverPoint = ObserverPoint {
        lat: 52.357,
        lon: 4.954,
        floor_altitude: 0.44,
    };

    fn test_map() -> MapFrame {
        let extent = MapExtent::new(50.513427, 53.956086, 2.8125, 8.085938).unwrap();
        MapFrame::new("nl", extent, 10).unwrap()
    }

    fn airborne_sample(timestamp: i64) -> StateVector {
        StateVector {
            timestamp,
            lat: 52.3,
            lon: 4.8,
            heading: 90.0,
            ground_speed: 200.0,
            vertical_rate: 5.0,
            altitude: Some((1000.0, crate::track::AltitudeSource::Barometric)),
            on_ground: false,
            callsign: Some("KLM1234".to_string()),
        }
    }

    #[test]
    fn test_duplicate_timestamp_is_noop() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");

        assert!(track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER));
        let position = track.map_position();
        let trail_len = track.map_trail().len();

        // Same timestamp with different data must change nothing.
        let mut dup = airborne_sample(1000);
        dup.lat = 53.0;
        assert!(!track.process_sample(&dup, Some(&map), &OBSERVER));
        assert_eq!(track.map_position(), position);
        assert_eq!(track.map_trail().len(), trail_len);
    }

    #[test]
    fn test_callsign_adopted_once_never_reverted() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");

        let mut anonymous = airborne_sample(1000);
        anonymous.callsign = None;
        track.process_sample(&anonymous, Some(&map), &OBSERVER);
        assert!(track.callsign().is_none());

        track.process_sample(&airborne_sample(1010), Some(&map), &OBSERVER);
        assert_eq!(track.callsign(), Some("KLM1234"));

        let mut renamed = airborne_sample(1020);
        renamed.callsign = Some("OTHER".to_string());
        track.process_sample(&renamed, Some(&map), &OBSERVER);
        assert_eq!(track.callsign(), Some("KLM1234"));
    }

    #[test]
    fn test_freshness_transitions_in_order() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);

        track.update(1030.0);
        assert_eq!(track.freshness(), Freshness::Fresh);

        track.update(1061.0);
        assert_eq!(track.freshness(), Freshness::Late);

        // Still late until the missing threshold.
        track.update(1120.0);
        assert_eq!(track.freshness(), Freshness::Late);

        track.update(1121.0);
        assert_eq!(track.freshness(), Freshness::Missing);
    }

    #[test]
    fn test_freshness_never_skips_late() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);

        // A single tick far beyond both thresholds only reaches Late.
        track.update(1500.0);
        assert_eq!(track.freshness(), Freshness::Late);
        track.update(1501.0);
        assert_eq!(track.freshness(), Freshness::Missing);
    }

    #[test]
    fn test_new_sample_revives_missing_track() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        track.update(1061.0);
        track.update(1200.0);
        assert_eq!(track.freshness(), Freshness::Missing);

        track.process_sample(&airborne_sample(1210), Some(&map), &OBSERVER);
        assert_eq!(track.freshness(), Freshness::Fresh);
    }

    #[test]
    fn test_missing_track_is_frozen() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        track.update(1061.0);
        track.update(1200.0);
        assert_eq!(track.freshness(), Freshness::Missing);

        let frozen = track.map_position();
        track.update(1300.0);
        assert_eq!(track.map_position(), frozen);
    }

    #[test]
    fn test_dead_reckoning_east() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);

        let start = track.map_position();
        track.update(1010.0);
        let moved = track.map_position();

        // Heading 90° at 200 m/s for 10 s: 2 km east, no northward move.
        assert!((moved.x - start.x - 2.0).abs() < 1e-9, "dx = {}", moved.x - start.x);
        assert!((moved.y - start.y).abs() < 1e-9);
        // Climb 5 m/s for 10 s in km.
        assert!((moved.z - start.z - 0.05).abs() < 1e-9);
        assert!((track.altitude() - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn test_climb_angle_sign_and_zero_speed() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        // Climbing at 5 m/s: negative pitch.
        assert!(track.climb_angle_deg() < 0.0);

        let mut hovering = airborne_sample(1010);
        hovering.ground_speed = 0.0;
        track.process_sample(&hovering, Some(&map), &OBSERVER);
        assert_eq!(track.climb_angle_deg(), 0.0);
    }

    #[test]
    fn test_previous_positions_recorded_for_interpolation() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");

        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        // With a single sample there is no older position to fall back
        // to; previous equals last.
        assert_eq!(track.previous_map_position(), track.map_position());

        let first_map = track.map_position();
        let first_sky = track.sky_position();

        let mut moved = airborne_sample(1010);
        moved.lat = 52.35;
        track.process_sample(&moved, Some(&map), &OBSERVER);

        assert_eq!(track.previous_map_position(), first_map);
        assert_eq!(track.previous_sky_position(), first_sky);
        assert_ne!(track.previous_map_position(), track.map_position());
    }

    #[test]
    fn test_trail_grows_airborne_clears_on_ground() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");

        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        track.process_sample(&airborne_sample(1010), Some(&map), &OBSERVER);
        assert_eq!(track.map_trail().len(), 2);

        let mut landed = airborne_sample(1020);
        landed.on_ground = true;
        track.process_sample(&landed, Some(&map), &OBSERVER);
        assert!(track.map_trail().is_empty());
    }

    #[test]
    fn test_map_changed_reprojects_trail() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        track.process_sample(&airborne_sample(1010), Some(&map), &OBSERVER);

        let zoomed = MapFrame::new(
            "schiphol",
            MapExtent::new(51.890054, 52.696361, 4.042969, 5.361328).unwrap(),
            12,
        )
        .unwrap();

        let before = track.map_trail().to_vec();
        track.map_changed(&zoomed);
        let after = track.map_trail();

        assert_eq!(after.len(), before.len());
        assert_ne!(after[0], before[0]);

        // Reprojected trail matches projecting the geo points directly.
        let (x, y) = zoomed.project(4.8, 52.3);
        assert!((after[0].x - x).abs() < 1e-9);
        assert!((after[0].y - y).abs() < 1e-9);
    }

    #[test]
    fn test_observer_changed_recomputes_sky_position() {
        let map = test_map();
        let mut track = AircraftTrack::new("4840d6");
        track.process_sample(&airborne_sample(1000), Some(&map), &OBSERVER);
        let before = track.sky_position();

        let moved = ObserverPoint {
            lat: 52.0,
            lon: 5.5,
            floor_altitude: 10.0,
        };
        track.observer_changed(&moved);

        assert_ne!(track.sky_position(), before);
        let direct = crate::coord::sky_frame_position(&moved, 52.3, 4.8, 1000.0);
        assert!((track.sky_position() - direct).norm() < 1e-9);
    }

    #[test]
    fn test_update_without_samples_is_noop() {
        let mut track = AircraftTrack::new("4840d6");
        track.update(5000.0);
        assert_eq!(track.freshness(), Freshness::Fresh);
        assert_eq!(track.map_position(), Vector3::zeros());
    }
}
