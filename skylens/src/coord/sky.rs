//! Observer-centric sky-frame transform.
//!
//! The sky frame is a local tangent plane centered on the observer:
//! +X east, +Y up, -Z north, units in meters. Aircraft and landmarks are
//! placed in this frame so a consumer can treat their positions as plain
//! 3-D offsets from the observer's eye, regardless of where on Earth the
//! observer stands.

use nalgebra::{Rotation3, Vector3};

use super::types::EARTH_RADIUS_METERS;

/// Height of the observer's eyes above the floor altitude, in meters.
pub const EYE_HEIGHT_METERS: f64 = 1.7;

/// An observing position on the Earth's surface.
///
/// `floor_altitude` is the floor the observer stands on, in meters above
/// the spherical Earth surface; eye height is added by the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverPoint {
    pub lat: f64,
    pub lon: f64,
    pub floor_altitude: f64,
}

/// Transforms a geographic point into the observer's sky frame.
///
/// The point is placed at `EARTH_RADIUS_METERS + altitude` along the
/// local up axis and carried through a fixed rotation sequence: about
/// the east-west axis by the negative point latitude, about the polar
/// axis by the longitude difference, about the east-west axis by the
/// observer latitude. Translating down by the Earth radius plus the
/// observer's floor altitude and eye height then yields the tangent
/// plane offset.
///
/// `altitude` is in meters; the result is in meters.
pub fn sky_frame_position(
    observer: &ObserverPoint,
    lat: f64,
    lon: f64,
    altitude: f64,
) -> Vector3<f64> {
    let tilt_point = Rotation3::from_axis_angle(&Vector3::x_axis(), (-lat).to_radians());
    let spin_lon = Rotation3::from_axis_angle(&Vector3::z_axis(), -(lon - observer.lon).to_radians());
    let tilt_observer = Rotation3::from_axis_angle(&Vector3::x_axis(), observer.lat.to_radians());

    let surface_point = Vector3::new(0.0, EARTH_RADIUS_METERS + altitude, 0.0);
    let rotated = tilt_observer * spin_lon * tilt_point * surface_point;

    let eye_distance = EARTH_RADIUS_METERS + observer.floor_altitude + EYE_HEIGHT_METERS;
    rotated - Vector3::new(0.0, eye_distance, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBSERVER: ObserverPoint = ObserverPoint {
        lat: 52.357,
        lon: 4.954,
        floor_altitude: 0.44,
    };

    #[test]
    fn test_point_directly_overhead() {
        let p = sky_frame_position(&OBSERVER, OBSERVER.lat, OBSERVER.lon, 1000.0);

        assert!(p.x.abs() < 1e-6, "x = {}", p.x);
        assert!(p.z.abs() < 1e-6, "z = {}", p.z);
        // 1000 m altitude minus floor altitude and eye height.
        let expected = 1000.0 - OBSERVER.floor_altitude - EYE_HEIGHT_METERS;
        assert!((p.y - expected).abs() < 1e-6, "y = {}", p.y);
    }

    #[test]
    fn test_point_due_north_has_negative_z() {
        let p = sky_frame_position(&OBSERVER, OBSERVER.lat + 0.01, OBSERVER.lon, 0.0);

        // 0.01° of latitude is ~1113 m of ground distance.
        assert!(p.x.abs() < 1.0, "x = {}", p.x);
        assert!((-p.z - 1113.0).abs() < 10.0, "z = {}", p.z);
    }

    #[test]
    fn test_point_due_east_has_positive_x() {
        let p = sky_frame_position(&OBSERVER, OBSERVER.lat, OBSERVER.lon + 0.01, 0.0);

        // 0.01° of longitude at 52°N is ~1113 * cos(lat) ≈ 680 m.
        let expected = 1113.0 * OBSERVER.lat.to_radians().cos();
        assert!((p.x - expected).abs() < 10.0, "x = {}", p.x);
        assert!(p.z.abs() < 10.0, "z = {}", p.z);
    }

    #[test]
    fn test_nearby_surface_point_sits_below_eye() {
        let p = sky_frame_position(&OBSERVER, OBSERVER.lat + 0.001, OBSERVER.lon, 0.0);

        // Ground nearby is slightly below the eye; Earth curvature at
        // 111 m distance is negligible against the eye height.
        assert!(p.y < 0.0);
        assert!(p.y > -(OBSERVER.floor_altitude + EYE_HEIGHT_METERS + 1.0));
    }

    #[test]
    fn test_frame_is_observer_relative() {
        // The same lat/lon offset gives the same local offset (up to
        // curvature) for observers at very different longitudes.
        let obs_a = ObserverPoint { lat: 40.0, lon: -74.0, floor_altitude: 0.0 };
        let obs_b = ObserverPoint { lat: 40.0, lon: 116.0, floor_altitude: 0.0 };

        let p_a = sky_frame_position(&obs_a, 40.05, -74.0 + 0.05, 500.0);
        let p_b = sky_frame_position(&obs_b, 40.05, 116.0 + 0.05, 500.0);

        assert!((p_a - p_b).norm() < 1e-6);
    }
}
