//! Telemetry sample parsing.
//!
//! The telemetry source returns a JSON document with a `states` array
//! of fixed-position arrays. The index assignments are part of the
//! provider's contract and must not be reordered:
//!
//! | index | field                        |
//! |-------|------------------------------|
//! | 0     | 24-bit address (string)      |
//! | 1     | callsign (may be blank)      |
//! | 3     | sample timestamp (unix s)    |
//! | 5     | longitude (degrees)          |
//! | 6     | latitude (degrees)           |
//! | 7     | barometric altitude (m)      |
//! | 8     | on-ground flag               |
//! | 9     | ground speed (m/s)           |
//! | 10    | heading (degrees, 0-360)     |
//! | 11    | vertical rate (m/s)          |
//! | 13    | geometric altitude (m)       |

use serde_json::Value;
use tracing::warn;

/// Which altitude field a track's altitude came from.
///
/// Altitude is optional in the feed; the source is tracked explicitly
/// so a missing value is never confused with sea level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltitudeSource {
    Barometric,
    Geometric,
}

/// One kinematic telemetry sample for an aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// Sample timestamp, seconds since the Unix epoch.
    pub timestamp: i64,
    pub lat: f64,
    pub lon: f64,
    /// Track over ground, degrees clockwise from north.
    pub heading: f64,
    /// Speed over ground, m/s.
    pub ground_speed: f64,
    /// Climb rate, m/s; positive is climbing.
    pub vertical_rate: f64,
    /// Altitude in meters with its source, when the feed carried one.
    pub altitude: Option<(f64, AltitudeSource)>,
    pub on_ground: bool,
    /// Callsign, if the feed carried a non-blank one.
    pub callsign: Option<String>,
}

/// A sample paired with the aircraft address it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftState {
    pub address: String,
    pub sample: StateVector,
}

/// Parses a telemetry response document into per-aircraft samples.
///
/// Entries missing an address, timestamp or position are skipped with
/// a warning; the remaining entries still parse. A missing or null
/// `states` array yields an empty batch.
pub fn parse_state_batch(root: &Value) -> Vec<AircraftState> {
    let states = match root.get("states").and_then(Value::as_array) {
        Some(states) => states,
        None => {
            warn!("telemetry response has no states array");
            return Vec::new();
        }
    };

    states.iter().filter_map(parse_state_entry).collect()
}

fn parse_state_entry(entry: &Value) -> Option<AircraftState> {
    let fields = entry.as_array()?;

    let address = match fields.first().and_then(Value::as_str) {
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => {
            warn!("state entry without address, skipping");
            return None;
        }
    };

    let timestamp = match fields.get(3).and_then(Value::as_i64) {
        Some(t) => t,
        None => {
            warn!(address, "state entry without timestamp, skipping");
            return None;
        }
    };

    let (lon, lat) = match (
        fields.get(5).and_then(Value::as_f64),
        fields.get(6).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => {
            warn!(address, "state entry without position, skipping");
            return None;
        }
    };

    // Barometric altitude preferred; geometric is the fallback. Both
    // may be absent, in which case the altitude is simply unknown.
    let altitude = fields
        .get(7)
        .and_then(Value::as_f64)
        .map(|alt| (alt, AltitudeSource::Barometric))
        .or_else(|| {
            fields
                .get(13)
                .and_then(Value::as_f64)
                .map(|alt| (alt, AltitudeSource::Geometric))
        });

    let callsign = fields
        .get(1)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(AircraftState {
        address,
        sample: StateVector {
            timestamp,
            lat,
            lon,
            heading: fields.get(10).and_then(Value::as_f64).unwrap_or(0.0),
            ground_speed: fields.get(9).and_then(Value::as_f64).unwrap_or(0.0),
            vertical_rate: fields.get(11).and_then(Value::as_f64).unwrap_or(0.0),
            altitude,
            on_ground: fields.get(8).and_then(Value::as_bool).unwrap_or(false),
            callsign,
        },
    })
}
