//! Address-keyed collection of aircraft tracks.

use std::collections::HashMap;

use tracing::debug;

use crate::coord::ObserverPoint;
use crate::map::MapFrame;

use super::aircraft::{AircraftTrack, Freshness};
use super::sample::AircraftState;

/// Summary of the table for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackCounts {
    pub total: usize,
    pub late: usize,
    pub missing: usize,
    pub on_ground: usize,
    pub on_map: usize,
}

/// All tracked aircraft, keyed by 24-bit address.
///
/// Owned by the event dispatcher; there is exactly one track per
/// address, created on first sample and retained through missing spells
/// so a track can revive without losing its identity.
#[derive(Debug, Default)]
pub struct TrackTable {
    tracks: HashMap<String, AircraftTrack>,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a telemetry batch, creating tracks as needed.
    ///
    /// Returns the number of samples actually applied (duplicates are
    /// no-ops and not counted).
    pub fn process_batch(
        &mut self,
        batch: &[AircraftState],
        map: Option<&MapFrame>,
        observer: &ObserverPoint,
    ) -> usize {
        let mut applied = 0;
        for state in batch {
            let track = self
                .tracks
                .entry(state.address.clone())
                .or_insert_with(|| AircraftTrack::new(state.address.clone()));
            if track.process_sample(&state.sample, map, observer) {
                applied += 1;
            }
        }
        debug!(
            batch = batch.len(),
            applied,
            tracked = self.tracks.len(),
            "telemetry batch processed"
        );
        applied
    }

    /// Dead-reckons every track to `now` and evaluates staleness.
    pub fn update_all(&mut self, now: f64) {
        for track in self.tracks.values_mut() {
            track.update(now);
        }
    }

    /// Reprojects all map-frame state into a new map.
    pub fn map_changed(&mut self, map: &MapFrame) {
        for track in self.tracks.values_mut() {
            track.map_changed(map);
        }
    }

    /// Recomputes all sky-frame state for a new observer.
    pub fn observer_changed(&mut self, observer: &ObserverPoint) {
        for track in self.tracks.values_mut() {
            track.observer_changed(observer);
        }
    }

    /// Clears every track's history polyline, keeping the tracks.
    pub fn clear_trails(&mut self) {
        for track in self.tracks.values_mut() {
            track.clear_track();
        }
    }

    /// Drops all tracks (used when the map set is replaced).
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&AircraftTrack> {
        self.tracks.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AircraftTrack> {
        self.tracks.values()
    }

    /// Counts tracks by display-relevant category.
    pub fn counts(&self, map: Option<&MapFrame>) -> TrackCounts {
        let mut counts = TrackCounts {
            total: self.tracks.len(),
            ..Default::default()
        };

        for track in self.tracks.values() {
            match track.freshness() {
                Freshness::Late => counts.late += 1,
                Freshness::Missing => counts.missing += 1,
                Freshness::Fresh => {}
            }
            if track.on_ground() {
                counts.on_ground += 1;
            }
            if let (Some(map), Some(sample)) = (map, track.last_sample()) {
                if map.contains(sample.lat, sample.lon) {
                    counts.on_map += 1;
                }
            }
        }

        counts
    }
}
