//! The single-consumer event dispatcher.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use tracing::{info, warn};

use crate::align::AlignmentSolver;
use crate::config::{ConfigFile, ImageSource, LandmarkConfig, MapConfig};
use crate::map::{covering_extent, MapError, MapExtent, MapFrame, MapRegistry};
use crate::mosaic::TileJob;
use crate::track::{parse_state_batch, Landmark, Observer, TrackCounts, TrackTable};

use super::events::{QueryExtent, ResultEvent, UrlRequest};
use super::PipelineHandles;

/// Owns all domain state and applies worker results to it.
///
/// This is the only place aircraft, map, landmark or alignment state is
/// mutated. Once per foreground tick, [`EventDispatcher::tick`] drains
/// the shared results queue completely (non-blocking) and then
/// dead-reckons every track to the current time. Workers never hold
/// references into this state, so none of it is locked.
pub struct EventDispatcher {
    handles: PipelineHandles,
    results: Receiver<ResultEvent>,

    tracks: TrackTable,
    maps: MapRegistry,
    observer: Observer,
    landmarks: HashMap<String, Landmark>,
    solver: AlignmentSolver,
}

impl EventDispatcher {
    /// Creates a dispatcher around the pipeline's channel ends.
    ///
    /// The built-in observer is a placeholder; a loaded configuration
    /// replaces it (or the first map's center stands in).
    pub fn new(handles: PipelineHandles, results: Receiver<ResultEvent>) -> Self {
        Self {
            handles,
            results,
            tracks: TrackTable::new(),
            maps: MapRegistry::new(),
            observer: Observer::new("default", 52.357036, 4.954487, 0.44),
            landmarks: HashMap::new(),
            solver: AlignmentSolver::new(),
        }
    }

    /// Drains the results queue and advances all tracks to `now`.
    ///
    /// Returns the number of events applied. Events are applied in
    /// arrival order; the queue preserves per-worker enqueue order and
    /// interleaves workers arbitrarily, which every handler tolerates.
    pub fn tick(&mut self, now: f64) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.results.try_recv() {
            self.apply(event);
            applied += 1;
        }
        self.tracks.update_all(now);
        applied
    }

    fn apply(&mut self, event: ResultEvent) {
        match event {
            ResultEvent::TelemetryBatch(document) => {
                let batch = parse_state_batch(&document);
                let map = self.maps.current().cloned();
                self.tracks
                    .process_batch(&batch, map.as_ref(), &self.observer.as_point());
            }
            ResultEvent::ConfigDocument { text, source_url } => {
                self.apply_config_text(&text, &source_url);
            }
            ResultEvent::MapImage { map_id, bytes } => {
                self.maps.store_image(&map_id, bytes);
            }
            ResultEvent::MosaicReady { map_id, image } => {
                self.maps.store_image(&map_id, image.encode());
            }
            ResultEvent::TileProgress { map_id, percent } => {
                self.maps.store_progress(&map_id, percent);
            }
            ResultEvent::FetchFailed { url, error } => {
                warn!(%url, %error, "fetch request failed");
            }
        }
    }

    /// Parses and applies a configuration document.
    ///
    /// `source_url` is where the document came from; relative map image
    /// URLs resolve against it.
    pub fn apply_config_text(&mut self, text: &str, source_url: &str) {
        match ConfigFile::parse(text) {
            Ok(config) => self.apply_config(&config, source_url),
            Err(e) => warn!(source = %source_url, error = %e, "configuration rejected"),
        }
    }

    fn apply_config(&mut self, config: &ConfigFile, source_url: &str) {
        info!(source = %source_url, "applying configuration");

        if let Some(query) = config.query() {
            match MapExtent::new(
                query.lat_range[0],
                query.lat_range[1],
                query.lon_range[0],
                query.lon_range[1],
            ) {
                Ok(extent) => self.handles.set_query_extent(QueryExtent::from(&extent)),
                Err(e) => warn!(error = %e, "query extent skipped"),
            }
        }

        let mut maps_updated = false;
        if config.has_maps() {
            let maps = config.maps();
            if maps.is_empty() {
                warn!("no usable maps in configuration, keeping current set");
            } else {
                self.maps.clear();
                let mut first = None;
                for map_config in &maps {
                    if let Err(e) = self.register_map(map_config, source_url) {
                        warn!(map = %map_config.name, error = %e, "map entry skipped");
                    } else if first.is_none() {
                        first = Some(map_config.name.clone());
                    }
                }
                if let Some(name) = first {
                    self.select_map(&name);
                    maps_updated = true;
                }
            }
        }

        if let Some(observer_config) = config.observer() {
            self.observer = Observer::new(
                observer_config.id,
                observer_config.lat,
                observer_config.lon,
                observer_config.floor_altitude,
            );
            self.observer_moved();
        } else if maps_updated {
            // No observer specified: stand at the map center at ground
            // level so the sky frame stays anchored to something.
            if let Some(extent) = self.maps.current().map(|m| *m.extent()) {
                self.observer =
                    Observer::new("map-center", extent.center_lat(), extent.center_lon(), 0.0);
                self.observer_moved();
            }
        }

        if config.has_landmarks() {
            self.replace_landmarks(config.landmarks());
        }

        if let Some(webhook) = &config.webhook {
            info!("webhook destination configured");
            self.handles.set_webhook(Some(webhook.clone()));
        }

        // Tracks projected against a replaced map set are meaningless.
        if maps_updated {
            self.tracks.clear();
        }
    }

    fn register_map(&mut self, config: &MapConfig, source_url: &str) -> Result<(), MapError> {
        let requested = config.extent()?;

        match &config.image_source {
            ImageSource::Url { url } => {
                self.maps.insert(MapFrame::new(&config.name, requested, 0)?);
                let resolved = resolve_url(url, source_url);
                info!(map = %config.name, url = %resolved, "map image fetch scheduled");
                self.handles
                    .fetch_url(UrlRequest::map_image(resolved, &config.name));
            }
            ImageSource::Tiles { zoom, tile_servers } => {
                // The served mosaic covers whole tiles; the frame must
                // use the snapped extent or overlays drift.
                let (snapped, range) = covering_extent(&requested, *zoom)?;
                self.maps
                    .insert(MapFrame::new(&config.name, snapped, *zoom)?);
                info!(
                    map = %config.name,
                    tiles = range.count(),
                    zoom,
                    "tile mosaic job scheduled"
                );
                self.handles.run_tile_job(TileJob {
                    range,
                    servers: tile_servers.clone(),
                    map_id: config.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Switches the current map and reprojects everything map-relative.
    pub fn select_map(&mut self, name: &str) {
        if self.maps.select(name).is_none() {
            return;
        }
        let Some(frame) = self.maps.current().cloned() else {
            return;
        };

        self.tracks.map_changed(&frame);
        self.observer.update_map_position(&frame);
        let point = self.observer.as_point();
        for landmark in self.landmarks.values_mut() {
            landmark.update_positions(Some(&frame), &point);
        }
    }

    /// Recomputes everything observer-relative after the observer moved.
    fn observer_moved(&mut self) {
        if let Some(frame) = self.maps.current().cloned() {
            self.observer.update_map_position(&frame);
        }
        let point = self.observer.as_point();
        self.tracks.observer_changed(&point);

        let frame = self.maps.current().cloned();
        for landmark in self.landmarks.values_mut() {
            landmark.update_positions(frame.as_ref(), &point);
        }
        self.refresh_alignment_references();
    }

    fn replace_landmarks(&mut self, configs: Vec<LandmarkConfig>) {
        self.landmarks.clear();
        let frame = self.maps.current().cloned();
        let point = self.observer.as_point();

        for config in configs {
            let mut landmark = Landmark::new(
                config.id.clone(),
                config.lat,
                config.lon,
                config.top_altitude,
                config.bottom_altitude,
            );
            landmark.update_positions(frame.as_ref(), &point);
            self.landmarks.insert(config.id, landmark);
        }

        info!(count = self.landmarks.len(), "landmarks replaced");
        self.refresh_alignment_references();
    }

    /// Reference positions for the alignment solver are the landmarks'
    /// sky positions; they follow every observer or landmark change.
    fn refresh_alignment_references(&mut self) {
        self.solver.clear_references();
        for landmark in self.landmarks.values() {
            self.solver
                .set_reference(landmark.id.clone(), landmark.sky_position());
        }
    }

    /// Runs the alignment solver and reports the solution outbound.
    pub fn solve_alignment(&self) -> crate::align::Solution {
        let solution = self.solver.solve();
        self.handles.notify(format!(
            "alignment solve -> ({:.6}, {:.6}, {:.6}), {:.3} deg (energy {:.6})",
            solution.translation.x,
            solution.translation.y,
            solution.translation.z,
            solution.rotation_deg,
            solution.energy
        ));
        solution
    }

    /// Counts for status display.
    pub fn counts(&self) -> TrackCounts {
        self.tracks.counts(self.maps.current())
    }

    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn landmarks(&self) -> &HashMap<String, Landmark> {
        &self.landmarks
    }

    pub fn solver(&self) -> &AlignmentSolver {
        &self.solver
    }

    /// Mutable access to the alignment model, for recording sightlines.
    pub fn solver_mut(&mut self) -> &mut AlignmentSolver {
        &mut self.solver
    }

    pub fn handles(&self) -> &PipelineHandles {
        &self.handles
    }
}

/// Resolves a possibly relative image URL against the config's own URL.
fn resolve_url(url: &str, base: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match reqwest::Url::parse(base).and_then(|b| b.join(url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => url.to_string(),
    }
}
