//! Registry of loaded maps and the current selection.

use std::collections::HashMap;

use tracing::{info, warn};

use super::MapFrame;

/// One registered map: its frame plus whatever basemap raster has
/// arrived for it so far.
#[derive(Debug, Clone)]
struct MapEntry {
    frame: MapFrame,
    /// Encoded basemap raster (TGA from the mosaic assembler, or the
    /// raw bytes of a directly fetched image). None until delivered.
    image: Option<Vec<u8>>,
    /// Mosaic assembly progress, 0-100, while tiles are being fetched.
    progress: Option<f32>,
}

/// Name-keyed map registry with a current selection.
///
/// Owned by the event dispatcher; it is the single writer for all map
/// state, so no locking is involved. Workers deliver rasters through
/// result events, never by reaching in here.
#[derive(Debug, Default)]
pub struct MapRegistry {
    maps: HashMap<String, MapEntry>,
    current: Option<String>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a map, replacing any previous one with the same name.
    pub fn insert(&mut self, frame: MapFrame) {
        let name = frame.name().to_string();
        self.maps.insert(
            name,
            MapEntry {
                frame,
                image: None,
                progress: None,
            },
        );
    }

    /// Drops all maps and the current selection.
    pub fn clear(&mut self) {
        self.maps.clear();
        self.current = None;
    }

    /// Selects the current map by name.
    ///
    /// Returns the newly selected frame so the caller can reproject
    /// dependent state, or `None` when the name is unknown (selection
    /// is left unchanged).
    pub fn select(&mut self, name: &str) -> Option<&MapFrame> {
        if !self.maps.contains_key(name) {
            warn!(map = name, "cannot select unknown map");
            return None;
        }
        self.current = Some(name.to_string());
        info!(map = name, "map selected");
        self.maps.get(name).map(|e| &e.frame)
    }

    /// The currently selected map frame, if any.
    pub fn current(&self) -> Option<&MapFrame> {
        self.current
            .as_deref()
            .and_then(|name| self.maps.get(name))
            .map(|e| &e.frame)
    }

    /// Name of the currently selected map.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&MapFrame> {
        self.maps.get(name).map(|e| &e.frame)
    }

    /// Registered map names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Stores a delivered basemap raster.
    ///
    /// Returns true when the raster belongs to the currently selected
    /// map, so the consumer knows to refresh its display. Rasters for
    /// maps that were dropped in the meantime are discarded.
    pub fn store_image(&mut self, name: &str, image: Vec<u8>) -> bool {
        match self.maps.get_mut(name) {
            Some(entry) => {
                info!(map = name, bytes = image.len(), "basemap raster stored");
                entry.image = Some(image);
                entry.progress = None;
                self.current.as_deref() == Some(name)
            }
            None => {
                warn!(map = name, "raster for unknown map discarded");
                false
            }
        }
    }

    /// Records mosaic assembly progress for a map.
    pub fn store_progress(&mut self, name: &str, percent: f32) {
        if let Some(entry) = self.maps.get_mut(name) {
            entry.progress = Some(percent);
        }
    }

    /// The stored raster for a map, if one has arrived.
    pub fn image(&self, name: &str) -> Option<&[u8]> {
        self.maps.get(name).and_then(|e| e.image.as_deref())
    }

    /// Mosaic progress for a map, if a job is underway.
    pub fn progress(&self, name: &str) -> Option<f32> {
        self.maps.get(name).and_then(|e| e.progress)
    }
}
