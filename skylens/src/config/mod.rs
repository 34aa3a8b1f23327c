//! Configuration documents.
//!
//! A configuration is a JSON document describing the telemetry query
//! extent, the available maps (with their image sources), the observer,
//! the landmark set and the outbound webhook. It is consumed once per
//! load by the event dispatcher, which translates it into tile jobs,
//! fetch requests and frame invalidations.
//!
//! Entries are validated individually: a malformed map or landmark is
//! skipped with a warning and its siblings still apply.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::map::{MapError, MapExtent};

/// Errors from configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document as a whole was not valid JSON.
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A parsed configuration document.
///
/// Collection entries stay as raw JSON here; the typed accessors below
/// validate them one by one so a single bad entry cannot take down the
/// whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    maps: Vec<Value>,
    #[serde(default)]
    observer: Option<Value>,
    #[serde(default)]
    landmarks: Vec<Value>,
    #[serde(default)]
    pub webhook: Option<String>,
}

/// Telemetry query extent override.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryConfig {
    pub lat_range: [f64; 2],
    pub lon_range: [f64; 2],
}

/// One map definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    pub name: String,
    pub lat_range: [f64; 2],
    pub lon_range: [f64; 2],
    pub image_source: ImageSource,
}

impl MapConfig {
    /// The requested (pre-snap) extent of this map.
    pub fn extent(&self) -> Result<MapExtent, MapError> {
        MapExtent::new(
            self.lat_range[0],
            self.lat_range[1],
            self.lon_range[0],
            self.lon_range[1],
        )
    }
}

/// Where a map's basemap raster comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageSource {
    /// A single prebuilt image fetched directly.
    Url { url: String },
    /// A mosaic assembled from tile servers.
    Tiles { zoom: u8, tile_servers: Vec<String> },
}

/// Observer definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_observer_id")]
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Floor altitude in meters; the feed key is `alt`.
    #[serde(rename = "alt")]
    pub floor_altitude: f64,
}

fn default_observer_id() -> String {
    "observer".to_string()
}

/// One landmark definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkConfig {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "topalt")]
    pub top_altitude: f64,
    #[serde(rename = "botalt", default)]
    pub bottom_altitude: f64,
}

impl ConfigFile {
    /// Parses a configuration document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The query extent, if present and well-formed.
    pub fn query(&self) -> Option<QueryConfig> {
        parse_entry(self.query.as_ref()?, "query")
    }

    /// Whether the document carries a maps section at all.
    pub fn has_maps(&self) -> bool {
        !self.maps.is_empty()
    }

    /// All well-formed map entries, skipping broken ones with a warning.
    pub fn maps(&self) -> Vec<MapConfig> {
        self.maps
            .iter()
            .filter_map(|entry| parse_entry(entry, "map"))
            .collect()
    }

    /// The observer, if present and well-formed.
    pub fn observer(&self) -> Option<ObserverConfig> {
        parse_entry(self.observer.as_ref()?, "observer")
    }

    /// Whether the document carries a landmarks section at all.
    pub fn has_landmarks(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// All well-formed landmark entries.
    pub fn landmarks(&self) -> Vec<LandmarkConfig> {
        self.landmarks
            .iter()
            .filter_map(|entry| parse_entry(entry, "landmark"))
            .collect()
    }
}

fn parse_entry<T: serde::de::DeserializeOwned>(entry: &Value, what: &str) -> Option<T> {
    match serde_json::from_value(entry.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(entry = %what, error = %e, "configuration entry skipped");
            None
        }
    }
}
