//! Typed request and result envelopes for the worker pipeline.
//!
//! Every message between the foreground and the workers is a closed
//! variant type with a strongly-typed payload; the dispatcher never
//! inspects payloads by runtime type.

use crate::fetch::FetchError;
use crate::map::MapExtent;
use crate::mosaic::TgaImage;

/// The telemetry query bounding box.
///
/// Carried on a single-slot channel: only the latest extent matters,
/// earlier unconsumed updates are overwritten, never queued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryExtent {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl From<&MapExtent> for QueryExtent {
    fn from(extent: &MapExtent) -> Self {
        Self {
            min_lat: extent.min_lat,
            max_lat: extent.max_lat,
            min_lon: extent.min_lon,
            max_lon: extent.max_lon,
        }
    }
}

/// What a generic URL fetch is for, which decides the result event the
/// fetcher emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// A configuration document; decoded as text.
    ConfigDocument,
    /// A complete basemap image; kept as bytes.
    MapImage,
}

/// A generic URL fetch request.
///
/// `tag` is an opaque correlation value echoed back in the result event
/// (the source URL for configs, the destination map for images).
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRequest {
    pub url: String,
    pub kind: FetchKind,
    pub binary: bool,
    pub tag: String,
}

impl UrlRequest {
    /// Request for a configuration document.
    pub fn config(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            tag: url.clone(),
            url,
            kind: FetchKind::ConfigDocument,
            binary: false,
        }
    }

    /// Request for a basemap image destined for the named map.
    pub fn map_image(url: impl Into<String>, map_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: FetchKind::MapImage,
            binary: true,
            tag: map_id.into(),
        }
    }
}

/// Results flowing from the background workers to the dispatcher.
///
/// Each event is produced by exactly one worker and consumed exactly
/// once when the dispatcher drains the shared results queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEvent {
    /// One parsed telemetry response document.
    TelemetryBatch(serde_json::Value),

    /// A fetched configuration document, not yet applied.
    ConfigDocument { text: String, source_url: String },

    /// A directly fetched basemap image.
    MapImage { map_id: String, bytes: Vec<u8> },

    /// Mosaic assembly progress for a map, percent complete.
    TileProgress { map_id: String, percent: f32 },

    /// A finished mosaic for a map.
    MosaicReady { map_id: String, image: TgaImage },

    /// A generic fetch that failed; informational only.
    FetchFailed { url: String, error: FetchError },
}
