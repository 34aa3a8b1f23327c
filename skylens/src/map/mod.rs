//! Map frames and the map registry.
//!
//! A map is a named lat/lon extent with an associated basemap raster.
//! This module owns the 2-D "map frame": the planar coordinate system
//! (kilometers from the map center) that aircraft positions and track
//! polylines are projected into.
//!
//! # Design
//!
//! - [`MapExtent`] is a plain validated lat/lon box.
//! - [`MapFrame`] precomputes the extent's Web Mercator bounding box so
//!   per-aircraft projection is two multiplies, not a fresh projection
//!   of the corners.
//! - [`covering_extent`] snaps a requested box outward to tile
//!   boundaries; the mosaic pixel grid must match tile edges exactly or
//!   plane overlays drift against the basemap.
//! - [`MapRegistry`] is single-writer state owned by the event
//!   dispatcher; background workers never touch it.

mod extent;
mod frame;
mod registry;

pub use extent::{covering_extent, MapExtent};
pub use frame::MapFrame;
pub use registry::MapRegistry;

use thiserror::Error;

/// Errors from map construction and lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Extent with inverted or collapsed bounds.
    #[error("invalid map extent: lat [{min_lat}, {max_lat}], lon [{min_lon}, {max_lon}]")]
    InvalidExtent {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },

    /// Underlying coordinate validation failure.
    #[error(transparent)]
    Coord(#[from] crate::coord::CoordError),
}
