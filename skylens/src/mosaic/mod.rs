//! Tile mosaic assembler.
//!
//! Turns a [`TileJob`] — a rectangular tile range plus a set of tile
//! server URL templates — into one stitched basemap raster. Tiles are
//! fetched sequentially in row-major order, round-robining across the
//! configured servers, and blitted into a single [`TgaImage`].
//!
//! A failed tile leaves its region blank and the job carries on;
//! partial mosaics are more useful than no mosaic.

mod job;
mod tga;

pub use job::{run_tile_job, TileJob, TILE_SIZE};
pub use tga::TgaImage;

use thiserror::Error;

/// Errors that abort a whole mosaic job (per-tile failures do not).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MosaicError {
    /// The assembled raster would not fit the container's 16-bit
    /// dimension fields.
    #[error("mosaic {width}x{height} exceeds maximum raster dimensions")]
    RasterTooLarge { width: u32, height: u32 },

    /// A job without any tile server templates cannot fetch anything.
    #[error("tile job for map '{0}' has no tile servers")]
    NoServers(String),
}
