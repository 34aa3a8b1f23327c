//! Tile job execution: fetch, decode, stitch.

use tracing::{debug, info, warn};

use crate::coord::TileRange;
use crate::fetch::HttpClient;

use super::{MosaicError, TgaImage};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// A request to assemble one basemap mosaic.
///
/// `servers` holds URL templates with `{zoom}`, `{x}` and `{y}`
/// placeholders; successive tiles round-robin across them to spread
/// load and stay under per-server rate limits. `map_id` is an opaque
/// correlation tag carried through progress and completion events.
#[derive(Debug, Clone, PartialEq)]
pub struct TileJob {
    pub range: TileRange,
    pub servers: Vec<String>,
    pub map_id: String,
}

impl TileJob {
    /// Pixel dimensions of the mosaic this job will produce.
    pub fn mosaic_size(&self) -> (u32, u32) {
        (
            self.range.columns() * TILE_SIZE,
            self.range.rows() * TILE_SIZE,
        )
    }
}

/// Expands a server URL template for one tile.
fn tile_url(template: &str, zoom: u8, col: u32, row: u32) -> String {
    template
        .replace("{zoom}", &zoom.to_string())
        .replace("{x}", &col.to_string())
        .replace("{y}", &row.to_string())
}

/// Runs a tile job to completion, returning the assembled raster.
///
/// Tiles are processed in row-major order. Each fetched tile is decoded
/// and blitted into its sub-rectangle; a tile that fails to fetch or
/// decode leaves its region at the blank value and the job continues.
/// `progress` is invoked after every tile with the percentage complete.
///
/// # Errors
///
/// Only job-level problems abort: an empty server list or a raster too
/// large for the container.
pub fn run_tile_job<F>(
    job: &TileJob,
    client: &dyn HttpClient,
    mut progress: F,
) -> Result<TgaImage, MosaicError>
where
    F: FnMut(f32),
{
    if job.servers.is_empty() {
        return Err(MosaicError::NoServers(job.map_id.clone()));
    }

    let (width, height) = job.mosaic_size();
    let mut mosaic = TgaImage::blank(width, height)?;

    let total = job.range.count();
    info!(
        map = %job.map_id,
        columns = job.range.columns(),
        rows = job.range.rows(),
        width,
        height,
        "assembling mosaic from {total} tiles"
    );

    let mut server_idx = 0;
    let mut fetched = 0u32;

    for tile in job.range.iter() {
        let url = tile_url(&job.servers[server_idx], tile.zoom, tile.col, tile.row);
        server_idx = (server_idx + 1) % job.servers.len();

        let dest_x = (tile.col - job.range.min_col) * TILE_SIZE;
        let dest_y = (tile.row - job.range.min_row) * TILE_SIZE;

        match fetch_tile(client, &url) {
            Ok(rgb) => {
                debug!(col = tile.col, row = tile.row, %url, "tile fetched");
                mosaic.blit_rgb(dest_x, dest_y, TILE_SIZE, TILE_SIZE, &rgb);
            }
            Err(reason) => {
                warn!(col = tile.col, row = tile.row, %url, %reason, "tile left blank");
            }
        }

        fetched += 1;
        progress(fetched as f32 / total as f32 * 100.0);
    }

    Ok(mosaic)
}

/// Fetches and decodes one tile to raw RGB8 at `TILE_SIZE` square.
fn fetch_tile(client: &dyn HttpClient, url: &str) -> Result<Vec<u8>, String> {
    let bytes = client.get(url).map_err(|e| e.to_string())?;

    let decoded = image::load_from_memory(&bytes).map_err(|e| format!("decode failed: {e}"))?;
    let rgb = decoded.to_rgb8();

    if rgb.width() != TILE_SIZE || rgb.height() != TILE_SIZE {
        return Err(format!(
            "unexpected tile size {}x{}",
            rgb.width(),
            rgb.height()
        ));
    }

    Ok(rgb.into_raw())
}
