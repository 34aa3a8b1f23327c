//! Minimal Targa (TGA) raster container.
//!
//! The mosaic output format: an 18-byte type-2 header (uncompressed
//! true-color) followed by row-major 24-bit BGR pixel data, with the
//! top-left-origin bit set in the image descriptor. A decoder needs
//! only the header's width/height/depth fields and the pixel stride.

use super::MosaicError;

/// Size of the TGA file header in bytes.
const HEADER_SIZE: usize = 18;

/// Bytes per pixel (24-bit BGR).
const BYTES_PER_PIXEL: usize = 3;

/// Bit 5 of the image descriptor: rows are stored top-to-bottom.
const DESCRIPTOR_TOP_LEFT: u8 = 1 << 5;

/// An uncompressed 24-bit raster with TGA encoding.
///
/// Pixels are stored BGR, row-major, top row first. Fresh rasters are
/// zeroed (black), which doubles as the defined blank value for tiles
/// that failed to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct TgaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TgaImage {
    /// Creates a blank (black) raster.
    ///
    /// # Errors
    ///
    /// Fails when either dimension exceeds the header's 16-bit fields.
    pub fn blank(width: u32, height: u32) -> Result<Self, MosaicError> {
        if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(MosaicError::RasterTooLarge { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGR pixel data, without the header.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copies an RGB8 block into the raster at (x, y), converting to
    /// the container's BGR order.
    ///
    /// The block must lie fully inside the raster; the mosaic assembler
    /// guarantees this by construction of the tile range.
    pub fn blit_rgb(&mut self, x: u32, y: u32, block_width: u32, block_height: u32, rgb: &[u8]) {
        debug_assert!(x + block_width <= self.width);
        debug_assert!(y + block_height <= self.height);
        debug_assert_eq!(rgb.len(), (block_width * block_height) as usize * BYTES_PER_PIXEL);

        let row_stride = self.width as usize * BYTES_PER_PIXEL;
        for row in 0..block_height as usize {
            let src_row = &rgb[row * block_width as usize * BYTES_PER_PIXEL..]
                [..block_width as usize * BYTES_PER_PIXEL];
            let dest_start = (y as usize + row) * row_stride + x as usize * BYTES_PER_PIXEL;
            let dest_row = &mut self.pixels[dest_start..dest_start + src_row.len()];
            for (dest, src) in dest_row.chunks_exact_mut(3).zip(src_row.chunks_exact(3)) {
                dest[0] = src[2];
                dest[1] = src[1];
                dest[2] = src[0];
            }
        }
    }

    /// Encodes the raster as a complete TGA file.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE + self.pixels.len()];

        out[2] = 2; // uncompressed true-color
        out[12] = (self.width & 0xff) as u8;
        out[13] = (self.width >> 8) as u8;
        out[14] = (self.height & 0xff) as u8;
        out[15] = (self.height >> 8) as u8;
        out[16] = 24; // bits per pixel
        out[17] = DESCRIPTOR_TOP_LEFT;

        out[HEADER_SIZE..].copy_from_slice(&self.pixels);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_zeroed() {
        let img = TgaImage::blank(4, 2).unwrap();
        assert_eq!(img.pixels().len(), 4 * 2 * 3);
        assert!(img.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blank_rejects_oversized() {
        assert!(TgaImage::blank(70_000, 256).is_err());
        assert!(TgaImage::blank(256, 70_000).is_err());
        assert!(TgaImage::blank(0, 256).is_err());
    }

    #[test]
    fn test_header_fields() {
        let img = TgaImage::blank(512, 260).unwrap();
        let file = img.encode();

        assert_eq!(file.len(), 18 + 512 * 260 * 3);
        assert_eq!(file[2], 2);
        assert_eq!(u16::from_le_bytes([file[12], file[13]]), 512);
        assert_eq!(u16::from_le_bytes([file[14], file[15]]), 260);
        assert_eq!(file[16], 24);
        assert_eq!(file[17] & (1 << 5), 1 << 5);
    }

    #[test]
    fn test_blit_converts_rgb_to_bgr() {
        let mut img = TgaImage::blank(2, 2).unwrap();
        // One red pixel at (1, 0).
        img.blit_rgb(1, 0, 1, 1, &[255, 0, 0]);

        let pixels = img.pixels();
        // Pixel (1,0) starts at byte 3; BGR order puts red last.
        assert_eq!(&pixels[3..6], &[0, 0, 255]);
        // Other pixels untouched.
        assert_eq!(&pixels[0..3], &[0, 0, 0]);
    }

    #[test]
    fn test_blit_places_block_at_offset() {
        let mut img = TgaImage::blank(4, 4).unwrap();
        // 2x2 green block at (2, 2).
        let green = [0u8, 255, 0].repeat(4);
        img.blit_rgb(2, 2, 2, 2, &green);

        let stride = 4 * 3;
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            let at = y * stride + x * 3;
            assert_eq!(&img.pixels()[at..at + 3], &[0, 255, 0], "pixel {x},{y}");
        }
        // Top-left corner stays blank.
        assert_eq!(&img.pixels()[0..3], &[0, 0, 0]);
    }
}
