/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Owned 8-bit RGB pixel buffers.
//!
//! Both the decoded input images and the composite layout raster use
//! [`PixelBuffer`]: row-major, tightly packed, [`CHANNELS`] bytes per pixel.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::identity::ImageId;

/// Bytes per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// Decoded images keyed by identifier.
pub type ImageMap = HashMap<ImageId, PixelBuffer>;

/// Owned row-major RGB8 buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGB8 bytes. `data.len()` must equal `width * height * 3`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = byte_count(width, height)?;
        if data.len() != expected {
            return Err(Error::invalid(
                "pixel buffer",
                alloc::format!(
                    "{}x{} RGB needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A `width` × `height` buffer with every pixel set to `rgb`.
    pub fn filled(width: usize, height: usize, rgb: [u8; CHANNELS]) -> Result<Self> {
        let len = byte_count(width, height)?;
        let mut data = vec![0u8; len];
        for px in data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`, the footprint compared during layout.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// The pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Bytes of row `y`, `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width * CHANNELS;
        Some(&self.data[y * stride..(y + 1) * stride])
    }

    /// All bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Consume the buffer and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Copy all of `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// The caller guarantees the block fits.
    pub(crate) fn blit(&mut self, src: &PixelBuffer, x: usize, y: usize) {
        let dst_stride = self.width * CHANNELS;
        let row_bytes = src.width * CHANNELS;
        if row_bytes == 0 {
            return;
        }
        for (r, src_row) in src.data.chunks_exact(row_bytes).enumerate() {
            let start = (y + r) * dst_stride + x * CHANNELS;
            self.data[start..start + row_bytes].copy_from_slice(src_row);
        }
    }
}

/// `width * height * CHANNELS`, or `InvalidInput` on overflow.
fn byte_count(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| {
            Error::invalid(
                "pixel buffer",
                alloc::format!("{}x{} RGB overflows usize", width, height),
            )
        })
}

impl core::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(feature = "image")]
mod imaging {
    use super::PixelBuffer;
    use crate::error::{Error, Result};
    use image::RgbImage;
    use std::path::Path;

    impl PixelBuffer {
        /// Take ownership of an `image::RgbImage`.
        pub fn from_rgb_image(img: RgbImage) -> Self {
            let (w, h) = img.dimensions();
            Self {
                width: w as usize,
                height: h as usize,
                data: img.into_raw(),
            }
        }

        /// Convert into an `image::RgbImage`.
        pub fn into_rgb_image(self) -> Result<RgbImage> {
            let (w, h) = (self.width as u32, self.height as u32);
            RgbImage::from_raw(w, h, self.data)
                .ok_or_else(|| Error::invalid("pixel buffer", "does not fit an RgbImage"))
        }

        /// Load any format the `image` crate decodes and convert to RGB8.
        pub fn open(path: &Path) -> Result<Self> {
            let img = image::open(path).map_err(|e| {
                Error::invalid("image file", std::format!("{}: {}", path.display(), e))
            })?;
            Ok(Self::from_rgb_image(img.into_rgb8()))
        }

        /// Write the buffer to `path` as PNG.
        pub fn save_png(&self, path: &Path) -> Result<()> {
            image::save_buffer_with_format(
                path,
                &self.data,
                self.width as u32,
                self.height as u32,
                image::ExtendedColorType::Rgb8,
                image::ImageFormat::Png,
            )
            .map_err(|e| Error::invalid("png output", std::format!("{}: {}", path.display(), e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(PixelBuffer::new(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 11]),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_filled_and_pixel() {
        let b = PixelBuffer::filled(3, 2, [1, 2, 3]).unwrap();
        assert_eq!(b.shape(), (2, 3));
        assert_eq!(b.pixel(2, 1), Some([1, 2, 3]));
        assert_eq!(b.pixel(3, 0), None);
        assert_eq!(b.byte_len(), 18);
    }

    #[test]
    fn test_filled_rejects_overflowing_dimensions() {
        assert!(matches!(
            PixelBuffer::filled(usize::MAX, 2, [0, 0, 0]),
            Err(Error::InvalidInput { .. })
        ));
        assert!(PixelBuffer::new(usize::MAX / 2, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_row_out_of_range_is_none() {
        let b = PixelBuffer::new(2, 2, (0..12).collect()).unwrap();
        assert_eq!(b.row(1), Some(&[6u8, 7, 8, 9, 10, 11][..]));
        assert_eq!(b.row(2), None);
        assert_eq!(b.row(usize::MAX), None);
    }

    #[test]
    fn test_blit_places_block() {
        let mut canvas = PixelBuffer::filled(4, 4, [255, 255, 255]).unwrap();
        let block = PixelBuffer::filled(2, 2, [9, 9, 9]).unwrap();
        canvas.blit(&block, 1, 2);
        assert_eq!(canvas.pixel(1, 2), Some([9, 9, 9]));
        assert_eq!(canvas.pixel(2, 3), Some([9, 9, 9]));
        assert_eq!(canvas.pixel(0, 2), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(3, 3), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(1, 1), Some([255, 255, 255]));
    }
}
