//! Read-only layer rasters.
//!
//! Each layer ships an equirectangular RGB image covering the whole world. Pure
//! black marks borders, pure white marks places the layer has nothing for, and
//! every other colour is an opaque key for one region (or one combination of
//! overlapping regions).

use crate::error::{GeocodeError, Result};
use image::{ImageReader, Rgb, RgbImage};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

/// Colour of pixels that must always be resolved by the backend.
pub const BORDER: u32 = 0x000000;

/// Colour of pixels where the layer has no regions.
pub const EMPTY: u32 = 0xFFFFFF;

/// An immutable 24-bit RGB world raster.
#[derive(Debug, Clone)]
pub struct Raster {
    image: RgbImage,
}

impl Raster {
    /// Decode a raster file. Any alpha channel is discarded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(|e| GeocodeError::Raster(format!("{}: {}", path.display(), e)))?
            .with_guessed_format()?
            .decode()?
            .to_rgb8();
        Self::from_image(image)
    }

    pub fn from_reader<R: BufRead + Seek>(reader: R) -> Result<Self> {
        let image = ImageReader::new(reader)
            .with_guessed_format()?
            .decode()?
            .to_rgb8();
        Self::from_image(image)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_image(image: RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GeocodeError::Raster(format!(
                "Raster must not be empty, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(Self { image })
    }

    /// A raster of a single colour, e.g. all [`BORDER`] for a layer whose
    /// regions overlap too much to cache.
    pub fn uniform(width: u32, height: u32, colour: u32) -> Result<Self> {
        Self::from_image(RgbImage::from_pixel(width, height, to_rgb(colour)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel covering a coordinate. The image origin is the top left, so the
    /// y axis runs from north to south.
    ///
    /// Callers must pass `-90 <= lat <= 90` and `-180 <= lng <= 180`.
    pub fn pixel_for(&self, lat: f64, lng: f64) -> (u32, u32) {
        let max_x = f64::from(self.width() - 1);
        let max_y = f64::from(self.height() - 1);

        let x = ((lng + 180.0) / 360.0 * max_x).round();
        let y = max_y - ((lat + 90.0) / 180.0 * max_y).round();

        (x.clamp(0.0, max_x) as u32, y.clamp(0.0, max_y) as u32)
    }

    pub fn colour_at(&self, x: u32, y: u32) -> u32 {
        from_rgb(self.image.get_pixel(x, y))
    }

    pub fn colour_for(&self, lat: f64, lng: f64) -> u32 {
        let (x, y) = self.pixel_for(lat, lng);
        self.colour_at(x, y)
    }
}

#[inline]
fn from_rgb(pixel: &Rgb<u8>) -> u32 {
    let [r, g, b] = pixel.0;
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

#[inline]
pub(crate) fn to_rgb(colour: u32) -> Rgb<u8> {
    Rgb([(colour >> 16) as u8, (colour >> 8) as u8, colour as u8])
}
