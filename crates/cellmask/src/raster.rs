use image::{GrayImage, Luma, Rgb, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{CellMaskError, Result};
use crate::types::Coordinate;

/// Mask value for a covered cell.
pub const COVERED: u8 = 255;
/// Mask value for a cell outside every region.
pub const NOT_COVERED: u8 = 0;

/// Storage order of the three colour channels of a [`Raster`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelOrder {
    /// Blue, green, red; the order microscopy frames are decoded in
    #[default]
    Bgr,
    Rgb,
}

/// Immutable three-channel 8-bit pixel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: RgbImage,
    order: ChannelOrder,
}

impl Raster {
    pub fn new(pixels: RgbImage, order: ChannelOrder) -> Self {
        Self { pixels, order }
    }

    pub fn from_bgr(pixels: RgbImage) -> Self {
        Self::new(pixels, ChannelOrder::Bgr)
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self::new(pixels, ChannelOrder::Rgb)
    }

    /// Builds a raster from an interleaved byte buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        let pixels = RgbImage::from_raw(width, height, data)
            .ok_or(CellMaskError::RasterSize { expected, actual })?;
        Ok(Self::new(pixels, order))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn channels(&self) -> u8 {
        3
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Raw pixels in storage order.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Luma of the pixel at `(x, y)`, honouring the channel order.
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        luma_of(self.pixels.get_pixel(x, y), self.order)
    }

    /// Single-channel intensity image the engine algorithms work on.
    pub fn luma(&self) -> GrayImage {
        let order = self.order;
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([luma_of(self.pixels.get_pixel(x, y), order)])
        })
    }

    /// Copy of the pixels in RGB order, for encoders and overlays.
    pub fn to_rgb(&self) -> RgbImage {
        match self.order {
            ChannelOrder::Rgb => self.pixels.clone(),
            ChannelOrder::Bgr => {
                let mut rgb = self.pixels.clone();
                for pixel in rgb.pixels_mut() {
                    pixel.0.swap(0, 2);
                }
                rgb
            }
        }
    }
}

fn luma_of(pixel: &Rgb<u8>, order: ChannelOrder) -> u8 {
    let [c0, c1, c2] = pixel.0;
    let (r, g, b) = match order {
        ChannelOrder::Rgb => (c0, c1, c2),
        ChannelOrder::Bgr => (c2, c1, c0),
    };
    let value = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    value.round().clamp(0.0, 255.0) as u8
}

/// Binary coverage grid laid over a raster.
///
/// Every cell is either [`COVERED`] or [`NOT_COVERED`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    cells: GrayImage,
}

impl Mask {
    /// Empty mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { cells: GrayImage::new(width, height) }
    }

    /// Binarizes a grayscale image: any non-zero value counts as covered.
    pub fn from_gray(image: &GrayImage) -> Self {
        let mut cells = image.clone();
        for pixel in cells.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > 0 { COVERED } else { NOT_COVERED };
        }
        Self { cells }
    }

    pub fn width(&self) -> u32 {
        self.cells.width()
    }

    pub fn height(&self) -> u32 {
        self.cells.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.cells.dimensions()
    }

    /// Out-of-bounds positions are reported as not covered.
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.cells.get_pixel(x, y).0[0] == COVERED
    }

    pub fn covers(&self, coord: Coordinate) -> bool {
        coord
            .in_bounds(self.width(), self.height())
            .is_some_and(|(x, y)| self.is_covered(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32, covered: bool) {
        let value = if covered { COVERED } else { NOT_COVERED };
        self.cells.put_pixel(x, y, Luma([value]));
    }

    pub fn clear(&mut self) {
        for pixel in self.cells.pixels_mut() {
            pixel.0[0] = NOT_COVERED;
        }
    }

    pub fn covered_count(&self) -> usize {
        self.cells.pixels().filter(|p| p.0[0] == COVERED).count()
    }

    pub fn is_empty(&self) -> bool {
        self.covered_count() == 0
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.cells
    }

    pub(crate) fn gray_mut(&mut self) -> &mut GrayImage {
        &mut self.cells
    }

    /// Replaces the whole grid; sizes must agree.
    pub(crate) fn replace(&mut self, cells: GrayImage) -> Result<()> {
        ensure_same_size(self.dimensions(), cells.dimensions())?;
        self.cells = cells;
        Ok(())
    }
}

/// Fails with [`CellMaskError::DimensionMismatch`] when the sizes differ.
pub fn ensure_same_size(raster: (u32, u32), mask: (u32, u32)) -> Result<()> {
    if raster == mask {
        Ok(())
    } else {
        Err(CellMaskError::DimensionMismatch {
            raster_width: raster.0,
            raster_height: raster.1,
            mask_width: mask.0,
            mask_height: mask.1,
        })
    }
}
