//! Presentation helpers. Everything here draws onto a fresh RGB copy; sources
//! are never modified.

use image::{Rgb, RgbImage};
use imageproc::contours::find_contours;

use crate::{
    raster::{Mask, Raster, ensure_same_size},
    error::Result,
    types::Coordinate,
};

/// Copy of `raster` with the outline of every mask region painted in `color`.
pub fn highlight_borders(raster: &Raster, mask: &Mask, color: [u8; 3]) -> Result<RgbImage> {
    ensure_same_size(raster.dimensions(), mask.dimensions())?;
    let mut canvas = raster.to_rgb();

    for contour in find_contours::<i32>(mask.as_gray()) {
        for point in contour.points {
            let coord = Coordinate::new(point.x, point.y);
            if let Some((x, y)) = coord.in_bounds(canvas.width(), canvas.height()) {
                canvas.put_pixel(x, y, Rgb(color));
            }
        }
    }

    Ok(canvas)
}

/// Paints each seed and its four direct neighbours.
pub fn mark_seeds(canvas: &mut RgbImage, seeds: &[Coordinate], color: [u8; 3]) {
    const PLUS: [(i32, i32); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];
    let (width, height) = canvas.dimensions();

    for seed in seeds {
        for (dx, dy) in PLUS {
            let (Some(cx), Some(cy)) = (seed.x.checked_add(dx), seed.y.checked_add(dy)) else {
                continue;
            };
            if let Some((x, y)) = Coordinate::new(cx, cy).in_bounds(width, height) {
                canvas.put_pixel(x, y, Rgb(color));
            }
        }
    }
}
