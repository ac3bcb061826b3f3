use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Integer pixel position, either in display space or native raster space.
///
/// Which space a value lives in is decided by the call site: engine operations
/// always take native coordinates, the session maps operator input first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, JsonSchema,
)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the position as unsigned pixel indices when it lies inside a
    /// `width` x `height` grid.
    pub fn in_bounds(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let x = u32::try_from(self.x).ok()?;
        let y = u32::try_from(self.y).ok()?;
        (x < width && y < height).then_some((x, y))
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Formats as an operator list row, e.g. `X: 12 Y: 40`.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {} Y: {}", self.x, self.y)
    }
}

/// Axis-aligned pixel bounds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// A connected region of a mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Contour {
    /// Component label, assigned in raster scan order starting at 1
    pub label: u32,
    /// Number of covered pixels in the region
    pub area: u32,
    /// Truncated mean of the region's pixel coordinates
    pub centroid: Coordinate,
    pub bounds: PixelBounds,
}

/// Ratio between the displayed size of an image and its native size.
///
/// A factor below 1 means the preview is drawn smaller than the raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScaleFactors {
    pub sf_x: f64,
    pub sf_y: f64,
}

impl ScaleFactors {
    pub const NATIVE: Self = Self { sf_x: 1.0, sf_y: 1.0 };

    /// Accepts only positive, finite factors.
    pub fn new(sf_x: f64, sf_y: f64) -> Option<Self> {
        let valid = |sf: f64| sf.is_finite() && sf > 0.0;
        (valid(sf_x) && valid(sf_y)).then_some(Self { sf_x, sf_y })
    }

    pub fn is_native(&self) -> bool {
        self.sf_x == 1.0 && self.sf_y == 1.0
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::NATIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_row_format() {
        assert_eq!(Coordinate::new(12, 40).to_string(), "X: 12 Y: 40");
    }

    #[test]
    fn test_in_bounds_rejects_negative_and_overflow() {
        assert_eq!(Coordinate::new(-1, 3).in_bounds(10, 10), None);
        assert_eq!(Coordinate::new(10, 3).in_bounds(10, 10), None);
        assert_eq!(Coordinate::new(9, 0).in_bounds(10, 10), Some((9, 0)));
    }

    #[test]
    fn test_scale_factors_validation() {
        assert!(ScaleFactors::new(0.0, 1.0).is_none());
        assert!(ScaleFactors::new(1.0, f64::NAN).is_none());
        assert!(ScaleFactors::new(0.5, 2.0).is_some());
        assert!(ScaleFactors::default().is_native());
    }
}
