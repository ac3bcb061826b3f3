//! Conversion between display-space and native-space pixel coordinates.
//!
//! Both directions truncate toward zero, so a round trip is lossy except at
//! factors that divide evenly.

use crate::types::{Coordinate, ScaleFactors};

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Divides each axis by its scale factor.
    pub fn to_native(display: Coordinate, sf_x: f64, sf_y: f64) -> Coordinate {
        Coordinate::new(
            (f64::from(display.x) / sf_x) as i32,
            (f64::from(display.y) / sf_y) as i32,
        )
    }

    /// Multiplies each axis by its scale factor.
    pub fn to_display(native: Coordinate, sf_x: f64, sf_y: f64) -> Coordinate {
        Coordinate::new(
            (f64::from(native.x) * sf_x) as i32,
            (f64::from(native.y) * sf_y) as i32,
        )
    }

    /// Maps operator input; passes through when the image is shown natively.
    pub fn native_from(scale: ScaleFactors, display: Coordinate) -> Coordinate {
        if scale.is_native() {
            display
        } else {
            Self::to_native(display, scale.sf_x, scale.sf_y)
        }
    }

    /// Maps engine output back for display.
    pub fn display_from(scale: ScaleFactors, native: Coordinate) -> Coordinate {
        if scale.is_native() {
            native
        } else {
            Self::to_display(native, scale.sf_x, scale.sf_y)
        }
    }

    pub fn natives_from(scale: ScaleFactors, display: &[Coordinate]) -> Vec<Coordinate> {
        display.iter().map(|&c| Self::native_from(scale, c)).collect()
    }

    pub fn displays_from(scale: ScaleFactors, native: &[Coordinate]) -> Vec<Coordinate> {
        native.iter().map(|&c| Self::display_from(scale, c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_scale_round_trip() {
        let native = CoordinateMapper::to_native(Coordinate::new(100, 100), 0.5, 0.5);
        assert_eq!(native, Coordinate::new(200, 200));
        let display = CoordinateMapper::to_display(native, 0.5, 0.5);
        assert_eq!(display, Coordinate::new(100, 100));
    }

    #[test]
    fn test_truncation_is_lossy() {
        // 7 / 0.3 = 23.33 -> 23; 23 * 0.3 = 6.9 -> 6
        let native = CoordinateMapper::to_native(Coordinate::new(7, 7), 0.3, 0.3);
        assert_eq!(native, Coordinate::new(23, 23));
        let back = CoordinateMapper::to_display(native, 0.3, 0.3);
        assert_eq!(back, Coordinate::new(6, 6));
    }

    #[test]
    fn test_upscaled_display() {
        let native = CoordinateMapper::to_native(Coordinate::new(45, 31), 2.0, 1.5);
        assert_eq!(native, Coordinate::new(22, 20));
    }

    #[test]
    fn test_native_scale_passes_through() {
        let c = Coordinate::new(-4, 17);
        assert_eq!(CoordinateMapper::native_from(ScaleFactors::NATIVE, c), c);
        assert_eq!(CoordinateMapper::display_from(ScaleFactors::NATIVE, c), c);
    }
}
