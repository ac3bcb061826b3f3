use image::{GrayImage, Luma};
use crate::{
    config::StructuringElement,
    raster::{COVERED, NOT_COVERED},
};

/// Odd kernel side used for a requested size; even sizes are bumped by one.
pub fn odd_kernel_size(size: u32) -> u32 {
    if size % 2 == 0 { size + 1 } else { size }
}

/// Offsets covered by a `size` x `size` structuring element, relative to its
/// centre. `size` is made odd first.
pub fn kernel_offsets(element: StructuringElement, size: u32) -> Vec<(i32, i32)> {
    let radius = (odd_kernel_size(size) / 2) as i32;
    let mut offsets = Vec::new();

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let inside = match element {
                StructuringElement::Rectangle => true,
                StructuringElement::Cross => dx == 0 || dy == 0,
                StructuringElement::Ellipse => {
                    if radius == 0 {
                        true
                    } else {
                        let (fx, fy, r) = (dx as f64, dy as f64, radius as f64);
                        (fx * fx + fy * fy) / (r * r) <= 1.0
                    }
                }
            };
            if inside {
                offsets.push((dx, dy));
            }
        }
    }

    offsets
}

fn covered_at(image: &GrayImage, x: i64, y: i64) -> Option<bool> {
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        None
    } else {
        Some(image.get_pixel(x as u32, y as u32).0[0] == COVERED)
    }
}

/// A cell survives when every kernel cell lands on a covered cell. Positions
/// past the border count as covered, so regions touching the edge are not
/// eaten from outside.
pub fn erode(mask: &GrayImage, offsets: &[(i32, i32)]) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let keep = offsets.iter().all(|&(dx, dy)| {
            covered_at(mask, i64::from(x) + i64::from(dx), i64::from(y) + i64::from(dy))
                .unwrap_or(true)
        });
        Luma([if keep { COVERED } else { NOT_COVERED }])
    })
}

/// A cell is covered when any kernel cell lands on a covered cell.
pub fn dilate(mask: &GrayImage, offsets: &[(i32, i32)]) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let hit = offsets.iter().any(|&(dx, dy)| {
            covered_at(mask, i64::from(x) - i64::from(dx), i64::from(y) - i64::from(dy))
                .unwrap_or(false)
        });
        Luma([if hit { COVERED } else { NOT_COVERED }])
    })
}

/// Erosion followed by dilation.
pub fn open(mask: &GrayImage, element: StructuringElement, size: u32) -> GrayImage {
    let offsets = kernel_offsets(element, size);
    dilate(&erode(mask, &offsets), &offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_rect(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([COVERED]));
            }
        }
    }

    /// Two 9x9 squares joined by a 1 pixel wide bridge.
    fn create_test_image() -> GrayImage {
        let mut mask = GrayImage::new(40, 20);
        fill_rect(&mut mask, 3, 5, 12, 14);
        fill_rect(&mut mask, 12, 9, 20, 10);
        fill_rect(&mut mask, 20, 5, 29, 14);
        mask
    }

    #[test]
    fn test_kernel_shapes() {
        assert_eq!(kernel_offsets(StructuringElement::Rectangle, 3).len(), 9);
        assert_eq!(kernel_offsets(StructuringElement::Cross, 5).len(), 9);
        assert_eq!(kernel_offsets(StructuringElement::Ellipse, 1), vec![(0, 0)]);

        let ellipse = kernel_offsets(StructuringElement::Ellipse, 5);
        assert!(ellipse.contains(&(2, 0)));
        assert!(!ellipse.contains(&(2, 2)));
    }

    #[test]
    fn test_even_size_matches_next_odd() {
        for element in [StructuringElement::Ellipse, StructuringElement::Rectangle, StructuringElement::Cross] {
            assert_eq!(kernel_offsets(element, 4), kernel_offsets(element, 5));
        }
    }

    #[test]
    fn test_open_cuts_thin_bridge() {
        let opened = open(&create_test_image(), StructuringElement::Rectangle, 3);

        assert_eq!(opened.get_pixel(16, 9).0[0], NOT_COVERED);
        assert_eq!(opened.get_pixel(7, 9).0[0], COVERED);
        assert_eq!(opened.get_pixel(24, 9).0[0], COVERED);
    }

    #[test]
    fn test_open_is_anti_extensive() {
        let original = create_test_image();
        let opened = open(&original, StructuringElement::Ellipse, 5);
        for (x, y, p) in opened.enumerate_pixels() {
            if p.0[0] == COVERED {
                assert_eq!(original.get_pixel(x, y).0[0], COVERED);
            }
        }
    }

    #[test]
    fn test_region_on_border_survives_erosion() {
        let mut mask = GrayImage::new(10, 10);
        fill_rect(&mut mask, 0, 0, 4, 4);
        let eroded = erode(&mask, &kernel_offsets(StructuringElement::Rectangle, 3));
        assert_eq!(eroded.get_pixel(0, 0).0[0], COVERED);
        assert_eq!(eroded.get_pixel(3, 3).0[0], NOT_COVERED);
    }
}
