use std::collections::VecDeque;

use image::GrayImage;
use tracing::debug;

use crate::{config::Adjacency, raster::Mask, types::Coordinate};

/// Seeded region growing over an intensity image.
#[derive(Debug, Clone)]
pub struct RegionGrower {
    /// Largest admitted distance between a pixel and the region's mean
    pub threshold: u32,
    /// Adjacency levels explored from each seed
    pub depth: u32,
    pub adjacency: Adjacency,
}

impl RegionGrower {
    /// Grows one region per seed into `mask`. Returns the number of cells
    /// newly covered.
    ///
    /// Seeds outside the grid or already covered are skipped. Covered cells
    /// are never cleared and block growth, so repeated calls only add.
    pub fn grow(&self, mask: &mut Mask, intensity: &GrayImage, seeds: &[Coordinate]) -> usize {
        let (width, height) = intensity.dimensions();
        let mut added = 0;

        for &seed in seeds {
            let Some((sx, sy)) = seed.in_bounds(width, height) else {
                debug!("Skipping out-of-bounds seed {}", seed);
                continue;
            };
            if mask.is_covered(sx, sy) {
                continue;
            }
            added += self.grow_one(mask, intensity, sx, sy);
        }

        added
    }

    fn grow_one(&self, mask: &mut Mask, intensity: &GrayImage, sx: u32, sy: u32) -> usize {
        let (width, height) = intensity.dimensions();
        let threshold = f64::from(self.threshold);

        let mut sum = f64::from(intensity.get_pixel(sx, sy).0[0]);
        let mut count = 1usize;
        let mut queue: VecDeque<(u32, u32, u32)> = VecDeque::new();

        mask.set(sx, sy, true);
        queue.push_back((sx, sy, 0));

        while let Some((x, y, level)) = queue.pop_front() {
            if level >= self.depth {
                continue;
            }

            for &(dx, dy) in self.adjacency.offsets() {
                let nx = x as i64 + i64::from(dx);
                let ny = y as i64 + i64::from(dy);
                if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if mask.is_covered(nx, ny) {
                    continue;
                }

                let value = f64::from(intensity.get_pixel(nx, ny).0[0]);
                let mean = sum / count as f64;
                if (value - mean).abs() <= threshold {
                    mask.set(nx, ny, true);
                    sum += value;
                    count += 1;
                    queue.push_back((nx, ny, level + 1));
                }
            }
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Dark 10x10 square at (5..15, 5..15) on a bright 30x30 background.
    fn create_test_image() -> GrayImage {
        GrayImage::from_fn(30, 30, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Luma([40])
            } else {
                Luma([200])
            }
        })
    }

    fn grower(threshold: u32, depth: u32) -> RegionGrower {
        RegionGrower { threshold, depth, adjacency: Adjacency::Four }
    }

    #[test]
    fn test_grows_to_intensity_edge() {
        let image = create_test_image();
        let mut mask = Mask::new(30, 30);

        let added = grower(20, 100).grow(&mut mask, &image, &[Coordinate::new(9, 9)]);

        assert_eq!(added, 100);
        assert!(mask.is_covered(5, 5));
        assert!(mask.is_covered(14, 14));
        assert!(!mask.is_covered(15, 14));
    }

    #[test]
    fn test_depth_limits_expansion() {
        let image = create_test_image();
        let mut mask = Mask::new(30, 30);

        grower(20, 1).grow(&mut mask, &image, &[Coordinate::new(9, 9)]);

        // Seed plus its four direct neighbours
        assert_eq!(mask.covered_count(), 5);
        assert!(mask.is_covered(9, 8));
        assert!(!mask.is_covered(8, 8));
    }

    #[test]
    fn test_covered_seed_is_noop() {
        let image = create_test_image();
        let mut mask = Mask::new(30, 30);
        let g = grower(20, 100);

        g.grow(&mut mask, &image, &[Coordinate::new(9, 9)]);
        let before = mask.clone();
        let added = g.grow(&mut mask, &image, &[Coordinate::new(9, 9), Coordinate::new(9, 9)]);

        assert_eq!(added, 0);
        assert_eq!(mask, before);
    }

    #[test]
    fn test_out_of_bounds_seed_does_not_abort_batch() {
        let image = create_test_image();
        let mut mask = Mask::new(30, 30);

        let seeds = [Coordinate::new(-3, 4), Coordinate::new(300, 1), Coordinate::new(20, 20)];
        let added = grower(10, 2).grow(&mut mask, &image, &seeds);

        assert!(added > 0);
        assert!(mask.is_covered(20, 20));
    }

    #[test]
    fn test_growth_never_clears() {
        let image = create_test_image();
        let mut mask = Mask::new(30, 30);
        mask.set(25, 25, true);
        mask.set(0, 0, true);

        grower(255, 50).grow(&mut mask, &image, &[Coordinate::new(20, 3)]);

        assert!(mask.is_covered(25, 25));
        assert!(mask.is_covered(0, 0));
    }
}
