use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};
use crate::{
    config::Polarity,
    error::Result,
    raster::{COVERED, NOT_COVERED},
    traits::MaskPreprocessor,
};

/// Mean-C adaptive threshold preprocessor
///
/// Each pixel is compared against the mean of the `block_size` x
/// `block_size` window centred on it (clipped at the image border). With
/// [`Polarity::Dark`] a pixel is foreground when it is below `mean - offset`,
/// with [`Polarity::Bright`] when it is above `mean + offset`.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdPreprocessor {
    pub block_size: u32,
    pub offset: i32,
    pub polarity: Polarity,
}

impl Default for AdaptiveThresholdPreprocessor {
    fn default() -> Self {
        Self {
            block_size: 11,
            offset: 2,
            polarity: Polarity::Dark,
        }
    }
}

impl AdaptiveThresholdPreprocessor {
    /// Window side actually used: odd and at least 3.
    pub fn effective_block_size(&self) -> u32 {
        let size = self.block_size.max(3);
        if size % 2 == 0 { size + 1 } else { size }
    }
}

impl MaskPreprocessor for AdaptiveThresholdPreprocessor {
    fn preprocess(&self, intensity: &GrayImage) -> Result<GrayImage> {
        let (width, height) = intensity.dimensions();
        let radius = i64::from(self.effective_block_size() / 2);
        let table: ImageBuffer<Luma<u64>, Vec<u64>> = integral_image(intensity);
        let offset = f64::from(self.offset);

        Ok(GrayImage::from_fn(width, height, |x, y| {
            let left = (i64::from(x) - radius).max(0) as u32;
            let top = (i64::from(y) - radius).max(0) as u32;
            let right = (i64::from(x) + radius).min(i64::from(width) - 1) as u32;
            let bottom = (i64::from(y) + radius).min(i64::from(height) - 1) as u32;

            let total = sum_image_pixels(&table, left, top, right, bottom)[0];
            let area = u64::from(right - left + 1) * u64::from(bottom - top + 1);
            let mean = total as f64 / area as f64;
            let value = f64::from(intensity.get_pixel(x, y).0[0]);
            let foreground = match self.polarity {
                Polarity::Dark => value < mean - offset,
                Polarity::Bright => value > mean + offset,
            };
            Luma([if foreground { COVERED } else { NOT_COVERED }])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bright 40x40 field with two dark 5x5 blobs.
    fn create_test_image() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            let in_a = (5..10).contains(&x) && (5..10).contains(&y);
            let in_b = (25..30).contains(&x) && (20..25).contains(&y);
            if in_a || in_b { Luma([30]) } else { Luma([210]) }
        })
    }

    #[test]
    fn test_dark_blobs_become_foreground() {
        let threshold = AdaptiveThresholdPreprocessor { block_size: 15, offset: 5, polarity: Polarity::Dark };
        let mask = threshold.preprocess(&create_test_image()).expect("Should threshold");

        assert_eq!(mask.get_pixel(7, 7).0[0], COVERED);
        assert_eq!(mask.get_pixel(27, 22).0[0], COVERED);
        assert_eq!(mask.get_pixel(35, 35).0[0], NOT_COVERED);
        assert_eq!(mask.get_pixel(12, 7).0[0], NOT_COVERED);
    }

    #[test]
    fn test_bright_polarity_inverts() {
        let threshold = AdaptiveThresholdPreprocessor { block_size: 15, offset: 5, polarity: Polarity::Bright };
        let mask = threshold.preprocess(&create_test_image()).expect("Should threshold");

        assert_eq!(mask.get_pixel(7, 7).0[0], NOT_COVERED);
        // Background right next to a blob sits above its window mean
        assert_eq!(mask.get_pixel(11, 7).0[0], COVERED);
    }

    #[test]
    fn test_flat_image_is_background() {
        let flat = GrayImage::from_pixel(16, 16, Luma([120]));
        let mask = AdaptiveThresholdPreprocessor::default().preprocess(&flat).expect("Should threshold");
        assert!(mask.pixels().all(|p| p.0[0] == NOT_COVERED));
    }

    #[test]
    fn test_window_clipped_at_corner() {
        let mut image = GrayImage::from_pixel(4, 4, Luma([100]));
        image.put_pixel(0, 0, Luma([90]));
        let threshold = AdaptiveThresholdPreprocessor { block_size: 3, offset: 2, polarity: Polarity::Dark };
        let mask = threshold.preprocess(&image).expect("Should threshold");

        // Corner window is 2x2 with mean 97.5
        assert_eq!(mask.get_pixel(0, 0).0[0], COVERED);
        assert_eq!(mask.get_pixel(1, 1).0[0], NOT_COVERED);
        assert_eq!(mask.pixels().filter(|p| p.0[0] == COVERED).count(), 1);
    }

    #[test]
    fn test_block_size_coercion() {
        let mut threshold = AdaptiveThresholdPreprocessor::default();
        threshold.block_size = 4;
        assert_eq!(threshold.effective_block_size(), 5);
        threshold.block_size = 0;
        assert_eq!(threshold.effective_block_size(), 3);
    }
}
