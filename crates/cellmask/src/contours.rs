use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::{
    algorithms::ConnectedComponentExtractor,
    config::Adjacency,
    error::Result,
    model::Image,
    traits::ContourExtractor,
    types::Contour,
};

static NEXT_ANALYZER_ID: AtomicU64 = AtomicU64::new(1);

/// Counts mask regions, caching the result on the image until its mask is
/// next written. A cache filled by one analyzer is never served by another.
pub struct ContourAnalyzer {
    id: u64,
    extractor: Box<dyn ContourExtractor>,
}

impl ContourAnalyzer {
    pub fn new(adjacency: Adjacency) -> Self {
        Self::with_extractor(ConnectedComponentExtractor { adjacency })
    }

    pub fn with_extractor<E>(extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        Self {
            id: NEXT_ANALYZER_ID.fetch_add(1, Ordering::Relaxed),
            extractor: Box::new(extractor),
        }
    }

    pub fn extract_contours<'a>(&self, image: &'a mut Image) -> Result<&'a [Contour]> {
        image.check_invariants()?;
        if image.cached_contours(self.id).is_some() {
            return Ok(image.cached_contours(self.id).unwrap_or_default());
        }

        let contours = self.extractor.extract_contours(image.mask().as_gray())?;
        debug!("Extracted {} contours from '{}'", contours.len(), image.name());
        Ok(image.store_contours(self.id, contours))
    }

    pub fn count(&self, image: &mut Image) -> Result<usize> {
        Ok(self.extract_contours(image)?.len())
    }
}

impl Default for ContourAnalyzer {
    fn default() -> Self {
        Self::new(Adjacency::Eight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{raster::Raster, segmentation::SegmentationEngine, types::Coordinate};
    use image::{GrayImage, RgbImage};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Counts how often the mask is actually scanned.
    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl ContourExtractor for CountingExtractor {
        fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ConnectedComponentExtractor::default().extract_contours(mask)
        }
    }

    fn create_test_image() -> Image {
        Image::new("blank.png", ".png", Raster::from_bgr(RgbImage::new(30, 30))).derive_preview()
    }

    #[test]
    fn test_cache_reused_until_mutation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = ContourAnalyzer::with_extractor(CountingExtractor { calls: calls.clone() });
        let engine = SegmentationEngine::default();
        let mut image = create_test_image();

        assert_eq!(analyzer.count(&mut image).expect("Count"), 0);
        assert_eq!(analyzer.count(&mut image).expect("Count"), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        engine
            .grow_region(&mut image, &[Coordinate::new(3, 3), Coordinate::new(20, 20)], 0, 1)
            .expect("Should grow");
        assert_eq!(analyzer.count(&mut image).expect("Count"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_not_shared_across_adjacency() {
        let mut image = create_test_image();
        {
            let (_, mask) = image.mask_for_write().expect("Sizes match");
            mask.set(5, 5, true);
            mask.set(6, 6, true);
        }

        let eight = ContourAnalyzer::new(Adjacency::Eight);
        let four = ContourAnalyzer::new(Adjacency::Four);
        assert_eq!(eight.count(&mut image).expect("Count"), 1);
        assert_eq!(four.count(&mut image).expect("Count"), 2);
        assert_eq!(eight.count(&mut image).expect("Count"), 1);
    }

    #[test]
    fn test_contour_details() {
        let analyzer = ContourAnalyzer::default();
        let engine = SegmentationEngine::default();
        let mut image = create_test_image();
        engine.grow_region(&mut image, &[Coordinate::new(10, 10)], 0, 1).expect("Should grow");

        let contours = analyzer.extract_contours(&mut image).expect("Extract");
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area, 5);
        assert_eq!(contours[0].centroid, Coordinate::new(10, 10));
    }
}
