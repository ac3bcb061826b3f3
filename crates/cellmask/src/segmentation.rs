//! Mask producers: seeded region growing and adaptive thresholding.

use tracing::{debug, info};

use crate::{
    algorithms::{AdaptiveThresholdPreprocessor, RegionGrower},
    config::EngineConfig,
    error::Result,
    model::Image,
    traits::MaskPreprocessor,
    types::Coordinate,
};

#[derive(Debug, Clone, Default)]
pub struct SegmentationEngine {
    config: EngineConfig,
}

impl SegmentationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Grows a region from every native-space seed into the image's mask.
    ///
    /// Returns the number of newly covered cells. A call whose seeds are all
    /// covered or out of bounds leaves the mask and its contour cache alone.
    pub fn grow_region(
        &self,
        image: &mut Image,
        seeds: &[Coordinate],
        threshold: u32,
        neighbour_depth: u32,
    ) -> Result<usize> {
        image.check_invariants()?;
        let (width, height) = image.dimensions();
        if !seeds
            .iter()
            .filter_map(|s| s.in_bounds(width, height))
            .any(|(x, y)| !image.mask().is_covered(x, y))
        {
            debug!("No growable seeds among {} supplied", seeds.len());
            return Ok(0);
        }

        let grower = RegionGrower {
            threshold,
            depth: neighbour_depth,
            adjacency: self.config.growth_adjacency,
        };
        let (raster, mask) = image.mask_for_write()?;
        let intensity = raster.luma();
        let added = grower.grow(mask, &intensity, seeds);

        info!(
            "Grew {} seeds (threshold {}, depth {}): {} cells added",
            seeds.len(),
            threshold,
            neighbour_depth,
            added
        );
        Ok(added)
    }

    /// Replaces the whole mask with a local mean threshold of the raster.
    ///
    /// `threshold` is the offset from the local mean and `neighbourhood` the
    /// window side (made odd, at least 3).
    pub fn adaptive_threshold(&self, image: &mut Image, threshold: i32, neighbourhood: u32) -> Result<()> {
        let preprocessor = AdaptiveThresholdPreprocessor {
            block_size: neighbourhood,
            offset: threshold,
            polarity: self.config.polarity,
        };
        let (raster, mask) = image.mask_for_write()?;
        let binary = preprocessor.preprocess(&raster.luma())?;
        mask.replace(binary)?;

        info!(
            "Adaptive threshold (offset {}, block {}): {} cells covered",
            threshold,
            preprocessor.effective_block_size(),
            mask.covered_count()
        );
        Ok(())
    }
}
