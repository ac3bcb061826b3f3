use tracing::{debug, info};

use crate::{
    algorithms::{editing, morphology::odd_kernel_size},
    config::{EngineConfig, StructuringElement},
    error::Result,
    model::Image,
    types::Coordinate,
};

/// Region-level corrections applied to an image's mask. All coordinates are
/// native.
#[derive(Debug, Clone, Default)]
pub struct MaskEditor {
    config: EngineConfig,
}

impl MaskEditor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Opens the region under `(x, y)` to split touching blobs and returns
    /// the centroids of what is left of it.
    ///
    /// `element` falls back to the configured element; an even `size` is
    /// bumped to the next odd one.
    pub fn morphological_open(
        &self,
        image: &mut Image,
        x: i32,
        y: i32,
        element: Option<StructuringElement>,
        size: u32,
    ) -> Result<Vec<Coordinate>> {
        image.check_invariants()?;
        let seed = Coordinate::new(x, y);
        if !image.mask().covers(seed) {
            debug!("Open at {} ignored: not on a region", seed);
            return Ok(Vec::new());
        }

        let element = element.unwrap_or(self.config.structuring_element);
        let adjacency = self.config.contour_adjacency;
        let (_, mask) = image.mask_for_write()?;
        let centers =
            editing::open_region(mask, adjacency, seed, element, size).unwrap_or_default();

        info!(
            "Opened region at {} with {} {}: {} pieces",
            seed,
            element,
            odd_kernel_size(size),
            centers.len()
        );
        Ok(centers)
    }

    /// Unions the regions under `coords` into one.
    pub fn merge_regions(&self, image: &mut Image, coords: &[Coordinate]) -> Result<bool> {
        image.check_invariants()?;
        let mut scratch = image.mask().clone();
        if !editing::merge_regions(&mut scratch, self.config.contour_adjacency, coords) {
            debug!("Merge ignored: fewer than two regions hit");
            return Ok(false);
        }

        let (_, mask) = image.mask_for_write()?;
        *mask = scratch;
        info!("Merged regions under {} coordinates", coords.len());
        Ok(true)
    }

    /// Deletes the region under `(x, y)` and returns the centroids of the
    /// surviving regions hit by `coords`.
    pub fn delete_region(
        &self,
        image: &mut Image,
        x: i32,
        y: i32,
        coords: &[Coordinate],
    ) -> Result<Vec<Coordinate>> {
        image.check_invariants()?;
        let seed = Coordinate::new(x, y);
        let adjacency = self.config.contour_adjacency;

        if !image.mask().covers(seed) {
            debug!("Delete at {} ignored: not on a region", seed);
            return Ok(editing::centroids_hit(image.mask(), adjacency, coords));
        }

        let (_, mask) = image.mask_for_write()?;
        let (_, remaining) = editing::delete_region(mask, adjacency, seed, coords);
        info!("Deleted region at {}, {} listed regions remain", seed, remaining.len());
        Ok(remaining)
    }

    /// One centroid per region currently in the mask.
    pub fn find_centers(&self, image: &Image) -> Result<Vec<Coordinate>> {
        image.check_invariants()?;
        Ok(editing::find_centers(image.mask(), self.config.contour_adjacency))
    }

    /// Coordinates that did not end up inside any region.
    pub fn points_not_covered(&self, image: &Image, coords: &[Coordinate]) -> Result<Vec<Coordinate>> {
        image.check_invariants()?;
        Ok(editing::points_not_covered(image.mask(), coords))
    }
}
