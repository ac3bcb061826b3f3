use std::collections::HashMap;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::connected_components;
use crate::{
    config::Adjacency,
    error::Result,
    raster::NOT_COVERED,
    traits::ContourExtractor,
    types::{Contour, Coordinate, PixelBounds},
};

/// Per-pixel region labels; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Connected-component based region extractor
#[derive(Debug, Clone)]
pub struct ConnectedComponentExtractor {
    pub adjacency: Adjacency,
}

impl Default for ConnectedComponentExtractor {
    fn default() -> Self {
        Self { adjacency: Adjacency::Eight }
    }
}

impl ContourExtractor for ConnectedComponentExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
        let (_, contours) = label_regions(mask, self.adjacency);
        Ok(contours)
    }
}

struct Accumulator {
    area: u32,
    sum_x: u64,
    sum_y: u64,
    bounds: PixelBounds,
}

/// Labels the covered cells of `mask` and summarizes each region.
///
/// Labels are renumbered so that region `n` (1-based) is the `n`-th region
/// met in raster scan order, and `contours[n - 1]` describes it.
pub fn label_regions(mask: &GrayImage, adjacency: Adjacency) -> (LabelImage, Vec<Contour>) {
    let mut labels = connected_components(mask, adjacency.into(), Luma([NOT_COVERED]));

    let mut renumber: HashMap<u32, u32> = HashMap::new();
    let mut regions: Vec<Accumulator> = Vec::new();

    for (x, y, label) in labels.enumerate_pixels_mut() {
        let raw = label.0[0];
        if raw == 0 {
            continue;
        }

        let next = regions.len() as u32 + 1;
        let id = *renumber.entry(raw).or_insert(next);
        if id == next {
            regions.push(Accumulator {
                area: 0,
                sum_x: 0,
                sum_y: 0,
                bounds: PixelBounds { min_x: x, min_y: y, max_x: x, max_y: y },
            });
        }

        let region = &mut regions[id as usize - 1];
        region.area += 1;
        region.sum_x += u64::from(x);
        region.sum_y += u64::from(y);
        region.bounds.min_x = region.bounds.min_x.min(x);
        region.bounds.min_y = region.bounds.min_y.min(y);
        region.bounds.max_x = region.bounds.max_x.max(x);
        region.bounds.max_y = region.bounds.max_y.max(y);

        label.0[0] = id;
    }

    let contours = regions
        .into_iter()
        .enumerate()
        .map(|(i, region)| Contour {
            label: i as u32 + 1,
            area: region.area,
            centroid: Coordinate::new(
                (region.sum_x / u64::from(region.area)) as i32,
                (region.sum_y / u64::from(region.area)) as i32,
            ),
            bounds: region.bounds,
        })
        .collect();

    (labels, contours)
}

/// Label under `coord`, or `None` for background and out-of-bounds positions.
pub fn label_at(labels: &LabelImage, coord: Coordinate) -> Option<u32> {
    let (x, y) = coord.in_bounds(labels.width(), labels.height())?;
    match labels.get_pixel(x, y).0[0] {
        0 => None,
        label => Some(label),
    }
}
