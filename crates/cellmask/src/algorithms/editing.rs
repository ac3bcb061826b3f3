use std::collections::HashSet;

use geo::{BoundingRect, ConvexHull, Intersects};
use geo_types::{Coord, LineString, Point};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use crate::{
    config::{Adjacency, StructuringElement},
    raster::{COVERED, Mask, NOT_COVERED},
    types::{Contour, Coordinate},
};

use super::{
    extraction::{LabelImage, label_at, label_regions},
    morphology::{odd_kernel_size, open},
};

/// Opens the single region under `seed` and writes the result back.
///
/// Returns `None` without touching the mask when `seed` is not on a region,
/// otherwise the centroids of the pieces the region split into (empty when
/// the opening erased it). A kernel wider than the larger side of the
/// region's bounding box erases the region outright.
pub fn open_region(
    mask: &mut Mask,
    adjacency: Adjacency,
    seed: Coordinate,
    element: StructuringElement,
    size: u32,
) -> Option<Vec<Coordinate>> {
    let (labels, contours) = label_regions(mask.as_gray(), adjacency);
    let label = label_at(&labels, seed)?;
    let bounds = contours[label as usize - 1].bounds;

    if odd_kernel_size(size) > bounds.width().max(bounds.height()) {
        for (x, y, pixel) in labels.enumerate_pixels() {
            if pixel.0[0] == label {
                mask.set(x, y, false);
            }
        }
        return Some(Vec::new());
    }

    // Pad by the kernel radius so the window never clips the element
    let pad = odd_kernel_size(size) / 2;
    let left = bounds.min_x.saturating_sub(pad);
    let top = bounds.min_y.saturating_sub(pad);
    let right = bounds.max_x.saturating_add(pad).min(mask.width() - 1);
    let bottom = bounds.max_y.saturating_add(pad).min(mask.height() - 1);

    let window = GrayImage::from_fn(right - left + 1, bottom - top + 1, |x, y| {
        if labels.get_pixel(x + left, y + top).0[0] == label {
            Luma([COVERED])
        } else {
            Luma([NOT_COVERED])
        }
    });
    let opened = open(&window, element, size);

    for (x, y, pixel) in window.enumerate_pixels() {
        if pixel.0[0] == COVERED {
            mask.set(x + left, y + top, opened.get_pixel(x, y).0[0] == COVERED);
        }
    }

    let (_, pieces) = label_regions(&opened, adjacency);
    Some(
        pieces
            .into_iter()
            .map(|piece| Coordinate::new(piece.centroid.x + left as i32, piece.centroid.y + top as i32))
            .collect(),
    )
}

/// Distinct labels hit by `coords`, in order of first hit.
fn labels_hit(labels: &LabelImage, coords: &[Coordinate]) -> Vec<u32> {
    let mut seen = HashSet::new();
    coords
        .iter()
        .filter_map(|&c| label_at(labels, c))
        .filter(|label| seen.insert(*label))
        .collect()
}

/// Joins the regions under `coords` into one by filling the convex hull of
/// their pixels. Returns whether the mask changed shape.
///
/// Straight segments between consecutive region centroids are drawn as well,
/// so regions lying on one line still end up 8-connected.
pub fn merge_regions(mask: &mut Mask, adjacency: Adjacency, coords: &[Coordinate]) -> bool {
    let (labels, contours) = label_regions(mask.as_gray(), adjacency);
    let selected = labels_hit(&labels, coords);
    if selected.len() < 2 {
        return false;
    }

    let wanted: HashSet<u32> = selected.iter().copied().collect();
    let points: Vec<Coord<f64>> = labels
        .enumerate_pixels()
        .filter(|(_, _, label)| wanted.contains(&label.0[0]))
        .map(|(x, y, _)| Coord { x: f64::from(x), y: f64::from(y) })
        .collect();

    let hull = LineString::new(points).convex_hull();
    if let Some(rect) = hull.bounding_rect() {
        let x0 = rect.min().x.floor().max(0.0) as u32;
        let y0 = rect.min().y.floor().max(0.0) as u32;
        let x1 = (rect.max().x.ceil() as u32).min(mask.width() - 1);
        let y1 = (rect.max().y.ceil() as u32).min(mask.height() - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                if !mask.is_covered(x, y) && hull.intersects(&Point::new(f64::from(x), f64::from(y))) {
                    mask.set(x, y, true);
                }
            }
        }
    }

    let centroids: Vec<Coordinate> = selected
        .iter()
        .map(|&label| contours[label as usize - 1].centroid)
        .collect();
    for pair in centroids.windows(2) {
        draw_line_segment_mut(
            mask.gray_mut(),
            (pair[0].x as f32, pair[0].y as f32),
            (pair[1].x as f32, pair[1].y as f32),
            Luma([COVERED]),
        );
    }

    true
}

/// Clears the region under `seed`. Returns whether anything was cleared and
/// the centroids of the surviving regions still hit by `coords`.
pub fn delete_region(
    mask: &mut Mask,
    adjacency: Adjacency,
    seed: Coordinate,
    coords: &[Coordinate],
) -> (bool, Vec<Coordinate>) {
    let (labels, contours) = label_regions(mask.as_gray(), adjacency);
    let deleted = label_at(&labels, seed);

    if let Some(label) = deleted {
        for (x, y, pixel) in labels.enumerate_pixels() {
            if pixel.0[0] == label {
                mask.set(x, y, false);
            }
        }
    }

    let remaining = labels_hit(&labels, coords)
        .into_iter()
        .filter(|&label| Some(label) != deleted)
        .map(|label| contours[label as usize - 1].centroid)
        .collect();

    (deleted.is_some(), remaining)
}

/// Centroids of the regions hit by `coords`, in order of first hit.
pub fn centroids_hit(mask: &Mask, adjacency: Adjacency, coords: &[Coordinate]) -> Vec<Coordinate> {
    let (labels, contours) = label_regions(mask.as_gray(), adjacency);
    labels_hit(&labels, coords)
        .into_iter()
        .map(|label| contours[label as usize - 1].centroid)
        .collect()
}

/// One centroid per region, in raster scan order.
pub fn find_centers(mask: &Mask, adjacency: Adjacency) -> Vec<Coordinate> {
    let (_, contours) = label_regions(mask.as_gray(), adjacency);
    contours.iter().map(|c: &Contour| c.centroid).collect()
}

/// The in-bounds coordinates that sit on uncovered cells.
pub fn points_not_covered(mask: &Mask, coords: &[Coordinate]) -> Vec<Coordinate> {
    coords
        .iter()
        .copied()
        .filter(|c| {
            c.in_bounds(mask.width(), mask.height())
                .is_some_and(|(x, y)| !mask.is_covered(x, y))
        })
        .collect()
}
