use image::GrayImage;
use crate::{error::Result, types::Contour};

/// Trait for whole-image mask producers
pub trait MaskPreprocessor: Send + Sync {
    /// Produce a binary mask (0 / 255) from an intensity image
    fn preprocess(&self, intensity: &GrayImage) -> Result<GrayImage>;
}

/// Trait for region extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract the connected regions of a binary mask
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>>;
}
