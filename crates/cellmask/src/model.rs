use tracing::debug;

use crate::error::{CellMaskError, Result};
use crate::raster::{Mask, Raster, ensure_same_size};
use crate::types::{Contour, ScaleFactors};

/// Suffix appended to the stem of a source name to name its preview.
pub const PREVIEW_SUFFIX: &str = "_mask";

/// A raster together with its editable mask and session bookkeeping.
///
/// Two of these live per editing session: the read-only source and the
/// preview that every edit is applied to.
#[derive(Debug, Clone)]
pub struct Image {
    name: String,
    format: String,
    raster: Raster,
    mask: Mask,
    masked: bool,
    contours: Vec<Contour>,
    /// Analyzer that filled `contours`; `None` once the mask is written
    contours_source: Option<u64>,
    scale: ScaleFactors,
}

impl Image {
    /// New image with an empty mask. `format` is the extension including the
    /// dot, e.g. `.png`.
    pub fn new(name: impl Into<String>, format: impl Into<String>, raster: Raster) -> Self {
        let (width, height) = raster.dimensions();
        Self {
            name: name.into(),
            format: format.into(),
            raster,
            mask: Mask::new(width, height),
            masked: false,
            contours: Vec::new(),
            contours_source: None,
            scale: ScaleFactors::NATIVE,
        }
    }

    /// New image over an existing mask; fails when the sizes disagree.
    pub fn with_mask(
        name: impl Into<String>,
        format: impl Into<String>,
        raster: Raster,
        mask: Mask,
    ) -> Result<Self> {
        ensure_same_size(raster.dimensions(), mask.dimensions())?;
        let mut image = Self::new(name, format, raster);
        image.masked = !mask.is_empty();
        image.mask = mask;
        Ok(image)
    }

    /// Independent deep copy to be edited, named `<stem>_mask<format>`, with
    /// a fresh mask.
    pub fn derive_preview(&self) -> Self {
        let mut preview = Self::new(
            format!("{}{}{}", self.stem(), PREVIEW_SUFFIX, self.format),
            self.format.clone(),
            self.raster.clone(),
        );
        preview.scale = self.scale;
        debug!("Derived preview '{}' from '{}'", preview.name, self.name);
        preview
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its extension (everything before the first dot).
    pub fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Whether any segmentation write has touched the mask.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    /// Whether the image is currently displayed at a non-native size.
    pub fn is_scaled(&self) -> bool {
        !self.scale.is_native()
    }

    /// Records the size the presentation layer is drawing the image at.
    pub fn set_display_scale(&mut self, sf_x: f64, sf_y: f64) -> Result<()> {
        self.scale =
            ScaleFactors::new(sf_x, sf_y).ok_or(CellMaskError::InvalidScaleFactor { sf_x, sf_y })?;
        Ok(())
    }

    /// Checks the mask still matches the raster.
    pub fn check_invariants(&self) -> Result<()> {
        ensure_same_size(self.raster.dimensions(), self.mask.dimensions())
    }

    /// Raster and mask for a write; marks the image masked and the contour
    /// cache stale.
    pub(crate) fn mask_for_write(&mut self) -> Result<(&Raster, &mut Mask)> {
        self.check_invariants()?;
        self.masked = true;
        self.contours_source = None;
        Ok((&self.raster, &mut self.mask))
    }

    /// Cached contours, only when `source` is the analyzer that stored them.
    pub(crate) fn cached_contours(&self, source: u64) -> Option<&[Contour]> {
        (self.contours_source == Some(source)).then_some(self.contours.as_slice())
    }

    pub(crate) fn store_contours(&mut self, source: u64, contours: Vec<Contour>) -> &[Contour] {
        self.contours = contours;
        self.contours_source = Some(source);
        &self.contours
    }

    pub fn contours_dirty(&self) -> bool {
        self.contours_source.is_none()
    }
}
