//! # Cell Mask Curation Engine
//!
//! Interactive segmentation and curation of binary cell masks over
//! microscopy tiles. An operator seeds regions, splits, merges and deletes
//! them, and the engine checks the resulting region count against a
//! reference count before deciding where the mask is saved.
//!
//! ## Core Features
//!
//! - **Region growing**: breadth-first growth from seeds by intensity similarity
//! - **Adaptive thresholding**: full mask rebuild from a local mean threshold
//! - **Region editing**: local morphological open, merge, delete, centre finding
//! - **Contour cache**: connected components recomputed only after a mask write
//! - **Validation routing**: matched masks to the primary destination, the rest to review
//! - **Display mapping**: operator input in display space, engine work in native pixels
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cellmask::{
//!     Coordinate, InMemoryNavigator, NoReferenceCounts, RecordingPersistence,
//!     Session, SessionConfig,
//! };
//!
//! let mut session = Session::new(
//!     InMemoryNavigator::default(),
//!     NoReferenceCounts,
//!     RecordingPersistence::default(),
//!     SessionConfig::default(),
//! );
//! session.open_current()?;
//! session.grow_region(&[Coordinate::new(12, 40)], "15", "60")?;
//! let decision = session.save_preview_mask("", None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Lower-level use
//!
//! ```rust,no_run
//! use cellmask::{ContourAnalyzer, Coordinate, Image, Raster, SegmentationEngine};
//!
//! let raster = Raster::from_bgr(image::open("tile.png")?.to_rgb8());
//! let mut preview = Image::new("tile.png", ".png", raster).derive_preview();
//! SegmentationEngine::default().adaptive_threshold(&mut preview, 2, 11)?;
//! let count = ContourAnalyzer::default().count(&mut preview)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod raster;
pub mod model;
pub mod config;
pub mod traits;
pub mod algorithms;

// Engine components
pub mod mapping;
pub mod parse;
pub mod segmentation;
pub mod editor;
pub mod contours;
pub mod validation;
pub mod overlay;

// Session and collaborators
pub mod providers;
pub mod session;

// Re-exports for convenience
pub use error::{CellMaskError, Result};
pub use types::{Contour, Coordinate, PixelBounds, ScaleFactors};
pub use raster::{ChannelOrder, Mask, Raster};
pub use model::Image;
pub use config::{Adjacency, AutosaveConfig, EngineConfig, Polarity, SessionConfig, StructuringElement};
pub use traits::*;
pub use mapping::CoordinateMapper;
pub use segmentation::SegmentationEngine;
pub use editor::MaskEditor;
pub use contours::ContourAnalyzer;
pub use validation::{Destination, Outcome, RoutingDecision, ValidationRouter};
pub use providers::*;
pub use session::{CommandOutput, Session, SessionCommand};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Light tile with three dark cells, two of them touching through a
    /// one pixel neck.
    fn create_test_image() -> Image {
        let pixels = RgbImage::from_fn(80, 60, |x, y| {
            let a = (10..20).contains(&x) && (10..20).contains(&y);
            let neck = (20..24).contains(&x) && y == 15;
            let b = (24..34).contains(&x) && (10..20).contains(&y);
            let c = (50..60).contains(&x) && (35..45).contains(&y);
            if a || neck || b || c { Rgb([40, 35, 45]) } else { Rgb([210, 205, 215]) }
        });
        Image::new("tile_07.png", ".png", Raster::from_bgr(pixels))
    }

    #[test]
    fn test_curation_round() {
        let mut references = StaticReferenceCounts::new();
        references.insert("tile_07", 3);
        let mut session = Session::new(
            InMemoryNavigator::new(vec![create_test_image()]),
            references,
            RecordingPersistence::default(),
            SessionConfig::default(),
        );
        assert!(session.open_current().expect("Open"));

        // Threshold finds two blobs: the joined pair and the lone cell
        assert!(session.threshold_image("10", "41").expect("Threshold"));
        assert_eq!(session.contour_count().expect("Count"), Some(2));
        let decision = session.validate().expect("Validate").expect("Image loaded");
        assert_eq!(decision.outcome, Outcome::Mismatched);
        assert_eq!(decision.destination, Destination::Secondary);

        // Opening the pair cuts the neck
        let pieces = session
            .morphological_open(15, 15, Some(StructuringElement::Rectangle), 3)
            .expect("Open");
        assert_eq!(pieces.len(), 2);
        assert_eq!(session.contour_count().expect("Count"), Some(3));

        let decision = session.save_preview_mask("", None).expect("Save").expect("Image loaded");
        assert_eq!(decision.outcome, Outcome::Matched);
        let saved = &session.persistence().saved;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "tile_07_mask.png");
        assert_eq!(saved[0].destination, Destination::Primary);
    }

    #[test]
    fn test_grown_region_never_shrinks_under_edits_elsewhere() {
        let mut preview = create_test_image().derive_preview();
        let engine = SegmentationEngine::default();
        let editor = MaskEditor::default();

        engine
            .grow_region(&mut preview, &[Coordinate::new(55, 40)], 20, 100)
            .expect("Grow");
        let lone = preview.mask().covered_count();
        assert_eq!(lone, 100);

        engine
            .grow_region(&mut preview, &[Coordinate::new(15, 15)], 20, 100)
            .expect("Grow");
        let remaining = editor
            .delete_region(&mut preview, 15, 15, &[Coordinate::new(55, 40)])
            .expect("Delete");

        assert_eq!(remaining, vec![Coordinate::new(54, 39)]);
        assert_eq!(preview.mask().covered_count(), lone);
    }
}
