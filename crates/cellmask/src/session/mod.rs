//! Editing session over one navigator.
//!
//! The session owns the source image and its preview, accepts operator input
//! in display space and maps it to native space before it reaches the engine.
//! Every coordinate it hands back is in display space again. Absent state
//! (no image loaded, unparseable numbers) yields a neutral result rather than
//! an error.

mod command;

pub use command::{CommandOutput, SessionCommand};

use std::path::PathBuf;

use image::RgbImage;
use tracing::{debug, info};

use crate::{
    config::{SessionConfig, StructuringElement},
    contours::ContourAnalyzer,
    editor::MaskEditor,
    error::Result,
    mapping::CoordinateMapper,
    model::Image,
    overlay::{highlight_borders, mark_seeds},
    parse::{parse_i32, parse_index, parse_u32},
    providers::{NavigationProvider, PersistenceProvider, ReferenceCounts},
    segmentation::SegmentationEngine,
    types::{Contour, Coordinate, ScaleFactors},
    validation::{Destination, RoutingDecision, ValidationRouter},
};

pub struct Session<N, R, P> {
    navigator: N,
    references: R,
    persistence: P,
    config: SessionConfig,
    engine: SegmentationEngine,
    editor: MaskEditor,
    analyzer: ContourAnalyzer,
    source: Option<Image>,
    preview: Option<Image>,
}

impl<N, R, P> Session<N, R, P>
where
    N: NavigationProvider,
    R: ReferenceCounts,
    P: PersistenceProvider,
{
    pub fn new(navigator: N, references: R, persistence: P, config: SessionConfig) -> Self {
        let adjacency = config.engine.contour_adjacency;
        Self {
            navigator,
            references,
            persistence,
            engine: SegmentationEngine::new(config.engine.clone()),
            editor: MaskEditor::new(config.engine.clone()),
            analyzer: ContourAnalyzer::new(adjacency),
            config,
            source: None,
            preview: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Image> {
        self.source.as_ref()
    }

    pub fn preview(&self) -> Option<&Image> {
        self.preview.as_ref()
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn references(&self) -> &R {
        &self.references
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn image_index(&self) -> usize {
        self.navigator.current_index()
    }

    pub fn image_count(&self) -> usize {
        self.navigator.image_count()
    }

    // Navigation

    /// Loads the navigator's current image without saving anything.
    pub fn open_current(&mut self) -> Result<bool> {
        let image = self.navigator.current_image()?;
        Ok(self.install(image))
    }

    pub fn next_image(&mut self) -> Result<bool> {
        self.autosave()?;
        let image = self.navigator.next_image()?;
        Ok(self.install(image))
    }

    pub fn previous_image(&mut self) -> Result<bool> {
        self.autosave()?;
        let image = self.navigator.previous_image()?;
        Ok(self.install(image))
    }

    /// Jumps to the image at `index`. Unparseable or out of range indices
    /// leave the session where it is.
    pub fn select_image(&mut self, index: &str) -> Result<bool> {
        let Some(index) = parse_index(index) else {
            return Ok(false);
        };
        if index >= self.navigator.image_count() {
            debug!("Image index {} out of range ({} images)", index, self.navigator.image_count());
            return Ok(false);
        }

        self.autosave()?;
        let image = self.navigator.image_at(index)?;
        Ok(self.install(image))
    }

    fn install(&mut self, image: Option<Image>) -> bool {
        match image {
            Some(source) => {
                info!(
                    "Opened '{}' ({}/{})",
                    source.name(),
                    self.navigator.current_index() + 1,
                    self.navigator.image_count()
                );
                self.preview = Some(source.derive_preview());
                self.source = Some(source);
                true
            }
            None => {
                self.source = None;
                self.preview = None;
                false
            }
        }
    }

    fn autosave(&mut self) -> Result<()> {
        if !self.config.autosave.enabled || self.preview.is_none() {
            return Ok(());
        }
        if self.config.autosave.save_original {
            self.save_source_image("")?;
        }
        self.save_preview_mask("", None)?;
        Ok(())
    }

    // Display scale

    fn scale(&self) -> ScaleFactors {
        self.source.as_ref().map_or(ScaleFactors::NATIVE, Image::scale)
    }

    /// Records the ratio between the displayed and native size of the
    /// current image.
    pub fn set_display_scale(&mut self, sf_x: f64, sf_y: f64) -> Result<bool> {
        let (Some(source), Some(preview)) = (self.source.as_mut(), self.preview.as_mut()) else {
            return Ok(false);
        };
        source.set_display_scale(sf_x, sf_y)?;
        preview.set_display_scale(sf_x, sf_y)?;
        debug!("Display scale set to {}x{}", sf_x, sf_y);
        Ok(true)
    }

    // Segmentation

    /// Grows regions from display-space seeds. `threshold` and `neighbours`
    /// are operator text; the call is skipped when either does not parse.
    pub fn grow_region(&mut self, seeds: &[Coordinate], threshold: &str, neighbours: &str) -> Result<bool> {
        let (Some(threshold), Some(depth)) = (parse_u32(threshold), parse_u32(neighbours)) else {
            debug!("Region growing skipped: unparseable threshold or depth");
            return Ok(false);
        };
        let scale = self.scale();
        let Some(preview) = self.preview.as_mut() else {
            return Ok(false);
        };

        let seeds = CoordinateMapper::natives_from(scale, seeds);
        self.engine.grow_region(preview, &seeds, threshold, depth)?;
        Ok(true)
    }

    /// Rebuilds the preview mask with an adaptive threshold.
    pub fn threshold_image(&mut self, threshold: &str, neighbourhood: &str) -> Result<bool> {
        let (Some(threshold), Some(neighbourhood)) = (parse_i32(threshold), parse_u32(neighbourhood)) else {
            debug!("Threshold skipped: unparseable offset or neighbourhood");
            return Ok(false);
        };
        let Some(preview) = self.preview.as_mut() else {
            return Ok(false);
        };

        self.engine.adaptive_threshold(preview, threshold, neighbourhood)?;
        Ok(true)
    }

    // Editing

    pub fn morphological_open(
        &mut self,
        x: i32,
        y: i32,
        element: Option<StructuringElement>,
        size: u32,
    ) -> Result<Vec<Coordinate>> {
        let scale = self.scale();
        let Some(preview) = self.preview.as_mut() else {
            return Ok(Vec::new());
        };

        let seed = CoordinateMapper::native_from(scale, Coordinate::new(x, y));
        let centers = self.editor.morphological_open(preview, seed.x, seed.y, element, size)?;
        Ok(CoordinateMapper::displays_from(scale, &centers))
    }

    pub fn merge_regions(&mut self, points: &[Coordinate]) -> Result<bool> {
        let scale = self.scale();
        let Some(preview) = self.preview.as_mut() else {
            return Ok(false);
        };

        let points = CoordinateMapper::natives_from(scale, points);
        self.editor.merge_regions(preview, &points)
    }

    pub fn delete_region(&mut self, x: i32, y: i32, points: &[Coordinate]) -> Result<Vec<Coordinate>> {
        let scale = self.scale();
        let Some(preview) = self.preview.as_mut() else {
            return Ok(Vec::new());
        };

        let seed = CoordinateMapper::native_from(scale, Coordinate::new(x, y));
        let points = CoordinateMapper::natives_from(scale, points);
        let remaining = self.editor.delete_region(preview, seed.x, seed.y, &points)?;
        Ok(CoordinateMapper::displays_from(scale, &remaining))
    }

    pub fn find_centers(&self) -> Result<Vec<Coordinate>> {
        let Some(preview) = self.preview.as_ref() else {
            return Ok(Vec::new());
        };
        let centers = self.editor.find_centers(preview)?;
        Ok(CoordinateMapper::displays_from(self.scale(), &centers))
    }

    /// The operator's points that are not inside any region, as given.
    pub fn points_not_covered(&self, points: &[Coordinate]) -> Result<Vec<Coordinate>> {
        let Some(preview) = self.preview.as_ref() else {
            return Ok(Vec::new());
        };

        let natives = CoordinateMapper::natives_from(self.scale(), points);
        let missing = self.editor.points_not_covered(preview, &natives)?;
        Ok(points
            .iter()
            .zip(&natives)
            .filter(|(_, native)| missing.contains(native))
            .map(|(display, _)| *display)
            .collect())
    }

    // Analysis

    pub fn contour_count(&mut self) -> Result<Option<usize>> {
        match self.preview.as_mut() {
            Some(preview) => Ok(Some(self.analyzer.count(preview)?)),
            None => Ok(None),
        }
    }

    /// Regions of the preview mask in native pixels.
    pub fn native_contours(&mut self) -> Result<Vec<Contour>> {
        match self.preview.as_mut() {
            Some(preview) => Ok(self.analyzer.extract_contours(preview)?.to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Reference count for the current source, looked up by its stem.
    pub fn reference_count(&self) -> Option<u32> {
        self.source
            .as_ref()
            .and_then(|source| self.references.lookup_reference_count(source.stem()))
    }

    /// Routing the preview would get if it were saved now.
    pub fn validate(&mut self) -> Result<Option<RoutingDecision>> {
        let reference = self.reference_count();
        match self.preview.as_mut() {
            Some(preview) => Ok(Some(ValidationRouter::new(&self.analyzer).route(preview, reference)?)),
            None => Ok(None),
        }
    }

    // Saving

    /// Saves the preview mask where validation routes it. An empty `name`
    /// saves under the preview's own name.
    pub fn save_preview_mask(&mut self, name: &str, format: Option<&str>) -> Result<Option<RoutingDecision>> {
        let reference = self.reference_count();
        let Some(preview) = self.preview.as_mut() else {
            return Ok(None);
        };

        let decision = ValidationRouter::new(&self.analyzer).route(preview, reference)?;
        let name = if name.is_empty() { preview.name() } else { name };
        let format = format.unwrap_or(preview.format());
        self.persistence.save(preview, name, format, &decision.destination)?;

        info!("Saved mask '{}' to {:?}", name, decision.destination);
        Ok(Some(decision))
    }

    /// Saves the preview without validation, to `destination` when a name is
    /// given and to the primary destination otherwise.
    pub fn save_preview_image(
        &mut self,
        name: &str,
        format: Option<&str>,
        destination: Option<PathBuf>,
    ) -> Result<bool> {
        let Some(preview) = self.preview.as_ref() else {
            return Ok(false);
        };

        let (name, destination) = if name.is_empty() {
            (preview.name(), Destination::Primary)
        } else {
            (name, destination.map_or(Destination::Primary, Destination::Other))
        };
        let format = format.unwrap_or(preview.format());
        self.persistence.save(preview, name, format, &destination)?;

        info!("Saved preview '{}' to {:?}", name, destination);
        Ok(true)
    }

    /// Copies the source image to the origin destination in the configured
    /// format.
    pub fn save_source_image(&mut self, name: &str) -> Result<bool> {
        let Some(source) = self.source.as_ref() else {
            return Ok(false);
        };

        let name = if name.is_empty() { source.name() } else { name };
        let format = self.config.autosave.format.as_deref().unwrap_or(source.format());
        self.persistence.save(source, name, format, &Destination::Origin)?;

        info!("Saved source '{}'", name);
        Ok(true)
    }

    // Presentation

    /// Source raster with the preview's region borders and the given
    /// display-space seeds painted on it.
    pub fn overlay(&self, seeds: &[Coordinate]) -> Result<Option<RgbImage>> {
        let (Some(source), Some(preview)) = (self.source.as_ref(), self.preview.as_ref()) else {
            return Ok(None);
        };

        let engine = &self.config.engine;
        let mut canvas = highlight_borders(source.raster(), preview.mask(), engine.overlay_color)?;
        mark_seeds(
            &mut canvas,
            &CoordinateMapper::natives_from(self.scale(), seeds),
            engine.seed_color,
        );
        Ok(Some(canvas))
    }
}
