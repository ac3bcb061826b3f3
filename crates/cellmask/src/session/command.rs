use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::debug;

use super::Session;
use crate::{
    config::StructuringElement,
    error::Result,
    providers::{NavigationProvider, PersistenceProvider, ReferenceCounts},
    types::Coordinate,
    validation::RoutingDecision,
};

/// Operator requests a session can execute. Coordinates are display space;
/// numeric text fields are parsed leniently and skip the command when they
/// do not parse.
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionCommand {
    /// Grow regions from seed points
    GrowRegion {
        seeds: Vec<Coordinate>,
        /// Largest admitted difference from the running region mean
        threshold: String,
        /// Maximum number of adjacency levels explored per seed
        neighbours: String,
    },

    /// Replace the mask with an adaptive threshold
    ThresholdImage {
        /// Offset from the local mean
        threshold: String,
        /// Side of the local window, made odd
        neighbourhood: String,
    },

    /// Split touching blobs in the region under a point
    MorphologicalOpen {
        x: i32,
        y: i32,
        #[serde(default)]
        element: Option<StructuringElement>,
        #[schemars(range(min = 1, max = 99))]
        size: u32,
    },

    /// Union the regions under the given points
    MergeRegions { points: Vec<Coordinate> },

    /// Delete the region under a point
    DeleteRegion {
        x: i32,
        y: i32,
        /// Points whose surviving regions are reported back
        #[serde(default)]
        points: Vec<Coordinate>,
    },

    /// One centre per region
    FindCenters,

    /// Points that fall outside every region
    PointsNotCovered { points: Vec<Coordinate> },

    /// Number of regions in the mask
    CountContours,

    /// Routing the mask would get if saved now
    Validate,

    /// Save the mask where validation routes it
    SavePreviewMask {
        #[serde(default)]
        name: String,
        #[serde(default)]
        format: Option<String>,
    },

    /// Save the preview to an explicit location
    SavePreviewImage {
        #[serde(default)]
        name: String,
        #[serde(default)]
        format: Option<String>,
        #[serde(default)]
        destination: Option<PathBuf>,
    },

    /// Copy the source image to the origin destination
    SaveSourceImage {
        #[serde(default)]
        name: String,
    },

    /// Record the displayed size of the image
    SetDisplayScale {
        #[schemars(range(min = 0.01))]
        sf_x: f64,
        #[schemars(range(min = 0.01))]
        sf_y: f64,
    },

    NextImage,

    PreviousImage,

    /// Jump to an image by zero-based index
    SelectImage { index: String },
}

impl SessionCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SessionCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::GrowRegion { .. } => "Grow regions from seed points by intensity similarity",
            Self::ThresholdImage { .. } => "Rebuild the whole mask with a local mean threshold",
            Self::MorphologicalOpen { .. } => "Erode then dilate the region under a point to split touching cells",
            Self::MergeRegions { .. } => "Join the regions under the given points into one",
            Self::DeleteRegion { .. } => "Clear the region under a point and report the remaining listed regions",
            Self::FindCenters => "List one centre per region",
            Self::PointsNotCovered { .. } => "List the given points that are not inside a region",
            Self::CountContours => "Count the regions in the mask",
            Self::Validate => "Compare the region count with the reference count",
            Self::SavePreviewMask { .. } => "Save the mask to the primary or review destination",
            Self::SavePreviewImage { .. } => "Save the preview to an explicit destination",
            Self::SaveSourceImage { .. } => "Copy the source image to the origin destination",
            Self::SetDisplayScale { .. } => "Set the display to native scale factors",
            Self::NextImage => "Move to the next image",
            Self::PreviousImage => "Move to the previous image",
            Self::SelectImage { .. } => "Move to the image at an index",
        }
    }

    /// Whether the command may write to the preview mask.
    pub fn mutates_mask(&self) -> bool {
        matches!(
            self,
            Self::GrowRegion { .. }
                | Self::ThresholdImage { .. }
                | Self::MorphologicalOpen { .. }
                | Self::MergeRegions { .. }
                | Self::DeleteRegion { .. }
        )
    }

    /// Whether the command moves the session to another image.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::NextImage | Self::PreviousImage | Self::SelectImage { .. })
    }
}

/// Result of one executed command.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CommandOutput {
    /// Whether the command ran; `false` means it was skipped
    Applied(bool),
    /// Display-space coordinates
    Points(Vec<Coordinate>),
    Count(Option<usize>),
    Routing(Option<RoutingDecision>),
}

impl<N, R, P> Session<N, R, P>
where
    N: NavigationProvider,
    R: ReferenceCounts,
    P: PersistenceProvider,
{
    pub fn execute(&mut self, command: SessionCommand) -> Result<CommandOutput> {
        debug!("Executing {}", command);
        let output = match command {
            SessionCommand::GrowRegion { seeds, threshold, neighbours } => {
                CommandOutput::Applied(self.grow_region(&seeds, &threshold, &neighbours)?)
            }
            SessionCommand::ThresholdImage { threshold, neighbourhood } => {
                CommandOutput::Applied(self.threshold_image(&threshold, &neighbourhood)?)
            }
            SessionCommand::MorphologicalOpen { x, y, element, size } => {
                CommandOutput::Points(self.morphological_open(x, y, element, size)?)
            }
            SessionCommand::MergeRegions { points } => {
                CommandOutput::Applied(self.merge_regions(&points)?)
            }
            SessionCommand::DeleteRegion { x, y, points } => {
                CommandOutput::Points(self.delete_region(x, y, &points)?)
            }
            SessionCommand::FindCenters => CommandOutput::Points(self.find_centers()?),
            SessionCommand::PointsNotCovered { points } => {
                CommandOutput::Points(self.points_not_covered(&points)?)
            }
            SessionCommand::CountContours => CommandOutput::Count(self.contour_count()?),
            SessionCommand::Validate => CommandOutput::Routing(self.validate()?),
            SessionCommand::SavePreviewMask { name, format } => {
                CommandOutput::Routing(self.save_preview_mask(&name, format.as_deref())?)
            }
            SessionCommand::SavePreviewImage { name, format, destination } => {
                CommandOutput::Applied(self.save_preview_image(&name, format.as_deref(), destination)?)
            }
            SessionCommand::SaveSourceImage { name } => {
                CommandOutput::Applied(self.save_source_image(&name)?)
            }
            SessionCommand::SetDisplayScale { sf_x, sf_y } => {
                CommandOutput::Applied(self.set_display_scale(sf_x, sf_y)?)
            }
            SessionCommand::NextImage => CommandOutput::Applied(self.next_image()?),
            SessionCommand::PreviousImage => CommandOutput::Applied(self.previous_image()?),
            SessionCommand::SelectImage { index } => CommandOutput::Applied(self.select_image(&index)?),
        };
        Ok(output)
    }
}
