use imageproc::region_labelling::Connectivity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

/// Pixel neighbourhood used when walking or labelling regions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Adjacency {
    /// Horizontal and vertical neighbours
    Four,
    /// Horizontal, vertical and diagonal neighbours
    Eight,
}

impl Adjacency {
    pub fn offsets(self) -> &'static [(i32, i32)] {
        const FOUR: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(i32, i32); 8] = [
            (-1, -1), (0, -1), (1, -1),
            (-1, 0), (1, 0),
            (-1, 1), (0, 1), (1, 1),
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }
}

impl From<Adjacency> for Connectivity {
    fn from(adjacency: Adjacency) -> Self {
        match adjacency {
            Adjacency::Four => Connectivity::Four,
            Adjacency::Eight => Connectivity::Eight,
        }
    }
}

/// Which side of the local mean counts as foreground when thresholding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Polarity {
    /// Stained cells darker than their surroundings
    #[default]
    Dark,
    Bright,
}

/// Kernel shape for morphological operations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StructuringElement {
    #[default]
    Ellipse,
    Rectangle,
    Cross,
}

/// Fixed parameters of the segmentation and editing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    /// Neighbourhood walked by region growing
    pub growth_adjacency: Adjacency,
    /// Neighbourhood used to split the mask into contours
    pub contour_adjacency: Adjacency,
    pub polarity: Polarity,
    /// Element used when a request does not name one
    pub structuring_element: StructuringElement,
    /// RGB colour of highlighted region borders
    pub overlay_color: [u8; 3],
    /// RGB colour of marked seed points
    pub seed_color: [u8; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            growth_adjacency: Adjacency::Four,
            contour_adjacency: Adjacency::Eight,
            polarity: Polarity::Dark,
            structuring_element: StructuringElement::Ellipse,
            overlay_color: [0, 255, 0],
            seed_color: [255, 0, 0],
        }
    }
}

/// Saving performed automatically when the operator leaves an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Also copy the source image to the origin destination
    pub save_original: bool,
    /// Format for saved originals, e.g. `.png`; the source's own when unset
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    pub autosave: AutosaveConfig,
}
