use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellMaskError {
    #[error("Mask is {mask_width}x{mask_height} but raster is {raster_width}x{raster_height}")]
    DimensionMismatch {
        raster_width: u32,
        raster_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("Raster buffer holds {actual} bytes, expected {expected}")]
    RasterSize { expected: usize, actual: usize },

    #[error("Invalid display scale factors ({sf_x}, {sf_y}): both must be positive and finite")]
    InvalidScaleFactor { sf_x: f64, sf_y: f64 },

    #[error("No image loaded")]
    NoImageLoaded,

    #[error("Image codec error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CellMaskError>;
