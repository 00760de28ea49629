use pagemark_core::organise::OrganiseError;
use thiserror::Error;

/// Errors from raster operations.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PNG encoding failed: {0}")]
    PngEncoding(#[from] png::EncodingError),
    #[error("Layer is {found_w}x{found_h} but page is {expected_w}x{expected_h}")]
    LayerSize {
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },
    #[error("No pages to export")]
    NothingToExport,
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Organise(#[from] OrganiseError),
}

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;
