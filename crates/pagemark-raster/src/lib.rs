//! Pagemark Raster Library
//!
//! CPU implementation of the Pagemark render surface, plus layer
//! compositing, page image export and watermark preparation.

mod error;
pub mod export;
mod fonts;
mod raster;
mod surface;
pub mod watermark;

pub use error::{RasterError, RasterResult};
pub use export::{ExportFormat, ExportedFile, export_pages, merge_layers};
pub use fonts::FontGlyphs;
pub use surface::{GlyphRasterizer, PixelSurface};
pub use watermark::{add_watermark, grayscale_png};
