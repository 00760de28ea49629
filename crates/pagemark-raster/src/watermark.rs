//! Grayscale watermark preparation.

use crate::error::RasterResult;
use crate::export::encode_png;
use pagemark_core::organise::DocumentModel;
use pagemark_core::watermark::{WatermarkOptions, apply_watermark};

/// Decode any supported image, convert it to grayscale and re-encode as PNG.
///
/// Luma is `0.299 r + 0.587 g + 0.114 b`; alpha is kept.
pub fn grayscale_png(bytes: &[u8]) -> RasterResult<Vec<u8>> {
    let mut image = image::load_from_memory(bytes)?.to_rgba8();
    for px in image.pixels_mut() {
        let [r, g, b, a] = px.0;
        let luma = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)).round() as u8;
        px.0 = [luma, luma, luma, a];
    }
    encode_png(&image)
}

/// Stamp a grayscale version of `image` onto every page of `document`.
pub fn add_watermark<D: DocumentModel>(
    document: &[u8],
    image: &[u8],
    options: &WatermarkOptions,
) -> RasterResult<Vec<u8>> {
    let png = grayscale_png(image)?;
    Ok(apply_watermark::<D>(document, &png, options)?)
}
