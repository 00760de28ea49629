//! Image watermarks stamped onto every page.

use crate::organise::{DocumentModel, OrganiseError, OrganiseResult};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Watermark configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkOptions {
    /// Opacity of the stamped image.
    pub opacity: f64,
    /// Watermark width as a fraction of the page width.
    pub scale: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            opacity: 0.2,
            scale: 0.6,
        }
    }
}

/// Where a watermark lands on a page: `scale` of the page width, aspect
/// ratio preserved, centred.
pub fn placement(page: Size, image: Size, options: &WatermarkOptions) -> Rect {
    let width = page.width * options.scale;
    let factor = if image.width > 0.0 { width / image.width } else { 0.0 };
    let size = Size::new(image.width * factor, image.height * factor);
    let x = (page.width - size.width) / 2.0;
    let y = (page.height - size.height) / 2.0;
    Rect::from_origin_size((x, y), size)
}

/// Embed `png` once and draw it centred on every page of the document.
pub fn apply_watermark<D: DocumentModel>(
    document: &[u8],
    png: &[u8],
    options: &WatermarkOptions,
) -> OrganiseResult<Vec<u8>> {
    let mut doc = D::load(document).map_err(OrganiseError::backend)?;
    let image = doc
        .embed_png(png)
        .map_err(OrganiseError::backend)?;
    let image_size = Size::new(f64::from(image.width), f64::from(image.height));
    let opacity = options.opacity.clamp(0.0, 1.0);

    for page in 0..doc.page_count() {
        let Some(page_size) = doc.page_size(page) else {
            continue;
        };
        let rect = placement(page_size, image_size, options);
        doc.draw_image(page, &image, rect, opacity);
    }
    log::debug!("watermark: stamped {} pages", doc.page_count());
    doc.save().map_err(OrganiseError::backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organise::{MemoryDocument, MemoryPage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&vec![255u8; (width * height * 4) as usize])
                .unwrap();
        }
        out
    }

    #[test]
    fn test_placement_centered() {
        let rect = placement(
            Size::new(600.0, 800.0),
            Size::new(200.0, 100.0),
            &WatermarkOptions::default(),
        );
        assert!((rect.width() - 360.0).abs() < 1e-9);
        assert!((rect.height() - 180.0).abs() < 1e-9);
        assert!((rect.x0 - 120.0).abs() < 1e-9);
        assert!((rect.y0 - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_placement_degenerate_image() {
        let rect = placement(Size::new(100.0, 100.0), Size::ZERO, &WatermarkOptions::default());
        assert!(rect.is_zero_area());
    }

    #[test]
    fn test_apply_to_every_page() {
        let doc = MemoryDocument::with_pages([
            MemoryPage::new("1", Size::new(100.0, 100.0)),
            MemoryPage::new("2", Size::new(200.0, 100.0)),
        ]);
        let bytes = doc.save().unwrap();
        let out = apply_watermark::<MemoryDocument>(&bytes, &png_bytes(10, 5), &WatermarkOptions::default()).unwrap();
        let stamped = MemoryDocument::load(&out).unwrap();

        for page in stamped.pages() {
            assert_eq!(page.images.len(), 1);
            let placed = &page.images[0];
            assert!((placed.opacity - 0.2).abs() < 1e-9);
            assert!((placed.rect.width() - page.size.width * 0.6).abs() < 1e-9);
        }
    }

    #[test]
    fn test_apply_rejects_bad_image() {
        let bytes = MemoryDocument::with_pages([MemoryPage::new("1", Size::new(10.0, 10.0))])
            .save()
            .unwrap();
        assert!(apply_watermark::<MemoryDocument>(&bytes, b"nope", &WatermarkOptions::default()).is_err());
    }
}
