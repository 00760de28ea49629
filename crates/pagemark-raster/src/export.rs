//! Page image export.

use crate::error::{RasterError, RasterResult};
use crate::raster;
use image::RgbaImage;
use image::codecs::jpeg::JpegEncoder;
use peniko::Compose;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// JPEG quality used for page export.
pub const JPEG_QUALITY: u8 = 90;

/// Image format for page export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Png,
    #[default]
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    /// Encode an image in this format.
    pub fn encode(&self, image: &RgbaImage) -> RasterResult<Vec<u8>> {
        match self {
            ExportFormat::Png => encode_png(image),
            ExportFormat::Jpeg => encode_jpeg(image, JPEG_QUALITY),
        }
    }
}

/// A named file produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Composite an annotation layer over a page raster.
pub fn merge_layers(base: &RgbaImage, overlay: &RgbaImage) -> RasterResult<RgbaImage> {
    if base.dimensions() != overlay.dimensions() {
        return Err(RasterError::LayerSize {
            expected_w: base.width(),
            expected_h: base.height(),
            found_w: overlay.width(),
            found_h: overlay.height(),
        });
    }
    let mut merged = base.clone();
    for (dst, src) in merged.pixels_mut().zip(overlay.pixels()) {
        let [r, g, b, a] = src.0;
        if a == 0 {
            continue;
        }
        raster::composite(&mut dst.0, [r, g, b], f32::from(a) / 255.0, Compose::SrcOver);
    }
    Ok(merged)
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
    }
    Ok(png_data)
}

/// Encode to JPEG. Alpha is discarded.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> RasterResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok(out)
}

/// Encode every page into one downloadable file.
///
/// A single page is returned as `{base}.{ext}`. More pages are packed into
/// a deflated archive named `{base}_{ext}.zip` whose entries are named
/// `{base}_page_{n}.{ext}`, counting from 1.
pub fn export_pages(pages: &[RgbaImage], format: ExportFormat, base_name: &str) -> RasterResult<ExportedFile> {
    let ext = format.extension();
    match pages {
        [] => Err(RasterError::NothingToExport),
        [page] => {
            let name = format!("{base_name}.{ext}");
            let bytes = format.encode(page)?;
            log::debug!("export: encoded {name} ({} bytes)", bytes.len());
            Ok(ExportedFile { name, bytes })
        }
        _ => {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
            for (i, page) in pages.iter().enumerate() {
                let entry = format!("{base_name}_page_{}.{ext}", i + 1);
                let bytes = format.encode(page)?;
                log::debug!("export: adding {entry} ({} bytes)", bytes.len());
                archive.start_file(entry, options)?;
                archive.write_all(&bytes)?;
            }
            let bytes = archive.finish()?.into_inner();
            let name = format!("{base_name}_{ext}.zip");
            log::info!("export: packed {} pages into {name}", pages.len());
            Ok(ExportedFile { name, bytes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(px))
    }

    #[test]
    fn test_merge_overlay_on_white() {
        let base = solid(2, 2, [255, 255, 255, 255]);
        let mut overlay = solid(2, 2, [0, 0, 0, 0]);
        overlay.put_pixel(1, 1, Rgba([255, 0, 0, 102]));

        let merged = merge_layers(&base, &overlay).unwrap();
        assert_eq!(merged.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(merged.get_pixel(1, 1).0, [255, 153, 153, 255]);
    }

    #[test]
    fn test_merge_size_mismatch() {
        let err = merge_layers(&solid(2, 2, [0; 4]), &solid(3, 2, [0; 4])).unwrap_err();
        assert!(matches!(err, RasterError::LayerSize { found_w: 3, .. }));
    }

    #[test]
    fn test_png_roundtrip() {
        let page = solid(3, 2, [10, 20, 30, 40]);
        let bytes = encode_png(&page).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, page);
    }

    #[test]
    fn test_jpeg_is_opaque() {
        let bytes = encode_jpeg(&solid(8, 8, [200, 100, 50, 128]), JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_single_page_is_not_archived() {
        let file = export_pages(&[solid(1, 1, [0; 4])], ExportFormat::Png, "doc").unwrap();
        assert_eq!(file.name, "doc.png");
        assert!(image::load_from_memory(&file.bytes).is_ok());
    }

    #[test]
    fn test_multi_page_archive() {
        let pages = vec![solid(2, 2, [255, 0, 0, 255]), solid(3, 1, [0, 0, 255, 255])];
        let file = export_pages(&pages, ExportFormat::Jpeg, "doc").unwrap();
        assert_eq!(file.name, "doc_jpg.zip");

        let mut archive = zip::ZipArchive::new(Cursor::new(file.bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let names: Vec<_> = archive.file_names().map(str::to_owned).collect();
        assert!(names.contains(&"doc_page_1.jpg".to_owned()));
        assert!(names.contains(&"doc_page_2.jpg".to_owned()));

        let mut second = Vec::new();
        std::io::Read::read_to_end(&mut archive.by_name("doc_page_2.jpg").unwrap(), &mut second).unwrap();
        let decoded = image::load_from_memory(&second).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 1));
    }

    #[test]
    fn test_empty_export_rejected() {
        assert!(matches!(
            export_pages(&[], ExportFormat::Png, "doc"),
            Err(RasterError::NothingToExport)
        ));
    }
}
