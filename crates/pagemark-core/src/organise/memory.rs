//! In-memory document backend.

use super::{DocumentModel, EmbeddedImage};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Errors from the in-memory backend.
#[derive(Debug, Error)]
pub enum MemoryDocumentError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid PNG: {0}")]
    Png(#[from] png::DecodingError),
}

/// An image drawn onto a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    /// Index into the document's image table.
    pub image: usize,
    pub rect: Rect,
    pub opacity: f64,
}

/// A page of a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    /// Free-form label, handy for telling pages apart.
    pub label: String,
    pub size: Size,
    #[serde(default)]
    pub images: Vec<PlacedImage>,
}

impl MemoryPage {
    pub fn new(label: impl Into<String>, size: Size) -> Self {
        Self {
            label: label.into(),
            size,
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ImageResource {
    width: u32,
    height: u32,
}

/// Document model that keeps pages in memory and saves them as JSON.
///
/// Useful for tests and tooling; real PDF backends implement
/// [`DocumentModel`] on top of a PDF library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    #[serde(default)]
    images: Vec<ImageResource>,
}

impl MemoryDocument {
    pub fn with_pages(pages: impl IntoIterator<Item = MemoryPage>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            images: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[MemoryPage] {
        &self.pages
    }
}

impl DocumentModel for MemoryDocument {
    type Page = MemoryPage;
    type Error = MemoryDocumentError;

    fn create() -> Self {
        Self::default()
    }

    fn load(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn save(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(serde_json::to_vec(self)?)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Option<Size> {
        self.pages.get(index).map(|p| p.size)
    }

    fn copy_pages(&mut self, source: &Self, indices: &[usize]) -> Vec<MemoryPage> {
        let mut copied = Vec::with_capacity(indices.len());
        for &index in indices {
            let Some(page) = source.pages.get(index) else {
                continue;
            };
            let mut page = page.clone();
            // Image ids are per document; bring the resources along.
            for placed in &mut page.images {
                if let Some(resource) = source.images.get(placed.image) {
                    self.images.push(*resource);
                    placed.image = self.images.len() - 1;
                }
            }
            copied.push(page);
        }
        copied
    }

    fn insert_page(&mut self, index: usize, page: MemoryPage) {
        let index = index.min(self.pages.len());
        self.pages.insert(index, page);
    }

    fn insert_blank_page(&mut self, index: usize, size: Size) {
        self.insert_page(index, MemoryPage::new("", size));
    }

    fn remove_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.pages.remove(index);
        }
    }

    fn embed_png(&mut self, png: &[u8]) -> Result<EmbeddedImage, Self::Error> {
        let reader = png::Decoder::new(Cursor::new(png)).read_info()?;
        let info = reader.info();
        let resource = ImageResource {
            width: info.width,
            height: info.height,
        };
        self.images.push(resource);
        Ok(EmbeddedImage {
            id: self.images.len() - 1,
            width: resource.width,
            height: resource.height,
        })
    }

    fn draw_image(&mut self, page: usize, image: &EmbeddedImage, rect: Rect, opacity: f64) {
        if let Some(page) = self.pages.get_mut(page) {
            page.images.push(PlacedImage {
                image: image.id,
                rect,
                opacity,
            });
        }
    }
}
