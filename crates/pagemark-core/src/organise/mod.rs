//! Page-level document organisation: merge, split, insert, delete and
//! blank-page insertion.
//!
//! Documents are handled as whole byte buffers through a [`DocumentModel`]
//! backend; nothing here looks inside a document beyond its page count and
//! page sizes.

mod memory;

pub use memory::{MemoryDocument, MemoryDocumentError, MemoryPage, PlacedImage};

use kurbo::{Rect, Size};
use thiserror::Error;

/// Boxed backend error.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Organisation errors. Messages are phrased for the end user.
#[derive(Debug, Error)]
pub enum OrganiseError {
    #[error("No documents provided for merging.")]
    NothingToMerge,
    #[error("Invalid page number. Please enter a number between 1 and {max}.")]
    InvalidPage { max: usize },
    #[error("Invalid split point. Please choose a page between 1 and {max}.")]
    InvalidSplit { max: usize },
    #[error("Cannot delete the only page in the document.")]
    LastPage,
    #[error("Document has no pages.")]
    EmptyDocument,
    #[error("Document backend error: {0}")]
    Backend(#[source] BackendError),
}

impl OrganiseError {
    pub(crate) fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        OrganiseError::Backend(Box::new(error))
    }
}

/// Result type for organisation operations.
pub type OrganiseResult<T> = Result<T, OrganiseError>;

/// An embedded image resource and its intrinsic size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedImage {
    pub id: usize,
    pub width: u32,
    pub height: u32,
}

/// Contract of a page-oriented document library.
pub trait DocumentModel: Sized {
    /// A page copied out of a document, insertable into another one.
    type Page;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create an empty document.
    fn create() -> Self;

    /// Parse a document from bytes.
    fn load(bytes: &[u8]) -> Result<Self, Self::Error>;

    /// Serialise the document to bytes.
    fn save(&self) -> Result<Vec<u8>, Self::Error>;

    fn page_count(&self) -> usize;

    /// Size of a page in document units, `None` if out of range.
    fn page_size(&self, index: usize) -> Option<Size>;

    /// Copy the given pages out of `source` for insertion into `self`.
    fn copy_pages(&mut self, source: &Self, indices: &[usize]) -> Vec<Self::Page>;

    /// Insert a page at `index` (`index == page_count()` appends).
    fn insert_page(&mut self, index: usize, page: Self::Page);

    /// Insert an empty page of the given size.
    fn insert_blank_page(&mut self, index: usize, size: Size);

    fn remove_page(&mut self, index: usize);

    /// Embed a PNG image once for drawing on any page.
    fn embed_png(&mut self, png: &[u8]) -> Result<EmbeddedImage, Self::Error>;

    /// Draw an embedded image onto a page.
    fn draw_image(&mut self, page: usize, image: &EmbeddedImage, rect: Rect, opacity: f64);

    /// Append a page at the end.
    fn add_page(&mut self, page: Self::Page) {
        let count = self.page_count();
        self.insert_page(count, page);
    }
}

/// Concatenate the pages of every document, in order.
pub fn merge_documents<D: DocumentModel>(documents: &[&[u8]]) -> OrganiseResult<Vec<u8>> {
    if documents.is_empty() {
        log::warn!("organise: no documents provided for merging");
        return Err(OrganiseError::NothingToMerge);
    }
    let mut merged = D::create();
    for bytes in documents {
        let source = D::load(bytes).map_err(OrganiseError::backend)?;
        let indices: Vec<usize> = (0..source.page_count()).collect();
        for page in merged.copy_pages(&source, &indices) {
            merged.add_page(page);
        }
    }
    log::debug!("organise: merged {} documents into {} pages", documents.len(), merged.page_count());
    merged.save().map_err(OrganiseError::backend)
}

/// Insert a blank page at `index` (0-based, `index == page_count` appends).
///
/// The new page takes the size of the first page.
pub fn add_blank_page<D: DocumentModel>(bytes: &[u8], index: usize) -> OrganiseResult<Vec<u8>> {
    let mut doc = D::load(bytes).map_err(OrganiseError::backend)?;
    let count = doc.page_count();
    if index > count {
        log::warn!("organise: blank page index {index} out of range for {count} pages");
        return Err(OrganiseError::InvalidPage { max: count + 1 });
    }
    let size = doc.page_size(0).ok_or(OrganiseError::EmptyDocument)?;
    doc.insert_blank_page(index, size);
    doc.save().map_err(OrganiseError::backend)
}

/// Remove the page at `index`. The last remaining page cannot be removed.
pub fn delete_page<D: DocumentModel>(bytes: &[u8], index: usize) -> OrganiseResult<Vec<u8>> {
    let mut doc = D::load(bytes).map_err(OrganiseError::backend)?;
    let count = doc.page_count();
    if count <= 1 {
        log::warn!("organise: refusing to delete the only page");
        return Err(OrganiseError::LastPage);
    }
    if index >= count {
        log::warn!("organise: delete index {index} out of range for {count} pages");
        return Err(OrganiseError::InvalidPage { max: count });
    }
    doc.remove_page(index);
    doc.save().map_err(OrganiseError::backend)
}

/// Split into two documents: pages `0..=after` and the rest.
///
/// Both halves must be non-empty, so `after` ranges over `0..count - 1`.
pub fn split_document<D: DocumentModel>(bytes: &[u8], after: usize) -> OrganiseResult<(Vec<u8>, Vec<u8>)> {
    let source = D::load(bytes).map_err(OrganiseError::backend)?;
    let count = source.page_count();
    if after + 1 >= count {
        log::warn!("organise: split point {after} out of range for {count} pages");
        return Err(OrganiseError::InvalidSplit {
            max: count.saturating_sub(1),
        });
    }

    let first: Vec<usize> = (0..=after).collect();
    let second: Vec<usize> = (after + 1..count).collect();
    let build = |indices: &[usize]| -> OrganiseResult<Vec<u8>> {
        let mut doc = D::create();
        for page in doc.copy_pages(&source, indices) {
            doc.add_page(page);
        }
        doc.save().map_err(OrganiseError::backend)
    };
    Ok((build(&first)?, build(&second)?))
}

/// Insert every page of `insert` into `target`, starting at `at`.
pub fn insert_document<D: DocumentModel>(target: &[u8], insert: &[u8], at: usize) -> OrganiseResult<Vec<u8>> {
    let mut doc = D::load(target).map_err(OrganiseError::backend)?;
    let source = D::load(insert).map_err(OrganiseError::backend)?;
    let count = doc.page_count();
    if at > count {
        log::warn!("organise: insert index {at} out of range for {count} pages");
        return Err(OrganiseError::InvalidPage { max: count + 1 });
    }

    let indices: Vec<usize> = (0..source.page_count()).collect();
    for (offset, page) in doc.copy_pages(&source, &indices).into_iter().enumerate() {
        doc.insert_page(at + offset, page);
    }
    doc.save().map_err(OrganiseError::backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(labels: &[&str]) -> Vec<u8> {
        MemoryDocument::with_pages(labels.iter().map(|l| MemoryPage::new(*l, Size::new(612.0, 792.0))))
            .save()
            .unwrap()
    }

    fn labels(bytes: &[u8]) -> Vec<String> {
        MemoryDocument::load(bytes)
            .unwrap()
            .pages()
            .iter()
            .map(|p| p.label.clone())
            .collect()
    }

    #[test]
    fn test_merge_keeps_order() {
        let a = doc(&["a1", "a2"]);
        let b = doc(&["b1"]);
        let merged = merge_documents::<MemoryDocument>(&[&a, &b]).unwrap();
        assert_eq!(labels(&merged), ["a1", "a2", "b1"]);
    }

    #[test]
    fn test_merge_requires_input() {
        assert!(matches!(
            merge_documents::<MemoryDocument>(&[]),
            Err(OrganiseError::NothingToMerge)
        ));
    }

    #[test]
    fn test_merge_reports_backend_error() {
        let good = doc(&["a"]);
        let result = merge_documents::<MemoryDocument>(&[&good, b"not a document"]);
        assert!(matches!(result, Err(OrganiseError::Backend(_))));
    }

    #[test]
    fn test_blank_page_uses_first_page_size() {
        let mut source = MemoryDocument::with_pages([
            MemoryPage::new("p1", Size::new(100.0, 200.0)),
            MemoryPage::new("p2", Size::new(300.0, 400.0)),
        ]);
        let bytes = source.save().unwrap();
        let out = add_blank_page::<MemoryDocument>(&bytes, 2).unwrap();
        source = MemoryDocument::load(&out).unwrap();

        assert_eq!(source.page_count(), 3);
        assert_eq!(source.page_size(2), Some(Size::new(100.0, 200.0)));
        assert_eq!(source.pages()[2].label, "");
    }

    #[test]
    fn test_blank_page_index_bounds() {
        let bytes = doc(&["a", "b"]);
        let err = add_blank_page::<MemoryDocument>(&bytes, 3).unwrap_err();
        assert_eq!(err.to_string(), "Invalid page number. Please enter a number between 1 and 3.");
    }

    #[test]
    fn test_delete_page() {
        let bytes = doc(&["a", "b", "c"]);
        let out = delete_page::<MemoryDocument>(&bytes, 1).unwrap();
        assert_eq!(labels(&out), ["a", "c"]);

        assert!(matches!(
            delete_page::<MemoryDocument>(&bytes, 3),
            Err(OrganiseError::InvalidPage { max: 3 })
        ));
    }

    #[test]
    fn test_delete_only_page_refused() {
        let bytes = doc(&["only"]);
        assert!(matches!(
            delete_page::<MemoryDocument>(&bytes, 0),
            Err(OrganiseError::LastPage)
        ));
    }

    #[test]
    fn test_split() {
        let bytes = doc(&["1", "2", "3", "4"]);
        let (first, second) = split_document::<MemoryDocument>(&bytes, 1).unwrap();
        assert_eq!(labels(&first), ["1", "2"]);
        assert_eq!(labels(&second), ["3", "4"]);
    }

    #[test]
    fn test_split_bounds() {
        let bytes = doc(&["1", "2", "3"]);
        let err = split_document::<MemoryDocument>(&bytes, 2).unwrap_err();
        assert_eq!(err.to_string(), "Invalid split point. Please choose a page between 1 and 2.");

        let single = doc(&["1"]);
        assert!(split_document::<MemoryDocument>(&single, 0).is_err());
    }

    #[test]
    fn test_insert_document() {
        let target = doc(&["t1", "t2"]);
        let insert = doc(&["i1", "i2"]);
        let out = insert_document::<MemoryDocument>(&target, &insert, 1).unwrap();
        assert_eq!(labels(&out), ["t1", "i1", "i2", "t2"]);

        let appended = insert_document::<MemoryDocument>(&target, &insert, 2).unwrap();
        assert_eq!(labels(&appended), ["t1", "t2", "i1", "i2"]);

        assert!(insert_document::<MemoryDocument>(&target, &insert, 5).is_err());
    }
}
