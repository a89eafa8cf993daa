//! Page backend abstraction.
//!
//! The segmenter only ever sees pages through [`PageSource`], which keeps the
//! concrete PDF library out of the segmentation logic and lets tests drive
//! it with hand-built pages.

use crate::error::{Error, Result};
use crate::model::{FileMetadata, MarkupTree};

/// Everything the segmenter needs from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// Headings and paragraphs in reading order
    pub tree: MarkupTree,

    /// Serialized text of the page's tables; empty if there are none
    pub table_text: String,
}

impl PageContent {
    /// Create page content.
    pub fn new(tree: MarkupTree, table_text: impl Into<String>) -> Self {
        Self {
            tree,
            table_text: table_text.into(),
        }
    }
}

/// A document that can be read page by page.
pub trait PageSource {
    /// Number of pages visited, after page selection.
    fn page_count(&self) -> usize;

    /// 1-indexed page number of the page at `index`.
    fn page_number(&self, index: usize) -> u32 {
        index as u32 + 1
    }

    /// Extract the page at `index` (0-based, after page selection).
    fn page(&self, index: usize) -> Result<PageContent>;

    /// Normalized document metadata.
    fn file_metadata(&self) -> &FileMetadata;
}

/// An in-memory source over pre-built pages.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<PageContent>,
    metadata: FileMetadata,
}

impl MemorySource {
    /// Create a source from pages.
    pub fn new(pages: Vec<PageContent>) -> Self {
        Self {
            pages,
            metadata: FileMetadata::new(),
        }
    }

    /// Attach document metadata.
    pub fn with_metadata(mut self, metadata: FileMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append a page.
    pub fn add_page(&mut self, page: PageContent) {
        self.pages.push(page);
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageContent> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(Error::PageOutOfRange(index as u32 + 1, self.pages.len() as u32))
    }

    fn file_metadata(&self) -> &FileMetadata {
        &self.metadata
    }
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_number(&self, index: usize) -> u32 {
        (**self).page_number(index)
    }

    fn page(&self, index: usize) -> Result<PageContent> {
        (**self).page(index)
    }

    fn file_metadata(&self) -> &FileMetadata {
        (**self).file_metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkupNode;

    #[test]
    fn test_memory_source() {
        let tree: MarkupTree = vec![MarkupNode::paragraph("x")].into_iter().collect();
        let source = MemorySource::new(vec![PageContent::new(tree, "")]);

        assert_eq!(source.page_count(), 1);
        assert_eq!(source.page_number(0), 1);
        assert_eq!(source.page(0).unwrap().tree.len(), 1);
        assert!(matches!(source.page(1), Err(Error::PageOutOfRange(2, 1))));
    }
}
