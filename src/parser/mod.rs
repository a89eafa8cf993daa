//! PDF page extraction.
//!
//! [`LopdfSource`] turns each page into a [`MarkupTree`](crate::model::MarkupTree)
//! of headings, paragraphs and inline images plus the page's table text.

mod header;
mod layout;
mod options;
mod pdf_source;
mod source;
mod table_detector;

pub use header::PdfHeader;
pub use layout::{
    group_into_blocks, group_into_lines, BlockKind, FontStatistics, ImagePlacement,
    LayoutAnalyzer, PageElements, TextBlock, TextLine, TextSpan,
};
pub use options::{ErrorMode, PageSelection, ParseOptions};
pub use pdf_source::LopdfSource;
pub use source::{MemorySource, PageContent, PageSource};
pub use table_detector::{DetectedRow, DetectedTable, TableDetector, TableDetectorConfig};
