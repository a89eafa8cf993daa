//! Data model shared by page backends and the segmenter.
//!
//! Backends describe a page as a [`MarkupTree`] of headings and paragraphs
//! plus the [`TableDescriptor`]s found on it; the segmenter turns that stream
//! into [`Segment`]s carrying the document's [`FileMetadata`].

mod metadata;
mod node;
mod segment;
mod table;

pub use metadata::{normalize_pdf_date, FileMetadata, DATE_KEYS, STANDARD_KEYS};
pub use node::{first_image, paragraph_text, Inline, MarkupNode, MarkupTree, MAX_HEADING_LEVEL};
pub use segment::{embed_titles, Segment};
pub use table::{generic_header, page_table_text, TableDescriptor, GENERIC_COLUMN_PREFIX};
