//! Heading-aware segmentation.
//!
//! A [`Segmenter`] owns the running state of one document: the
//! [`HeadingStack`], the accumulated body text, and the images and table
//! texts collected since the last boundary. [`Segments`] drives it lazily
//! over a [`PageSource`](crate::parser::PageSource).

mod chunk;
mod heading;
mod images;
mod machine;
mod options;
mod stream;

pub use chunk::TextSplitter;
pub use heading::HeadingStack;
pub use images::{content_hash, decode_data_url, ImageStore};
pub use machine::Segmenter;
pub use options::SegmentOptions;
pub use stream::{Chunked, Segments};
