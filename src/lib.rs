//! # pdfsplit
//!
//! Heading-aware segmentation of PDF documents for retrieval pipelines.
//!
//! Each page is read into a tree of headings and paragraphs; a state machine
//! walks the nodes of all pages in order and cuts a new [`Segment`] every
//! time a heading closes a stretch of body text. Every segment carries the
//! heading path that governed it, the images and tables seen while it was
//! open, and the document's normalized metadata.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsplit::{split_file, SegmentOptions};
//!
//! fn main() -> pdfsplit::Result<()> {
//!     let options = SegmentOptions::new().with_embed_titles(true);
//!     for segment in split_file("document.pdf", &options)? {
//!         println!("{:?}: {}", segment.titles(), segment.body_text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lazy**: [`Segments`] extracts one page at a time
//! - **Images**: inline images are stored under the MD5 of their bytes
//! - **Tables**: detected tables are attached to segments as compact JSON
//! - **Parallel**: independent files are processed with Rayon
//! - **Chunking**: optional size-bounded chunks with overlap

pub mod error;
pub mod model;
pub mod parser;
pub mod segment;

pub use error::{Error, Result};
pub use model::{FileMetadata, MarkupNode, Segment, TableDescriptor};
pub use parser::{ErrorMode, LopdfSource, PageSelection, PageSource, ParseOptions};
pub use segment::{HeadingStack, ImageStore, SegmentOptions, Segmenter, Segments, TextSplitter};

use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use rayon::prelude::*;

/// Open a PDF file and return its segments lazily.
///
/// Chunking options are not applied; use [`Segments::chunked`].
///
/// # Example
///
/// ```no_run
/// use pdfsplit::{segments, SegmentOptions};
///
/// let first = segments("document.pdf", &SegmentOptions::default())?
///     .next()
///     .transpose()?;
/// # Ok::<(), pdfsplit::Error>(())
/// ```
pub fn segments<P: AsRef<Path>>(path: P, options: &SegmentOptions) -> Result<Segments<LopdfSource>> {
    let source = LopdfSource::open(path, options.parse.clone())?;
    Ok(Segments::new(source, options))
}

/// Split a PDF file into segments.
///
/// # Arguments
///
/// * `path` - Path to the PDF file
/// * `options` - Segmentation options
pub fn split_file<P: AsRef<Path>>(path: P, options: &SegmentOptions) -> Result<Vec<Segment>> {
    collect(segments(path, options)?, options)
}

/// Split a PDF held in memory into segments.
///
/// # Example
///
/// ```no_run
/// use pdfsplit::{split_bytes, SegmentOptions};
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let segments = split_bytes(&data, &SegmentOptions::default()).unwrap();
/// ```
pub fn split_bytes(data: &[u8], options: &SegmentOptions) -> Result<Vec<Segment>> {
    let source = LopdfSource::from_bytes(data, options.parse.clone())?;
    collect(Segments::new(source, options), options)
}

/// Split several independent PDF files in parallel.
///
/// Results are returned in input order, one per file.
pub fn split_files_parallel<P>(paths: &[P], options: &SegmentOptions) -> Vec<Result<Vec<Segment>>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| split_file(path, options))
        .collect()
}

/// Segment a PDF file on a worker thread.
///
/// The channel holds at most one pending segment; the worker waits until it
/// is taken. Dropping the receiver stops the worker after its current
/// segment.
pub fn segment_channel(
    path: impl Into<PathBuf>,
    options: SegmentOptions,
) -> Receiver<Result<Segment>> {
    let path = path.into();
    let (tx, rx) = crossbeam_channel::bounded(1);

    std::thread::spawn(move || {
        let items: Box<dyn Iterator<Item = Result<Segment>>> = match segments(&path, &options) {
            Ok(segments) => match options.splitter {
                Some(splitter) => Box::new(segments.chunked(splitter)),
                None => Box::new(segments),
            },
            Err(e) => Box::new(std::iter::once(Err(e))),
        };

        for item in items {
            if tx.send(item).is_err() {
                log::debug!("Receiver for {} dropped, stopping", path.display());
                break;
            }
        }
    });

    rx
}

/// Split a PDF file without blocking the async runtime.
#[cfg(feature = "async")]
pub async fn split_file_async(
    path: impl Into<PathBuf>,
    options: SegmentOptions,
) -> Result<Vec<Segment>> {
    let path = path.into();
    tokio::task::spawn_blocking(move || split_file(&path, &options))
        .await
        .map_err(|e| Error::Other(format!("segmentation task failed: {}", e)))?
}

fn collect<S: PageSource>(segments: Segments<S>, options: &SegmentOptions) -> Result<Vec<Segment>> {
    match options.splitter {
        Some(splitter) => segments.chunked(splitter).collect(),
        None => segments.collect(),
    }
}

/// Builder for splitting PDF documents.
///
/// # Example
///
/// ```no_run
/// use pdfsplit::{PdfSplitter, TextSplitter};
///
/// let segments = PdfSplitter::new()
///     .embed_titles()
///     .with_images("./pdf_images")
///     .with_chunking(TextSplitter::default())
///     .split("document.pdf")?;
/// # Ok::<(), pdfsplit::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PdfSplitter {
    options: SegmentOptions,
}

impl PdfSplitter {
    /// Create a new splitter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix segment bodies with their heading path.
    pub fn embed_titles(mut self) -> Self {
        self.options = self.options.with_embed_titles(true);
        self
    }

    /// Store inline images under `dir`.
    pub fn with_images(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_images(dir);
        self
    }

    /// Fail on the first recoverable error.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Restrict extraction to some pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options.parse = self.options.parse.with_pages(pages);
        self
    }

    /// Cut segments into overlapping chunks.
    pub fn with_chunking(mut self, splitter: TextSplitter) -> Self {
        self.options = self.options.with_splitter(splitter);
        self
    }

    /// Add a metadata entry to every segment.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_metadata(key, value);
        self
    }

    /// The options this builder has collected.
    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Open a PDF file and return its segments lazily.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Segments<LopdfSource>> {
        segments(path, &self.options)
    }

    /// Split a PDF file.
    pub fn split<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Segment>> {
        split_file(path, &self.options)
    }

    /// Split a PDF held in memory.
    pub fn split_bytes(&self, data: &[u8]) -> Result<Vec<Segment>> {
        split_bytes(data, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let splitter = PdfSplitter::new()
            .embed_titles()
            .with_images("imgs")
            .with_pages(PageSelection::Range(1..=3))
            .with_metadata("source", "a.pdf")
            .strict();

        let options = splitter.options();
        assert!(options.embed_titles);
        assert!(options.extract_images);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.parse.error_mode, ErrorMode::Strict);
        assert_eq!(options.parse.pages, PageSelection::Range(1..=3));
    }

    #[test]
    fn test_split_bytes_rejects_non_pdf() {
        let options = SegmentOptions::default();
        assert!(matches!(split_bytes(b"", &options), Err(Error::UnknownFormat)));
        assert!(matches!(split_bytes(b"%PDF", &options), Err(Error::UnknownFormat)));
        assert!(split_bytes(b"%PDF-1.7\ngarbage", &options).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = split_file("/definitely/not/here.pdf", &SegmentOptions::default());
        assert!(matches!(result, Err(Error::Io(_))));

        let rx = segment_channel("/definitely/not/here.pdf", SegmentOptions::default());
        assert!(matches!(rx.recv(), Ok(Err(Error::Io(_)))));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_parallel_keeps_order() {
        let results = split_files_parallel(&["/nope/a.pdf", "/nope/b.pdf"], &SegmentOptions::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Result::is_err));
    }
}
