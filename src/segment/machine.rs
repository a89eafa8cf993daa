//! The heading-aware segmentation state machine.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::model::{embed_titles, first_image, paragraph_text, FileMetadata, Inline, MarkupNode, Segment};
use crate::parser::ErrorMode;

use super::heading::HeadingStack;
use super::images::ImageStore;
use super::options::SegmentOptions;

/// Turns a stream of markup nodes into segments.
///
/// Paragraph text accumulates until a heading arrives; the heading closes the
/// open segment under the heading context that governed it, then updates the
/// context. [`finish`](Segmenter::finish) closes whatever is left.
///
/// ```
/// use pdfsplit::model::MarkupNode;
/// use pdfsplit::segment::{SegmentOptions, Segmenter};
///
/// let mut segmenter = Segmenter::new(&SegmentOptions::default(), Default::default());
/// segmenter.begin_page("");
/// assert!(segmenter.feed(MarkupNode::heading(1, "Intro")).unwrap().is_none());
/// assert!(segmenter.feed(MarkupNode::paragraph("Hello")).unwrap().is_none());
///
/// let segment = segmenter.finish().unwrap();
/// assert_eq!(segment.body_text, "Hello");
/// assert_eq!(segment.titles(), ["Intro"]);
/// ```
#[derive(Debug)]
pub struct Segmenter {
    headings: HeadingStack,
    accumulated_text: String,
    image_paths: Vec<PathBuf>,
    table_texts: Vec<String>,
    embed_titles: bool,
    images: Option<ImageStore>,
    error_mode: ErrorMode,
    file_metadata: FileMetadata,
}

impl Segmenter {
    /// Create a segmenter for one document.
    ///
    /// Extra metadata from the options is added to the file metadata.
    pub fn new(options: &SegmentOptions, mut file_metadata: FileMetadata) -> Self {
        for (key, value) in &options.extra_metadata {
            file_metadata.insert(key.clone(), value.clone());
        }

        Self {
            headings: HeadingStack::new(),
            accumulated_text: String::new(),
            image_paths: Vec::new(),
            table_texts: Vec::new(),
            embed_titles: options.embed_titles,
            images: options
                .extract_images
                .then(|| ImageStore::new(options.image_dir.clone())),
            error_mode: options.error_mode,
            file_metadata,
        }
    }

    /// Start a new page, recording its table text even when empty.
    pub fn begin_page(&mut self, table_text: impl Into<String>) {
        self.table_texts.push(table_text.into());
    }

    /// Process one node, returning the segment it closed, if any.
    pub fn feed(&mut self, node: MarkupNode) -> Result<Option<Segment>> {
        match node {
            MarkupNode::Heading { level, text } => {
                let closed = self.flush();
                self.headings.set_level(level, text);
                Ok(closed)
            }
            MarkupNode::Paragraph(content) => {
                self.paragraph(&content)?;
                Ok(None)
            }
            MarkupNode::Other { tag, .. } => match self.error_mode {
                ErrorMode::Strict => Err(Error::UnsupportedNode(tag)),
                ErrorMode::Lenient => {
                    log::debug!("Ignoring unsupported <{}> node", tag);
                    Ok(None)
                }
            },
        }
    }

    /// Close the open segment at end of input.
    ///
    /// Returns `None` when no text has accumulated.
    pub fn finish(&mut self) -> Option<Segment> {
        self.flush()
    }

    /// Current heading context.
    pub fn heading_stack(&self) -> &HeadingStack {
        &self.headings
    }

    /// Text accumulated since the last segment closed.
    pub fn pending_text(&self) -> &str {
        &self.accumulated_text
    }

    /// Document metadata attached to every segment.
    pub fn file_metadata(&self) -> &FileMetadata {
        &self.file_metadata
    }

    fn paragraph(&mut self, content: &[Inline]) -> Result<()> {
        if let (Some(store), Some(src)) = (&self.images, first_image(content)) {
            match store.store_data_url(src) {
                Ok(path) => {
                    self.image_paths.push(path);
                    return Ok(());
                }
                Err(e @ Error::ImageStore { .. }) => return Err(e),
                Err(e) if self.error_mode == ErrorMode::Strict => return Err(e),
                Err(e) => log::warn!("Keeping image paragraph as text: {}", e),
            }
        }

        self.accumulated_text.push_str(&paragraph_text(content));
        Ok(())
    }

    /// Emit the open segment if it has text and reset the buffers.
    fn flush(&mut self) -> Option<Segment> {
        if self.accumulated_text.is_empty() {
            return None;
        }

        let heading_path = self.headings.path();
        let text = std::mem::take(&mut self.accumulated_text);
        let body_text = if self.embed_titles {
            embed_titles(&heading_path, &text)
        } else {
            text
        };

        Some(Segment {
            body_text,
            heading_path,
            images: std::mem::take(&mut self.image_paths),
            table_texts: std::mem::take(&mut self.table_texts),
            file_metadata: self.file_metadata.clone(),
        })
    }
}
