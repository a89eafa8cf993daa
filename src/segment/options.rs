//! Segmentation options.

use std::path::PathBuf;

use crate::parser::{ErrorMode, ParseOptions};

use super::chunk::TextSplitter;

/// Options controlling how a document is cut into segments.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Prefix each body with its heading path
    pub embed_titles: bool,

    /// Decode inline images into the image directory instead of reading
    /// them as text
    pub extract_images: bool,

    /// Where decoded images are written
    pub image_dir: PathBuf,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Extra key/value pairs added to every segment's metadata
    pub extra_metadata: Vec<(String, String)>,

    /// Cut long segments into overlapping chunks
    pub splitter: Option<TextSplitter>,

    /// Page extraction options
    pub parse: ParseOptions,
}

impl SegmentOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable title embedding.
    pub fn with_embed_titles(mut self, embed: bool) -> Self {
        self.embed_titles = embed;
        self
    }

    /// Decode inline images into `dir`.
    pub fn with_images(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_images = true;
        self.image_dir = dir.into();
        self
    }

    /// Set error mode for both extraction and segmentation.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self.parse.error_mode = mode;
        self
    }

    /// Fail on the first recoverable error.
    pub fn strict(self) -> Self {
        self.with_error_mode(ErrorMode::Strict)
    }

    /// Add a metadata entry to every segment.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_metadata.push((key.into(), value.into()));
        self
    }

    /// Cut segments into chunks.
    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Set page extraction options. The error mode of `parse` is kept.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.error_mode = parse.error_mode;
        self.parse = parse;
        self
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            embed_titles: false,
            extract_images: false,
            image_dir: PathBuf::from("./pdf_images"),
            error_mode: ErrorMode::Lenient,
            extra_metadata: Vec::new(),
            splitter: None,
            parse: ParseOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = SegmentOptions::new()
            .with_embed_titles(true)
            .with_images("/tmp/imgs")
            .with_metadata("source", "report.pdf")
            .strict();

        assert!(options.embed_titles);
        assert!(options.extract_images);
        assert_eq!(options.image_dir, PathBuf::from("/tmp/imgs"));
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.parse.error_mode, ErrorMode::Strict);
        assert_eq!(options.extra_metadata.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let options = SegmentOptions::default();
        assert!(!options.embed_titles);
        assert!(!options.extract_images);
        assert!(options.error_mode.is_lenient());
        assert!(options.splitter.is_none());
    }
}
