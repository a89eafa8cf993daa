//! Extraction options and configuration.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

use super::table_detector::TableDetectorConfig;

/// Options controlling how pages are extracted from a PDF.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Page selection (which pages to visit)
    pub pages: PageSelection,

    /// Whether to surface image XObjects as inline images
    pub images: bool,

    /// Whether to run table detection
    pub tables: bool,

    /// Thresholds used by table detection
    pub table_config: TableDetectorConfig,

    /// Whether to apply Unicode NFKC normalization to extracted text
    pub normalize_unicode: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first malformed page or metadata field.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable inline image extraction.
    pub fn with_images(mut self, images: bool) -> Self {
        self.images = images;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, tables: bool) -> Self {
        self.tables = tables;
        self
    }

    /// Set the table detection thresholds.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.table_config = config;
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            pages: PageSelection::All,
            images: true,
            tables: true,
            table_config: TableDetectorConfig::default(),
            normalize_unicode: true,
        }
    }
}

/// Error handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Log recoverable errors and continue
    #[default]
    Lenient,
}

impl ErrorMode {
    /// Check if recoverable errors should be logged and skipped.
    pub fn is_lenient(self) -> bool {
        self == ErrorMode::Lenient
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
    /// A list of ranges (inclusive, 1-indexed), sorted by start
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        let range = |part: &str| -> Result<RangeInclusive<u32>> {
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (number(start)?, number(end)?),
                None => {
                    let page = number(part)?;
                    (page, page)
                }
            };
            if start > end {
                return Err(invalid());
            }
            Ok(start..=end)
        };

        if !s.contains(',') && s.contains('-') {
            return Ok(PageSelection::Range(range(s)?));
        }

        let mut ranges = s.split(',').map(range).collect::<Result<Vec<_>>>()?;
        ranges.sort_by_key(|r| (*r.start(), *r.end()));
        ranges.dedup();
        Ok(PageSelection::Ranges(ranges))
    }
}
