//! Size-bounded chunking of segment bodies.

use crate::error::{Error, Result};
use crate::model::Segment;

/// Cuts long segment bodies into overlapping windows of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter. The overlap must be smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(Error::Other(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks, at most.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a segment; every chunk keeps the parent's headings, images,
    /// tables and metadata.
    pub fn split(&self, segment: &Segment) -> Vec<Segment> {
        self.split_text(&segment.body_text)
            .into_iter()
            .map(|body_text| Segment {
                body_text,
                ..segment.clone()
            })
            .collect()
    }

    /// Split text into windows of at most `chunk_size` characters.
    ///
    /// Windows end at the last whitespace inside them when there is one.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + self.chunk_size).min(chars.len());
            let mut at_word_break = false;
            if end < chars.len() {
                if let Some(space) = chars[start + 1..end].iter().rposition(|c| c.is_whitespace()) {
                    end = start + 1 + space;
                    at_word_break = true;
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
            if end == chars.len() {
                break;
            }

            // Step back by the overlap; after a word break, forward to a word start
            let next = end.saturating_sub(self.chunk_overlap).max(start + 1);
            start = if at_word_break {
                (next..end)
                    .find(|&i| chars[i - 1].is_whitespace() && !chars[i].is_whitespace())
                    .unwrap_or(end)
            } else {
                next
            };
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 960,
            chunk_overlap: 100,
        }
    }
}
