//! Lazy segment iteration over a page source.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::error::Result;
use crate::model::{MarkupNode, Segment};
use crate::parser::{ErrorMode, PageSource};

use super::chunk::TextSplitter;
use super::machine::Segmenter;
use super::options::SegmentOptions;

/// Iteration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Pulling nodes from pages
    Running,
    /// End of input reached or an error was returned
    Done,
}

/// A lazy, finite sequence of segments.
///
/// Pages are extracted only when the pending nodes run out, so at most one
/// page is held at a time. Dropping the iterator early is safe. After an
/// error the iterator returns `None`.
pub struct Segments<S: PageSource> {
    source: S,
    segmenter: Segmenter,
    error_mode: ErrorMode,
    next_page: usize,
    pending: VecDeque<MarkupNode>,
    state: StreamState,
}

impl<S: PageSource> Segments<S> {
    /// Segment the pages of `source`.
    pub fn new(source: S, options: &SegmentOptions) -> Self {
        let segmenter = Segmenter::new(options, source.file_metadata().clone());
        Self {
            source,
            segmenter,
            error_mode: options.error_mode,
            next_page: 0,
            pending: VecDeque::new(),
            state: StreamState::Running,
        }
    }

    /// The underlying page source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The state machine driving this iterator.
    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Cut every segment into chunks.
    pub fn chunked(self, splitter: TextSplitter) -> Chunked<Self> {
        Chunked::new(self, splitter)
    }

    /// Load the next page's nodes. Returns `Ok(false)` at end of input.
    fn load_page(&mut self) -> Result<bool> {
        if self.next_page >= self.source.page_count() {
            return Ok(false);
        }
        let index = self.next_page;
        self.next_page += 1;

        match self.source.page(index) {
            Ok(page) => {
                self.segmenter.begin_page(page.table_text);
                self.pending.extend(page.tree);
            }
            Err(e) if self.error_mode.is_lenient() && e.is_recoverable() => {
                log::warn!("Skipping page {}: {}", self.source.page_number(index), e);
                self.segmenter.begin_page(String::new());
            }
            Err(e) => return Err(e),
        }
        Ok(true)
    }
}

impl<S: PageSource> Iterator for Segments<S> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == StreamState::Running {
            if let Some(node) = self.pending.pop_front() {
                match self.segmenter.feed(node) {
                    Ok(Some(segment)) => return Some(Ok(segment)),
                    Ok(None) => continue,
                    Err(e) => {
                        self.state = StreamState::Done;
                        return Some(Err(e));
                    }
                }
            }

            match self.load_page() {
                Ok(true) => {}
                Ok(false) => {
                    self.state = StreamState::Done;
                    return self.segmenter.finish().map(Ok);
                }
                Err(e) => {
                    self.state = StreamState::Done;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<S: PageSource> FusedIterator for Segments<S> {}

/// Segments cut into size-bounded chunks.
pub struct Chunked<I> {
    inner: I,
    splitter: TextSplitter,
    buffer: VecDeque<Segment>,
}

impl<I> Chunked<I>
where
    I: Iterator<Item = Result<Segment>>,
{
    /// Chunk the segments of `inner`.
    pub fn new(inner: I, splitter: TextSplitter) -> Self {
        Self {
            inner,
            splitter,
            buffer: VecDeque::new(),
        }
    }
}

impl<I> Iterator for Chunked<I>
where
    I: Iterator<Item = Result<Segment>>,
{
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.buffer.pop_front() {
                return Some(Ok(chunk));
            }
            match self.inner.next()? {
                Ok(segment) => self.buffer.extend(self.splitter.split(&segment)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
