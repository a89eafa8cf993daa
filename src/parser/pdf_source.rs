//! PDF page source backed by lopdf.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{page_table_text, FileMetadata, MarkupNode, MarkupTree, TableDescriptor};

use super::header::PdfHeader;
use super::layout::{
    group_into_blocks, group_into_lines, BlockKind, FontStatistics, LayoutAnalyzer, TextBlock,
};
use super::options::ParseOptions;
use super::source::{PageContent, PageSource};
use super::table_detector::{DetectedTable, TableDetector};

/// Information dictionary entries copied into the file metadata.
const INFO_KEYS: [(&[u8], &str); 9] = [
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Subject", "subject"),
    (b"Keywords", "keywords"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
    (b"CreationDate", "creationDate"),
    (b"ModDate", "modDate"),
    (b"Trapped", "trapped"),
];

/// A PDF document read page by page.
pub struct LopdfSource {
    doc: LopdfDocument,
    options: ParseOptions,
    /// Selected pages as (page number, object id), in document order
    pages: Vec<(u32, ObjectId)>,
    total_pages: u32,
    stats: FontStatistics,
    metadata: FileMetadata,
    detector: TableDetector,
}

impl LopdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let header = PdfHeader::from_path(path)?;
        let doc = LopdfDocument::load(path).map_err(load_error)?;
        Self::from_document(doc, header, options)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(data: &[u8], options: ParseOptions) -> Result<Self> {
        let header = PdfHeader::from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(load_error)?;
        Self::from_document(doc, header, options)
    }

    fn from_document(doc: LopdfDocument, header: PdfHeader, options: ParseOptions) -> Result<Self> {
        doc.catalog()
            .map_err(|_| Error::MissingObject("document catalog".to_string()))?;

        let all_pages = doc.get_pages();
        let total_pages = all_pages.len() as u32;
        let pages: Vec<(u32, ObjectId)> = all_pages
            .into_iter()
            .filter(|(number, _)| options.pages.includes(*number))
            .collect();

        let metadata = extract_metadata(&doc, &header, &options)?;

        let detector = TableDetector::with_config(options.table_config.clone());
        let mut source = Self {
            doc,
            options,
            pages,
            total_pages,
            stats: FontStatistics::default(),
            metadata,
            detector,
        };
        source.stats = source.scan_fonts();

        log::debug!(
            "Opened {} with {} of {} pages selected, body size {:.1}",
            header,
            source.pages.len(),
            total_pages,
            source.stats.body_size
        );

        Ok(source)
    }

    /// Number of pages in the document, ignoring page selection.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Font-size statistics gathered over the selected pages.
    pub fn font_statistics(&self) -> &FontStatistics {
        &self.stats
    }

    /// Collect font sizes from every selected page.
    ///
    /// Heading levels depend on the document-wide body size, so this runs
    /// once before any page is handed out.
    fn scan_fonts(&self) -> FontStatistics {
        let analyzer = LayoutAnalyzer::new(&self.doc, self.options.normalize_unicode);
        let mut stats = FontStatistics::default();

        for &(number, page_id) in &self.pages {
            match analyzer.extract_page(page_id) {
                Ok(elements) => {
                    for span in &elements.spans {
                        stats.add_size(span.font_size, span.text.chars().count());
                    }
                }
                Err(e) => log::debug!("Font scan skipped page {}: {}", number, e),
            }
        }

        stats.analyze();
        stats
    }

    /// Build the markup tree and table text of one page.
    fn extract(&self, page_id: ObjectId) -> Result<PageContent> {
        let analyzer = LayoutAnalyzer::new(&self.doc, self.options.normalize_unicode);
        let elements = analyzer.extract_page(page_id)?;

        let (tables, spans) = if self.options.tables {
            self.detector.detect(elements.spans)
        } else {
            (Vec::new(), elements.spans)
        };
        let descriptors: Vec<TableDescriptor> =
            tables.iter().map(DetectedTable::to_descriptor).collect();
        let table_text = page_table_text(&descriptors)?;

        let blocks = group_into_blocks(group_into_lines(spans, &self.stats));
        let mut placed: Vec<(f32, MarkupNode)> = blocks
            .iter()
            .map(|block| (block.top(), block_node(block)))
            .collect();

        if self.options.images {
            for image in &elements.images {
                match self.image_data_url(page_id, &image.name) {
                    Some(url) => placed.push((image.y, MarkupNode::image(url))),
                    None => log::debug!(
                        "Skipping XObject /{}",
                        String::from_utf8_lossy(&image.name)
                    ),
                }
            }
        }

        // Top of the page first; the sort is stable so blocks keep their order
        placed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let tree: MarkupTree = placed.into_iter().map(|(_, node)| node).collect();
        Ok(PageContent::new(tree, table_text))
    }

    /// Inline data URL for a JPEG or JPEG 2000 image XObject.
    fn image_data_url(&self, page_id: ObjectId, name: &[u8]) -> Option<String> {
        let xobjects = self.page_xobjects(page_id)?;
        let id = xobjects.get(name).ok()?.as_reference().ok()?;
        let Object::Stream(stream) = self.doc.get_object(id).ok()? else {
            return None;
        };

        let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
        if subtype != b"Image" {
            return None;
        }

        let filters: Vec<&[u8]> = match stream.dict.get(b"Filter").ok()? {
            Object::Name(name) => vec![name.as_slice()],
            Object::Array(items) => items.iter().filter_map(|o| o.as_name().ok()).collect(),
            _ => return None,
        };
        let ext = match filters.as_slice() {
            [b"DCTDecode"] => "jpeg",
            [b"JPXDecode"] => "jp2",
            _ => return None,
        };

        Some(format!(
            "data:image/{};base64,{}",
            ext,
            STANDARD.encode(&stream.content)
        ))
    }

    fn page_xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let page = self.doc.get_dictionary(page_id).ok()?;
        let resources = self.resolve_dict(page.get(b"Resources").ok()?)?;
        self.resolve_dict(resources.get(b"XObject").ok()?)
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_number(&self, index: usize) -> u32 {
        self.pages
            .get(index)
            .map_or(index as u32 + 1, |(number, _)| *number)
    }

    fn page(&self, index: usize) -> Result<PageContent> {
        let (_, page_id) = self
            .pages
            .get(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index as u32 + 1, self.pages.len() as u32))?;
        self.extract(page_id)
    }

    fn file_metadata(&self) -> &FileMetadata {
        &self.metadata
    }
}

fn block_node(block: &TextBlock) -> MarkupNode {
    match block.kind {
        BlockKind::Heading(level) => MarkupNode::heading(level, block.text()),
        BlockKind::Paragraph => MarkupNode::paragraph(block.text()),
    }
}

fn load_error(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        _ => Error::from(err),
    }
}

/// Read the information dictionary into normalized file metadata.
fn extract_metadata(
    doc: &LopdfDocument,
    header: &PdfHeader,
    options: &ParseOptions,
) -> Result<FileMetadata> {
    let mut metadata = FileMetadata::with_standard_keys();
    metadata.insert("format", header.to_string());

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| match info {
            Object::Reference(r) => doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        });
    if let Some(info) = info {
        for (pdf_key, key) in INFO_KEYS {
            if let Some(value) = get_string_from_dict(info, pdf_key) {
                metadata.insert(key, value);
            }
        }
    }

    if let Ok(encrypt) = doc.trailer.get(b"Encrypt") {
        let filter = match encrypt {
            Object::Reference(r) => doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
        .and_then(|d| get_string_from_dict(d, b"Filter"))
        .unwrap_or_else(|| "Standard".to_string());
        metadata.insert("encryption", filter);
    }

    if let Err(e) = metadata.normalize_dates() {
        if !options.error_mode.is_lenient() {
            return Err(e);
        }
        log::warn!("Keeping raw metadata date: {}", e);
    }

    Ok(metadata)
}

/// Read a text string or name from a dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(super::layout::decode_text_simple(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}
