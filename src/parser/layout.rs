//! Layout analysis for PDF pages.
//!
//! Walks a page content stream and records positioned text spans and image
//! placements, then groups spans into lines and blocks and assigns heading
//! levels from the document's font-size hierarchy.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Document as LopdfDocument, Object, ObjectId};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::MAX_HEADING_LEVEL;

/// A text span with position and style information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextSpan {
    /// Create a new text span; width is estimated from the character count.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let width = text.chars().count() as f32 * font_size * 0.5;

        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
        }
    }
}

/// Where an image XObject was painted on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// XObject resource name
    pub name: Vec<u8>,
    /// Top edge of the placed image
    pub y: f32,
}

/// Raw positioned content of one page.
#[derive(Debug, Clone, Default)]
pub struct PageElements {
    /// Text spans in content-stream order
    pub spans: Vec<TextSpan>,
    /// Image placements in content-stream order
    pub images: Vec<ImagePlacement>,
}

/// A text line composed of spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size in this line
    pub font_size: f32,
    /// Heading level (1-6), or 0 for body text
    pub heading_level: u8,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        // Dominant font size, weighted by text length
        let total_chars: usize = spans.iter().map(|s| s.text.len()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.len() as f32)
            .sum();
        let font_size = match (total_chars, spans.first()) {
            (0, Some(first)) => first.font_size,
            (0, None) => 0.0,
            _ => weighted / total_chars as f32,
        };

        let (x, y) = spans.first().map_or((0.0, 0.0), |s| (s.x, s.y));

        Self {
            spans,
            y,
            x,
            font_size,
            heading_level: 0,
        }
    }

    /// Combined text of all spans, with spaces inserted at visible gaps.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - (prev.x + prev.width);
                let char_count = span.text.chars().count().max(1);
                let threshold = span.width / char_count as f32 * 0.2;

                let both_spaceless = prev.text.chars().last().is_some_and(is_spaceless_script_char)
                    && span.text.chars().next().is_some_and(is_spaceless_script_char);
                let has_space = prev.text.ends_with([' ', '\u{00A0}'])
                    || span.text.starts_with([' ', '\u{00A0}']);

                if gap > threshold && !both_spaceless && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }

        result
    }

    /// Check if this line was classified as a heading.
    pub fn is_heading(&self) -> bool {
        self.heading_level > 0
    }
}

/// Kind of text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A heading at the given level
    Heading(u8),
    /// A regular paragraph
    Paragraph,
}

/// A group of consecutive lines forming one heading or paragraph.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// The lines in this block
    pub lines: Vec<TextLine>,
    /// Block kind
    pub kind: BlockKind,
}

impl TextBlock {
    /// Build a block; it is a heading if any line is, at the shallowest level.
    pub fn new(lines: Vec<TextLine>) -> Self {
        let kind = lines
            .iter()
            .filter(|l| l.is_heading())
            .map(|l| l.heading_level)
            .min()
            .map_or(BlockKind::Paragraph, BlockKind::Heading);
        Self { lines, kind }
    }

    /// Combined text of all lines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Baseline of the first line.
    pub fn top(&self) -> f32 {
        self.lines.first().map_or(0.0, |l| l.y)
    }
}

/// Font statistics for heading detection.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Body text font size (most common)
    pub body_size: f32,
    /// Font sizes larger than body, largest first
    pub heading_sizes: Vec<f32>,
    /// Observed font sizes (tenths of a point) with frequency
    size_histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    /// Add a font size observation, weighted by character count.
    pub fn add_size(&mut self, size: f32, weight: usize) {
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += weight.max(1);
    }

    /// Calculate body size and heading sizes.
    pub fn analyze(&mut self) {
        let Some((&body_key, _)) = self
            .size_histogram
            .iter()
            .max_by_key(|(key, count)| (**count, -**key))
        else {
            self.body_size = 12.0;
            self.heading_sizes.clear();
            return;
        };
        self.body_size = body_key as f32 / 10.0;

        let mut larger: Vec<f32> = self
            .size_histogram
            .keys()
            .map(|k| *k as f32 / 10.0)
            .filter(|size| *size > self.body_size + 0.5)
            .collect();
        larger.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        self.heading_sizes = larger;
    }

    /// Heading level for a font size (1-6), or 0 for body text.
    pub fn heading_level(&self, font_size: f32) -> u8 {
        // Headings must be noticeably larger than body text
        if font_size < self.body_size + 1.5 {
            return 0;
        }

        self.heading_sizes
            .iter()
            .position(|&size| font_size >= size - 0.5)
            .map_or(MAX_HEADING_LEVEL - 1, |i| {
                (i + 1).min(MAX_HEADING_LEVEL as usize) as u8
            })
    }
}

/// Extracts positioned content from the pages of a document.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
    normalize_unicode: bool,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new layout analyzer.
    pub fn new(doc: &'a LopdfDocument, normalize_unicode: bool) -> Self {
        Self {
            doc,
            normalize_unicode,
        }
    }

    /// Extract spans and image placements from a page.
    pub fn extract_page(&self, page_id: ObjectId) -> Result<PageElements> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let font_names: HashMap<Vec<u8>, String> = lopdf_fonts
            .iter()
            .map(|(name, font)| {
                let base_font = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                (name.clone(), base_font)
            })
            .collect();

        let content = self.page_content(page_id)?;
        self.parse_content_stream(&content, &font_names, &lopdf_fonts)
    }

    /// Get the decompressed page content stream.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(stream_bytes(s)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            content.extend_from_slice(&stream_bytes(s));
                            content.push(b' ');
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn parse_content_stream(
        &self,
        content: &[u8],
        font_names: &HashMap<Vec<u8>, String>,
        lopdf_fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    ) -> Result<PageElements> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut elements = PageElements::default();
        let mut font_key: Vec<u8> = Vec::new();
        let mut font_name = String::new();
        let mut font_size: f32 = 12.0;
        let mut leading: f32 = 12.0;
        let mut text_matrix = TextMatrix::default();
        let mut ctm = Matrix::IDENTITY;
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut in_text_block = false;

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => ctm = ctm_stack.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        ctm = m.concat(&ctm);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        elements.images.push(ImagePlacement {
                            name: name.clone(),
                            y: ctm.f + ctm.d.max(0.0),
                        });
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text_matrix = TextMatrix::default();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if let [Object::Name(key), size, ..] = operands.as_slice() {
                        font_key = key.clone();
                        font_name = font_names
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                        font_size = get_number(size).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(tl) = operands.first().and_then(get_number) {
                        leading = tl;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty, ..] = operands.as_slice() {
                        let tx = get_number(tx).unwrap_or(0.0);
                        let ty = get_number(ty).unwrap_or(0.0);
                        if op.operator == "TD" {
                            leading = -ty;
                        }
                        text_matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text_matrix.set(m);
                    }
                }
                "T*" => text_matrix.next_line(leading),
                "Tj" | "TJ" | "'" | "\"" if in_text_block => {
                    if matches!(op.operator.as_str(), "'" | "\"") {
                        text_matrix.next_line(leading);
                    }

                    let encoding = lopdf_fonts
                        .get(&font_key)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());
                    let decode = |bytes: &[u8]| match encoding {
                        Some(ref enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_default(),
                        None => decode_text_simple(bytes),
                    };

                    let text = match (op.operator.as_str(), operands.as_slice()) {
                        ("TJ", [Object::Array(items), ..]) => decode_tj_array(items, decode),
                        ("Tj" | "'", [Object::String(bytes, _), ..]) => decode(bytes),
                        ("\"", [_, _, Object::String(bytes, _), ..]) => decode(bytes),
                        _ => String::new(),
                    };

                    if !text.trim().is_empty() {
                        let text = if self.normalize_unicode {
                            text.nfkc().collect()
                        } else {
                            text
                        };
                        let (x, y) = text_matrix.position();
                        elements.spans.push(TextSpan::new(
                            text,
                            x,
                            y,
                            font_size * text_matrix.scale(),
                            font_name.clone(),
                        ));
                    }
                }
                _ => {}
            }
        }

        Ok(elements)
    }
}

/// Group spans into lines by baseline, top to bottom.
pub fn group_into_lines(mut spans: Vec<TextSpan>, stats: &FontStatistics) -> Vec<TextLine> {
    // PDF Y grows upwards, so sort descending
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    for line in &mut lines {
        line.heading_level = stats.heading_level(line.font_size);
    }

    lines
}

/// Group lines into blocks based on spacing, size and indentation changes.
pub fn group_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let avg_spacing = average_line_spacing(&lines);
    let mut blocks = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break_block(prev, &line, avg_spacing) {
                blocks.push(TextBlock::new(std::mem::take(&mut current)));
            }
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(TextBlock::new(current));
    }

    blocks
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    // Headings stand alone unless the next line continues the same heading
    if prev.is_heading() || curr.is_heading() {
        return prev.heading_level != curr.heading_level
            || (prev.y - curr.y).abs() > prev.font_size * 1.6;
    }

    (prev.y - curr.y).abs() > avg_spacing * 1.5
        || (prev.font_size - curr.font_size).abs() > 1.0
        || (prev.x - curr.x).abs() > 20.0
}

/// Decode a `TJ` array, turning wide negative kerning into word spaces.
fn decode_tj_array(items: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    // Adjustments are in thousandths of text space; ~200 reads as a space
    const SPACE_THRESHOLD: f32 = 200.0;

    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(bytes)),
            other => {
                let Some(adjustment) = get_number(other).map(|n| -n) else {
                    continue;
                };
                let wants_space = adjustment > SPACE_THRESHOLD
                    && !combined.ends_with([' ', '\u{00A0}'])
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !is_spaceless_script_char(c));
                if wants_space {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f32> = operands.iter().take(6).filter_map(get_number).collect();
        match values.as_slice() {
            &[a, b, c, d, e, f] => Some(Matrix { a, b, c, d, e, f }),
            _ => None,
        }
    }

    /// `self × other`
    fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }
}

/// Text and line matrices for tracking position inside `BT`/`ET`.
#[derive(Debug, Clone)]
struct TextMatrix {
    matrix: Matrix,
    line: Matrix,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line: Matrix::IDENTITY,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: Matrix) {
        self.matrix = m;
        self.line = m;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let shift = Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        };
        self.line = shift.concat(&self.line);
        self.matrix = self.line;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.matrix.e, self.matrix.f)
    }

    fn scale(&self) -> f32 {
        (self.matrix.a * self.matrix.a + self.matrix.c * self.matrix.c).sqrt()
    }
}

/// Decoded stream data; unfiltered streams are returned as stored.
fn stream_bytes(stream: &lopdf::Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words (Chinese, Japanese).
/// Hangul is not included; Korean uses word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Decode text when the font has no usable encoding.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
