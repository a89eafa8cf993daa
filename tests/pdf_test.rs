//! End-to-end tests over PDFs built in memory with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdfsplit::parser::{LopdfSource, PageSource, TableDetectorConfig};
use pdfsplit::{
    segment_channel, split_bytes, Error, PageSelection, ParseOptions, PdfSplitter, Segment,
    SegmentOptions,
};
use tempfile::TempDir;

/// Text drawn at a position with the given font size.
struct Text(&'static str, f32, f32, i64);

fn text_ops(items: &[Text]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for Text(text, x, y, size) in items {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
        ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources: lopdf::Dictionary,
    operations: Vec<Operation>,
) -> ObjectId {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    })
}

/// Three pages: headings and body text, a text page with an image, and a
/// page holding only a table.
fn sample_pdf(mod_date: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        b"fake jpeg bytes".to_vec(),
    ));
    let fonts = || dictionary! { "Font" => dictionary! { "F1" => font_id } };

    let page1 = add_page(
        &mut doc,
        pages_id,
        fonts(),
        text_ops(&[
            Text("Introduction", 72.0, 740.0, 24),
            Text("This is the first paragraph.", 72.0, 700.0, 12),
            Text("Background", 72.0, 660.0, 18),
            Text("Some background text.", 72.0, 630.0, 12),
        ]),
    );

    let mut ops = text_ops(&[
        Text("more background on page two.", 72.0, 740.0, 12),
        Text("Methods", 72.0, 700.0, 24),
        Text("Method body text here.", 72.0, 670.0, 12),
    ]);
    ops.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![100.into(), 0.into(), 0.into(), 50.into(), 72.into(), 600.into()],
        ),
        Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
        Operation::new("Q", vec![]),
    ]);
    let mut resources = fonts();
    resources.set("XObject", dictionary! { "Im1" => image_id });
    let page2 = add_page(&mut doc, pages_id, resources, ops);

    let page3 = add_page(
        &mut doc,
        pages_id,
        fonts(),
        text_ops(&[
            Text("Name", 72.0, 700.0, 12),
            Text("Age", 200.0, 700.0, 12),
            Text("Alice", 72.0, 680.0, 12),
            Text("30", 200.0, 680.0, 12),
            Text("Bob", 72.0, 660.0, 12),
            Text("25", 200.0, 660.0, 12),
        ]),
    );

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page1.into(), page2.into(), page3.into()],
            "Count" => 3,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Sample Report"),
        "Author" => Object::string_literal("Research Team"),
        "CreationDate" => Object::string_literal("D:20230615143022+08'00'"),
        "ModDate" => Object::string_literal(mod_date),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn valid_pdf() -> Vec<u8> {
    sample_pdf("D:20240101000000Z")
}

const TABLE_TEXT: &str = "Name_Age\n{\"Name\":{\"0\":\"Alice\",\"1\":\"Bob\"},\"Age\":{\"0\":\"30\",\"1\":\"25\"}}\n";

#[test]
fn test_pages_become_markup() {
    let source = LopdfSource::from_bytes(&valid_pdf(), ParseOptions::default()).unwrap();
    assert_eq!(source.page_count(), 3);
    assert_eq!(source.total_pages(), 3);
    assert!((source.font_statistics().body_size - 12.0).abs() < 0.1);

    let first = source.page(0).unwrap();
    let tags: Vec<String> = first.tree.nodes.iter().map(|n| n.tag()).collect();
    assert_eq!(tags, ["h1", "p", "h2", "p"]);
    assert_eq!(first.table_text, "");

    let third = source.page(2).unwrap();
    assert!(third.tree.is_empty());
    assert_eq!(third.table_text, TABLE_TEXT);
}

#[test]
fn test_table_thresholds_come_from_options() {
    let options = ParseOptions::default().with_table_config(TableDetectorConfig {
        min_rows: 10,
        ..TableDetectorConfig::default()
    });
    let source = LopdfSource::from_bytes(&valid_pdf(), options).unwrap();

    let third = source.page(2).unwrap();
    assert_eq!(third.table_text, "");
    assert!(!third.tree.is_empty());
}

#[test]
fn test_segments_end_to_end() {
    let segments = split_bytes(&valid_pdf(), &SegmentOptions::default()).unwrap();
    let summary: Vec<(&str, Vec<&str>)> = segments
        .iter()
        .map(|s| (s.body_text.as_str(), s.titles()))
        .collect();

    assert_eq!(
        summary,
        [
            ("This is the first paragraph.", vec!["Introduction"]),
            (
                "Some background text.more background on page two.",
                vec!["Introduction", "Background"],
            ),
            ("Method body text here.", vec!["Methods"]),
        ]
    );

    // Each page's table text goes out with the first segment closed after it
    assert_eq!(segments[0].table_texts, [""]);
    assert_eq!(segments[1].table_texts, [""]);
    assert_eq!(segments[2].table_texts, [TABLE_TEXT]);
}

#[test]
fn test_file_metadata() {
    let segments = split_bytes(&valid_pdf(), &SegmentOptions::default()).unwrap();
    let metadata = segments[0].metadata();

    assert_eq!(metadata["format"], "PDF 1.5");
    assert_eq!(metadata["title"], "Sample Report");
    assert_eq!(metadata["author"], "Research Team");
    assert_eq!(metadata["creationDate"], "2023-06-15 14:30:22");
    assert_eq!(metadata["modDate"], "2024-01-01 00:00:00");
    assert_eq!(metadata["encryption"], "");
}

#[test]
fn test_malformed_date_policy() {
    let pdf = sample_pdf("D:2023XX15");

    let segments = split_bytes(&pdf, &SegmentOptions::default()).unwrap();
    assert_eq!(segments[0].file_metadata.get("modDate"), Some("D:2023XX15"));
    assert_eq!(
        segments[0].file_metadata.get("creationDate"),
        Some("2023-06-15 14:30:22")
    );

    let strict = split_bytes(&pdf, &SegmentOptions::new().strict());
    assert!(matches!(strict, Err(Error::MalformedDate { .. })));
}

#[test]
fn test_images_are_extracted() {
    let dir = TempDir::new().unwrap();
    let segments = PdfSplitter::new()
        .with_images(dir.path())
        .split_bytes(&valid_pdf())
        .unwrap();

    let methods = &segments[2];
    assert_eq!(methods.images.len(), 1);
    assert_eq!(methods.images[0].extension().unwrap(), "jpeg");
    assert_eq!(std::fs::read(&methods.images[0]).unwrap(), b"fake jpeg bytes");
    assert!(segments[..2].iter().all(|s| s.images.is_empty()));
}

#[test]
fn test_page_selection() {
    let segments = PdfSplitter::new()
        .with_pages(PageSelection::Range(1..=1))
        .split_bytes(&valid_pdf())
        .unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].titles(), ["Introduction", "Background"]);
    assert_eq!(segments[1].body_text, "Some background text.");

    let table_only = PdfSplitter::new()
        .with_pages(PageSelection::Pages(vec![3]))
        .split_bytes(&valid_pdf())
        .unwrap();
    assert!(table_only.is_empty());
}

#[test]
fn test_embedded_titles_and_chunks() {
    let options = SegmentOptions::new()
        .with_embed_titles(true)
        .with_splitter(pdfsplit::TextSplitter::new(30, 5).unwrap());
    let segments = split_bytes(&valid_pdf(), &options).unwrap();

    assert!(segments.iter().all(|s| s.body_text.chars().count() <= 30));
    assert!(segments[0].body_text.starts_with("Introduction"));
}

#[test]
fn test_channel_delivers_segments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.pdf");
    std::fs::write(&path, valid_pdf()).unwrap();

    let rx = segment_channel(&path, SegmentOptions::default());
    let segments: Vec<Segment> = rx.iter().collect::<pdfsplit::Result<_>>().unwrap();
    assert_eq!(segments.len(), 3);
}

#[test]
fn test_parallel_files() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("doc{i}.pdf"));
            std::fs::write(&path, valid_pdf()).unwrap();
            path
        })
        .collect();

    let results = pdfsplit::split_files_parallel(&paths, &SegmentOptions::default());
    assert_eq!(results.len(), 3);
    for result in results {
        assert_eq!(result.unwrap().len(), 3);
    }
}
