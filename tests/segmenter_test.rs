//! Integration tests for the segmentation state machine.

use pdfsplit::model::{FileMetadata, MarkupNode, MarkupTree, Segment};
use pdfsplit::parser::{MemorySource, PageContent};
use pdfsplit::{Result, SegmentOptions, Segmenter, Segments};

fn page(nodes: Vec<MarkupNode>) -> PageContent {
    page_with_tables(nodes, "")
}

fn page_with_tables(nodes: Vec<MarkupNode>, tables: &str) -> PageContent {
    PageContent::new(nodes.into_iter().collect::<MarkupTree>(), tables)
}

fn run(pages: Vec<PageContent>, options: &SegmentOptions) -> Vec<Segment> {
    Segments::new(MemorySource::new(pages), options)
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

fn h(level: u8, text: &str) -> MarkupNode {
    MarkupNode::heading(level, text)
}

fn p(text: &str) -> MarkupNode {
    MarkupNode::paragraph(text)
}

#[test]
fn test_paragraphs_concatenate_without_separator() {
    let segments = run(vec![page(vec![p("A"), p("B")])], &SegmentOptions::default());

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].body_text, "AB");
    assert!(segments[0].heading_path.is_empty());
}

#[test]
fn test_no_data_loss_across_page_boundary() {
    let segments = run(
        vec![
            page(vec![p("X"), p("Y")]),
            page(vec![h(1, "T"), p("Z")]),
        ],
        &SegmentOptions::default(),
    );

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].body_text, "XY");
    assert!(segments[0].heading_path.is_empty());
    assert_eq!(segments[1].body_text, "Z");
    assert_eq!(segments[1].titles(), ["T"]);
}

#[test]
fn test_flush_uses_context_before_the_heading() {
    let segments = run(
        vec![page(vec![
            h(1, "Intro"),
            h(2, "Scope"),
            p("scope text"),
            h(1, "Usage"),
            p("usage text"),
        ])],
        &SegmentOptions::default(),
    );

    assert_eq!(segments[0].titles(), ["Intro", "Scope"]);
    assert_eq!(segments[1].titles(), ["Usage"]);
}

#[test]
fn test_end_of_input_uses_full_stack() {
    let segments = run(
        vec![page(vec![h(1, "Top"), p("intro"), h(2, "Sub"), p("tail")])],
        &SegmentOptions::default(),
    );

    let last = segments.last().unwrap();
    assert_eq!(last.body_text, "tail");
    assert_eq!(last.titles(), ["Top", "Sub"]);
}

#[test]
fn test_skipped_levels_stay_in_the_path() {
    let options = SegmentOptions::new().with_embed_titles(true);
    let segments = run(vec![page(vec![h(1, "A"), h(3, "C"), p("x")])], &options);

    let segment = &segments[0];
    assert_eq!(
        segment.heading_path,
        [Some("A".to_string()), None, Some("C".to_string())]
    );
    assert_eq!(segment.metadata()["titles"], serde_json::json!(["A", null, "C"]));
    assert_eq!(segment.body_text, "A\nC\n\nx");
}

#[test]
fn test_consecutive_headings_update_context_only() {
    let segments = run(
        vec![page(vec![h(1, "A"), h(1, "B"), h(2, "C"), p("body")])],
        &SegmentOptions::default(),
    );

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].titles(), ["B", "C"]);
}

#[test]
fn test_no_segment_without_text() {
    assert!(run(vec![], &SegmentOptions::default()).is_empty());
    assert!(run(vec![page(vec![h(1, "Only a heading")])], &SegmentOptions::default()).is_empty());
}

#[test]
fn test_title_embedding_round_trip() {
    let options = SegmentOptions::new().with_embed_titles(true);
    let segments = run(
        vec![page(vec![h(1, "A"), h(2, "B"), p("body"), h(1, "C"), p("more")])],
        &options,
    );

    for segment in &segments {
        let prefix = format!("{}\n\n", segment.titles().join("\n"));
        assert!(segment.body_text.starts_with(&prefix));
    }
    assert_eq!(segments[0].body_text, "A\nB\n\nbody");
    assert_eq!(segments[1].body_text, "C\n\nmore");

    let untitled = run(vec![page(vec![p("plain")])], &options);
    assert_eq!(untitled[0].body_text, "\n\nplain");
}

#[test]
fn test_tables_ride_along_across_pages() {
    let segments = run(
        vec![
            page_with_tables(vec![h(1, "A"), p("one")], "t1\n{}\n"),
            page_with_tables(vec![p("two")], "t2\n{}\n"),
            page_with_tables(vec![p("three"), h(1, "B"), p("four")], ""),
        ],
        &SegmentOptions::default(),
    );

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].body_text, "onetwothree");
    assert_eq!(segments[0].table_texts, ["t1\n{}\n", "t2\n{}\n", ""]);
    // The last page's table text went out with the first segment
    assert!(segments[1].table_texts.is_empty());
}

#[test]
fn test_metadata_surface() {
    let metadata: FileMetadata = [("title", "Report"), ("creationDate", "2023-06-15 14:30:22")]
        .into_iter()
        .collect();
    let source = MemorySource::new(vec![page_with_tables(vec![h(1, "H"), p("x")], "T\n{}\n")])
        .with_metadata(metadata);

    let segment = Segments::new(source, &SegmentOptions::default())
        .next()
        .unwrap()
        .unwrap();
    let surface = segment.metadata();

    assert_eq!(surface["titles"], serde_json::json!(["H"]));
    assert_eq!(surface["images"], serde_json::json!([]));
    assert_eq!(surface["table"], serde_json::json!(["T\n{}\n"]));
    assert_eq!(surface["title"], "Report");
    assert_eq!(surface["creationDate"], "2023-06-15 14:30:22");
}

#[test]
fn test_early_abandonment_is_safe() {
    let pages: Vec<PageContent> = (0..50)
        .map(|i| page(vec![h(1, &format!("Section {i}")), p("text")]))
        .collect();
    let source = MemorySource::new(pages);

    let mut segments = Segments::new(&source, &SegmentOptions::default());
    let first = segments.next().unwrap().unwrap();
    assert_eq!(first.titles(), ["Section 0"]);

    // Only the pages needed for the first segment were read
    assert_eq!(segments.segmenter().heading_stack().titles(), ["Section 1"]);
    drop(segments);

    let all = Segments::new(&source, &SegmentOptions::default()).count();
    assert_eq!(all, 50);
}

#[test]
fn test_segmenter_driven_by_hand() {
    let mut segmenter = Segmenter::new(&SegmentOptions::default(), FileMetadata::new());
    segmenter.begin_page("");

    let mut emitted = Vec::new();
    for node in [h(1, "A"), p("a"), h(3, "C"), p("c"), h(2, "B")] {
        emitted.extend(segmenter.feed(node).unwrap());
    }
    emitted.extend(segmenter.finish());

    let paths: Vec<_> = emitted.iter().map(|s| s.heading_path.clone()).collect();
    assert_eq!(
        paths,
        [
            vec![Some("A".to_string())],
            vec![Some("A".to_string()), None, Some("C".to_string())],
        ]
    );
    assert_eq!(segmenter.heading_stack().titles(), ["A", "B"]);
}
