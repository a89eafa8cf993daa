//! Benchmarks for segmentation throughput.
//!
//! Run with: cargo bench
//!
//! Pages are built in memory so only the state machine and the
//! surrounding iterator are measured.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfsplit::model::{MarkupNode, MarkupTree};
use pdfsplit::parser::{MemorySource, PageContent};
use pdfsplit::{SegmentOptions, Segments, TextSplitter};

/// Creates pages with a few headings and many paragraphs each.
fn create_test_pages(page_count: usize) -> Vec<PageContent> {
    (0..page_count)
        .map(|i| {
            let mut nodes = vec![MarkupNode::heading(1, format!("Chapter {}", i + 1))];
            for section in 0..4 {
                nodes.push(MarkupNode::heading(2, format!("Section {}.{}", i + 1, section)));
                for _ in 0..8 {
                    nodes.push(MarkupNode::paragraph(
                        "Benchmark paragraph text for segmentation throughput measurement. ",
                    ));
                }
            }
            PageContent::new(nodes.into_iter().collect::<MarkupTree>(), "")
        })
        .collect()
}

/// Benchmark segmentation at various sizes.
fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    for page_count in [1, 10, 100].iter() {
        let source = MemorySource::new(create_test_pages(*page_count));
        let options = SegmentOptions::default();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| Segments::new(black_box(&source), &options).count());
        });
    }

    group.finish();
}

/// Benchmark segmentation with titles embedded and chunking enabled.
fn bench_chunking(c: &mut Criterion) {
    let source = MemorySource::new(create_test_pages(10));
    let options = SegmentOptions::new().with_embed_titles(true);

    c.bench_function("chunked_10_pages", |b| {
        b.iter(|| {
            Segments::new(black_box(&source), &options)
                .chunked(TextSplitter::new(200, 20).unwrap())
                .count()
        });
    });
}

criterion_group!(benches, bench_segmentation, bench_chunking);
criterion_main!(benches);
