//! Table detection from text positions (Stream mode).
//!
//! Tables are found by looking for runs of rows whose spans start at the same
//! X positions. No ruling lines are needed.

use std::collections::{HashMap, HashSet};

use crate::model::TableDescriptor;

use super::layout::TextSpan;

/// A table region found on a page.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Left edges of the columns, ascending
    pub columns: Vec<f32>,
    /// Rows from top to bottom
    pub rows: Vec<DetectedRow>,
    /// Rightmost extent of any span in the table
    pub right_x: f32,
}

/// One row of a detected table.
#[derive(Debug, Clone)]
pub struct DetectedRow {
    /// Average baseline of the row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Width of the buckets left edges are snapped to.
const EDGE_BUCKET: f32 = 5.0;

/// Rows of span indices, used while scanning.
#[derive(Debug, Clone)]
struct RowIndex {
    y: f32,
    members: Vec<usize>,
}

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans.
    ///
    /// Returns the tables and the spans that are not part of any table.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return (Vec::new(), spans);
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            return (Vec::new(), spans);
        }

        let columns = self.detect_columns(&rows, &spans);
        if columns.len() < self.config.min_columns {
            return (Vec::new(), spans);
        }

        let mut tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start, end) in self.find_table_regions(&rows, &columns, &spans) {
            let region = &rows[start..=end];

            // Columns are re-detected for the region alone
            let region_columns = self.detect_columns(region, &spans);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(region, &region_columns, &spans) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            let rows: Vec<DetectedRow> = region
                .iter()
                .map(|row| DetectedRow {
                    y: row.y,
                    spans: row.members.iter().map(|&i| spans[i].clone()).collect(),
                })
                .collect();
            let right_x = rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(|s| s.x + s.width)
                .fold(0.0_f32, f32::max);

            used.extend(region.iter().flat_map(|r| r.members.iter().copied()));
            tables.push(DetectedTable {
                columns: region_columns,
                rows,
                right_x,
            });
        }

        log::debug!("TableDetector: {} tables from {} spans", tables.len(), spans.len());

        let unused = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, span)| span)
            .collect();

        (tables, unused)
    }

    /// Group span indices into rows by Y position, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<RowIndex> {
        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by(|&a, &b| {
            spans[b]
                .y
                .partial_cmp(&spans[a].y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    spans[a]
                        .x
                        .partial_cmp(&spans[b].x)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let finish = |members: Vec<usize>| RowIndex {
            y: members.iter().map(|&i| spans[i].y).sum::<f32>() / members.len() as f32,
            members,
        };

        let mut rows = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_y: Option<f32> = None;

        for i in order {
            let span = &spans[i];
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(i),
                _ => {
                    if !current.is_empty() {
                        rows.push(finish(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(i);
                }
            }
        }
        if !current.is_empty() {
            rows.push(finish(current));
        }

        rows
    }

    /// Column left edges shared by enough rows.
    ///
    /// Rows with two or more spans are preferred; when there are too few of
    /// them every row votes.
    fn detect_columns(&self, rows: &[RowIndex], spans: &[TextSpan]) -> Vec<f32> {
        let multi: Vec<&RowIndex> = rows.iter().filter(|r| r.members.len() >= 2).collect();
        let voters: Vec<&RowIndex> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };
        if voters.is_empty() {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            let buckets: HashSet<i32> = row
                .members
                .iter()
                .map(|&i| (spans[i].x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous row ranges (inclusive) whose spans align with the columns.
    fn find_table_regions(
        &self,
        rows: &[RowIndex],
        columns: &[f32],
        spans: &[TextSpan],
    ) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = alignment_score(row, columns, spans) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_rows {
                        regions.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Numbered or bulleted lists split into marker and text spans look
    /// like two-column tables.
    fn is_list_pattern(&self, rows: &[RowIndex], columns: &[f32], spans: &[TextSpan]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullets = 0;
        let mut numbers = 0;
        for row in rows {
            let first = row.members.iter().map(|&i| &spans[i]).min_by(|a, b| {
                a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
            });
            if let Some(span) = first {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullets += 1;
                } else if is_number_marker(text) {
                    numbers += 1;
                }
            }
        }

        let bullet_ratio = bullets as f32 / rows.len() as f32;
        let marker_ratio = (bullets + numbers) as f32 / rows.len() as f32;

        // Numbered first columns are common in real tables wider than two
        bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
    }
}

impl DetectedTable {
    /// Convert into a table descriptor.
    ///
    /// The first row becomes the header when every cell in it holds
    /// non-numeric text; otherwise all rows are body rows and the columns get
    /// generic labels.
    pub fn to_descriptor(&self) -> TableDescriptor {
        let mut grid: Vec<Vec<Option<String>>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
                for span in &row.spans {
                    let col = column_for(span.x, &self.columns, self.right_x);
                    cells[col].push(span.text.trim());
                }
                cells
                    .into_iter()
                    .map(|parts| {
                        let text = parts.join(" ");
                        (!text.is_empty()).then_some(text)
                    })
                    .collect()
            })
            .collect();

        let has_header = grid.len() > 1
            && grid[0]
                .iter()
                .all(|cell| cell.as_deref().is_some_and(|text| !is_numeric(text)));

        if has_header {
            let header = grid.remove(0);
            TableDescriptor::new(header, grid)
        } else {
            TableDescriptor::headless(grid)
        }
    }
}

/// Index of the column a span starting at `x` belongs to.
fn column_for(x: f32, columns: &[f32], right_x: f32) -> usize {
    // Spans may start slightly before their column edge
    const SLACK: f32 = 10.0;

    columns
        .iter()
        .enumerate()
        .position(|(i, &start)| {
            let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
            x >= start - SLACK && x < end - SLACK
        })
        .unwrap_or_else(|| {
            columns
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (x - **a)
                        .abs()
                        .partial_cmp(&(x - **b).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map_or(0, |(i, _)| i)
        })
}

/// Fraction of a row's spans that start on a column edge.
fn alignment_score(row: &RowIndex, columns: &[f32], spans: &[TextSpan]) -> f32 {
    if row.members.is_empty() || columns.is_empty() {
        return 0.0;
    }

    let aligned = row
        .members
        .iter()
        .filter(|&&i| columns.iter().any(|col| (spans[i].x - col).abs() <= EDGE_BUCKET))
        .count();
    aligned as f32 / row.members.len() as f32
}

fn is_numeric(text: &str) -> bool {
    text.replace([',', '%'], "").trim().parse::<f64>().is_ok()
}

/// Bullet markers (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※"
            | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Number-style list markers (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest == "." || rest == ")") {
        return true;
    }

    // Letter marker: "a.", "B)"
    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}
