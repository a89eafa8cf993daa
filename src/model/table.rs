//! Table descriptors and their text serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Prefix of the generic labels given to columns without a header cell.
pub const GENERIC_COLUMN_PREFIX: &str = "Col";

/// A table detected on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// One entry per column; `None` when the header cell is empty
    pub header: Vec<Option<String>>,

    /// Body rows, one optional cell value per column
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableDescriptor {
    /// Create a table from a header and body rows.
    pub fn new(header: Vec<Option<String>>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { header, rows }
    }

    /// Create a table without a header row; columns get generic labels.
    pub fn headless(rows: Vec<Vec<Option<String>>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            header: generic_header(columns),
            rows,
        }
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    /// Number of body rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table name: the meaningful header cells joined by underscores.
    ///
    /// Empty header cells and generic `Col` labels are skipped.
    pub fn name(&self) -> String {
        self.header
            .iter()
            .flatten()
            .filter(|name| !name.contains(GENERIC_COLUMN_PREFIX))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Compact column-oriented JSON: `{"<column>":{"0":v,"1":v}}`.
    ///
    /// Columns whose cells are all empty are dropped.
    pub fn to_json(&self) -> Result<String> {
        let mut object = Map::new();

        for col in 0..self.column_count() {
            let cells: Vec<Option<&String>> = self
                .rows
                .iter()
                .map(|row| row.get(col).and_then(Option::as_ref))
                .collect();

            if cells.iter().all(Option::is_none) {
                continue;
            }

            let mut label = self
                .header
                .get(col)
                .cloned()
                .flatten()
                .unwrap_or_else(|| generic_label(col));
            if object.contains_key(&label) {
                label = generic_label(col);
            }

            let column: Map<String, Value> = cells
                .into_iter()
                .enumerate()
                .map(|(i, cell)| {
                    let value = cell.map_or(Value::Null, |s| Value::String(s.clone()));
                    (i.to_string(), value)
                })
                .collect();
            object.insert(label, Value::Object(column));
        }

        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    /// Name and body, each followed by a newline.
    pub fn to_text(&self) -> Result<String> {
        Ok(format!("{}\n{}\n", self.name(), self.to_json()?))
    }
}

/// Concatenated text of every table on a page; empty if there are none.
pub fn page_table_text(tables: &[TableDescriptor]) -> Result<String> {
    let mut text = String::new();
    for table in tables {
        text.push_str(&table.to_text()?);
    }
    Ok(text)
}

/// Generic header of `columns` labels: `Col1`, `Col2`, ...
pub fn generic_header(columns: usize) -> Vec<Option<String>> {
    (0..columns).map(|i| Some(generic_label(i))).collect()
}

fn generic_label(col: usize) -> String {
    format!("{}{}", GENERIC_COLUMN_PREFIX, col + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_name_skips_generic_and_empty() {
        let table = TableDescriptor::new(
            vec![cell("Name"), None, cell("Col3"), cell("Age")],
            vec![],
        );
        assert_eq!(table.name(), "Name_Age");

        let headless = TableDescriptor::headless(vec![vec![cell("a"), cell("b")]]);
        assert_eq!(headless.name(), "");
    }

    #[test]
    fn test_json_is_column_oriented() {
        let table = TableDescriptor::new(
            vec![cell("Name"), cell("Age")],
            vec![vec![cell("Alice"), cell("30")], vec![cell("Bob"), None]],
        );
        assert_eq!(
            table.to_json().unwrap(),
            r#"{"Name":{"0":"Alice","1":"Bob"},"Age":{"0":"30","1":null}}"#
        );
    }

    #[test]
    fn test_json_drops_fully_null_columns() {
        let table = TableDescriptor::new(
            vec![cell("A"), cell("Empty"), cell("B")],
            vec![vec![cell("1"), None, cell("2")], vec![cell("3"), None]],
        );
        assert_eq!(
            table.to_json().unwrap(),
            r#"{"A":{"0":"1","1":"3"},"B":{"0":"2","1":null}}"#
        );
    }

    #[test]
    fn test_json_keeps_non_ascii_and_row_order() {
        let rows: Vec<Vec<Option<String>>> = (0..12).map(|i| vec![cell(&i.to_string())]).collect();
        let table = TableDescriptor::new(vec![cell("名称")], rows);
        let json = table.to_json().unwrap();
        assert!(json.starts_with(r#"{"名称":{"0":"0","1":"1","2":"2""#));
        assert!(json.ends_with(r#""10":"10","11":"11"}}"#));
    }

    #[test]
    fn test_duplicate_labels_fall_back_to_generic() {
        let table = TableDescriptor::new(
            vec![cell("X"), cell("X")],
            vec![vec![cell("1"), cell("2")]],
        );
        assert_eq!(table.to_json().unwrap(), r#"{"X":{"0":"1"},"Col2":{"0":"2"}}"#);
    }

    #[test]
    fn test_page_table_text() {
        assert_eq!(page_table_text(&[]).unwrap(), "");

        let t1 = TableDescriptor::new(vec![cell("K")], vec![vec![cell("v")]]);
        let t2 = TableDescriptor::headless(vec![vec![cell("x")]]);
        assert_eq!(
            page_table_text(&[t1, t2]).unwrap(),
            "K\n{\"K\":{\"0\":\"v\"}}\n\n{\"Col1\":{\"0\":\"x\"}}\n"
        );
    }
}
