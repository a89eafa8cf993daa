//! Finished segments handed to consumers.

use std::path::PathBuf;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value};

use super::FileMetadata;

/// One logical document cut from a PDF at heading boundaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    /// Body text; prefixed with the heading path when titles are embedded
    pub body_text: String,

    /// Headings in effect when the segment closed, one entry per level from
    /// level 1 down; `None` marks a level that was never set
    pub heading_path: Vec<Option<String>>,

    /// Stored image files collected since the previous segment
    pub images: Vec<PathBuf>,

    /// Table text of every page the segment's window touched
    pub table_texts: Vec<String>,

    /// Normalized document metadata
    pub file_metadata: FileMetadata,
}

impl Segment {
    /// Metadata surface: `titles`, `images`, `table`, plus every file
    /// metadata key at the top level.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert(
            "titles".to_string(),
            Value::Array(
                self.heading_path
                    .iter()
                    .map(|title| title.clone().map_or(Value::Null, Value::String))
                    .collect(),
            ),
        );
        object.insert(
            "images".to_string(),
            Value::from(
                self.images
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
            ),
        );
        object.insert("table".to_string(), Value::from(self.table_texts.clone()));
        self.file_metadata.merge_into(&mut object);
        object
    }

    /// Set heading texts, outermost first.
    pub fn titles(&self) -> Vec<&str> {
        self.heading_path.iter().flatten().map(String::as_str).collect()
    }

    /// Innermost heading, if any.
    pub fn title(&self) -> Option<&str> {
        self.heading_path.iter().rev().flatten().next().map(String::as_str)
    }

    /// Check if the body text is empty.
    pub fn is_empty(&self) -> bool {
        self.body_text.is_empty()
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Segment", 2)?;
        state.serialize_field("page_content", &self.body_text)?;
        state.serialize_field("metadata", &self.metadata())?;
        state.end()
    }
}

/// Prefix a body with its set headings and a blank line.
///
/// Unset levels are skipped.
pub fn embed_titles(heading_path: &[Option<String>], body: &str) -> String {
    let titles: Vec<&str> = heading_path.iter().flatten().map(String::as_str).collect();
    format!("{}\n\n{}", titles.join("\n"), body)
}
