//! Markup nodes produced by a page backend.

use serde::{Deserialize, Serialize};

/// Deepest heading level tracked by the segmenter.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// The structured content of one page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupTree {
    /// Direct children of the page body
    pub nodes: Vec<MarkupNode>,
}

impl MarkupTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node.
    pub fn push(&mut self, node: MarkupNode) {
        self.nodes.push(node);
    }

    /// Number of nodes on the page.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the page produced no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<MarkupNode> for MarkupTree {
    fn from_iter<I: IntoIterator<Item = MarkupNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MarkupTree {
    type Item = MarkupNode;
    type IntoIter = std::vec::IntoIter<MarkupNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// A direct child of a page's markup tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkupNode {
    /// A heading at level 1-6
    Heading {
        /// Heading level (1 = top)
        level: u8,
        /// Heading text
        text: String,
    },

    /// A paragraph of inline content
    Paragraph(Vec<Inline>),

    /// Any other element (lists, captions, figures, ...)
    Other {
        /// Element name as reported by the backend
        tag: String,
        /// Text content of the element
        text: String,
    },
}

impl MarkupNode {
    /// Create a heading node; the level is clamped to 1-6.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        MarkupNode::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
            text: text.into(),
        }
    }

    /// Create a plain text paragraph.
    pub fn paragraph(text: impl Into<String>) -> Self {
        MarkupNode::Paragraph(vec![Inline::Text(text.into())])
    }

    /// Create a paragraph holding a single inline image.
    pub fn image(src: impl Into<String>) -> Self {
        MarkupNode::Paragraph(vec![Inline::Image { src: src.into() }])
    }

    /// Create an unsupported node.
    pub fn other(tag: impl Into<String>, text: impl Into<String>) -> Self {
        MarkupNode::Other {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Element name, html-style ("h2", "p", ...).
    pub fn tag(&self) -> String {
        match self {
            MarkupNode::Heading { level, .. } => format!("h{}", level),
            MarkupNode::Paragraph(_) => "p".to_string(),
            MarkupNode::Other { tag, .. } => tag.clone(),
        }
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, MarkupNode::Heading { .. })
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A run of text
    Text(String),

    /// An inline image; `src` is normally a `data:image/<ext>;base64,` URL
    Image {
        /// Image source
        src: String,
    },
}

/// Text of a paragraph; images contribute nothing.
pub fn paragraph_text(content: &[Inline]) -> String {
    content
        .iter()
        .filter_map(|inline| match inline {
            Inline::Text(text) => Some(text.as_str()),
            Inline::Image { .. } => None,
        })
        .collect()
}

/// Source of the first inline image in a paragraph, if any.
pub fn first_image(content: &[Inline]) -> Option<&str> {
    content.iter().find_map(|inline| match inline {
        Inline::Image { src } => Some(src.as_str()),
        Inline::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(MarkupNode::heading(9, "x").tag(), "h6");
        assert_eq!(MarkupNode::heading(0, "x").tag(), "h1");
    }

    #[test]
    fn test_paragraph_helpers() {
        let content = vec![
            Inline::Text("Hello ".to_string()),
            Inline::Image {
                src: "data:image/png;base64,AAAA".to_string(),
            },
            Inline::Text("world".to_string()),
        ];
        assert_eq!(paragraph_text(&content), "Hello world");
        assert_eq!(first_image(&content), Some("data:image/png;base64,AAAA"));
        assert_eq!(first_image(&[Inline::Text("x".into())]), None);
    }

    #[test]
    fn test_tree_collect() {
        let tree: MarkupTree = vec![MarkupNode::heading(1, "A"), MarkupNode::paragraph("b")]
            .into_iter()
            .collect();
        assert_eq!(tree.len(), 2);
        assert!(tree.nodes[0].is_heading());
        assert_eq!(MarkupNode::other("ul", "").tag(), "ul");
    }
}
