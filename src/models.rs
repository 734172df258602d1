//! Core data models used throughout md-harness.
//!
//! These types represent the documents, chunks, and search results that flow
//! through the chunking and retrieval pipeline.

use serde::Serialize;

/// A raw document handed to the retrieval core by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier, used as [`Chunk::source_id`] (e.g. a relative path).
    pub source_id: String,
    /// Full UTF-8 text content.
    pub body: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            body: body.into(),
        }
    }

    /// Short summary of the document.
    ///
    /// Taken from a `description:` line in leading `---` frontmatter, or else
    /// the first non-empty paragraph with Markdown marker characters removed,
    /// cut to [`DESCRIPTION_MAX_CHARS`]. Frontmatter is read line by line as
    /// `key: value`, not as YAML.
    pub fn description(&self) -> Option<String> {
        let (frontmatter, body) = split_frontmatter(&self.body);

        let from_frontmatter = frontmatter.and_then(|fm| {
            fm.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                (key.trim() == "description").then(|| value.trim().to_string())
            })
        });
        if let Some(desc) = from_frontmatter.filter(|d| !d.is_empty()) {
            return Some(desc);
        }

        let paragraph = body.split("\n\n").map(str::trim).find(|p| !p.is_empty())?;
        let cleaned: String = paragraph
            .chars()
            .filter(|c| !MARKDOWN_MARKERS.contains(c))
            .take(DESCRIPTION_MAX_CHARS)
            .collect();
        let cleaned = cleaned.trim();
        (!cleaned.is_empty()).then(|| cleaned.to_string())
    }
}

/// Longest description returned by [`Document::description`], in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

const MARKDOWN_MARKERS: &[char] = &['#', '*', '_', '`', '[', ']', '(', ')'];

/// Split leading `---` frontmatter from the rest of the text.
fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let mut lines = text.split_inclusive('\n');
    let start = match lines.next() {
        Some(first) if first.trim_end() == "---" => first.len(),
        _ => return (None, text),
    };

    let mut offset = start;
    for line in lines {
        if line.trim_end() == "---" {
            return (Some(&text[start..offset]), &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Listing entry for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub source_id: String,
    pub description: String,
    /// Body length in bytes.
    pub size: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            source_id: doc.source_id.clone(),
            description: doc
                .description()
                .unwrap_or_else(|| format!("Markdown file: {}", doc.source_id)),
            size: doc.body.len(),
        }
    }
}

/// One retrievable slice of a document with its section lineage.
///
/// Chunks are produced once per chunking pass and never mutated; a changed
/// document is re-chunked from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Chunk text.
    pub content: String,
    /// Ancestor header titles joined by `" > "`, or `"(root)"`.
    pub header_path: String,
    /// Byte offset of the chunk start in the source document.
    pub start_char: usize,
    /// Byte offset one past the chunk end (half-open).
    pub end_char: usize,
    /// Identifier of the owning document.
    pub source_id: String,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A ranked search hit with a display snippet.
///
/// Recomputed for every query; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Owning document identifier.
    pub source_id: String,
    /// Section lineage of the matched chunk.
    pub header_path: String,
    /// A few lines around the first query match.
    pub snippet: String,
    /// Relevance score; scale depends on the strategy.
    pub score: f64,
    pub start_char: usize,
    pub end_char: usize,
    /// Position of the matched chunk in the session's chunk list.
    #[serde(skip)]
    pub chunk_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_from_first_paragraph() {
        let doc = Document::new("a.md", "\n\n# Title\n\nBody text.\n");
        assert_eq!(doc.description().as_deref(), Some("Title"));

        let doc = Document::new("b.md", "Use **bold** and `code` [links](x).\n\nSecond.");
        assert_eq!(doc.description().as_deref(), Some("Use bold and code linksx."));
    }

    #[test]
    fn test_description_from_frontmatter() {
        let doc = Document::new(
            "c.md",
            "---\ntitle: Deploy\ndescription: How we ship: safely\n---\n# Deploy\n\nSteps.\n",
        );
        assert_eq!(doc.description().as_deref(), Some("How we ship: safely"));

        // Frontmatter without a description falls through to the body.
        let doc = Document::new("d.md", "---\ntitle: X\n---\n\nFirst paragraph.\n");
        assert_eq!(doc.description().as_deref(), Some("First paragraph."));
    }

    #[test]
    fn test_description_length_and_empty() {
        let long = "é".repeat(DESCRIPTION_MAX_CHARS + 50);
        let doc = Document::new("e.md", long);
        assert_eq!(
            doc.description().map(|d| d.chars().count()),
            Some(DESCRIPTION_MAX_CHARS)
        );

        assert_eq!(Document::new("f.md", "  \n\n ").description(), None);
        let summary = DocumentSummary::from(&Document::new("f.md", ""));
        assert_eq!(summary.description, "Markdown file: f.md");
        assert_eq!(summary.size, 0);
    }

    #[test]
    fn test_unclosed_frontmatter_is_body() {
        let doc = Document::new("g.md", "---\ndescription: nope\nstill body");
        assert_eq!(doc.description().as_deref(), Some("---\ndescription: nope\nstill body"));
    }
}
