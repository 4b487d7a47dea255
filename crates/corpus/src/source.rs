//! Source document abstraction.
//!
//! The pipeline only needs two things from the source PDF: its navigational
//! outline and per-page text. Both are behind [`DocumentSource`] so the
//! extraction stage can run against a pre-extracted JSON dump in production
//! and an in-memory fixture in tests; PDF parsing itself stays outside this
//! crate.

use std::path::Path;

use serde::Deserialize;

use lexrag_core::{AppError, AppResult};

use crate::types::OutlineEntry;

/// Read-only view of the source document.
pub trait DocumentSource {
    /// The navigational outline, in document order.
    fn outline(&self) -> AppResult<Vec<OutlineEntry>>;

    /// Extractable text of one page. `page_index` is zero-based.
    fn page_text(&self, page_index: u32) -> AppResult<String>;

    /// Total number of pages.
    fn page_count(&self) -> u32;
}

/// Document dump file layout: outline triples plus per-page text, as
/// produced by a small extraction script against the source PDF.
#[derive(Debug, Deserialize)]
struct DocumentDump {
    /// `(level, title, page)` triples; pages are 1-based
    outline: Vec<(u32, String, u32)>,

    /// Page text, index 0 = first page
    pages: Vec<String>,
}

/// A [`DocumentSource`] backed by a JSON dump on disk.
#[derive(Debug)]
pub struct JsonDocumentSource {
    outline: Vec<OutlineEntry>,
    pages: Vec<String>,
}

impl JsonDocumentSource {
    /// Load a document dump from a JSON file.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Corpus(format!("Failed to read document dump {:?}: {}", path, e))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a document dump from a JSON string.
    pub fn from_json(contents: &str) -> AppResult<Self> {
        let dump: DocumentDump = serde_json::from_str(contents)
            .map_err(|e| AppError::Corpus(format!("Invalid document dump: {}", e)))?;

        let outline = dump
            .outline
            .into_iter()
            .map(|(level, title, page)| OutlineEntry { level, title, page })
            .collect();

        Ok(Self {
            outline,
            pages: dump.pages,
        })
    }

    /// Build a source directly from parts; used by tests.
    pub fn from_parts(outline: Vec<OutlineEntry>, pages: Vec<String>) -> Self {
        Self { outline, pages }
    }
}

impl DocumentSource for JsonDocumentSource {
    fn outline(&self) -> AppResult<Vec<OutlineEntry>> {
        Ok(self.outline.clone())
    }

    fn page_text(&self, page_index: u32) -> AppResult<String> {
        self.pages
            .get(page_index as usize)
            .cloned()
            .ok_or_else(|| AppError::Corpus(format!("Page {} out of range", page_index)))
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let raw = r#"{
            "outline": [[1, "§ 1. Law A", 1], [3, "Artículo 1. Foo", 1]],
            "pages": ["primera página", "segunda página"]
        }"#;
        let source = JsonDocumentSource::from_json(raw).unwrap();

        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_text(1).unwrap(), "segunda página");

        let outline = source.outline().unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].level, 1);
        assert_eq!(outline[1].title, "Artículo 1. Foo");
    }

    #[test]
    fn test_page_out_of_range() {
        let source = JsonDocumentSource::from_parts(Vec::new(), vec!["una".to_string()]);
        assert!(source.page_text(3).is_err());
    }

    #[test]
    fn test_invalid_dump() {
        assert!(JsonDocumentSource::from_json("{}").is_err());
        assert!(JsonDocumentSource::from_json("not json").is_err());
    }
}
