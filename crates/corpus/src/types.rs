//! Corpus type definitions.
//!
//! The pipeline flows outline entries and page text into law spans, article
//! spans, and finally chunks. Chunks are immutable once assembled; the
//! enrichment and indexing stages attach fields without mutating the
//! original four.

use serde::{Deserialize, Serialize};

/// A navigational table-of-contents node from the source document.
///
/// Level 1 is a law, level 2 a structural division (LIBRO, TÍTULO,
/// CAPÍTULO, ...), level 3 an article. Read-only after extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
}

impl OutlineEntry {
    pub fn new(level: u32, title: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }
}

/// Page window of one law within the document.
///
/// `end_page` is exclusive: the end page of law *i* is the start page of law
/// *i+1*, and the last law runs to `page_count + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LawSpan {
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
}

impl LawSpan {
    /// Human-readable page range, e.g. `"641-717"`.
    pub fn page_range(&self) -> String {
        format!("{}-{}", self.start_page, self.end_page.saturating_sub(1))
    }
}

/// A contiguous text region belonging to one article or disposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSpan {
    /// Raw law title (still carries the `§ N.` marker)
    pub law_title: String,

    /// Article or disposition title, possibly suffixed `"(parte N)"`
    pub section_title: String,

    /// Cleaned multi-line text
    pub text: String,

    /// Page range, only set for whole-law fallback spans
    pub pages: Option<String>,
}

/// Final retrieval unit combining cleaned text with its resolved
/// legal-hierarchy context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Law title with the leading `§ N.` marker stripped
    pub law: String,

    /// Hierarchy path joined by `" > "`, empty when unmatched
    pub chapter: String,

    /// Article title, unique within a law except for `"(parte N)"` splits
    pub section: String,

    /// Single-line-per-paragraph cleaned text, at least 30 chars
    pub text: String,

    /// Page range, only present on whole-law fallback chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
}

/// Structured annotation produced by the enrichment stage.
///
/// All fields default to empty so a malformed or missing model response
/// degrades to an empty annotation instead of failing the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAnnotation {
    /// 1-2 sentence plain-Spanish summary
    #[serde(default)]
    pub resumen: String,

    /// 5-8 key concepts for semantic search
    #[serde(default)]
    pub palabras_clave: Vec<String>,

    /// 3-4 questions this article answers
    #[serde(default)]
    pub preguntas: Vec<String>,
}

impl ChunkAnnotation {
    /// Fixed annotation for chunks too short to be worth a model call.
    pub fn derogated() -> Self {
        Self {
            resumen: "Artículo derogado.".to_string(),
            palabras_clave: Vec::new(),
            preguntas: Vec::new(),
        }
    }

    /// Whether the annotation carries a usable summary.
    pub fn is_populated(&self) -> bool {
        !self.resumen.is_empty()
    }
}

/// A chunk together with its annotation, as persisted after enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,

    #[serde(flatten)]
    pub annotation: ChunkAnnotation,
}

/// End-of-run counts for the enrichment stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichSummary {
    /// Chunks annotated with a populated summary
    pub enriched: u32,

    /// Chunks that exhausted retries and got an empty annotation
    pub failed: u32,

    /// Chunks already present in the progress file at startup
    pub resumed: u32,
}

/// End-of-run counts for the indexing stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Documents accepted by the search store
    pub uploaded: u32,

    /// Documents rejected or lost to failed batches
    pub failed: u32,

    /// Chunks skipped because their identity was already uploaded
    pub skipped: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_law_span_page_range() {
        let span = LawSpan {
            title: "§ 1. Estatuto de los Trabajadores".to_string(),
            start_page: 35,
            end_page: 128,
        };
        assert_eq!(span.page_range(), "35-127");
    }

    #[test]
    fn test_chunk_pages_omitted_when_absent() {
        let chunk = Chunk {
            law: "Estatuto de los Trabajadores".to_string(),
            chapter: "TÍTULO I > CAPÍTULO I".to_string(),
            section: "Artículo 1. Ámbito de aplicación.".to_string(),
            text: "Esta ley será de aplicación a los trabajadores.".to_string(),
            pages: None,
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("pages"));
    }

    #[test]
    fn test_enriched_chunk_flattens() {
        let enriched = EnrichedChunk {
            chunk: Chunk {
                law: "Ley".to_string(),
                chapter: String::new(),
                section: "Artículo 1. X".to_string(),
                text: "Texto con suficiente longitud para ser un chunk.".to_string(),
                pages: None,
            },
            annotation: ChunkAnnotation {
                resumen: "Resumen.".to_string(),
                palabras_clave: vec!["clave".to_string()],
                preguntas: vec!["¿Qué regula?".to_string()],
            },
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["law"], "Ley");
        assert_eq!(value["resumen"], "Resumen.");
        assert_eq!(value["palabras_clave"][0], "clave");
    }

    #[test]
    fn test_annotation_defaults() {
        let parsed: ChunkAnnotation = serde_json::from_str(r#"{"resumen": "ok"}"#).unwrap();
        assert_eq!(parsed.resumen, "ok");
        assert!(parsed.palabras_clave.is_empty());
        assert!(parsed.is_populated());
        assert!(!ChunkAnnotation::default().is_populated());
    }
}
