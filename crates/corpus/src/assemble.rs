//! Chunk assembly: joining article spans with their hierarchy context.
//!
//! Spans arrive keyed by raw law title and section title; the hierarchy map
//! is keyed by raw law title and normalized article title. The two are
//! re-synchronized by fuzzy title matching with three tiers of confidence;
//! an unmatched span is kept with an empty chapter (soft degradation), but
//! counted against the data-quality metric.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{join_lines, normalize_title};
use crate::outline::HierarchyMap;
use crate::segment::{FULL_TEXT_SECTION, PREAMBLE_SECTION};
use crate::types::{ArticleSpan, Chunk};

/// Emitted chunks must carry at least this much text.
const MIN_CHUNK_CHARS: usize = 30;

/// How many unmatched section titles to keep as diagnostic examples.
const MAX_UNMATCHED_EXAMPLES: usize = 5;

static LAW_NUMBER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^§\s*\d+\.\s*").expect("invalid pattern"));

static PART_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(parte \d+\)$").expect("invalid pattern"));

static ARTICLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Art[ií]culo\s+\d+[a-z]?(?:\s+bis|\s+ter|\s+qu[aá]ter)?\.)")
        .expect("invalid pattern")
});

static DISPOSITION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Disposici[oó]n\s+\w+\s+\w+)").expect("invalid pattern"));

/// Outcome of a chapter lookup, in decreasing order of confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterMatch {
    /// Exact hit on `(law, normalized section title)`
    Exact(String),

    /// Matched another outline article sharing the `"Artículo N."` prefix
    ArticlePrefix(String),

    /// Matched a disposition sharing the `"Disposición <kind> <id>"` prefix
    DispositionPrefix(String),

    /// No hierarchy context found; chapter stays empty
    Unmatched,
}

impl ChapterMatch {
    /// The resolved path, or the empty string when unmatched.
    pub fn path(&self) -> &str {
        match self {
            Self::Exact(path) | Self::ArticlePrefix(path) | Self::DispositionPrefix(path) => path,
            Self::Unmatched => "",
        }
    }

    pub fn is_matched(&self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

/// Resolve the chapter path for one section title within a law.
///
/// Lookup tiers: exact key match first; then a scan for any article in the
/// same law sharing the section's article-number prefix; then the same for
/// disposition prefixes (case-insensitive, since disposition casing varies
/// between outline and body text).
pub fn resolve_chapter(map: &HierarchyMap, law_raw: &str, section: &str) -> ChapterMatch {
    let sec_norm = normalize_title(section);
    let sec_norm = PART_SUFFIX.replace(&sec_norm, "").trim().to_string();

    if let Some(path) = map.get_exact(law_raw, &sec_norm) {
        return ChapterMatch::Exact(path.to_string());
    }

    if let Some(caps) = ARTICLE_PREFIX.captures(&sec_norm) {
        let prefix = caps.get(1).expect("group 1 always present").as_str();
        if let Some(path) = map.find_article_prefix(law_raw, prefix) {
            return ChapterMatch::ArticlePrefix(path.to_string());
        }
    }

    if let Some(caps) = DISPOSITION_PREFIX.captures(&sec_norm) {
        let prefix = caps.get(1).expect("group 1 always present").as_str();
        if let Some(path) = map.find_prefix_ignore_case(law_raw, &prefix.to_lowercase()) {
            return ChapterMatch::DispositionPrefix(path.to_string());
        }
    }

    ChapterMatch::Unmatched
}

/// Strip the leading `§ N.` marker from a law title.
pub fn clean_law_title(law: &str) -> String {
    LAW_NUMBER_MARKER.replace(law, "").trim().to_string()
}

/// Chapter-match diagnostics for one assembly run.
///
/// Preamble and whole-law fallback spans are excluded: they have no outline
/// entry to match by construction.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub matched: u32,
    pub unmatched: u32,
    pub examples: Vec<String>,
}

impl MatchReport {
    /// Fraction of eligible chunks with resolved chapter context.
    pub fn match_rate(&self) -> f64 {
        let total = self.matched + self.unmatched;
        if total == 0 {
            return 1.0;
        }
        f64::from(self.matched) / f64::from(total)
    }

    /// Data-quality target for a healthy extraction run.
    pub fn meets_target(&self) -> bool {
        self.match_rate() > 0.9
    }
}

/// Assemble final chunks from article spans and the hierarchy map.
///
/// Spans below the minimum text length after line-joining are discarded as
/// noise. Everything else is kept, chapter context or not.
pub fn assemble(spans: &[ArticleSpan], hierarchy: &HierarchyMap) -> (Vec<Chunk>, MatchReport) {
    let mut chunks = Vec::with_capacity(spans.len());
    let mut report = MatchReport::default();

    for span in spans {
        let text = join_lines(&span.text);
        if text.chars().count() < MIN_CHUNK_CHARS {
            continue;
        }

        let structural =
            span.section_title == PREAMBLE_SECTION || span.section_title == FULL_TEXT_SECTION;

        let matched = if structural {
            ChapterMatch::Unmatched
        } else {
            resolve_chapter(hierarchy, &span.law_title, &span.section_title)
        };

        if !structural {
            if matched.is_matched() {
                report.matched += 1;
            } else {
                report.unmatched += 1;
                if report.examples.len() < MAX_UNMATCHED_EXAMPLES {
                    report
                        .examples
                        .push(format!("{} | {}", span.law_title, span.section_title));
                }
            }
        }

        chunks.push(Chunk {
            law: clean_law_title(&span.law_title),
            chapter: matched.path().to_string(),
            section: span.section_title.clone(),
            text,
            pages: span.pages.clone(),
        });
    }

    tracing::info!(
        chunks = chunks.len(),
        matched = report.matched,
        unmatched = report.unmatched,
        match_rate = format!("{:.1}%", report.match_rate() * 100.0),
        "chunks assembled"
    );
    for example in &report.examples {
        tracing::debug!(example, "unmatched chapter");
    }

    (chunks, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::build_hierarchy;
    use crate::types::OutlineEntry;

    fn hierarchy() -> HierarchyMap {
        build_hierarchy(&[
            OutlineEntry::new(1, "§ 19. Ley General de la Seguridad Social", 1),
            OutlineEntry::new(2, "TÍTULO II", 1),
            OutlineEntry::new(2, "CAPÍTULO XIII", 1),
            OutlineEntry::new(3, "Artículo 205. Beneficiarios", 1),
            OutlineEntry::new(3, "Disposición transitoria cuarta. Aplicación paulatina", 9),
        ])
    }

    fn span(section: &str, text_chars: usize) -> ArticleSpan {
        ArticleSpan {
            law_title: "§ 19. Ley General de la Seguridad Social".to_string(),
            section_title: section.to_string(),
            text: "régimen jurídico de la jubilación. "
                .chars()
                .cycle()
                .take(text_chars)
                .collect(),
            pages: None,
        }
    }

    #[test]
    fn test_exact_match() {
        let m = resolve_chapter(
            &hierarchy(),
            "§ 19. Ley General de la Seguridad Social",
            "Artículo 205. Beneficiarios",
        );
        assert_eq!(m, ChapterMatch::Exact("TÍTULO II > CAPÍTULO XIII".to_string()));
    }

    #[test]
    fn test_part_suffix_stripped_before_lookup() {
        let m = resolve_chapter(
            &hierarchy(),
            "§ 19. Ley General de la Seguridad Social",
            "Artículo 205. Beneficiarios (parte 2)",
        );
        assert!(m.is_matched());
    }

    #[test]
    fn test_article_prefix_fallback() {
        // Body text title differs from outline title after the number
        let m = resolve_chapter(
            &hierarchy(),
            "§ 19. Ley General de la Seguridad Social",
            "Artículo 205. Beneficiarios de la pensión de jubilación",
        );
        assert_eq!(
            m,
            ChapterMatch::ArticlePrefix("TÍTULO II > CAPÍTULO XIII".to_string())
        );
    }

    #[test]
    fn test_disposition_prefix_fallback_case_insensitive() {
        let m = resolve_chapter(
            &hierarchy(),
            "§ 19. Ley General de la Seguridad Social",
            "disposición transitoria cuarta. Normas transitorias sobre pensión",
        );
        assert_eq!(
            m,
            ChapterMatch::DispositionPrefix("TÍTULO II > CAPÍTULO XIII".to_string())
        );
    }

    #[test]
    fn test_unmatched() {
        let m = resolve_chapter(
            &hierarchy(),
            "§ 19. Ley General de la Seguridad Social",
            "Artículo 999. Inexistente",
        );
        assert_eq!(m, ChapterMatch::Unmatched);
        assert_eq!(m.path(), "");
    }

    #[test]
    fn test_clean_law_title() {
        assert_eq!(
            clean_law_title("§ 71. Texto refundido de la Ley General"),
            "Texto refundido de la Ley General"
        );
        assert_eq!(clean_law_title("Sin marcador"), "Sin marcador");
    }

    #[test]
    fn test_assemble_keeps_unmatched_chunks() {
        let spans = vec![
            span("Artículo 205. Beneficiarios", 200),
            span("Artículo 999. Inexistente", 200),
        ];
        let (chunks, report) = assemble(&spans, &hierarchy());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chapter, "TÍTULO II > CAPÍTULO XIII");
        assert_eq!(chunks[1].chapter, "");
        assert_eq!(chunks[1].law, "Ley General de la Seguridad Social");
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.examples.len(), 1);
    }

    #[test]
    fn test_assemble_drops_tiny_chunks() {
        let spans = vec![span("Artículo 205. Beneficiarios", 10)];
        let (chunks, _) = assemble(&spans, &hierarchy());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_structural_sections_excluded_from_metric() {
        let spans = vec![
            span(crate::segment::PREAMBLE_SECTION, 300),
            span(crate::segment::FULL_TEXT_SECTION, 300),
        ];
        let (chunks, report) = assemble(&spans, &hierarchy());

        assert_eq!(chunks.len(), 2);
        assert_eq!(report.matched + report.unmatched, 0);
        assert_eq!(report.match_rate(), 1.0);
    }

    #[test]
    fn test_assemble_applies_line_join() {
        let mut s = span("Artículo 205. Beneficiarios", 0);
        s.text = "primera línea\nsegunda línea\n\notro párrafo con texto suficiente aquí"
            .to_string();
        let (chunks, _) = assemble(&[s], &hierarchy());
        assert_eq!(
            chunks[0].text,
            "primera línea segunda línea\notro párrafo con texto suficiente aquí"
        );
    }
}
