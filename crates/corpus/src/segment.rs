//! Article segmentation within a law's text.
//!
//! A law's page text is split at article and disposition headings matched at
//! line start. Text before the first heading becomes a preamble span; laws
//! with no recognizable internal structure fall back to a single truncated
//! whole-text span. Oversized articles are sub-split at paragraph boundaries
//! so no retrieval unit exceeds the embedding-friendly size.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{clean, truncate_chars};
use crate::types::{ArticleSpan, LawSpan, OutlineEntry};

/// Fixed section title for text preceding the first article.
pub const PREAMBLE_SECTION: &str = "Preambulo / Exposicion de motivos";

/// Fixed section title for laws without recognizable articles.
pub const FULL_TEXT_SECTION: &str = "Texto completo";

/// Minimum preamble length worth keeping, in chars.
const MIN_PREAMBLE_CHARS: usize = 200;

/// Minimum fallback whole-law text length, in chars.
const MIN_FULL_TEXT_CHARS: usize = 100;

/// Cap applied to preamble and fallback spans, in chars.
const MAX_SPAN_CHARS: usize = 8000;

/// Spans shorter than this after cleaning are header noise.
const MIN_ARTICLE_CHARS: usize = 50;

/// Articles longer than this are sub-split at paragraph boundaries.
const OVERSIZE_THRESHOLD_CHARS: usize = 6000;

/// Running buffer limit while sub-splitting an oversized article.
const SPLIT_BUFFER_CHARS: usize = 5500;

/// Article and disposition headings, anchored to their own line.
///
/// Alternative (a) matches `"Artículo <n><letter?><ordinal?>."` plus the
/// title remainder; alternative (b) matches the four disposition kinds. The
/// two are mutually exclusive by keyword, so matches never nest.
static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\n(Art[ií]culo\s+\d+[a-z]?(?:\s+bis|\s+ter|\s+qu[aá]ter|\s+quinquies|\s+sexies|\s+septies|\s+octies)?\.\s*[^\n]*)\n|\n(Disposici[oó]n\s+(?:adicional|transitoria|derogatoria|final)\s+[^\n]*)\n",
    )
    .expect("invalid boundary pattern")
});

/// Front-matter laws (summary, systematic index) carry no body text.
pub fn is_front_matter(law_title: &str) -> bool {
    law_title.contains("Sumario") || law_title.contains("ndice Sistem")
}

/// Derive per-law page windows from the document outline.
///
/// A level-1 entry qualifies as a law when its trimmed title starts with the
/// section sign `§`. Each law runs to the start page of the next one; the
/// last runs to `page_count + 1`.
pub fn law_spans(outline: &[OutlineEntry], page_count: u32) -> Vec<LawSpan> {
    let mut laws: Vec<LawSpan> = outline
        .iter()
        .filter(|e| e.level == 1 && e.title.trim().starts_with('§'))
        .map(|e| LawSpan {
            title: e.title.trim().to_string(),
            start_page: e.page,
            end_page: 0,
        })
        .collect();

    let count = laws.len();
    for i in 0..count {
        laws[i].end_page = if i + 1 < count {
            laws[i + 1].start_page
        } else {
            page_count + 1
        };
    }

    laws
}

/// Split one law's full text into ordered article spans.
pub fn segment(law: &LawSpan, full_text: &str) -> Vec<ArticleSpan> {
    let mut spans = Vec::new();

    let boundaries: Vec<(usize, String)> = BOUNDARY
        .captures_iter(full_text)
        .map(|caps| {
            let whole = caps.get(0).expect("match has group 0");
            let title = caps
                .get(1)
                .or_else(|| caps.get(2))
                .expect("boundary match has a title group");
            (whole.start(), title.as_str().trim().to_string())
        })
        .collect();

    if boundaries.is_empty() {
        // No internal structure; keep the whole law as one capped span
        let trimmed = full_text.trim();
        if trimmed.chars().count() > MIN_FULL_TEXT_CHARS {
            spans.push(ArticleSpan {
                law_title: law.title.clone(),
                section_title: FULL_TEXT_SECTION.to_string(),
                text: clean(truncate_chars(trimmed, MAX_SPAN_CHARS)),
                pages: Some(law.page_range()),
            });
        }
        return spans;
    }

    let preamble = full_text[..boundaries[0].0].trim();
    if preamble.chars().count() > MIN_PREAMBLE_CHARS {
        spans.push(ArticleSpan {
            law_title: law.title.clone(),
            section_title: PREAMBLE_SECTION.to_string(),
            text: clean(truncate_chars(preamble, MAX_SPAN_CHARS)),
            pages: None,
        });
    }

    for (i, (start, title)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(i + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(full_text.len());

        let text = clean(full_text[*start..end].trim());

        // Pure header noise: a heading re-listed in an index page, etc.
        if text.chars().count() < MIN_ARTICLE_CHARS {
            continue;
        }

        if text.chars().count() > OVERSIZE_THRESHOLD_CHARS {
            split_oversized(law, title, &text, &mut spans);
        } else {
            spans.push(ArticleSpan {
                law_title: law.title.clone(),
                section_title: title.clone(),
                text,
                pages: None,
            });
        }
    }

    spans
}

/// Sub-split an oversized article at paragraph boundaries.
///
/// Paragraphs accumulate greedily into a buffer; whenever the next paragraph
/// would push a non-empty buffer past the limit, the buffer is flushed as a
/// `"(parte N)"` span. Once any split has occurred, every part carries the
/// suffix, part 1 included; an article that ends up in a single buffer keeps
/// its bare title.
fn split_oversized(law: &LawSpan, title: &str, text: &str, spans: &mut Vec<ArticleSpan>) {
    let mut buffer = String::new();
    let mut part_num = 1u32;

    for para in text.split("\n\n") {
        let would_overflow =
            buffer.chars().count() + para.chars().count() > SPLIT_BUFFER_CHARS;
        if would_overflow && !buffer.trim().is_empty() {
            spans.push(ArticleSpan {
                law_title: law.title.clone(),
                section_title: format!("{} (parte {})", title, part_num),
                text: buffer.trim().to_string(),
                pages: None,
            });
            part_num += 1;
            buffer = format!("{}\n\n", para);
        } else {
            buffer.push_str(para);
            buffer.push_str("\n\n");
        }
    }

    if !buffer.trim().is_empty() {
        let section_title = if part_num > 1 {
            format!("{} (parte {})", title, part_num)
        } else {
            title.to_string()
        };
        spans.push(ArticleSpan {
            law_title: law.title.clone(),
            section_title,
            text: buffer.trim().to_string(),
            pages: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn law() -> LawSpan {
        LawSpan {
            title: "§ 12. Estatuto de los Trabajadores".to_string(),
            start_page: 35,
            end_page: 128,
        }
    }

    fn filler(chars: usize) -> String {
        "política de empleo y relaciones laborales. "
            .chars()
            .cycle()
            .take(chars)
            .collect()
    }

    #[test]
    fn test_two_articles_with_correct_boundaries() {
        let text = format!(
            "encabezado breve\nArtículo 1. Ámbito de aplicación\n{}\nArtículo 2. Fuentes\n{}",
            filler(120),
            filler(90)
        );
        let spans = segment(&law(), &text);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].section_title, "Artículo 1. Ámbito de aplicación");
        assert!(spans[0].text.starts_with("Artículo 1."));
        assert!(!spans[0].text.contains("Artículo 2."));
        assert_eq!(spans[1].section_title, "Artículo 2. Fuentes");
    }

    #[test]
    fn test_disposition_boundary() {
        let text = format!(
            "\nDisposición transitoria cuarta. Aplicación paulatina\n{}",
            filler(100)
        );
        let spans = segment(&law(), &text);
        assert_eq!(spans.len(), 1);
        assert_eq!(
            spans[0].section_title,
            "Disposición transitoria cuarta. Aplicación paulatina"
        );
    }

    #[test]
    fn test_preamble_captured_when_long_enough() {
        let text = format!("{}\nArtículo 1. Objeto\n{}", filler(300), filler(100));
        let spans = segment(&law(), &text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].section_title, PREAMBLE_SECTION);
    }

    #[test]
    fn test_short_preamble_discarded() {
        let text = format!("portada\nArtículo 1. Objeto\n{}", filler(100));
        let spans = segment(&law(), &text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].section_title, "Artículo 1. Objeto");
    }

    #[test]
    fn test_no_boundaries_falls_back_to_full_text() {
        let text = filler(500);
        let spans = segment(&law(), &text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].section_title, FULL_TEXT_SECTION);
        assert_eq!(spans[0].pages.as_deref(), Some("35-127"));
    }

    #[test]
    fn test_no_boundaries_short_text_dropped() {
        let spans = segment(&law(), "texto muy breve");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_header_noise_span_dropped() {
        // The second heading is immediately followed by the next one: an
        // index line, not an article body
        let text = format!(
            "\nArtículo 1. Objeto\n{}\nArtículo 2. Fuentes\n\nArtículo 3. Otro\n{}",
            filler(100),
            filler(100)
        );
        let spans = segment(&law(), &text);
        let titles: Vec<_> = spans.iter().map(|s| s.section_title.as_str()).collect();
        assert!(!titles.contains(&"Artículo 2. Fuentes"));
        assert!(titles.contains(&"Artículo 3. Otro"));
    }

    #[test]
    fn test_ordinal_suffix_headings() {
        let text = format!("\nArtículo 27 bis. Nuevas garantías\n{}", filler(100));
        let spans = segment(&law(), &text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].section_title, "Artículo 27 bis. Nuevas garantías");
    }

    #[test]
    fn test_oversize_split_sizes_and_numbering() {
        // ~12000 chars with a paragraph break every ~1000
        let para = filler(1000);
        let body = vec![para.as_str(); 12].join("\n\n");
        let text = format!("\nArtículo 40. Movilidad geográfica\n{}", body);

        let spans = segment(&law(), &text);
        assert!(spans.len() > 1);
        for (i, span) in spans.iter().enumerate() {
            assert!(span.text.chars().count() <= SPLIT_BUFFER_CHARS + 2);
            assert_eq!(
                span.section_title,
                format!("Artículo 40. Movilidad geográfica (parte {})", i + 1)
            );
        }
    }

    #[test]
    fn test_law_spans_chaining() {
        let outline = vec![
            OutlineEntry::new(1, "§ 1. Law A", 3),
            OutlineEntry::new(1, "§ 2. Law B", 40),
            OutlineEntry::new(2, "TÍTULO I", 41),
            OutlineEntry::new(1, "§ 3. Law C", 90),
        ];
        let laws = law_spans(&outline, 120);

        assert_eq!(laws.len(), 3);
        assert_eq!(laws[0].end_page, 40);
        assert_eq!(laws[1].end_page, 90);
        assert_eq!(laws[2].end_page, 121);
    }

    #[test]
    fn test_non_section_sign_entries_ignored() {
        let outline = vec![
            OutlineEntry::new(1, "Portada", 1),
            OutlineEntry::new(1, "§ 1. Law A", 3),
        ];
        let laws = law_spans(&outline, 50);
        assert_eq!(laws.len(), 1);
        assert_eq!(laws[0].title, "§ 1. Law A");
    }

    #[test]
    fn test_front_matter_detection() {
        assert!(is_front_matter("§ 0. Sumario"));
        assert!(is_front_matter("§ 0. Índice Sistemático"));
        assert!(!is_front_matter("§ 12. Estatuto de los Trabajadores"));
    }
}
