//! Pure text normalization for extracted PDF text.
//!
//! Two normal forms are produced. [`clean`] strips recurring print artifacts
//! (running headers, page numbers, gazette boilerplate) from multi-line text.
//! [`join_lines`] additionally collapses intra-paragraph line wraps into a
//! single line per paragraph; it is applied only to embedding-facing text.
//!
//! [`clean`] is an ordered pipeline of pattern rules. The order is a
//! correctness invariant: de-hyphenation must run before header removal so a
//! hyphen-wrapped header line is still recognizable, and newline collapsing
//! must run last so rule replacements cannot leave triple blank lines behind.
//! Rules that find no match are no-ops; normalization never fails.

use once_cell::sync::Lazy;
use regex::Regex;

/// One named pattern rule in the cleaning pipeline.
struct CleanRule {
    name: &'static str,
    pattern: Lazy<Regex>,
    replacement: &'static str,
}

macro_rules! rule {
    ($name:literal, $pattern:literal, $replacement:literal) => {
        CleanRule {
            name: $name,
            pattern: Lazy::new(|| Regex::new($pattern).expect("invalid clean rule pattern")),
            replacement: $replacement,
        }
    };
}

/// Ordered cleaning rules. See module docs for why order matters.
static CLEAN_RULES: [CleanRule; 12] = [
    // Re-join words wrapped across lines with a hyphen: "condi-\nciones"
    rule!("dehyphenate", r"(\w)-\n(\w)", "${1}${2}"),
    // Running header with a § reference line and optional page number
    rule!(
        "header_with_reference",
        r"C[OÓ]DIGO LABORAL Y DE LA SEGURIDAD SOCIAL\n[^\n]*\n(?:–\s*\d+\s*–\s*\n?)?",
        ""
    ),
    // Running header immediately followed by body text
    rule!(
        "header_bare",
        r"C[OÓ]DIGO LABORAL Y DE LA SEGURIDAD SOCIAL\n(?:–\s*\d+\s*–\s*\n?)?",
        ""
    ),
    // Standalone page numbers, em-dash variant
    rule!("page_number", r"\n–\s*\d+\s*–\s*(?:\n|$)", "\n"),
    rule!("page_number_at_start", r"^–\s*\d+\s*–\s*\n", ""),
    // Standalone page numbers, plain hyphen variant
    rule!("page_number_hyphen", r"\n-\s*\d+\s*-\s*(?:\n|$)", "\n"),
    // "Página N de N" footers
    rule!("page_footer", r"\nP[aá]gina\s+\d+\s+de\s+\d+\s*(?:\n|$)", "\n"),
    // Official-gazette boilerplate block
    rule!(
        "gazette_header",
        r"BOLET[IÍ]N OFICIAL DEL ESTADO\n(?:N[uú]m\.\s*\d+[^\n]*\n)?(?:Sec\.\s*[IVX]+[^\n]*\n)?",
        ""
    ),
    // Verification-code and source-verification lines
    rule!("cve_line", r"\n[Cc]ve:\s*BOE-[A-Z]-\d+-\d+[^\n]*(?:\n|$)", "\n"),
    rule!(
        "verification_line",
        r"\nVerificable en https?://www\.boe\.es[^\n]*(?:\n|$)",
        "\n"
    ),
    // "[. . .]" omission markers alone on a line
    rule!("omission_marker", r"\n\[\s*\.\s*\.\s*\.\s*\]\s*(?:\n|$)", "\n"),
    // Collapse runs of blank lines, preserving paragraph breaks
    rule!("collapse_newlines", r"\n{3,}", "\n\n"),
];

/// Strip recurring print artifacts from extracted text.
///
/// Pure and deterministic; applying it twice yields the same result.
pub fn clean(text: &str) -> String {
    let mut result = text.to_string();
    for rule in &CLEAN_RULES {
        let cleaned = rule.pattern.replace_all(&result, rule.replacement);
        if let std::borrow::Cow::Owned(owned) = cleaned {
            tracing::trace!(rule = rule.name, "clean rule applied");
            result = owned;
        }
    }
    result.trim().to_string()
}

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").expect("invalid pattern"));
static SPACED_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r" *\n *").expect("invalid pattern"));
static MULTI_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("invalid pattern"));
static LAW_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^§\s*\d+\.?\s*").expect("invalid pattern"));

/// Sentinel protecting paragraph breaks while single newlines are joined.
const PARA: &str = "\u{0}PARA\u{0}";

/// Collapse line-wrapped text to one line per paragraph.
///
/// Double newlines (paragraph breaks) survive as single newlines; single
/// newlines (PDF column wraps) become spaces. A leading `§ N` marker is
/// stripped, since preamble bodies start with the law marker of their law.
pub fn join_lines(text: &str) -> String {
    let text = text.replace("\n\n", PARA);
    let text = text.replace('\n', " ");
    let text = text.replace(PARA, "\n");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = SPACED_BREAK.replace_all(&text, "\n");
    let text = MULTI_BREAK.replace_all(&text, "\n");
    let text = LAW_MARKER.replace(&text, "");
    text.trim().to_string()
}

static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid pattern"));

/// Collapse internal whitespace and trim; used for title matching.
pub fn normalize_title(title: &str) -> String {
    MULTI_WHITESPACE.replace_all(title, " ").trim().to_string()
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dehyphenation() {
        let cleaned = clean("las condi-\nciones de trabajo");
        assert!(cleaned.contains("condiciones"));
        assert!(!cleaned.contains("condi-"));
    }

    #[test]
    fn test_header_block_with_reference_line() {
        let text = "cuerpo anterior.\nCÓDIGO LABORAL Y DE LA SEGURIDAD SOCIAL\n§ 12 Estatuto de los Trabajadores\n– 95 –\ncuerpo posterior.";
        let cleaned = clean(text);
        assert!(!cleaned.contains("CÓDIGO LABORAL"));
        assert!(!cleaned.contains("– 95 –"));
        assert!(cleaned.contains("cuerpo anterior."));
        assert!(cleaned.contains("cuerpo posterior."));
    }

    #[test]
    fn test_standalone_page_numbers() {
        assert!(!clean("texto\n– 17 –\nsigue").contains("17"));
        assert!(!clean("texto\n- 17 -\nsigue").contains("17"));
        assert!(!clean("– 17 –\nempieza aquí").contains("17"));
    }

    #[test]
    fn test_page_footer() {
        let cleaned = clean("texto\nPágina 3 de 120\nsigue");
        assert!(!cleaned.contains("Página 3"));
        assert!(cleaned.contains("sigue"));
    }

    #[test]
    fn test_gazette_block() {
        let text = "texto\nBOLETÍN OFICIAL DEL ESTADO\nNúm. 255 Sábado 24 de octubre\nSec. I. Pág. 98345\nsigue";
        let cleaned = clean(text);
        assert!(!cleaned.contains("BOLETÍN"));
        assert!(!cleaned.contains("Núm. 255"));
        assert!(cleaned.contains("sigue"));
    }

    #[test]
    fn test_verification_lines() {
        let text = "texto\ncve: BOE-A-2015-11430\nVerificable en https://www.boe.es\nsigue";
        let cleaned = clean(text);
        assert!(!cleaned.contains("cve:"));
        assert!(!cleaned.contains("Verificable"));
    }

    #[test]
    fn test_omission_marker() {
        let cleaned = clean("texto\n[ . . . ]\nsigue");
        assert!(!cleaned.contains("[ . . . ]"));
    }

    #[test]
    fn test_collapse_blank_lines() {
        let cleaned = clean("uno\n\n\n\n\ndos");
        assert_eq!(cleaned, "uno\n\ndos");
    }

    #[test]
    fn test_identity_when_nothing_matches() {
        let text = "  Artículo 1. Objeto.\nEsta ley regula el contrato de trabajo.  ";
        assert_eq!(clean(text), text.trim());
    }

    #[test]
    fn test_idempotence() {
        let text = "las condi-\nciones\n– 4 –\n\n\n\ny el salario\ncve: BOE-A-2020-1234\nfin";
        let once = clean(text);
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_join_lines_preserves_paragraphs() {
        let joined = join_lines("primera línea\nsegunda línea\n\npárrafo nuevo");
        assert_eq!(joined, "primera línea segunda línea\npárrafo nuevo");
    }

    #[test]
    fn test_join_lines_collapses_spaces() {
        assert_eq!(join_lines("a  b   c"), "a b c");
    }

    #[test]
    fn test_join_lines_strips_law_marker() {
        let joined = join_lines("§ 12 Real Decreto Legislativo 2/2015");
        assert_eq!(joined, "Real Decreto Legislativo 2/2015");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Artículo   1.\n Ámbito  "),
            "Artículo 1. Ámbito"
        );
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("áéíóú", 3), "áéí");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
