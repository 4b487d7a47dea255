//! Hierarchy reconstruction from the document outline.
//!
//! The source outline is flat: `(level, title, page)` triples with no parent
//! pointers. This module rebuilds, for every article-level entry, the path of
//! structural divisions that contain it (LIBRO > TÍTULO > CAPÍTULO > ...).
//!
//! The traversal is an explicit fold: [`HierarchyState::apply`] is a reducer
//! over outline entries in document order, and [`build_hierarchy`] threads it
//! through the sequence while accumulating the per-article map. An article's
//! path is fixed at the moment it is encountered; later divisions never
//! retroactively change it.

use std::collections::HashMap;

use crate::normalize::normalize_title;
use crate::types::OutlineEntry;

/// Structural division kinds, ordered by containment.
///
/// A LIBRO contains TÍTULOs, which contain CAPÍTULOs, and so on. `Other`
/// covers free-form level-2 groupings such as "Disposiciones adicionales".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DivisionKind {
    Book,
    Title,
    Chapter,
    Subsection,
    Section,
    Other,
}

impl DivisionKind {
    /// Classify a division title by case-insensitive prefix.
    pub fn classify(title: &str) -> Self {
        let upper = title.to_uppercase();
        if upper.starts_with("LIBRO") {
            Self::Book
        } else if upper.starts_with("TÍTULO") || upper.starts_with("TITULO") {
            Self::Title
        } else if upper.starts_with("CAPÍTULO")
            || upper.starts_with("CAPITULO")
            || upper.starts_with("CAP.")
        {
            Self::Chapter
        } else if upper.starts_with("SUBSECCIÓN") || upper.starts_with("SUBSECCION") {
            Self::Subsection
        } else if upper.starts_with("SECCIÓN")
            || upper.starts_with("SECCION")
            || upper.starts_with("SECC.")
        {
            Self::Section
        } else {
            Self::Other
        }
    }
}

/// Scan state threaded through the outline fold.
#[derive(Debug, Clone, Default)]
pub struct HierarchyState {
    /// Raw title of the law currently being traversed
    current_law: String,

    /// Currently open structural divisions, outermost first
    division_stack: Vec<(DivisionKind, String)>,
}

/// A recorded article: `(law_title_raw, normalized_article_title)` mapped to
/// its joined division path.
type ArticleRecord = ((String, String), String);

impl HierarchyState {
    /// Reduce one outline entry into the state.
    ///
    /// Returns the article record to accumulate when the entry is an
    /// article-level node.
    pub fn apply(&mut self, entry: &OutlineEntry) -> Option<ArticleRecord> {
        let title = entry.title.trim();
        match entry.level {
            1 => {
                self.current_law = title.to_string();
                self.division_stack.clear();
                None
            }
            2 => {
                let kind = DivisionKind::classify(title);
                match kind {
                    // Free-form groupings hang directly under LIBRO/TÍTULO
                    DivisionKind::Other => self
                        .division_stack
                        .retain(|(k, _)| matches!(k, DivisionKind::Book | DivisionKind::Title)),
                    // A new division closes every division at its depth or deeper
                    _ => self.division_stack.retain(|(k, _)| *k < kind),
                }
                self.division_stack.push((kind, title.to_string()));
                None
            }
            3 => {
                let key = (self.current_law.clone(), normalize_title(title));
                Some((key, self.chapter_path()))
            }
            other => {
                tracing::debug!(level = other, title, "ignoring outline entry at unknown level");
                None
            }
        }
    }

    /// Joined titles of the currently open divisions.
    fn chapter_path(&self) -> String {
        self.division_stack
            .iter()
            .map(|(_, title)| title.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// Resolved hierarchy paths for every article in the outline.
///
/// Keyed by `(law_title_raw, normalized_article_title)`. Duplicate keys keep
/// the later occurrence.
#[derive(Debug, Default)]
pub struct HierarchyMap {
    entries: HashMap<(String, String), String>,
}

impl HierarchyMap {
    /// Exact lookup on `(law, normalized article title)`.
    pub fn get_exact(&self, law: &str, article: &str) -> Option<&str> {
        self.entries
            .get(&(law.to_string(), article.to_string()))
            .map(String::as_str)
    }

    /// Find any article in `law` whose title starts with `prefix`.
    pub fn find_article_prefix(&self, law: &str, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|((l, a), _)| l == law && a.starts_with(prefix))
            .map(|(_, path)| path.as_str())
    }

    /// Find any article in `law` whose lowercased title starts with the
    /// lowercased `prefix`. Used for disposition titles, whose casing varies.
    pub fn find_prefix_ignore_case(&self, law: &str, prefix_lower: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|((l, a), _)| l == law && a.to_lowercase().starts_with(prefix_lower))
            .map(|(_, path)| path.as_str())
    }

    /// Number of recorded articles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the hierarchy map by folding over the outline in document order.
pub fn build_hierarchy(outline: &[OutlineEntry]) -> HierarchyMap {
    let mut state = HierarchyState::default();
    let mut map = HierarchyMap::default();

    for entry in outline {
        if let Some((key, path)) = state.apply(entry) {
            map.entries.insert(key, path);
        }
    }

    tracing::debug!(articles = map.len(), "hierarchy map built");
    map
}
