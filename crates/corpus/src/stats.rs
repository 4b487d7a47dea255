//! Corpus statistics.
//!
//! Size distribution and law counts over an assembled chunk set, used by the
//! CLI `stats` command and logged at the end of extraction runs.

use serde::Serialize;
use std::collections::HashSet;

use crate::types::Chunk;

/// Size and coverage statistics for a chunk set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusStats {
    pub total_chunks: usize,
    pub unique_laws: usize,
    pub avg_chars: usize,
    pub min_chars: usize,
    pub max_chars: usize,
    pub median_chars: usize,
    pub oversized: usize,
    pub undersized: usize,
}

/// Chunks above this size suggest the segmenter failed to sub-split.
const OVERSIZED_CHARS: usize = 5000;

/// Chunks below this size are worth eyeballing for extraction noise.
const UNDERSIZED_CHARS: usize = 200;

impl CorpusStats {
    /// Compute statistics over a chunk set.
    pub fn compute(chunks: &[Chunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }

        let mut lengths: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        lengths.sort_unstable();

        let total: usize = lengths.iter().sum();
        let laws: HashSet<&str> = chunks.iter().map(|c| c.law.as_str()).collect();

        Self {
            total_chunks: chunks.len(),
            unique_laws: laws.len(),
            avg_chars: total / lengths.len(),
            min_chars: lengths[0],
            max_chars: lengths[lengths.len() - 1],
            median_chars: lengths[lengths.len() / 2],
            oversized: lengths.iter().filter(|&&l| l > OVERSIZED_CHARS).count(),
            undersized: lengths.iter().filter(|&&l| l < UNDERSIZED_CHARS).count(),
        }
    }
}
