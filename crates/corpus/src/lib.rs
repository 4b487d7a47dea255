//! Legal corpus ingestion pipeline.
//!
//! Turns a consolidated Spanish legal-code compilation into enriched,
//! vector-indexed retrieval chunks. The pipeline has three stages, each
//! resumable on its own artifacts:
//!
//! 1. extraction: outline-driven law windows, article segmentation, text
//!    cleaning and hierarchy reconstruction ([`extract_corpus`]);
//! 2. enrichment: LLM-generated summaries, keywords and questions per chunk
//!    ([`enrich::enrich_chunks`]);
//! 3. indexing: embedding and upload to the search index
//!    ([`index::index_chunks`]).

pub mod assemble;
pub mod checkpoint;
pub mod enrich;
pub mod index;
pub mod normalize;
pub mod outline;
pub mod segment;
pub mod source;
pub mod stats;
pub mod store;
pub mod types;


pub use assemble::{ChapterMatch, MatchReport};
pub use checkpoint::{CheckpointStore, FileCheckpoint, MemoryCheckpoint};
pub use enrich::{EnrichOptions, EnrichProgress};
pub use index::{IndexOptions, UploadProgress};
pub use source::{DocumentSource, JsonDocumentSource};
pub use stats::CorpusStats;
pub use store::{AzureSearchStore, MemorySearchStore, SearchDocument, SearchStore};
pub use types::{
    ArticleSpan, Chunk, ChunkAnnotation, EnrichSummary, EnrichedChunk, IndexSummary, LawSpan,
    OutlineEntry,
};

use lexrag_core::AppResult;

/// Result of one extraction run.
#[derive(Debug)]
pub struct ExtractOutput {
    pub chunks: Vec<Chunk>,
    pub report: MatchReport,
    pub stats: CorpusStats,
}

/// Run the full extraction stage against a source document.
///
/// The outline drives everything: level-1 `§` entries delimit per-law page
/// windows, deeper levels feed the hierarchy map. Front-matter laws (the
/// summary and the systematic index) are skipped before their pages are even
/// read.
pub fn extract_corpus(source: &dyn DocumentSource) -> AppResult<ExtractOutput> {
    let outline = source.outline()?;
    let hierarchy = outline::build_hierarchy(&outline);
    let laws = segment::law_spans(&outline, source.page_count());

    tracing::info!(
        laws = laws.len(),
        hierarchy_entries = hierarchy.len(),
        pages = source.page_count(),
        "extraction started"
    );

    let mut spans: Vec<ArticleSpan> = Vec::new();
    for law in &laws {
        if segment::is_front_matter(&law.title) {
            tracing::debug!(law = %law.title, "skipping front matter");
            continue;
        }

        let mut pages = Vec::with_capacity((law.end_page - law.start_page) as usize);
        for page in law.start_page..law.end_page {
            pages.push(source.page_text(page - 1)?);
        }
        let full_text = pages.join("\n");

        let law_spans = segment::segment(law, &full_text);
        tracing::debug!(law = %law.title, spans = law_spans.len(), "law segmented");
        spans.extend(law_spans);
    }

    let (chunks, report) = assemble::assemble(&spans, &hierarchy);
    if !report.meets_target() {
        tracing::warn!(
            match_rate = format!("{:.1}%", report.match_rate() * 100.0),
            "chapter match rate below target"
        );
    }

    let stats = CorpusStats::compute(&chunks);
    tracing::info!(
        chunks = stats.total_chunks,
        laws = stats.unique_laws,
        avg_chars = stats.avg_chars,
        "extraction finished"
    );

    Ok(ExtractOutput {
        chunks,
        report,
        stats,
    })
}
