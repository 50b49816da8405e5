//! Formats nearest-neighbor hits as citation-annotated excerpt blocks.

use std::fmt::Write;
use std::sync::Arc;

use lectern_llm::LlmProvider;

use crate::error::Result;
use crate::index::VectorIndex;

/// Marker returned when no hit clears the relevance threshold, so the
/// answering stage can state it has no grounding instead of guessing.
pub const NO_GROUNDING: &str =
    "No relevant excerpts were found in the lecture corpus for this query.";

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub top_k: usize,
    /// Maximum characters of chunk content rendered per excerpt.
    pub excerpt_cap_chars: usize,
    /// Hits with L2 distance above this are dropped as irrelevant.
    pub max_distance: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            excerpt_cap_chars: 1000,
            max_distance: 1.5,
        }
    }
}

/// The sole grounding interface the pipeline stages see. Holds a shared
/// handle to an already-built index; never reloads per call and never
/// emits a source/page pair that is not present in a stored record.
pub struct Retriever<P> {
    index: Arc<VectorIndex<P>>,
    config: RetrieverConfig,
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex<P>>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    /// Retrieve the most relevant chunks and render them as delimited,
    /// citation-annotated excerpt blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is not ready or embedding the query
    /// fails.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let hits = self.index.query(query, self.config.top_k).await?;

        let mut formatted = String::new();
        for hit in hits {
            if hit.distance > self.config.max_distance {
                tracing::debug!(
                    "dropping hit from {} page {} at distance {:.3}",
                    hit.record.source,
                    hit.record.page,
                    hit.distance
                );
                continue;
            }
            let excerpt: String = hit
                .record
                .content
                .chars()
                .take(self.config.excerpt_cap_chars)
                .collect();
            let _ = writeln!(
                formatted,
                "[Source: {} - Page {}]",
                hit.record.source, hit.record.page
            );
            formatted.push_str(&excerpt);
            formatted.push_str("\n---\n");
        }

        if formatted.is_empty() {
            return Ok(NO_GROUNDING.to_owned());
        }
        Ok(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChunkRecord, IndexPaths};
    use lectern_llm::mock::MockProvider;

    async fn retriever_with(
        texts: &[&str],
        config: RetrieverConfig,
    ) -> Retriever<MockProvider> {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::default());
        let mut index = VectorIndex::new(provider, IndexPaths::in_dir(dir.path()));
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_owned()).collect();
        let records: Vec<ChunkRecord> = owned
            .iter()
            .enumerate()
            .map(|(i, content)| ChunkRecord {
                source: "lecture1.pdf".into(),
                page: i + 1,
                content: content.clone(),
            })
            .collect();
        index.build(&owned, records).await.unwrap();
        Retriever::new(Arc::new(index), config)
    }

    #[tokio::test]
    async fn formats_source_and_page_citations() {
        let retriever = retriever_with(
            &["def add(a,b): return a+b", "Recursion is defined as..."],
            RetrieverConfig {
                max_distance: f32::MAX,
                ..RetrieverConfig::default()
            },
        )
        .await;

        let out = retriever.retrieve("def add(a,b): return a+b").await.unwrap();
        assert!(out.contains("[Source: lecture1.pdf - Page 1]"));
        assert!(out.contains("def add(a,b): return a+b"));
        assert!(out.contains("---"));
    }

    #[tokio::test]
    async fn excerpts_capped_at_configured_length() {
        let long = "x".repeat(5000);
        let retriever = retriever_with(
            &[long.as_str()],
            RetrieverConfig {
                excerpt_cap_chars: 100,
                max_distance: f32::MAX,
                ..RetrieverConfig::default()
            },
        )
        .await;

        let out = retriever.retrieve(&long).await.unwrap();
        let excerpt_line = out.lines().nth(1).unwrap();
        assert_eq!(excerpt_line.chars().count(), 100);
    }

    #[tokio::test]
    async fn distant_hits_dropped_by_relevance_policy() {
        let retriever = retriever_with(
            &["linear algebra and matrix multiplication"],
            RetrieverConfig {
                max_distance: 0.0,
                ..RetrieverConfig::default()
            },
        )
        .await;

        let out = retriever.retrieve("completely unrelated query").await.unwrap();
        assert_eq!(out, NO_GROUNDING);
    }

    #[tokio::test]
    async fn empty_corpus_yields_no_grounding_marker() {
        let retriever = retriever_with(&[], RetrieverConfig::default()).await;
        let out = retriever.retrieve("anything").await.unwrap();
        assert_eq!(out, NO_GROUNDING);
    }

    #[tokio::test]
    async fn top_k_limits_block_count() {
        let retriever = retriever_with(
            &["first topic text", "second topic text", "third topic text"],
            RetrieverConfig {
                top_k: 2,
                max_distance: f32::MAX,
                ..RetrieverConfig::default()
            },
        )
        .await;

        let out = retriever.retrieve("topic text").await.unwrap();
        assert_eq!(out.matches("[Source:").count(), 2);
    }

    #[tokio::test]
    async fn unready_index_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::default());
        let index = VectorIndex::new(provider, IndexPaths::in_dir(dir.path()));
        let retriever = Retriever::new(Arc::new(index), RetrieverConfig::default());
        assert!(retriever.retrieve("q").await.is_err());
    }
}
