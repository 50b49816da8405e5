//! Startup wiring: build the vector index from the PDF corpus, or load the
//! persisted artifacts when they are intact.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use lectern_llm::LlmProvider;
use lectern_memory::document::{PdfCorpusLoader, chunk};
use lectern_memory::index::{ChunkRecord, IndexPaths, VectorIndex};
use lectern_memory::MemoryError;

use crate::config::Config;

/// Build the index if no persisted artifacts exist (or a rebuild is forced),
/// otherwise load them. Corrupted artifacts are treated as absent: logged and
/// rebuilt, never silently queried.
///
/// # Errors
///
/// Returns an error if the corpus cannot be read or the build/load fails —
/// fatal at startup, since there is no pipeline without an index.
pub async fn prepare_index<P: LlmProvider>(
    provider: Arc<P>,
    config: &Config,
) -> anyhow::Result<VectorIndex<P>> {
    let paths = IndexPaths::in_dir(Path::new(&config.index.dir));
    let mut index = VectorIndex::new(provider, paths);

    if config.corpus.force_rebuild || !index.artifacts_exist() {
        tracing::info!("building embeddings and vector store");
        rebuild(&mut index, config).await?;
        return Ok(index);
    }

    tracing::info!("vector store exists, loading");
    match index.load() {
        Ok(()) => {}
        Err(MemoryError::CorruptedArtifact(reason)) => {
            tracing::warn!("persisted index unusable ({reason}), rebuilding");
            rebuild(&mut index, config).await?;
        }
        Err(e) => return Err(e).context("failed to load the vector index"),
    }
    if !index.is_ready() {
        // An artifact vanished between the existence check and the load.
        rebuild(&mut index, config).await?;
    }
    Ok(index)
}

async fn rebuild<P: LlmProvider>(
    index: &mut VectorIndex<P>,
    config: &Config,
) -> anyhow::Result<()> {
    let loader = PdfCorpusLoader::default();
    let documents = loader
        .load(Path::new(&config.corpus.pdf_folder))
        .await
        .with_context(|| format!("failed to read PDF folder {}", config.corpus.pdf_folder))?;

    let mut texts = Vec::new();
    let mut records = Vec::new();
    for doc in &documents {
        for piece in chunk(&doc.content, config.corpus.chunk_size, config.corpus.overlap)? {
            records.push(ChunkRecord {
                source: doc.source.clone(),
                page: doc.page,
                content: piece.clone(),
            });
            texts.push(piece);
        }
    }
    tracing::info!(
        "chunked {} pages into {} chunks",
        documents.len(),
        texts.len()
    );

    index
        .build(&texts, records)
        .await
        .context("failed to build the vector index")?;
    Ok(())
}
