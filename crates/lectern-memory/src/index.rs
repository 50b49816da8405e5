//! Persistent flat-L2 vector index with a parallel chunk-metadata store.
//!
//! Vectors and metadata are kept positionally aligned: the record at
//! ordinal `i` describes the vector at ordinal `i`, and that alignment is
//! the only linkage between them. Exact scan keeps retrieval correct at
//! lecture-corpus scale; this is not built for web-scale corpora.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lectern_llm::LlmProvider;

use crate::error::{MemoryError, Result};

/// Provenance-tagged chunk text, stored at the same ordinal as its vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub source: String,
    pub page: usize,
    pub content: String,
}

/// A retrieval hit: the record plus its L2 distance from the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub distance: f32,
}

/// Locations of the two co-located persisted artifacts.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub vectors: PathBuf,
    pub metadata: PathBuf,
}

impl IndexPaths {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            vectors: dir.join("vectors.json"),
            metadata: dir.join("metadata.json"),
        }
    }

    #[must_use]
    pub fn both_exist(&self) -> bool {
        self.vectors.exists() && self.metadata.exists()
    }
}

#[derive(Serialize, Deserialize)]
struct VectorsArtifact {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct MetadataArtifact {
    embedding_model: String,
    records: Vec<ChunkRecord>,
}

struct IndexState {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    records: Vec<ChunkRecord>,
}

/// Exact nearest-neighbor index over embedding vectors.
///
/// Mutated only by [`build`](Self::build) and [`load`](Self::load); queries
/// are read-only. The embedding provider is injected at construction so the
/// same model serves both build-time and query-time embedding.
pub struct VectorIndex<P> {
    provider: Arc<P>,
    paths: IndexPaths,
    state: Option<IndexState>,
}

impl<P> std::fmt::Debug for VectorIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("paths", &self.paths)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<P> VectorIndex<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, paths: IndexPaths) -> Self {
        Self {
            provider,
            paths,
            state: None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.records.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn artifacts_exist(&self) -> bool {
        self.paths.both_exist()
    }
}

impl<P: LlmProvider> VectorIndex<P> {
    /// Embed every text, replace the in-memory state, and persist both
    /// artifacts atomically (temp file + rename), overwriting prior state.
    ///
    /// # Errors
    ///
    /// Returns an error if `texts` and `records` differ in length, an
    /// embedding call fails, embeddings disagree on dimension, or
    /// persistence fails.
    pub async fn build(&mut self, texts: &[String], records: Vec<ChunkRecord>) -> Result<()> {
        if texts.len() != records.len() {
            return Err(MemoryError::Other(format!(
                "texts and records must be the same length: {} vs {}",
                texts.len(),
                records.len()
            )));
        }

        tracing::info!("embedding {} chunks", texts.len());
        let mut vectors = Vec::with_capacity(texts.len());
        let mut dimension = 0;
        for text in texts {
            let vector = self.provider.embed(text).await?;
            if vectors.is_empty() {
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(MemoryError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            vectors.push(vector);
        }

        self.persist(dimension, &vectors, &records)?;
        self.state = Some(IndexState {
            dimension,
            vectors,
            records,
        });
        tracing::info!("vector index built and persisted ({} chunks)", self.len());
        Ok(())
    }

    /// Read both persisted artifacts into memory.
    ///
    /// When either artifact is absent the index resets to an empty,
    /// unqueryable state and returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedArtifact` when an artifact is unreadable, the
    /// vector and record counts disagree, the vectors disagree on
    /// dimension, or the persisted embedding-model identifier does not
    /// match the configured provider.
    pub fn load(&mut self) -> Result<()> {
        if !self.paths.both_exist() {
            tracing::debug!("index artifacts absent, resetting to empty state");
            self.state = None;
            return Ok(());
        }

        let vectors: VectorsArtifact = read_artifact(&self.paths.vectors)?;
        let metadata: MetadataArtifact = read_artifact(&self.paths.metadata)?;

        if vectors.vectors.len() != metadata.records.len() {
            return Err(MemoryError::CorruptedArtifact(format!(
                "vector count {} does not match record count {}",
                vectors.vectors.len(),
                metadata.records.len()
            )));
        }
        if let Some(v) = vectors.vectors.iter().find(|v| v.len() != vectors.dimension) {
            return Err(MemoryError::CorruptedArtifact(format!(
                "vector of dimension {} in an index of dimension {}",
                v.len(),
                vectors.dimension
            )));
        }
        if metadata.embedding_model != self.provider.embedding_model_id() {
            return Err(MemoryError::CorruptedArtifact(format!(
                "index was built with embedding model '{}', configured model is '{}'",
                metadata.embedding_model,
                self.provider.embedding_model_id()
            )));
        }

        self.state = Some(IndexState {
            dimension: vectors.dimension,
            vectors: vectors.vectors,
            records: metadata.records,
        });
        Ok(())
    }

    /// Return the `top_k` nearest records by ascending L2 distance.
    ///
    /// `top_k` greater than the index size returns every record.
    ///
    /// # Errors
    ///
    /// Returns `IndexNotReady` before a successful build or load, or an
    /// error if embedding the query fails or its dimension does not match
    /// the index.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let state = self.state.as_ref().ok_or(MemoryError::IndexNotReady)?;
        if state.records.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed(text).await?;
        if query_vector.len() != state.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: state.dimension,
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = state
            .vectors
            .iter()
            .zip(&state.records)
            .map(|(vector, record)| ScoredChunk {
                record: record.clone(),
                distance: l2_distance(&query_vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    fn persist(
        &self,
        dimension: usize,
        vectors: &[Vec<f32>],
        records: &[ChunkRecord],
    ) -> Result<()> {
        if let Some(dir) = self.paths.vectors.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let vectors_artifact = VectorsArtifact {
            dimension,
            vectors: vectors.to_vec(),
        };
        let metadata_artifact = MetadataArtifact {
            embedding_model: self.provider.embedding_model_id().to_owned(),
            records: records.to_vec(),
        };

        write_atomic(&self.paths.vectors, &serde_json::to_vec(&vectors_artifact)?)?;
        write_atomic(
            &self.paths.metadata,
            &serde_json::to_vec(&metadata_artifact)?,
        )?;
        Ok(())
    }
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        MemoryError::CorruptedArtifact(format!("{}: {e}", path.display()))
    })
}

/// Write via a temp sibling and rename, so a concurrent reader never sees a
/// partially-written artifact.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
