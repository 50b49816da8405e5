//! Lecture corpus loading, chunking, and the persistent flat-L2 vector index.

pub mod document;
pub mod error;
pub mod index;
pub mod retriever;

pub use document::{PageDocument, PdfCorpusLoader, chunk};
pub use error::MemoryError;
pub use index::{ChunkRecord, IndexPaths, ScoredChunk, VectorIndex};
pub use retriever::{Retriever, RetrieverConfig};
