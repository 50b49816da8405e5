#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] lectern_llm::LlmError),

    #[error("PDF error in {source_file}: {reason}")]
    Pdf { source_file: String, reason: String },

    #[error("invalid chunking parameters: {0}")]
    InvalidChunking(String),

    #[error("index not ready: build or load it before querying")]
    IndexNotReady,

    #[error("corrupted index artifact: {0}")]
    CorruptedArtifact(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
