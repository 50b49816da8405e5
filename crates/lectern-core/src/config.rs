use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalSettings,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize)]
pub struct CorpusConfig {
    pub pdf_folder: String,
    pub chunk_size: usize,
    pub overlap: usize,
    pub force_rebuild: bool,
}

#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub excerpt_cap_chars: usize,
    pub max_distance: f32,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to sensible defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LECTERN_PDF_FOLDER") {
            self.corpus.pdf_folder = v;
        }
        if let Ok(v) = std::env::var("LECTERN_INDEX_DIR") {
            self.index.dir = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LECTERN_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
    }

    fn default() -> Self {
        Self {
            corpus: CorpusConfig {
                pdf_folder: "data/lectures".into(),
                chunk_size: 800,
                overlap: 50,
                force_rebuild: false,
            },
            index: IndexConfig {
                dir: "data/index".into(),
            },
            retrieval: RetrievalSettings {
                top_k: 3,
                excerpt_cap_chars: 1000,
                max_distance: 1.5,
            },
            llm: LlmConfig {
                provider: "ollama".into(),
                base_url: "http://localhost:11434".into(),
                model: "mistral:7b".into(),
                embedding_model: "nomic-embed-text".into(),
                request_timeout_secs: 60,
            },
        }
    }
}
