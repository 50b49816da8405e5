use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;

use lectern_core::bootstrap;
use lectern_core::config::Config;
use lectern_core::session::Session;
use lectern_llm::any::AnyProvider;
use lectern_llm::ollama::OllamaProvider;
use lectern_llm::openai::OpenAiProvider;
use lectern_llm::provider::LlmProvider;
use lectern_memory::retriever::{Retriever, RetrieverConfig};

#[derive(Debug, Parser)]
#[command(
    name = "lectern",
    about = "Ask questions about a folder of lecture PDFs, with verified answers",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "lectern.toml")]
    config: PathBuf,

    /// Folder of lecture PDFs (overrides the config file).
    #[arg(long)]
    pdf_folder: Option<PathBuf>,

    /// Rebuild the vector index even if persisted artifacts exist.
    #[arg(long)]
    rebuild: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(folder) = cli.pdf_folder {
        config.corpus.pdf_folder = folder.display().to_string();
    }
    if cli.rebuild {
        config.corpus.force_rebuild = true;
    }

    let pdf_folder = Path::new(&config.corpus.pdf_folder);
    if !pdf_folder.is_dir() {
        bail!(
            "PDF folder {} does not exist or is not a directory",
            pdf_folder.display()
        );
    }

    let provider = Arc::new(build_provider(&config)?);
    if !provider.supports_embeddings() {
        bail!(
            "provider {} has no embedding model configured",
            provider.name()
        );
    }
    tracing::info!("using {} with embedding model {}", provider.name(), provider.embedding_model_id());

    let index = bootstrap::prepare_index(provider.clone(), &config).await?;
    let retriever = Arc::new(Retriever::new(
        Arc::new(index),
        RetrieverConfig {
            top_k: config.retrieval.top_k,
            excerpt_cap_chars: config.retrieval.excerpt_cap_chars,
            max_distance: config.retrieval.max_distance,
        },
    ));

    println!("Ask your question about the lecture PDFs (type 'exit' to quit):");
    Session::new(provider, retriever).run().await?;
    Ok(())
}

fn build_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let timeout = Duration::from_secs(config.llm.request_timeout_secs);
    match config.llm.provider.as_str() {
        "ollama" => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.llm.embedding_model.clone(),
            timeout,
        ))),
        "openai" => {
            let api_key = std::env::var("LECTERN_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .context(
                    "openai provider selected but neither LECTERN_API_KEY nor OPENAI_API_KEY is set",
                )?;
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                Some(config.llm.embedding_model.clone()),
                timeout,
            )))
        }
        other => bail!("unknown LLM provider '{other}' (expected 'ollama' or 'openai')"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_ollama_provider() {
        let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(provider.supports_embeddings());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
        config.llm.provider = "carrier-pigeon".into();
        assert!(build_provider(&config).is_err());
    }
}
