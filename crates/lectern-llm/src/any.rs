//! Enum dispatch over the concrete provider backends.

use crate::error::LlmError;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(crate::mock::MockProvider),
}

macro_rules! dispatch {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            AnyProvider::Ollama(p) => p.$method($($arg),*),
            AnyProvider::OpenAi(p) => p.$method($($arg),*),
            #[cfg(feature = "mock")]
            AnyProvider::Mock(p) => p.$method($($arg),*),
        }
    };
}

macro_rules! dispatch_async {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            AnyProvider::Ollama(p) => p.$method($($arg),*).await,
            AnyProvider::OpenAi(p) => p.$method($($arg),*).await,
            #[cfg(feature = "mock")]
            AnyProvider::Mock(p) => p.$method($($arg),*).await,
        }
    };
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        dispatch_async!(self, chat, messages)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        dispatch_async!(self, embed, text)
    }

    fn supports_embeddings(&self) -> bool {
        dispatch!(self, supports_embeddings)
    }

    fn name(&self) -> &str {
        dispatch!(self, name)
    }

    fn embedding_model_id(&self) -> &str {
        dispatch!(self, embedding_model_id)
    }
}
