use std::time::Duration;

use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};
use crate::retry;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
    request_timeout: Duration,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(
        base_url: &str,
        model: String,
        embedding_model: String,
        request_timeout: Duration,
    ) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
            request_timeout,
        }
    }

    /// Check if Ollama is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection to Ollama fails.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.client.list_local_models().await.map_err(|e| LlmError::Api {
            provider: "ollama",
            message: format!("failed to connect to Ollama — is it running? {e}"),
        })?;
        Ok(())
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();

        let response = retry::call_bounded("ollama", "chat", self.request_timeout, || {
            let request =
                ChatMessageRequest::new(self.model.clone(), ollama_messages.clone());
            async move {
                self.client
                    .send_chat_messages(request)
                    .await
                    .map_err(|e| LlmError::Api {
                        provider: "ollama",
                        message: format!("chat request failed: {e}"),
                    })
            }
        })
        .await?;

        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response = retry::call_bounded("ollama", "embed", self.request_timeout, || {
            let request = GenerateEmbeddingsRequest::new(
                self.embedding_model.clone(),
                EmbeddingsInput::from(text),
            );
            async move {
                self.client
                    .generate_embeddings(request)
                    .await
                    .map_err(|e| LlmError::Api {
                        provider: "ollama",
                        message: format!("embedding request failed: {e}"),
                    })
            }
        })
        .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }

    fn embedding_model_id(&self) -> &str {
        &self.embedding_model
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    match msg.role {
        Role::System => ChatMessage::system(msg.content.clone()),
        Role::User => ChatMessage::user(msg.content.clone()),
        Role::Assistant => ChatMessage::assistant(msg.content.clone()),
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), 11434)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> OllamaProvider {
        OllamaProvider::new(
            "http://localhost:11434",
            "mistral:7b".into(),
            "nomic-embed-text".into(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn parse_host_port_with_port() {
        let (host, port) = parse_host_port("http://localhost:11434");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn parse_host_port_trailing_slash() {
        let (host, port) = parse_host_port("http://localhost:8080/");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 8080);
    }

    #[test]
    fn parse_host_port_without_port_defaults() {
        let (host, port) = parse_host_port("somehost");
        assert_eq!(host, "somehost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn provider_name_and_model_id() {
        let p = test_provider();
        assert_eq!(p.name(), "ollama");
        assert_eq!(p.embedding_model_id(), "nomic-embed-text");
        assert!(p.supports_embeddings());
    }

    #[test]
    fn convert_message_roles() {
        let sys = convert_message(&Message::system("s"));
        assert_eq!(sys.content, "s");
        let user = convert_message(&Message::user("u"));
        assert_eq!(user.content, "u");
    }
}
