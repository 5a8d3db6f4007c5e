use crate::llm::client::InferenceService;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use tracing::debug;

pub struct OllamaInference {
    client: Ollama,
    model: String,
}

impl OllamaInference {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_host_port(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }
}

/// Splits `http://host:port` into (`http://host`, port), defaulting to 11434.
fn split_host_port(base_url: &str) -> (String, u16) {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", base_url),
    };
    let rest = rest.trim_end_matches('/');

    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(11434),
        ),
        None => (format!("{}://{}", scheme, rest), 11434),
    }
}

#[async_trait]
impl InferenceService for OllamaInference {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending Ollama chat request");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::Inference(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            split_host_port("https://ollama.internal/"),
            ("https://ollama.internal".to_string(), 11434)
        );
        assert_eq!(
            split_host_port("10.0.0.5:9999"),
            ("http://10.0.0.5".to_string(), 9999)
        );
    }
}
