//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. The classification prompt is
//! embedded from `prompts/classify_ie_type.md`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::IeType;

use super::parsing::parse_ie_type;
use super::ExternalClassifier;

/// Embedded classification prompt (compiled into binary)
const CLASSIFY_PROMPT: &str = include_str!("../../../../prompts/classify_ie_type.md");

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Get the host URL (for logging)
    pub fn host(&self) -> &str {
        &self.base_url
    }
}

/// Fill the `{{field}}` and `{{hint}}` placeholders
fn render_prompt(field_name: &str, doc_type_hint: Option<&str>) -> String {
    CLASSIFY_PROMPT
        .replace("{{field}}", field_name)
        .replace("{{hint}}", doc_type_hint.unwrap_or("unknown"))
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl ExternalClassifier for OllamaBackend {
    async fn classify_field(
        &self,
        field_name: &str,
        doc_type_hint: Option<&str>,
    ) -> Result<IeType> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: render_prompt(field_name, doc_type_hint),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(field = %field_name, "Ollama response: {}", ollama_response.response);

        parse_ie_type(&ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
