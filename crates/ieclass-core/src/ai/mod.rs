//! Pluggable external classifier for fields the keyword rules miss
//!
//! # Architecture
//!
//! - `ExternalClassifier` trait: the interface the resolver calls
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;
pub mod parsing;

pub use mock::MockBackend;
#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::label_by_markers;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::IeType;

/// Trait for classifiers consulted after the keyword rules miss
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait ExternalClassifier: Send + Sync {
    /// Decide income or expense for a field name
    async fn classify_field(&self, field_name: &str, doc_type_hint: Option<&str>)
        -> Result<IeType>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Get the host URL (for logging)
    pub fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(_) => "mock://localhost",
        }
    }
}

// Implement ExternalClassifier for AIClient by delegating to the inner backend
#[async_trait]
impl ExternalClassifier for AIClient {
    async fn classify_field(
        &self,
        field_name: &str,
        doc_type_hint: Option<&str>,
    ) -> Result<IeType> {
        match self {
            AIClient::Ollama(b) => b.classify_field(field_name, doc_type_hint).await,
            AIClient::Mock(b) => b.classify_field(field_name, doc_type_hint).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_classify_field() {
        let client = AIClient::mock();
        let label = client.classify_field("성과급", Some("소득")).await.unwrap();
        assert_eq!(label, IeType::Income);
    }

    #[test]
    fn test_ollama_trims_trailing_slash() {
        let client = AIClient::ollama("http://localhost:11434/", "llama3.2");
        assert_eq!(client.host(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }
}
