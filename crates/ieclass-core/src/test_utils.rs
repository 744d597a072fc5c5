//! Test utilities for ieclass-core
//!
//! This module provides a mock Ollama server that can be used for
//! development and integration tests.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::ai::label_by_markers;

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
///
/// Answers like a chatty model: a sentence followed by the JSON label.
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let field = extract_item_from_prompt(&request.prompt);
    let label = label_by_markers(&field);

    Json(GenerateResponse {
        model: request.model,
        response: format!(
            "The item \"{}\" is classified below.\n{{\"type\": \"{}\"}}",
            field,
            label.as_str()
        ),
        done: true,
    })
}

/// Pull the quoted value after `Item: ` out of the prompt
fn extract_item_from_prompt(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix("Item: "))
        .map(|rest| rest.trim().trim_matches('"').to_string())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_item_from_prompt() {
        let prompt = "Classify.\n\nItem: \"기타수당\"\nDocument type: \"소득\"\n";
        assert_eq!(extract_item_from_prompt(prompt), "기타수당");
        assert_eq!(extract_item_from_prompt("no item here"), "");
    }

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockOllamaServer::start().await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
    }
}
