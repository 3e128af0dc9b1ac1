//! Ollama chat client.
//!
//! Sends a single non-streaming `/api/chat` request with JSON output
//! requested through Ollama's `format` option.

use super::{CompletionService, ProviderError};
use crate::config::ModelConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Completion client for a local or remote Ollama server.
pub struct OllamaClient {
    http_client: reqwest::Client,
    url: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OllamaClient {
    /// Create a client from model settings.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let model_name = config.model_name().to_string();
        let url = config.base_url().trim_end_matches('/').to_string();
        info!("Using Ollama model {} at {}", model_name, url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            url,
            model_name,
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn build_request<'a>(
        &'a self,
        system_instruction: &str,
        user_text: &str,
    ) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_text.to_string(),
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl CompletionService for OllamaClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.url);
        let request = self.build_request(system_instruction, user_text);

        debug!("Sending chat request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_send(e, &self.url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        // Blank content is a model answer, not a transport failure.
        Ok(chat_response.message.content)
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model_name)
    }
}
