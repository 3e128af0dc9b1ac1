//! Gemini `generateContent` client.
//!
//! Requests `application/json` output via `responseMimeType`; the model may
//! still wrap its answer in code fences, which the validator tolerates.

use super::{CompletionService, ProviderError};
use crate::config::ModelConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiSystemInstruction,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Completion client for Google's Gemini API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    url: String,
    model_name: String,
    api_key: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured env var.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .with_context(|| format!("{} not set", config.api_key_env))?;

        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let model_name = config.model_name().to_string();
        let url = config.base_url().trim_end_matches('/').to_string();
        info!("Using Gemini model {} at {}", model_name, url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            url,
            model_name,
            api_key,
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.url, self.model_name
        )
    }

    fn build_request(&self, system_instruction: &str, user_text: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: user_text.to_string(),
                }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: system_instruction.to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        }
    }
}

/// Concatenate the text parts of the first candidate.
///
/// `None` only when the envelope carries no candidate content. Blank text is
/// returned as is and left to the validator.
fn first_candidate_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    Some(content.parts.into_iter().map(|p| p.text).collect())
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let endpoint = self.endpoint();
        let request = self.build_request(system_instruction, user_text);

        debug!("Sending generateContent request to {}", endpoint);

        let response = self
            .http_client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_send(e, &self.url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        first_candidate_text(body).ok_or(ProviderError::EmptyResponse)
    }

    fn describe(&self) -> String {
        format!("gemini:{}", self.model_name)
    }
}
