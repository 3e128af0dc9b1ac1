//! Text-completion providers.
//!
//! The extraction orchestrator only needs one capability from a model:
//! turn a system instruction plus user text into raw text. This module
//! defines that seam and the HTTP clients that implement it.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::config::{ModelConfig, ProviderKind};
use anyhow::Result;
use async_trait::async_trait;

/// Failure talking to a completion service.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("cannot connect to {url}")]
    Connect { url: String },

    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable provider response: {0}")]
    InvalidResponse(String),

    /// The response envelope carried no candidate at all.
    #[error("provider returned no candidates")]
    EmptyResponse,
}

impl ProviderError {
    /// Classify a transport error the way both HTTP clients report it.
    pub(crate) fn from_send(err: reqwest::Error, url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                seconds: timeout_seconds,
            }
        } else if err.is_connect() {
            ProviderError::Connect {
                url: url.to_string(),
            }
        } else {
            ProviderError::Request(err)
        }
    }
}

/// An opaque text-completion service.
///
/// Implementations perform exactly one round trip per call and must ask the
/// model for JSON output where the backend supports it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate raw text for the given instruction and user input.
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, ProviderError>;

    /// Short label for logs and reports.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        (**self).generate(system_instruction, user_text).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the configured provider.
pub fn build_provider(config: &ModelConfig) -> Result<Box<dyn CompletionService>> {
    match config.provider {
        ProviderKind::Ollama => Ok(Box::new(OllamaClient::new(config)?)),
        ProviderKind::Gemini => Ok(Box::new(GeminiClient::from_config(config)?)),
    }
}
