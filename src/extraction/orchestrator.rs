//! Call analysis orchestration.
//!
//! One call to [`Extractor::analyze`] makes at most one round trip to the
//! completion service. There is no retry here; the caller decides whether to
//! try again. The extractor never persists anything and only borrows the
//! caller's notes, so a failed analysis leaves the input untouched.

use super::prompt::build_system_instruction;
use super::validator::{validate_analysis, ValidationError};
use crate::models::Analysis;
use crate::provider::{CompletionService, ProviderError};
use tracing::{debug, info, warn};

/// Shortest call notes, in characters, worth sending to the model.
pub const MIN_INPUT_CHARS: usize = 50;

/// Why an analysis could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("call notes too short for analysis: {length} characters (minimum {minimum})")]
    InputTooShort { length: usize, minimum: usize },

    #[error("completion provider unavailable: {source}")]
    ProviderUnavailable { source: ProviderError },

    #[error("model returned malformed output: {source}")]
    MalformedOutput {
        source: ValidationError,
        /// The payload exactly as the provider returned it.
        raw: String,
    },
}

impl AnalyzeError {
    /// Whether retrying the same input could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AnalyzeError::InputTooShort { .. })
    }
}

/// Turns raw call notes into a validated [`Analysis`].
pub struct Extractor<S> {
    service: S,
}

impl<S: CompletionService> Extractor<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The underlying completion service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Analyze call notes, addressing coaching to `rep_name` when given.
    pub async fn analyze(
        &self,
        raw_text: &str,
        rep_name: Option<&str>,
    ) -> Result<Analysis, AnalyzeError> {
        let length = raw_text.chars().count();
        if length < MIN_INPUT_CHARS {
            debug!("Rejecting {} character input before calling the model", length);
            return Err(AnalyzeError::InputTooShort {
                length,
                minimum: MIN_INPUT_CHARS,
            });
        }

        let system_instruction = build_system_instruction(rep_name);
        info!(
            "Analyzing {} characters of call notes with {}",
            length,
            self.service.describe()
        );

        let raw = self
            .service
            .generate(&system_instruction, raw_text)
            .await
            .map_err(|source| {
                warn!("Completion provider failed: {}", source);
                AnalyzeError::ProviderUnavailable { source }
            })?;

        match validate_analysis(&raw) {
            Ok(analysis) => {
                info!("Call graded {}", analysis.call_grade);
                Ok(analysis)
            }
            Err(source) => {
                warn!("Malformed model output ({}): {}", source, raw);
                Err(AnalyzeError::MalformedOutput { source, raw })
            }
        }
    }
}
