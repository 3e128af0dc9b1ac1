//! Call-insight extraction.
//!
//! This module turns raw call notes into a validated coaching analysis
//! using a text-completion provider.

pub mod orchestrator;
pub mod prompt;
pub mod validator;

pub use orchestrator::{AnalyzeError, Extractor, MIN_INPUT_CHARS};
pub use validator::{strip_code_fences, validate_analysis, ValidationError};
