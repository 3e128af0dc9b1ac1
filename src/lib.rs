//! CallCoach - LLM-powered sales call coaching.
//!
//! Extracts a structured coaching [`Analysis`] from raw call notes through a
//! [`CompletionService`], and aggregates the analyses of recent calls into
//! team-level trend narratives.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod models;
pub mod provider;
pub mod report;
pub mod store;
pub mod trends;

pub use extraction::{AnalyzeError, Extractor};
pub use models::{
    Analysis, AnalyzedCall, CallGrade, InsufficientDataReason, ObjectionCategory, TrendReport,
    TrendSnapshot,
};
pub use provider::{build_provider, CompletionService, ProviderError};
pub use store::{CallWindowReader, JsonFileStore};
pub use trends::{compute_trends, normalize_objection, TrendConfig};
