//! Report rendering.

pub mod generator;

pub use generator::{generate_analysis_markdown, generate_json_report, generate_trends_markdown};
