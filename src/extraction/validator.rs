//! Validation of raw model output against the analysis schema.
//!
//! Providers are asked for JSON but some still wrap the document in
//! Markdown code fences or a sentence of prose. The validator peels that
//! off, parses, and checks the grade literal. It never repairs a document:
//! anything that does not parse is rejected whole.

use crate::models::{Analysis, CallGrade};
use serde_json::Value;

/// Why a model payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("model output is empty")]
    Empty,

    #[error("model output contains no JSON object")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output is not a JSON object")]
    NotAnObject,

    #[error("missing call_grade")]
    MissingGrade,

    #[error("invalid call_grade: {0}")]
    InvalidGrade(String),
}

/// Remove a surrounding Markdown code fence, if any.
///
/// Handles a leading fence with an optional language tag (`` ```json ``) and
/// a trailing fence. Text without fences is returned trimmed, so applying
/// this twice gives the same result as applying it once.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Locate the JSON document inside the model output.
fn json_body(raw: &str) -> Result<&str, ValidationError> {
    let text = strip_code_fences(raw);

    if text.is_empty() {
        return Err(ValidationError::Empty);
    }

    // Top-level arrays go to the parser whole and are rejected there.
    if text.starts_with('[') || (text.starts_with('{') && text.ends_with('}')) {
        return Ok(text);
    }

    // Prose or a stray fence around the object: take the outermost braces.
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(ValidationError::NoJsonObject),
    }
}

/// Parse and validate raw model output into an [`Analysis`].
///
/// `call_grade` must be one of the exact wire literals. Array fields that
/// are absent or `null` become empty; array elements must be strings.
/// Unknown fields are ignored.
pub fn validate_analysis(raw: &str) -> Result<Analysis, ValidationError> {
    let body = json_body(raw)?;
    let value: Value = serde_json::from_str(body)?;

    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    match object.get("call_grade") {
        None | Some(Value::Null) => return Err(ValidationError::MissingGrade),
        Some(Value::String(grade)) => {
            if CallGrade::from_wire(grade).is_none() {
                return Err(ValidationError::InvalidGrade(grade.clone()));
            }
        }
        Some(other) => return Err(ValidationError::InvalidGrade(other.to_string())),
    }

    Ok(serde_json::from_value(value)?)
}
