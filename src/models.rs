//! Data models for call coaching.
//!
//! This module contains the structured analysis artifact produced per call,
//! the call records read back from the store, and the trend snapshot
//! computed over a window of recent calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Overall grade assigned to a call.
///
/// The wire literal for [`CallGrade::NeedsImprovement`] is `"Needs Improvement"`
/// (with a space); matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallGrade {
    /// Objections handled well, next steps clear, deal moved forward.
    Strong,
    /// Acceptable call with room to improve.
    Okay,
    /// Missed objections, unclear next steps, or no deal progression.
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl CallGrade {
    /// All grades in wire order.
    pub const ALL: [CallGrade; 3] = [
        CallGrade::Strong,
        CallGrade::Okay,
        CallGrade::NeedsImprovement,
    ];

    /// The canonical wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallGrade::Strong => "Strong",
            CallGrade::Okay => "Okay",
            CallGrade::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Parse an exact wire literal. Returns `None` for anything else,
    /// including case variants such as `"strong"`.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|grade| grade.as_str() == s)
    }

    /// Returns an emoji representation of the grade.
    pub fn emoji(&self) -> &'static str {
        match self {
            CallGrade::Strong => "🟢",
            CallGrade::Okay => "🟡",
            CallGrade::NeedsImprovement => "🔴",
        }
    }
}

impl fmt::Display for CallGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical objection category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectionCategory {
    Pricing,
    Competition,
    Timing,
    Authority,
    /// Anything the taxonomy does not recognise. Never reported as a trend.
    Other,
}

impl ObjectionCategory {
    /// All categories in taxonomy order.
    pub const ALL: [ObjectionCategory; 5] = [
        ObjectionCategory::Pricing,
        ObjectionCategory::Competition,
        ObjectionCategory::Timing,
        ObjectionCategory::Authority,
        ObjectionCategory::Other,
    ];

    /// Whether this category takes part in trend reporting.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, ObjectionCategory::Other)
    }
}

impl fmt::Display for ObjectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectionCategory::Pricing => write!(f, "Pricing"),
            ObjectionCategory::Competition => write!(f, "Competition"),
            ObjectionCategory::Timing => write!(f, "Timing"),
            ObjectionCategory::Authority => write!(f, "Authority"),
            ObjectionCategory::Other => write!(f, "Other"),
        }
    }
}

/// The structured coaching analysis extracted from one call's notes.
///
/// Array fields are never absent: a missing or `null` array in the source
/// JSON deserializes to an empty vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// 2 to 3 sentence overview of the call and deal status.
    pub summary: String,
    /// Overall call grade.
    pub call_grade: CallGrade,
    /// Short factual justifications for the grade.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub grade_reason: Vec<String>,
    /// Positive or negative buying signals.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_signals: Vec<String>,
    /// Free-text objections, not yet normalized.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub objections: Vec<String>,
    /// Feedback for the representative.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub coaching_notes: Vec<String>,
    /// Concrete next actions.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub next_steps: Vec<String>,
}

impl Analysis {
    /// Creates an analysis with the given summary and grade and empty lists.
    pub fn new(summary: impl Into<String>, call_grade: CallGrade) -> Self {
        Self {
            summary: summary.into(),
            call_grade,
            grade_reason: Vec::new(),
            key_signals: Vec::new(),
            objections: Vec::new(),
            coaching_notes: Vec::new(),
            next_steps: Vec::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A call as seen by the trend aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedCall {
    /// Call identifier.
    pub id: String,
    /// When the call record was created.
    pub created_at: DateTime<Utc>,
    /// Display name of the assigned representative, if any.
    #[serde(default)]
    pub representative_name: Option<String>,
    /// The latest analysis, if the call has been analyzed.
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

impl AnalyzedCall {
    /// Whether the call carries a valid graded analysis.
    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }

    /// The representative name, ignoring blank values.
    pub fn representative(&self) -> Option<&str> {
        self.representative_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Why a trend snapshot could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsufficientDataReason {
    #[serde(rename = "not enough calls")]
    NotEnoughCalls,
    #[serde(rename = "not enough analyzed calls")]
    NotEnoughAnalyzedCalls,
}

impl InsufficientDataReason {
    /// Human-facing guidance for the empty state.
    pub fn hint(&self, min_calls: usize) -> String {
        match self {
            InsufficientDataReason::NotEnoughCalls => format!(
                "Not enough calls to generate trends. Create at least {} calls.",
                min_calls
            ),
            InsufficientDataReason::NotEnoughAnalyzedCalls => format!(
                "Not enough analyzed calls. Run AI analysis on at least {} calls to see trends.",
                min_calls
            ),
        }
    }
}

impl fmt::Display for InsufficientDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsufficientDataReason::NotEnoughCalls => write!(f, "not enough calls"),
            InsufficientDataReason::NotEnoughAnalyzedCalls => {
                write!(f, "not enough analyzed calls")
            }
        }
    }
}

/// The three trend narratives for a window of calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub objection_trend: String,
    pub quality_trend: String,
    pub rep_trend: String,
}

/// Marker payload for the insufficient-data state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientData {
    pub insufficient_data_reason: InsufficientDataReason,
}

/// Result of trend aggregation: either all three trends or one reason why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrendSnapshot {
    Ready(TrendReport),
    InsufficientData(InsufficientData),
}

impl TrendSnapshot {
    pub fn insufficient(reason: InsufficientDataReason) -> Self {
        TrendSnapshot::InsufficientData(InsufficientData {
            insufficient_data_reason: reason,
        })
    }

    /// The trends, if there was enough data.
    pub fn report(&self) -> Option<&TrendReport> {
        match self {
            TrendSnapshot::Ready(report) => Some(report),
            TrendSnapshot::InsufficientData(_) => None,
        }
    }

    /// The reason for absence, if there was not enough data.
    pub fn insufficient_data_reason(&self) -> Option<InsufficientDataReason> {
        match self {
            TrendSnapshot::Ready(_) => None,
            TrendSnapshot::InsufficientData(data) => Some(data.insufficient_data_reason),
        }
    }
}

/// An analysis with the context it was produced in, as rendered to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Store id of the analyzed call, when it came from the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
    /// Provider and model, e.g. `ollama:llama3.2:latest`.
    pub model_used: String,
    pub analysis_date: DateTime<Utc>,
    pub analysis: Analysis,
}

/// Raw objection count for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectionCount {
    pub category: ObjectionCategory,
    pub count: usize,
}

/// A trend snapshot with the window it was computed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTrendsReport {
    pub generated_at: DateTime<Utc>,
    pub calls_considered: usize,
    pub analyzed_calls: usize,
    pub min_calls: usize,
    pub trends: TrendSnapshot,
    /// Every category, `Other` included, in taxonomy order.
    pub objection_distribution: Vec<ObjectionCount>,
}
