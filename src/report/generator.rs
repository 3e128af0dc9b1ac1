//! Markdown report generation.
//!
//! This module renders a single call analysis and the team trend snapshot
//! as Markdown, plus JSON renderings of the same report structs.

use crate::models::{AnalysisReport, CallGrade, TeamTrendsReport, TrendReport};
use crate::trends::normalize_objection;
use anyhow::Result;
use serde::Serialize;

/// Generate the Markdown report for one analyzed call.
pub fn generate_analysis_markdown(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str("# Call Analysis\n\n");
    output.push_str(&generate_analysis_metadata(report));

    let analysis = &report.analysis;

    output.push_str("## Summary\n\n");
    output.push_str(&analysis.summary);
    output.push_str("\n\n");

    output.push_str(&generate_grade_section(
        analysis.call_grade,
        &analysis.grade_reason,
    ));

    output.push_str(&generate_list_section("Key Signals", &analysis.key_signals));
    output.push_str(&generate_objections_section(&analysis.objections));
    output.push_str(&generate_list_section(
        "Coaching Notes",
        &analysis.coaching_notes,
    ));

    output.push_str("## Next Steps\n\n");
    if analysis.next_steps.is_empty() {
        output.push_str("_None recorded._\n\n");
    } else {
        for (i, step) in analysis.next_steps.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, step));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());

    output
}

fn generate_analysis_metadata(report: &AnalysisReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref call_id) = report.call_id {
        section.push_str(&format!("- **Call:** `{}`\n", call_id));
    }
    if let Some(ref rep) = report.representative {
        section.push_str(&format!("- **Representative:** {}\n", rep));
    }
    section.push_str(&format!("- **Model Used:** `{}`\n", report.model_used));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n\n",
        report.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section
}

fn generate_grade_section(grade: CallGrade, reasons: &[String]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Grade: {} **{}**\n\n", grade.emoji(), grade));
    for reason in reasons {
        section.push_str(&format!("- {}\n", reason));
    }
    if !reasons.is_empty() {
        section.push('\n');
    }

    section
}

fn generate_list_section(title: &str, items: &[String]) -> String {
    let mut section = format!("## {}\n\n", title);

    if items.is_empty() {
        section.push_str("_None recorded._\n\n");
        return section;
    }

    for item in items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');

    section
}

/// Objections with their canonical category alongside.
fn generate_objections_section(objections: &[String]) -> String {
    let mut section = String::from("## Objections\n\n");

    if objections.is_empty() {
        section.push_str("_None recorded._\n\n");
        return section;
    }

    for objection in objections {
        section.push_str(&format!(
            "- {} *({})*\n",
            objection,
            normalize_objection(objection)
        ));
    }
    section.push('\n');

    section
}

/// Generate the Markdown report for the team trend snapshot.
pub fn generate_trends_markdown(report: &TeamTrendsReport) -> String {
    let mut output = String::new();

    output.push_str("# Team Trends\n\n");

    output.push_str("## Metadata\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "- **Calls Considered:** {}\n",
        report.calls_considered
    ));
    output.push_str(&format!(
        "- **Analyzed Calls:** {}\n\n",
        report.analyzed_calls
    ));

    match (report.trends.report(), report.trends.insufficient_data_reason()) {
        (Some(trends), _) => output.push_str(&generate_trend_sections(trends)),
        (None, Some(reason)) => {
            output.push_str("## Not Enough Data\n\n");
            output.push_str(&format!("{}\n\n", reason.hint(report.min_calls)));
        }
        (None, None) => {}
    }

    output.push_str(&generate_distribution_section(report));
    output.push_str(&generate_footer());

    output
}

fn generate_trend_sections(trends: &TrendReport) -> String {
    let mut section = String::new();

    section.push_str("## Objections\n\n");
    section.push_str(&format!("{}\n\n", trends.objection_trend));
    section.push_str("## Call Quality\n\n");
    section.push_str(&format!("{}\n\n", trends.quality_trend));
    section.push_str("## Representatives\n\n");
    section.push_str(&format!("{}\n\n", trends.rep_trend));

    section
}

fn generate_distribution_section(report: &TeamTrendsReport) -> String {
    let mut section = String::new();

    section.push_str("## Objection Distribution\n\n");
    section.push_str("| Category | Count |\n");
    section.push_str("|:---|:---:|\n");
    for entry in &report.objection_distribution {
        section.push_str(&format!("| {} | {} |\n", entry.category, entry.count));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Generated by CallCoach*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
