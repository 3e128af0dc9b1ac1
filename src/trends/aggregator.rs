//! Team trend aggregation.
//!
//! Rolls the analyses of the most recent calls into three short narratives:
//! the dominant objection, overall call quality, and the most active
//! representative. The input window is newest first, and every tie is broken
//! in favour of whatever appears earliest in it.

use super::normalizer::normalize_objection;
use crate::config::TrendsConfig;
use crate::models::{
    Analysis, AnalyzedCall, CallGrade, InsufficientDataReason, ObjectionCategory, TrendReport,
    TrendSnapshot,
};
use tracing::debug;

/// Reason used when no "Needs Improvement" call explains its grade.
const DEFAULT_NEEDS_IMPROVEMENT_REASON: &str = "missed opportunities";

/// Words kept from a grade reason in the quality trend.
const REASON_WORDS: usize = 6;

/// Thresholds for trend aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendConfig {
    /// Most recent calls considered.
    pub window_size: usize,
    /// Minimum calls, and minimum analyzed calls, before trends are reported.
    pub min_calls: usize,
    /// Percentage of "Needs Improvement" calls that triggers the warning trend.
    pub needs_improvement_percent: u32,
    /// Percentage of calls that makes a grade the prevailing one.
    pub majority_percent: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_calls: 3,
            needs_improvement_percent: 30,
            majority_percent: 50,
        }
    }
}

impl From<&TrendsConfig> for TrendConfig {
    fn from(config: &TrendsConfig) -> Self {
        Self {
            window_size: config.window_size,
            min_calls: config.min_calls,
            needs_improvement_percent: config.needs_improvement_percent,
            majority_percent: config.majority_percent,
        }
    }
}

/// Smallest count that is at least `percent`% of `total`.
fn ceil_percent(total: usize, percent: u32) -> usize {
    (total * percent as usize).div_ceil(100)
}

/// A call paired with its analysis.
type Graded<'a> = (&'a AnalyzedCall, &'a Analysis);

/// Compute the trend snapshot for a newest-first window of calls.
///
/// Only the first `window_size` entries are considered. The result is
/// recomputed from scratch on every call.
pub fn compute_trends(window: &[AnalyzedCall], config: &TrendConfig) -> TrendSnapshot {
    let window = &window[..window.len().min(config.window_size)];
    // An empty window never has trends, whatever the threshold.
    let min_calls = config.min_calls.max(1);

    if window.len() < min_calls {
        debug!("Only {} calls in window", window.len());
        return TrendSnapshot::insufficient(InsufficientDataReason::NotEnoughCalls);
    }

    let analyzed: Vec<Graded<'_>> = window
        .iter()
        .filter_map(|call| call.analysis.as_ref().map(|analysis| (call, analysis)))
        .collect();

    if analyzed.len() < min_calls {
        debug!(
            "Only {} of {} calls analyzed",
            analyzed.len(),
            window.len()
        );
        return TrendSnapshot::insufficient(InsufficientDataReason::NotEnoughAnalyzedCalls);
    }

    TrendSnapshot::Ready(TrendReport {
        objection_trend: objection_trend(&analyzed),
        quality_trend: quality_trend(&analyzed, config),
        rep_trend: rep_trend(&analyzed),
    })
}

/// Reportable objection counts in order of first appearance.
pub fn tally_objections<'a>(
    analyses: impl IntoIterator<Item = &'a Analysis>,
) -> Vec<(ObjectionCategory, usize)> {
    let mut tally: Vec<(ObjectionCategory, usize)> = Vec::new();

    for objection in analyses.into_iter().flat_map(|a| a.objections.iter()) {
        let category = normalize_objection(objection);
        if !category.is_reportable() {
            continue;
        }
        match tally.iter_mut().find(|(c, _)| *c == category) {
            Some(entry) => entry.1 += 1,
            None => tally.push((category, 1)),
        }
    }

    tally
}

fn objection_trend(analyzed: &[Graded<'_>]) -> String {
    let tally = tally_objections(analyzed.iter().map(|(_, analysis)| *analysis));

    // Strictly greater keeps the earliest category on a tie.
    let mut top: Option<(ObjectionCategory, usize)> = None;
    for (category, count) in tally {
        if top.map_or(true, |(_, best)| count > best) {
            top = Some((category, count));
        }
    }

    match top {
        Some((category, count)) => format!(
            "{} objections appeared in {} of the last {} calls.",
            category,
            count,
            analyzed.len()
        ),
        None => "No dominant objection patterns detected recently.".to_string(),
    }
}

/// Grade counts and thresholds shared by the quality rules.
struct QualityContext<'a> {
    strong: usize,
    okay: usize,
    needs_improvement: usize,
    warning_threshold: usize,
    majority_threshold: usize,
    first_needs_improvement_reason: Option<&'a str>,
}

impl<'a> QualityContext<'a> {
    fn new(analyzed: &[Graded<'a>], config: &TrendConfig) -> Self {
        let total = analyzed.len();
        let count = |grade: CallGrade| {
            analyzed
                .iter()
                .filter(|(_, analysis)| analysis.call_grade == grade)
                .count()
        };

        let first_needs_improvement_reason = analyzed
            .iter()
            .filter(|(_, analysis)| analysis.call_grade == CallGrade::NeedsImprovement)
            .flat_map(|&(_, analysis)| analysis.grade_reason.iter())
            .map(|reason| reason.trim())
            .find(|reason| !reason.is_empty());

        Self {
            strong: count(CallGrade::Strong),
            okay: count(CallGrade::Okay),
            needs_improvement: count(CallGrade::NeedsImprovement),
            warning_threshold: ceil_percent(total, config.needs_improvement_percent),
            majority_threshold: ceil_percent(total, config.majority_percent),
            first_needs_improvement_reason,
        }
    }
}

/// One step of the quality cascade.
struct QualityRule {
    applies: fn(&QualityContext<'_>) -> bool,
    describe: fn(&QualityContext<'_>) -> String,
}

/// Evaluated top-down; the first rule that applies wins. The last rule
/// always applies.
const QUALITY_RULES: [QualityRule; 4] = [
    QualityRule {
        applies: mostly_needs_improvement,
        describe: describe_needs_improvement,
    },
    QualityRule {
        applies: mostly_strong,
        describe: describe_strong,
    },
    QualityRule {
        applies: mostly_okay,
        describe: describe_okay,
    },
    QualityRule {
        applies: always,
        describe: describe_mixed,
    },
];

fn mostly_needs_improvement(ctx: &QualityContext<'_>) -> bool {
    ctx.needs_improvement >= ctx.warning_threshold
}

fn mostly_strong(ctx: &QualityContext<'_>) -> bool {
    ctx.strong >= ctx.majority_threshold
}

fn mostly_okay(ctx: &QualityContext<'_>) -> bool {
    ctx.okay >= ctx.majority_threshold
}

fn always(_: &QualityContext<'_>) -> bool {
    true
}

fn describe_needs_improvement(ctx: &QualityContext<'_>) -> String {
    let reason = ctx
        .first_needs_improvement_reason
        .unwrap_or(DEFAULT_NEEDS_IMPROVEMENT_REASON);
    format!(
        "Several recent calls were graded \"Needs Improvement\", often related to: \"{}\"",
        shorten_reason(reason)
    )
}

fn describe_strong(_: &QualityContext<'_>) -> String {
    "Recent performance is strong, with consistent effective objection handling.".to_string()
}

fn describe_okay(_: &QualityContext<'_>) -> String {
    "Most recent calls are graded as 'Okay', showing steady but average performance.".to_string()
}

fn describe_mixed(_: &QualityContext<'_>) -> String {
    "Call quality has been mixed recently.".to_string()
}

/// First six words of a reason, followed by an ellipsis.
fn shorten_reason(reason: &str) -> String {
    let words: Vec<&str> = reason.split_whitespace().take(REASON_WORDS).collect();
    format!("{}...", words.join(" "))
}

fn quality_trend(analyzed: &[Graded<'_>], config: &TrendConfig) -> String {
    let ctx = QualityContext::new(analyzed, config);
    debug!(
        "Grades: {} strong, {} okay, {} needs improvement",
        ctx.strong, ctx.okay, ctx.needs_improvement
    );

    QUALITY_RULES
        .iter()
        .find(|rule| (rule.applies)(&ctx))
        .map(|rule| (rule.describe)(&ctx))
        .unwrap_or_default()
}

/// Group graded calls by representative, in order of first appearance.
///
/// Calls without an assigned representative are skipped.
pub fn group_by_representative<'a>(
    calls: impl IntoIterator<Item = &'a AnalyzedCall>,
) -> Vec<(&'a str, Vec<CallGrade>)> {
    let mut grouped: Vec<(&'a str, Vec<CallGrade>)> = Vec::new();

    for call in calls {
        let (Some(name), Some(analysis)) = (call.representative(), call.analysis.as_ref()) else {
            continue;
        };
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1.push(analysis.call_grade),
            None => grouped.push((name, vec![analysis.call_grade])),
        }
    }

    grouped
}

fn rep_trend(analyzed: &[Graded<'_>]) -> String {
    let grouped = group_by_representative(analyzed.iter().map(|(call, _)| *call));

    // Strictly greater keeps the most recently seen representative on a tie.
    let mut top: Option<&(&str, Vec<CallGrade>)> = None;
    for entry in &grouped {
        if top.map_or(true, |best| entry.1.len() > best.1.len()) {
            top = Some(entry);
        }
    }

    let Some((name, grades)) = top else {
        return "Sales representatives are showing varied activity levels.".to_string();
    };

    let strong = grades.iter().filter(|g| **g == CallGrade::Strong).count();
    let needs_improvement = grades
        .iter()
        .filter(|g| **g == CallGrade::NeedsImprovement)
        .count();

    if strong * 2 > grades.len() {
        format!(
            "{}'s recent calls show strong engagement and effective deal progression.",
            name
        )
    } else if needs_improvement > 0 {
        format!(
            "{}'s recent calls indicate meaningful activity, though some coaching on objections may be needed.",
            name
        )
    } else {
        format!("{} has been the most active representative recently.", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn analysis(grade: CallGrade, objections: &[&str], reasons: &[&str]) -> Analysis {
        let mut analysis = Analysis::new("Summary.", grade);
        analysis.objections = objections.iter().map(|s| s.to_string()).collect();
        analysis.grade_reason = reasons.iter().map(|s| s.to_string()).collect();
        analysis
    }

    /// Build a newest-first window; entry `i` is `i` hours older than entry 0.
    fn window(entries: Vec<(Option<&str>, Option<Analysis>)>) -> Vec<AnalyzedCall> {
        let newest = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (rep, analysis))| AnalyzedCall {
                id: format!("call-{}", i),
                created_at: newest - Duration::hours(i as i64),
                representative_name: rep.map(String::from),
                analysis,
            })
            .collect()
    }

    fn graded(grade: CallGrade) -> (Option<&'static str>, Option<Analysis>) {
        (None, Some(analysis(grade, &[], &[])))
    }

    fn report(snapshot: TrendSnapshot) -> TrendReport {
        snapshot.report().cloned().expect("expected a full trend report")
    }

    #[test]
    fn test_ceil_percent() {
        assert_eq!(ceil_percent(10, 30), 3);
        assert_eq!(ceil_percent(4, 30), 2);
        assert_eq!(ceil_percent(7, 30), 3);
        assert_eq!(ceil_percent(3, 50), 2);
        assert_eq!(ceil_percent(4, 50), 2);
    }

    #[test]
    fn test_two_calls_is_not_enough() {
        let calls = window(vec![graded(CallGrade::Strong), graded(CallGrade::Okay)]);
        let snapshot = compute_trends(&calls, &TrendConfig::default());
        assert_eq!(
            snapshot.insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughCalls)
        );
        assert!(snapshot.report().is_none());
    }

    #[test]
    fn test_empty_window_is_not_enough() {
        let snapshot = compute_trends(&[], &TrendConfig::default());
        assert_eq!(
            snapshot.insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughCalls)
        );
    }

    #[test]
    fn test_zero_min_calls_still_needs_a_call() {
        let config = TrendConfig {
            min_calls: 0,
            ..TrendConfig::default()
        };
        assert_eq!(
            compute_trends(&[], &config).insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughCalls)
        );

        let calls = window(vec![(Some("Jess"), None)]);
        assert_eq!(
            compute_trends(&calls, &config).insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughAnalyzedCalls)
        );
    }

    #[test]
    fn test_too_few_analyzed_calls() {
        let calls = window(vec![
            graded(CallGrade::Strong),
            (Some("Jess"), None),
            graded(CallGrade::Okay),
            (None, None),
        ]);
        let snapshot = compute_trends(&calls, &TrendConfig::default());
        assert_eq!(
            snapshot.insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughAnalyzedCalls)
        );
    }

    #[test]
    fn test_only_window_size_calls_are_considered() {
        // Three unanalyzed recent calls push the analyzed ones out of a window of 3.
        let calls = window(vec![
            (None, None),
            (None, None),
            (None, None),
            graded(CallGrade::Strong),
            graded(CallGrade::Strong),
            graded(CallGrade::Strong),
        ]);
        let config = TrendConfig {
            window_size: 3,
            ..TrendConfig::default()
        };
        assert_eq!(
            compute_trends(&calls, &config).insufficient_data_reason(),
            Some(InsufficientDataReason::NotEnoughAnalyzedCalls)
        );
        assert!(compute_trends(&calls, &TrendConfig::default())
            .report()
            .is_some());
    }

    #[test]
    fn test_pricing_objection_trend() {
        let calls = window(vec![
            (None, Some(analysis(CallGrade::Okay, &["price too high"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["competitor X"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["price too high"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["timing issue"], &[]))),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.objection_trend,
            "Pricing objections appeared in 2 of the last 4 calls."
        );
    }

    #[test]
    fn test_objection_tie_goes_to_most_recent() {
        let calls = window(vec![
            (None, Some(analysis(CallGrade::Okay, &["Timing is bad"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["competitor"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["price"], &["x"]))),
            (None, Some(analysis(CallGrade::Okay, &["competitor", "price"], &[]))),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        // Competition and Pricing both have 2; Competition appears first.
        assert_eq!(
            trends.objection_trend,
            "Competition objections appeared in 2 of the last 4 calls."
        );
    }

    #[test]
    fn test_other_objections_never_dominate() {
        let calls = window(vec![
            (None, Some(analysis(CallGrade::Okay, &["legal review", "security"], &[]))),
            (None, Some(analysis(CallGrade::Okay, &["procurement"], &[]))),
            graded(CallGrade::Okay),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.objection_trend,
            "No dominant objection patterns detected recently."
        );
    }

    #[test]
    fn test_tally_keeps_first_appearance_order() {
        let newest = analysis(CallGrade::Okay, &["authority", "legal"], &[]);
        let older = analysis(CallGrade::Okay, &["expensive", "authority", "price"], &[]);

        let tally = tally_objections([&newest, &older]);
        assert_eq!(
            tally,
            vec![
                (ObjectionCategory::Authority, 2),
                (ObjectionCategory::Pricing, 2)
            ]
        );
    }

    #[test]
    fn test_needs_improvement_branch_with_ten_calls() {
        let mut entries = Vec::new();
        for i in 0..10 {
            if i % 2 == 0 {
                entries.push((
                    None,
                    Some(analysis(
                        CallGrade::NeedsImprovement,
                        &[],
                        &["Did not confirm budget owner or timeline before closing"],
                    )),
                ));
            } else {
                entries.push(graded(CallGrade::Strong));
            }
        }
        let trends = report(compute_trends(&window(entries), &TrendConfig::default()));
        assert_eq!(
            trends.quality_trend,
            "Several recent calls were graded \"Needs Improvement\", often related to: \"Did not confirm budget owner or...\""
        );
    }

    #[test]
    fn test_needs_improvement_beats_strong_majority() {
        let calls = window(vec![
            graded(CallGrade::Strong),
            (None, Some(analysis(CallGrade::NeedsImprovement, &[], &[]))),
            graded(CallGrade::Strong),
            (None, Some(analysis(CallGrade::NeedsImprovement, &[], &["  ", "Rushed close"]))),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.quality_trend,
            "Several recent calls were graded \"Needs Improvement\", often related to: \"Rushed close...\""
        );
    }

    #[test]
    fn test_needs_improvement_default_reason() {
        let calls = window(vec![
            graded(CallGrade::NeedsImprovement),
            graded(CallGrade::Okay),
            graded(CallGrade::Okay),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.quality_trend,
            "Several recent calls were graded \"Needs Improvement\", often related to: \"missed opportunities...\""
        );
    }

    #[test]
    fn test_blank_reasons_are_skipped() {
        let calls = window(vec![
            (None, Some(analysis(CallGrade::NeedsImprovement, &[], &["  ", ""]))),
            (
                None,
                Some(analysis(
                    CallGrade::NeedsImprovement,
                    &[],
                    &["  No clear next step was agreed with the buyer"],
                )),
            ),
            graded(CallGrade::Okay),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.quality_trend,
            "Several recent calls were graded \"Needs Improvement\", often related to: \"No clear next step was agreed...\""
        );
    }

    #[test]
    fn test_strong_okay_and_mixed_branches() {
        let strong = window(vec![
            graded(CallGrade::Strong),
            graded(CallGrade::Okay),
            graded(CallGrade::Strong),
            graded(CallGrade::NeedsImprovement),
        ]);
        assert_eq!(
            report(compute_trends(&strong, &TrendConfig::default())).quality_trend,
            "Recent performance is strong, with consistent effective objection handling."
        );

        let okay = window(vec![
            graded(CallGrade::Okay),
            graded(CallGrade::Strong),
            graded(CallGrade::Okay),
        ]);
        assert_eq!(
            report(compute_trends(&okay, &TrendConfig::default())).quality_trend,
            "Most recent calls are graded as 'Okay', showing steady but average performance."
        );

        let mixed = window(vec![
            graded(CallGrade::Okay),
            graded(CallGrade::Strong),
            graded(CallGrade::Okay),
            graded(CallGrade::Strong),
            graded(CallGrade::NeedsImprovement),
        ]);
        assert_eq!(
            report(compute_trends(&mixed, &TrendConfig::default())).quality_trend,
            "Call quality has been mixed recently."
        );
    }

    #[test]
    fn test_rep_strong_engagement() {
        let calls = window(vec![
            (Some("Jess"), Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some("Sam"), Some(analysis(CallGrade::Okay, &[], &[]))),
            (Some("Jess"), Some(analysis(CallGrade::Okay, &[], &[]))),
            (Some("Jess"), Some(analysis(CallGrade::Strong, &[], &[]))),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.rep_trend,
            "Jess's recent calls show strong engagement and effective deal progression."
        );
    }

    #[test]
    fn test_rep_needs_coaching_and_most_active() {
        let coaching = window(vec![
            (Some("Jess"), Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some("Jess"), Some(analysis(CallGrade::NeedsImprovement, &[], &[]))),
            (None, Some(analysis(CallGrade::Okay, &[], &[]))),
        ]);
        assert_eq!(
            report(compute_trends(&coaching, &TrendConfig::default())).rep_trend,
            "Jess's recent calls indicate meaningful activity, though some coaching on objections may be needed."
        );

        let active = window(vec![
            (Some("Sam"), Some(analysis(CallGrade::Okay, &[], &[]))),
            (Some("Sam"), Some(analysis(CallGrade::Strong, &[], &[]))),
            (None, Some(analysis(CallGrade::Okay, &[], &[]))),
        ]);
        assert_eq!(
            report(compute_trends(&active, &TrendConfig::default())).rep_trend,
            "Sam has been the most active representative recently."
        );
    }

    #[test]
    fn test_rep_tie_goes_to_most_recent() {
        let calls = window(vec![
            (Some("Alex"), Some(analysis(CallGrade::Okay, &[], &[]))),
            (Some("Jess"), Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some("Jess"), Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some("Alex"), Some(analysis(CallGrade::Okay, &[], &[]))),
        ]);
        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.rep_trend,
            "Alex has been the most active representative recently."
        );
    }

    #[test]
    fn test_unassigned_and_unanalyzed_calls_skip_rep_grouping() {
        let calls = window(vec![
            (None, Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some(""), Some(analysis(CallGrade::Strong, &[], &[]))),
            (Some("Jess"), None),
            (None, Some(analysis(CallGrade::Okay, &[], &[]))),
        ]);
        assert!(group_by_representative(&calls).is_empty());

        let trends = report(compute_trends(&calls, &TrendConfig::default()));
        assert_eq!(
            trends.rep_trend,
            "Sales representatives are showing varied activity levels."
        );
    }

    #[test]
    fn test_trends_from_config_section() {
        let section = TrendsConfig {
            window_size: 25,
            ..TrendsConfig::default()
        };
        let config = TrendConfig::from(&section);
        assert_eq!(config.window_size, 25);
        assert_eq!(config.min_calls, 3);
        assert_eq!(config.needs_improvement_percent, 30);
    }
}
