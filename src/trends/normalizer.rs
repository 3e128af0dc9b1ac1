//! Objection taxonomy.
//!
//! Maps free-text objections to a canonical [`ObjectionCategory`].

use crate::models::{AnalyzedCall, ObjectionCategory};

/// Keyword rules, checked in order. The first rule with a matching keyword wins.
const RULES: &[(&[&str], ObjectionCategory)] = &[
    (&["price", "expensive"], ObjectionCategory::Pricing),
    (&["competitor"], ObjectionCategory::Competition),
    (&["timing"], ObjectionCategory::Timing),
    (&["authority"], ObjectionCategory::Authority),
];

/// Classify one objection. Case-insensitive substring match; never fails.
pub fn normalize_objection(text: &str) -> ObjectionCategory {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(ObjectionCategory::Other)
}

/// Raw objection counts per category over the analyzed calls, `Other` included.
///
/// Every category appears in taxonomy order, including zero counts.
pub fn objection_distribution(calls: &[AnalyzedCall]) -> Vec<(ObjectionCategory, usize)> {
    let mut counts: Vec<(ObjectionCategory, usize)> =
        ObjectionCategory::ALL.iter().map(|c| (*c, 0)).collect();

    let objections = calls
        .iter()
        .filter_map(|call| call.analysis.as_ref())
        .flat_map(|analysis| analysis.objections.iter());

    for objection in objections {
        let category = normalize_objection(objection);
        if let Some(entry) = counts.iter_mut().find(|(c, _)| *c == category) {
            entry.1 += 1;
        }
    }

    counts
}
