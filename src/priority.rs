//! Keyword-based priority scoring.
//!
//! Tasks are scored from their description and stated benefit, then bucketed
//! into a tier. Every distinct keyword found adds its group's weight once; how
//! often a keyword repeats does not matter.

use crate::fields::Priority;

/// Signs of manual, error-prone work in a description.
pub const EFFORT_KEYWORDS: [&str; 7] = [
    "manual",
    "time-consuming",
    "error",
    "repetitive",
    "copy",
    "paste",
    "spreadsheet",
];

/// Automation payoff in a benefit statement.
pub const BENEFIT_KEYWORDS: [&str; 4] = ["automat", "ai", "reduce time", "efficiency"];

/// Recurring upkeep work in a description.
pub const UPKEEP_KEYWORDS: [&str; 4] = ["report", "update", "review", "tracking"];

const EFFORT_WEIGHT: u32 = 3;
const BENEFIT_WEIGHT: u32 = 2;
const UPKEEP_WEIGHT: u32 = 1;

fn hits(text: &str, keywords: &[&str]) -> u32 {
    keywords.iter().filter(|k| text.contains(*k)).count() as u32
}

/// Weighted keyword score for a task.
pub fn score(description: &str, benefit: Option<&str>) -> u32 {
    let desc = description.to_lowercase();
    let benefit = benefit.unwrap_or_default().to_lowercase();

    hits(&desc, &EFFORT_KEYWORDS) * EFFORT_WEIGHT
        + hits(&benefit, &BENEFIT_KEYWORDS) * BENEFIT_WEIGHT
        + hits(&desc, &UPKEEP_KEYWORDS) * UPKEEP_WEIGHT
}

/// Bucket a score into a tier.
pub fn tier_for_score(score: u32) -> Priority {
    match score {
        s if s >= 6 => Priority::P0,
        s if s >= 4 => Priority::P1,
        s if s >= 2 => Priority::P2,
        _ => Priority::P3,
    }
}

/// Score a task and bucket it.
pub fn score_priority(description: &str, benefit: Option<&str>) -> Priority {
    tier_for_score(score(description, benefit))
}

/// Simple tier from the number of effort keywords alone. Never yields P3.
///
/// Used for tool requests whose sheet row has no usable priority when
/// inference is enabled.
pub fn count_priority(description: &str) -> Priority {
    match hits(&description.to_lowercase(), &EFFORT_KEYWORDS) {
        n if n >= 3 => Priority::P0,
        2 => Priority::P1,
        _ => Priority::P2,
    }
}
